//! Pending changes and the log that orders them.

use crate::codec::CompressionMethod;
use crate::source::EntrySource;
use crate::write::AddOptions;

/// A pending modification of one entry slot.
#[derive(Debug)]
pub enum Change {
    /// A new entry occupying a fresh slot.
    Add {
        /// Slot of the new entry.
        index: usize,
        /// Name of the new entry.
        name: String,
        /// Bytes of the new entry.
        source: Box<dyn EntrySource>,
        /// Encoding options.
        options: AddOptions,
    },
    /// New contents for an existing entry.
    Replace {
        /// Slot of the replaced entry.
        index: usize,
        /// New bytes.
        source: Box<dyn EntrySource>,
        /// Encoding options.
        options: AddOptions,
    },
    /// Removal of an existing entry.
    Delete {
        /// Slot of the removed entry.
        index: usize,
    },
    /// A new name for an existing entry.
    Rename {
        /// Slot of the renamed entry.
        index: usize,
        /// The new name.
        new_name: String,
    },
    /// Re-encoding of an existing entry with another method or level.
    Recompress {
        /// Slot of the entry.
        index: usize,
        /// Target method.
        method: CompressionMethod,
        /// Target level.
        level: u32,
    },
    /// A new comment for an entry.
    SetEntryComment {
        /// Slot of the entry.
        index: usize,
        /// The comment; empty means none.
        comment: String,
    },
}

impl Change {
    /// Returns the slot this change applies to.
    pub fn index(&self) -> usize {
        match self {
            Change::Add { index, .. }
            | Change::Replace { index, .. }
            | Change::Delete { index }
            | Change::Rename { index, .. }
            | Change::Recompress { index, .. }
            | Change::SetEntryComment { index, .. } => *index,
        }
    }

    /// Returns whether committing this change rewrites only header fields.
    pub fn is_header_only(&self) -> bool {
        matches!(
            self,
            Change::Delete { .. } | Change::Rename { .. } | Change::SetEntryComment { .. }
        )
    }

    /// Returns a short name for logging.
    pub fn operation_type(&self) -> &'static str {
        match self {
            Change::Add { .. } => "add",
            Change::Replace { .. } => "replace",
            Change::Delete { .. } => "delete",
            Change::Rename { .. } => "rename",
            Change::Recompress { .. } => "recompress",
            Change::SetEntryComment { .. } => "set_comment",
        }
    }
}

/// Uncommitted changes in insertion order.
///
/// Recording a change folds it into earlier changes on the same slot where
/// the combination has a single meaning:
///
/// - a Delete drops every earlier change on the slot; deleting a pending
///   Add leaves nothing behind
/// - a Replace on a pending Add swaps the Add's source; otherwise it drops
///   earlier Replace and Recompress changes
/// - a Rename of a pending Add updates its name; otherwise it drops the
///   earlier Rename
/// - a Recompress updates the options of a pending Add or Replace
/// - a comment drops the earlier comment
#[derive(Debug, Default)]
pub struct ChangeLog {
    changes: Vec<Change>,
}

impl ChangeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a change.
    pub fn record(&mut self, change: Change) {
        log::trace!(
            "recording {} on slot {}",
            change.operation_type(),
            change.index()
        );
        match change {
            Change::Add { .. } => self.changes.push(change),
            Change::Delete { index } => {
                let was_added = self.is_added(index);
                self.discard(index);
                if !was_added {
                    self.changes.push(Change::Delete { index });
                }
            }
            Change::Replace {
                index,
                source,
                options,
            } => {
                if let Some(Change::Add {
                    source: add_source,
                    options: add_options,
                    ..
                }) = self.find_mut(index, |c| matches!(c, Change::Add { .. }))
                {
                    *add_source = source;
                    *add_options = options;
                    return;
                }
                self.changes.retain(|c| {
                    c.index() != index
                        || !matches!(c, Change::Replace { .. } | Change::Recompress { .. })
                });
                self.changes.push(Change::Replace {
                    index,
                    source,
                    options,
                });
            }
            Change::Rename { index, new_name } => {
                if let Some(Change::Add { name, .. }) =
                    self.find_mut(index, |c| matches!(c, Change::Add { .. }))
                {
                    *name = new_name;
                    return;
                }
                self.changes
                    .retain(|c| c.index() != index || !matches!(c, Change::Rename { .. }));
                self.changes.push(Change::Rename { index, new_name });
            }
            Change::Recompress {
                index,
                method,
                level,
            } => {
                if let Some(Change::Add { options, .. } | Change::Replace { options, .. }) = self
                    .find_mut(index, |c| {
                        matches!(c, Change::Add { .. } | Change::Replace { .. })
                    })
                {
                    options.method = method;
                    options.level = level;
                    return;
                }
                self.changes
                    .retain(|c| c.index() != index || !matches!(c, Change::Recompress { .. }));
                self.changes.push(Change::Recompress {
                    index,
                    method,
                    level,
                });
            }
            Change::SetEntryComment { index, comment } => {
                self.changes.retain(|c| {
                    c.index() != index || !matches!(c, Change::SetEntryComment { .. })
                });
                self.changes.push(Change::SetEntryComment { index, comment });
            }
        }
    }

    fn find_mut(
        &mut self,
        index: usize,
        predicate: impl Fn(&Change) -> bool,
    ) -> Option<&mut Change> {
        self.changes
            .iter_mut()
            .find(|c| c.index() == index && predicate(&**c))
    }

    /// Drops every change on a slot.
    pub fn discard(&mut self, index: usize) {
        self.changes.retain(|c| c.index() != index);
    }

    /// Returns whether the slot was created by a pending Add.
    pub fn is_added(&self, index: usize) -> bool {
        self.changes
            .iter()
            .any(|c| matches!(c, Change::Add { index: i, .. } if *i == index))
    }

    /// Returns whether any change touches the slot.
    pub fn touches(&self, index: usize) -> bool {
        self.changes.iter().any(|c| c.index() == index)
    }

    /// Returns the pending source and options for a slot, if its bytes are new.
    pub fn source_for(&self, index: usize) -> Option<(&dyn EntrySource, &AddOptions)> {
        self.changes.iter().rev().find_map(|c| match c {
            Change::Add {
                index: i,
                source,
                options,
                ..
            }
            | Change::Replace {
                index: i,
                source,
                options,
            } if *i == index => Some((source.as_ref(), options)),
            _ => None,
        })
    }

    /// Returns the pending method and level for an existing entry.
    pub fn recompression_for(&self, index: usize) -> Option<(CompressionMethod, u32)> {
        self.changes.iter().rev().find_map(|c| match c {
            Change::Recompress {
                index: i,
                method,
                level,
            } if *i == index => Some((*method, *level)),
            _ => None,
        })
    }

    /// Returns the changes in insertion order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Returns the number of recorded changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Drops every change.
    pub fn clear(&mut self) {
        self.changes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    fn add(index: usize, name: &str) -> Change {
        Change::Add {
            index,
            name: name.into(),
            source: Box::new(BufferSource::new("add")),
            options: AddOptions::default(),
        }
    }

    fn replace(index: usize, data: &str) -> Change {
        Change::Replace {
            index,
            source: Box::new(BufferSource::new(data)),
            options: AddOptions::default(),
        }
    }

    fn drained(log: &ChangeLog, index: usize) -> Vec<u8> {
        let (source, _) = log.source_for(index).unwrap();
        let mut out = Vec::new();
        std::io::Read::read_to_end(&mut source.materialize().unwrap(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_rename_then_delete_is_delete() {
        let mut log = ChangeLog::new();
        log.record(Change::Rename {
            index: 0,
            new_name: "b".into(),
        });
        log.record(Change::Delete { index: 0 });
        assert_eq!(log.len(), 1);
        assert!(matches!(log.changes()[0], Change::Delete { index: 0 }));
    }

    #[test]
    fn test_add_then_delete_leaves_nothing() {
        let mut log = ChangeLog::new();
        log.record(add(3, "new.txt"));
        log.record(Change::SetEntryComment {
            index: 3,
            comment: "c".into(),
        });
        log.record(Change::Delete { index: 3 });
        assert!(log.is_empty());
    }

    #[test]
    fn test_replace_supersedes_replace_and_recompress() {
        let mut log = ChangeLog::new();
        log.record(replace(1, "first"));
        log.record(Change::Recompress {
            index: 1,
            method: CompressionMethod::Stored,
            level: 0,
        });
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.source_for(1).unwrap().1.method,
            CompressionMethod::Stored
        );

        log.record(replace(1, "second"));
        assert_eq!(log.len(), 1);
        assert_eq!(drained(&log, 1), b"second");
    }

    #[test]
    fn test_replace_updates_pending_add() {
        let mut log = ChangeLog::new();
        log.record(add(0, "a"));
        log.record(replace(0, "changed"));
        assert_eq!(log.len(), 1);
        assert!(log.is_added(0));
        assert_eq!(drained(&log, 0), b"changed");
    }

    #[test]
    fn test_rename_updates_pending_add() {
        let mut log = ChangeLog::new();
        log.record(add(0, "a"));
        log.record(Change::Rename {
            index: 0,
            new_name: "b".into(),
        });
        assert_eq!(log.len(), 1);
        assert!(matches!(&log.changes()[0], Change::Add { name, .. } if name == "b"));
    }

    #[test]
    fn test_recompress_on_existing_entry() {
        let mut log = ChangeLog::new();
        log.record(Change::Recompress {
            index: 2,
            method: CompressionMethod::Stored,
            level: 0,
        });
        log.record(Change::Recompress {
            index: 2,
            method: CompressionMethod::Deflate,
            level: 9,
        });
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.recompression_for(2),
            Some((CompressionMethod::Deflate, 9))
        );
        assert!(log.source_for(2).is_none());
    }

    #[test]
    fn test_discard_only_touches_one_slot() {
        let mut log = ChangeLog::new();
        log.record(Change::Delete { index: 0 });
        log.record(Change::Rename {
            index: 1,
            new_name: "x".into(),
        });
        log.discard(0);
        assert!(!log.touches(0));
        assert!(log.touches(1));
        assert!(log.changes()[0].is_header_only());
    }
}
