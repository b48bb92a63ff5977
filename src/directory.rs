//! In-memory central directory model.
//!
//! Entries live in an arena of slots addressed by index. Each slot keeps the
//! record as last committed and the record as currently edited; either may
//! be absent (a pending add has no original, a deleted entry has no current
//! record). A name map over live records gives O(1) lookups and is updated
//! in place on every add, rename, removal and revert.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::format::flags;
use crate::format::header::{CentralDirectoryHeader, decode_text};
use crate::{Error, Result};

/// One entry's header together with its decoded name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryRecord {
    pub(crate) name: String,
    pub(crate) header: CentralDirectoryHeader,
}

impl EntryRecord {
    pub(crate) fn from_header(header: CentralDirectoryHeader) -> Self {
        Self {
            name: header.decoded_name().into_owned(),
            header,
        }
    }

    /// Sets the name and the UTF-8 flag that goes with it.
    pub(crate) fn set_name(&mut self, name: String) {
        if name.is_ascii() {
            self.header.flags &= !flags::UTF8;
        } else {
            self.header.flags |= flags::UTF8;
        }
        self.header.name = name.as_bytes().to_vec();
        self.name = name;
    }

    pub(crate) fn comment(&self) -> Cow<'_, str> {
        decode_text(&self.header.comment)
    }

    pub(crate) fn set_comment(&mut self, comment: &str) {
        self.header.comment = comment.as_bytes().to_vec();
    }
}

#[derive(Debug, Clone)]
struct Slot {
    original: Option<EntryRecord>,
    current: Option<EntryRecord>,
}

/// The slot arena and its name index.
#[derive(Debug, Default)]
pub(crate) struct Directory {
    slots: Vec<Slot>,
    names: HashMap<String, usize>,
    // set when the committed directory repeats a name
    has_duplicates: bool,
}

impl Directory {
    /// Builds a directory from committed headers, in directory order.
    ///
    /// When a foreign archive repeats a name, lookups resolve to the first
    /// live occurrence; the later ones stay reachable by index and take over
    /// the name when the earlier ones are removed or renamed.
    pub(crate) fn from_headers(headers: Vec<CentralDirectoryHeader>) -> Self {
        let mut directory = Self {
            slots: Vec::with_capacity(headers.len()),
            names: HashMap::with_capacity(headers.len()),
            has_duplicates: false,
        };
        for header in headers {
            let record = EntryRecord::from_header(header);
            let index = directory.slots.len();
            if directory.names.contains_key(&record.name) {
                log::warn!("duplicate entry name {:?} at index {}", record.name, index);
                directory.has_duplicates = true;
            } else {
                directory.names.insert(record.name.clone(), index);
            }
            directory.slots.push(Slot {
                original: Some(record.clone()),
                current: Some(record),
            });
        }
        directory
    }

    /// Number of live entries.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.current.is_some()).count()
    }

    /// Number of slots, live or not.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the live record at `index`.
    pub(crate) fn get(&self, index: usize) -> Option<&EntryRecord> {
        self.slots.get(index)?.current.as_ref()
    }

    /// Returns the live record at `index` or [`Error::InvalidIndex`].
    pub(crate) fn live(&self, index: usize) -> Result<&EntryRecord> {
        self.get(index).ok_or(Error::InvalidIndex { index })
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut EntryRecord> {
        self.slots.get_mut(index)?.current.as_mut()
    }

    /// Returns the committed record at `index`.
    pub(crate) fn original(&self, index: usize) -> Option<&EntryRecord> {
        self.slots.get(index)?.original.as_ref()
    }

    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Indices of live entries in slot order.
    pub(crate) fn live_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.current.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Appends a record without a committed original.
    pub(crate) fn insert(&mut self, record: EntryRecord) -> Result<usize> {
        if self.names.contains_key(&record.name) {
            return Err(Error::EntryExists { name: record.name });
        }
        let index = self.slots.len();
        self.names.insert(record.name.clone(), index);
        self.slots.push(Slot {
            original: None,
            current: Some(record),
        });
        Ok(index)
    }

    /// Renames a live entry. Renaming to the current name does nothing.
    pub(crate) fn rename(&mut self, index: usize, new_name: &str) -> Result<()> {
        let old_name = self.live(index)?.name.clone();
        if old_name == new_name {
            return Ok(());
        }
        if self.names.contains_key(new_name) {
            return Err(Error::EntryExists {
                name: new_name.to_string(),
            });
        }
        self.unlink(&old_name, index);
        self.names.insert(new_name.to_string(), index);
        if let Some(record) = self.get_mut(index) {
            record.set_name(new_name.to_string());
        }
        Ok(())
    }

    /// Removes a live entry, returning its record.
    pub(crate) fn remove(&mut self, index: usize) -> Result<EntryRecord> {
        let record = self
            .slots
            .get_mut(index)
            .and_then(|s| s.current.take())
            .ok_or(Error::InvalidIndex { index })?;
        self.unlink(&record.name, index);
        Ok(record)
    }

    /// Restores the committed record of a slot.
    ///
    /// A pending add disappears. Fails without changing anything when the
    /// committed name is now used by another live entry.
    pub(crate) fn revert(&mut self, index: usize) -> Result<()> {
        let slot = self.slots.get(index).ok_or(Error::InvalidIndex { index })?;
        let original = slot.original.clone();
        let current_name = slot.current.as_ref().map(|r| r.name.clone());

        if let Some(original) = &original {
            if let Some(&other) = self.names.get(&original.name) {
                if other != index && !self.is_committed_duplicate(other, &original.name) {
                    return Err(Error::EntryExists {
                        name: original.name.clone(),
                    });
                }
            }
        }

        if let Some(name) = current_name {
            self.unlink(&name, index);
        }
        if let Some(original) = &original {
            self.link(&original.name, index);
        }
        self.slots[index].current = original;
        Ok(())
    }

    /// Restores every committed record and drops pending adds.
    pub(crate) fn revert_all(&mut self) {
        self.slots.retain(|s| s.original.is_some());
        self.names.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.current = slot.original.clone();
            if let Some(record) = &slot.current {
                self.names.entry(record.name.clone()).or_insert(index);
            }
        }
    }

    /// Returns whether the live entry at `other` still carries `name` from
    /// the committed directory, which a foreign archive may repeat.
    fn is_committed_duplicate(&self, other: usize, name: &str) -> bool {
        self.has_duplicates && self.original(other).is_some_and(|r| r.name == name)
    }

    /// Points `name` at `index` unless an earlier live slot holds it.
    fn link(&mut self, name: &str, index: usize) {
        match self.names.get(name) {
            Some(&existing) if existing < index => {}
            _ => {
                self.names.insert(name.to_string(), index);
            }
        }
    }

    /// Drops `index` from the name map, handing the name to the next live
    /// slot that repeats it.
    fn unlink(&mut self, name: &str, index: usize) {
        if self.names.get(name) != Some(&index) {
            return;
        }
        let successor = if self.has_duplicates {
            self.slots
                .iter()
                .enumerate()
                .find(|&(i, s)| i != index && s.current.as_ref().is_some_and(|r| r.name == name))
                .map(|(i, _)| i)
        } else {
            None
        };
        match successor {
            Some(next) => {
                self.names.insert(name.to_string(), next);
            }
            None => {
                self.names.remove(name);
            }
        }
    }
}
