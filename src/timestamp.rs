//! MS-DOS date/time handling.
//!
//! ZIP headers store the last-modified time of an entry as a pair of 16-bit
//! MS-DOS words:
//!
//! | Word | Bits | Meaning |
//! |------|------|---------|
//! | time | 0-4 | seconds / 2 |
//! | time | 5-10 | minutes |
//! | time | 11-15 | hours |
//! | date | 0-4 | day of month (1-31) |
//! | date | 5-8 | month (1-12) |
//! | date | 9-15 | years since 1980 |
//!
//! The format has two-second resolution, covers 1980-01-01 through
//! 2107-12-31, and carries no time zone. This crate reads and writes the
//! fields as UTC.
//!
//! # Example
//!
//! ```rust
//! use zipwright::DosDateTime;
//!
//! let ts = DosDateTime::from_unix_secs(1_000_000_000);
//! assert_eq!(ts.year(), 2001);
//! assert_eq!(ts.month(), 9);
//! assert_eq!(ts.day(), 9);
//! assert_eq!(ts.as_unix_secs(), 1_000_000_000);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MIN_YEAR: i64 = 1980;
const MAX_YEAR: i64 = 2107;
const SECS_PER_DAY: i64 = 86_400;

/// Unix seconds of 1980-01-01T00:00:00.
const DOS_EPOCH_UNIX: i64 = 315_532_800;

/// A timestamp in MS-DOS date/time format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DosDateTime {
    // date first so the derived ordering is chronological
    date: u16,
    time: u16,
}

impl Default for DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    fn default() -> Self {
        Self {
            date: (1 << 5) | 1,
            time: 0,
        }
    }
}

impl DosDateTime {
    /// Creates a timestamp from raw header words.
    ///
    /// The words are kept verbatim, even when they do not name a real
    /// calendar date; archives written by other tools sometimes contain zero.
    #[inline]
    pub const fn from_parts(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    /// Returns the raw date word.
    #[inline]
    pub const fn date_word(&self) -> u16 {
        self.date
    }

    /// Returns the raw time word.
    #[inline]
    pub const fn time_word(&self) -> u16 {
        self.time
    }

    /// Creates a timestamp from Unix seconds, clamped to the DOS range.
    ///
    /// Odd seconds are rounded down.
    pub fn from_unix_secs(secs: i64) -> Self {
        let (year, month, day) = civil_from_days(secs.div_euclid(SECS_PER_DAY));
        if year < MIN_YEAR {
            return Self::default();
        }
        if year > MAX_YEAR {
            return Self::from_parts(
                (((MAX_YEAR - MIN_YEAR) as u16) << 9) | (12 << 5) | 31,
                (23 << 11) | (59 << 5) | 29,
            );
        }
        let secs_of_day = secs.rem_euclid(SECS_PER_DAY);
        let hour = secs_of_day / 3600;
        let minute = (secs_of_day % 3600) / 60;
        let second = secs_of_day % 60;
        Self {
            date: (((year - MIN_YEAR) as u16) << 9) | ((month as u16) << 5) | day as u16,
            time: ((hour as u16) << 11) | ((minute as u16) << 5) | (second as u16 / 2),
        }
    }

    /// Creates a timestamp from a `SystemTime`, clamped to the DOS range.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(duration) => Self::from_unix_secs(duration.as_secs() as i64),
            Err(_) => Self::default(),
        }
    }

    /// Returns the current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Returns the calendar year (1980-2107).
    pub fn year(&self) -> u16 {
        (self.date >> 9) + MIN_YEAR as u16
    }

    /// Returns the month (1-12 for well-formed values).
    pub fn month(&self) -> u8 {
        ((self.date >> 5) & 0x0F) as u8
    }

    /// Returns the day of month (1-31 for well-formed values).
    pub fn day(&self) -> u8 {
        (self.date & 0x1F) as u8
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u8 {
        (self.time >> 11) as u8
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u8 {
        ((self.time >> 5) & 0x3F) as u8
    }

    /// Returns the second (0-58, always even).
    pub fn second(&self) -> u8 {
        ((self.time & 0x1F) * 2) as u8
    }

    /// Returns the timestamp as Unix seconds, interpreting the fields as UTC.
    ///
    /// Out-of-range month or day fields are clamped to the nearest valid
    /// value so malformed headers still yield a usable instant.
    pub fn as_unix_secs(&self) -> i64 {
        let month = self.month().clamp(1, 12) as i64;
        let day = self.day().max(1) as i64;
        let days = days_from_civil(self.year() as i64, month, day);
        let secs_of_day =
            self.hour() as i64 * 3600 + self.minute() as i64 * 60 + self.second() as i64;
        days * SECS_PER_DAY + secs_of_day
    }

    /// Converts to a `SystemTime`.
    pub fn as_system_time(&self) -> SystemTime {
        let secs = self.as_unix_secs().max(DOS_EPOCH_UNIX) as u64;
        UNIX_EPOCH + Duration::from_secs(secs)
    }
}

impl From<SystemTime> for DosDateTime {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl std::fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
