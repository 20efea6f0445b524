//! Core types shared by the store and the circulation manager.

use chrono::{Local, NaiveDateTime, TimeDelta};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;

/// A single structured record: an ordered map of field name to JSON value.
pub type Document = Map<String, Value>;

/// Collection holding [`crate::models::Book`] records.
pub const BOOKS: &str = "books";

/// Collection holding [`crate::models::Member`] records.
pub const MEMBERS: &str = "members";

/// Collection holding [`crate::models::Loan`] records.
pub const LOANS: &str = "loans";

/// Collections every store starts with, in file order.
pub const DEFAULT_COLLECTIONS: [&str; 3] = [BOOKS, MEMBERS, LOANS];

/// Build a one-field patch for [`crate::Store::update`].
pub fn patch(field: &str, value: impl Into<Value>) -> Document {
    let mut doc = Document::new();
    doc.insert(field.to_string(), value.into());
    doc
}

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system's local time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
pub struct ManualClock {
    current: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn at(start: NaiveDateTime) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) -> NaiveDateTime {
        let mut current = self.current.lock();
        *current = *current + by;
        *current
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManualClock({})", self.now())
    }
}

/// Store statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub book_count: usize,
    pub member_count: usize,
    pub loan_count: usize,
    pub active_loan_count: usize,
    pub collection_count: usize,
    pub file_size_bytes: u64,
}
