//! Clock Port - Injected source of the current time.

use chrono::NaiveDate;

use crate::domain::foundation::Timestamp;

/// Source of "now" for TTLs and date rules.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Today's date (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
