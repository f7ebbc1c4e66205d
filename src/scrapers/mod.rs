//! Calendar page scraping.
//!
//! The scraper follows a two-phase pattern:
//!
//! 1. **Fetching**: download the calendar page with a browser-like identity
//! 2. **Extraction**: walk the slot markers, build [`CalendarEntry`] values
//!    and drop duplicates in document order
//!
//! [`CalendarEntry`]: crate::models::CalendarEntry

pub mod calendar;

use crate::error::DashboardError;
use crate::models::CalendarEntry;
use std::future::Future;

/// A document source yielding deduplicated calendar entries.
pub trait CalendarSource {
    fn fetch_entries(&self) -> impl Future<Output = Result<Vec<CalendarEntry>, DashboardError>> + Send;
}
