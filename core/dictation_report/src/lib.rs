//! Read-only reporting over a local dictation history store.
//!
//! The store is the dictation app's own SQLite database; nothing here ever
//! writes to it. Each report generator takes a [`ReportConfig`] and opens the
//! store itself.

pub mod aggregate;
pub mod apps;
pub mod clock;
pub mod config;
pub mod error;
pub mod report;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use clock::{Period, TimeNormalizer};
pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use store::{DictationEvent, FilterSet, Store};
