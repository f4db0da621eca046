//! Cache module for persisting images of the day to disk
//!
//! A cache directory holds one `<YYYYMMDD>.jpg` per day plus a `.lastrun`
//! marker recording the configuration that populated it. Reconciliation
//! compares the marker and the directory listing with the current
//! configuration; the store carries out the resulting deletes and writes.

mod reconciler;
mod store;

pub use reconciler::{plan, reconcile, target_dates, ReconcilePlan, DATE_FORMAT};
pub use store::{CacheError, FileFailure, ImageStore, IMAGE_EXTENSION, RUNFILE_NAME};
