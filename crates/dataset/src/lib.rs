//! Parking Datasets
//!
//! CSV loading and export, plus path-keyed dataset and classification caches.

mod cache;
mod export;
mod loader;

pub use cache::{ClassificationCache, ClassifiedRun, Dataset, DatasetCache, DatasetId};
pub use export::{write_multi_entry_csv, write_rejected_csv, MULTI_ENTRY_COLUMNS, REJECTED_COLUMNS};
pub use loader::{load_csv, read_events};

use std::path::PathBuf;
use thiserror::Error;

/// Dataset errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Cache lock poisoned: {0}")]
    Lock(String),
}
