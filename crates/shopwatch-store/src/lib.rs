//! On-disk output: the append-only product history, the derived current
//! snapshot, and diagnostic HTML dumps.
//!
//! All CSV files are UTF-8 with a leading byte-order mark so spreadsheet
//! tools render Arabic product names correctly. Readers strip the mark.

pub mod diagnostics;
pub mod history;
pub mod snapshot;

use std::path::Path;

use thiserror::Error;

pub use diagnostics::{diagnostic_file_name, write_diagnostic_html};
pub use history::HistoryStore;
pub use snapshot::{build_snapshot, rebuild_snapshot, write_snapshot};

pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error on {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}

pub(crate) fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}
