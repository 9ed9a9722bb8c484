use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use shopwatch_core::{ProductRecord, HISTORY_COLUMNS};

use crate::{strip_bom, StoreError, UTF8_BOM};

/// Append-only CSV log of every record ever extracted.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `records` after the existing rows. A missing or empty file
    /// gets the BOM and header first, so calling this with no records still
    /// leaves a valid file behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file or its directory cannot be written.
    pub fn append(&self, records: &[ProductRecord]) -> Result<usize, StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let is_new = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len()
            == 0;
        if is_new {
            file.write_all(UTF8_BOM)
                .map_err(|e| StoreError::io(&self.path, e))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer
                .write_record(HISTORY_COLUMNS)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| StoreError::csv(&self.path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), rows = records.len(), "history appended");
        Ok(records.len())
    }

    /// Reads every parseable row in file order. A missing file is an empty
    /// history; malformed rows are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<Vec<ProductRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let mut reader = csv::ReaderBuilder::new().from_reader(strip_bom(&content).as_bytes());
        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<ProductRecord>() {
            match row {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        path = %self.path.display(),
                        line = e.position().map(csv::Position::line),
                        error = %e,
                        "skipping unreadable history row"
                    );
                }
            }
        }
        if skipped > 0 {
            tracing::warn!(path = %self.path.display(), skipped, "history rows skipped");
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use shopwatch_core::StockStatus;

    use super::*;

    fn record(site: &str, url: &str, hour: u32) -> ProductRecord {
        ProductRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 2, 1, hour, 0, 0).unwrap(),
            site_name: site.to_owned(),
            product_name: "Galaxy A15, 128GB".to_owned(),
            sku: String::new(),
            product_url: url.to_owned(),
            status: StockStatus::SoldOut,
            price_value: Some(8499.0),
            currency: "ج.م".to_owned(),
            raw_price_text: "8,499 ج.م".to_owned(),
            source_url: "https://shop.example/cat".to_owned(),
            notes: "profile=salla; page=1".to_owned(),
        }
    }

    #[test]
    fn append_writes_bom_and_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("products_history.csv"));

        store.append(&[record("A", "https://a/1", 1)]).unwrap();
        store.append(&[record("A", "https://a/2", 2)]).unwrap();

        let bytes = fs::read(store.path()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.matches("timestamp_iso,site_name").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn appended_rows_load_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("h.csv"));
        let rows = vec![record("A", "https://a/1", 1), record("B", "https://b/1", 2)];

        store.append(&rows).unwrap();

        assert_eq!(store.load().unwrap(), rows);
    }

    #[test]
    fn empty_append_creates_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested/out/h.csv"));

        assert_eq!(store.append(&[]).unwrap(), 0);

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(strip_bom(&text).trim_end(), HISTORY_COLUMNS.join(","));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("absent.csv"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.csv");
        let header = HISTORY_COLUMNS.join(",");
        let content = format!(
            "{header}\n\
             2025-02-01T01:00:00+00:00,A,Kettle,,https://a/1,Available,100.0,EGP,100 EGP,https://a,\n\
             not-a-date,A,Broken,,https://a/2,Available,,,,https://a,\n\
             2025-02-01T02:00:00Z,A,Toaster,,https://a/3,Sold Out,,,,https://a,\n"
        );
        fs::write(&path, content).unwrap();

        let loaded = HistoryStore::new(&path).load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].product_name, "Kettle");
        assert_eq!(loaded[1].status, StockStatus::SoldOut);
        assert_eq!(loaded[1].price_value, None);
    }
}
