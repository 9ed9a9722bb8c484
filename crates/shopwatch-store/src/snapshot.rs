//! The current-state view: latest record per `(site_name, product_url)`.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use shopwatch_core::{ProductRecord, HISTORY_COLUMNS};
use tempfile::NamedTempFile;

use crate::history::HistoryStore;
use crate::{StoreError, UTF8_BOM};

/// Derives the snapshot from a full history.
///
/// Each key keeps its record with the greatest timestamp; on equal
/// timestamps the later row wins. Output is sorted by site name, then
/// product name, then product URL.
#[must_use]
pub fn build_snapshot(history: &[ProductRecord]) -> Vec<ProductRecord> {
    let mut latest: HashMap<(&str, &str), &ProductRecord> = HashMap::new();
    for record in history {
        latest
            .entry(record.key())
            .and_modify(|current| {
                if record.timestamp >= current.timestamp {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut snapshot: Vec<ProductRecord> = latest.into_values().cloned().collect();
    snapshot.sort_by(|a, b| {
        (&a.site_name, &a.product_name, &a.product_url).cmp(&(
            &b.site_name,
            &b.product_name,
            &b.product_url,
        ))
    });
    snapshot
}

/// Replaces the file at `path` with `records`, writing a sibling temporary
/// file first and renaming it into place.
///
/// # Errors
///
/// Returns [`StoreError`] if the temporary file cannot be written or
/// renamed.
pub fn write_snapshot(path: &Path, records: &[ProductRecord]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(UTF8_BOM)
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer
            .write_record(HISTORY_COLUMNS)
            .map_err(|e| StoreError::csv(path, e))?;
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| StoreError::csv(path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}

/// Reloads the full history, rebuilds the snapshot and writes it.
/// Returns the number of snapshot rows.
///
/// # Errors
///
/// Returns [`StoreError`] if the history cannot be read or the snapshot
/// cannot be written.
pub fn rebuild_snapshot(history: &HistoryStore, path: &Path) -> Result<usize, StoreError> {
    let records = history.load()?;
    let snapshot = build_snapshot(&records);
    write_snapshot(path, &snapshot)?;
    tracing::debug!(
        path = %path.display(),
        history_rows = records.len(),
        snapshot_rows = snapshot.len(),
        "snapshot rebuilt"
    );
    Ok(snapshot.len())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use shopwatch_core::StockStatus;

    use super::*;

    fn record(site: &str, name: &str, url: &str, hour: u32, price: f64) -> ProductRecord {
        ProductRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 2, 1, hour, 0, 0).unwrap(),
            site_name: site.to_owned(),
            product_name: name.to_owned(),
            sku: String::new(),
            product_url: url.to_owned(),
            status: StockStatus::Available,
            price_value: Some(price),
            currency: "EGP".to_owned(),
            raw_price_text: format!("{price} EGP"),
            source_url: "https://shop.example/cat".to_owned(),
            notes: String::new(),
        }
    }

    #[test]
    fn keeps_latest_record_per_key() {
        let history = vec![
            record("A", "Kettle", "https://a/1", 5, 100.0),
            record("A", "Kettle", "https://a/1", 9, 120.0),
            record("A", "Kettle", "https://a/1", 7, 110.0),
            record("B", "Kettle", "https://a/1", 1, 90.0),
        ];

        let snapshot = build_snapshot(&history);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].site_name, "A");
        assert_eq!(snapshot[0].price_value, Some(120.0));
        assert_eq!(snapshot[1].site_name, "B");
    }

    #[test]
    fn equal_timestamps_keep_last_seen() {
        let history = vec![
            record("A", "Kettle", "https://a/1", 5, 100.0),
            record("A", "Kettle", "https://a/1", 5, 105.0),
        ];
        assert_eq!(build_snapshot(&history)[0].price_value, Some(105.0));
    }

    #[test]
    fn sorted_by_site_then_product_name() {
        let history = vec![
            record("B", "Alpha", "https://b/1", 1, 1.0),
            record("A", "Zeta", "https://a/2", 1, 1.0),
            record("A", "Beta", "https://a/3", 1, 1.0),
        ];
        let names: Vec<_> = build_snapshot(&history)
            .into_iter()
            .map(|r| format!("{}/{}", r.site_name, r.product_name))
            .collect();
        assert_eq!(names, vec!["A/Beta", "A/Zeta", "B/Alpha"]);
    }

    #[test]
    fn one_row_per_key_with_group_maximum() {
        let mut history = Vec::new();
        for hour in [3, 1, 8, 2] {
            for (site, url) in [("A", "https://a/1"), ("A", "https://a/2"), ("B", "https://a/1")] {
                history.push(record(site, "P", url, hour, f64::from(hour)));
            }
        }

        let snapshot = build_snapshot(&history);

        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|r| r.price_value == Some(8.0)));
    }

    #[test]
    fn building_twice_is_idempotent() {
        let history = vec![
            record("A", "Kettle", "https://a/1", 5, 100.0),
            record("A", "Toaster", "https://a/2", 6, 200.0),
            record("A", "Kettle", "https://a/1", 9, 120.0),
        ];
        let once = build_snapshot(&history);
        assert_eq!(build_snapshot(&history), once);
        assert_eq!(build_snapshot(&once), once);
    }

    #[test]
    fn records_without_url_share_one_key_per_site() {
        let history = vec![
            record("A", "First", "", 1, 1.0),
            record("A", "Second", "", 2, 2.0),
        ];
        let snapshot = build_snapshot(&history);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].product_name, "Second");
    }

    #[test]
    fn empty_snapshot_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_snapshot.csv");

        write_snapshot(&path, &[]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.trim_end(), HISTORY_COLUMNS.join(","));
    }

    #[test]
    fn write_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_snapshot.csv");
        write_snapshot(&path, &[record("A", "Old", "https://a/1", 1, 1.0)]).unwrap();

        write_snapshot(&path, &[record("A", "New", "https://a/1", 2, 2.0)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("New"));
        assert!(!text.contains("Old"));
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
