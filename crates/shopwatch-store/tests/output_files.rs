//! End-to-end checks of the history/snapshot pair on a real directory.

use std::fs;

use chrono::{TimeZone, Utc};
use shopwatch_core::{ProductRecord, StockStatus, HISTORY_COLUMNS};
use shopwatch_store::{build_snapshot, rebuild_snapshot, HistoryStore};

fn record(name: &str, url: &str, day: u32, status: StockStatus) -> ProductRecord {
    ProductRecord {
        timestamp: Utc.with_ymd_and_hms(2025, 4, day, 6, 0, 0).unwrap(),
        site_name: "Shop".to_owned(),
        product_name: name.to_owned(),
        sku: String::new(),
        product_url: url.to_owned(),
        status,
        price_value: Some(1250.0),
        currency: "EGP".to_owned(),
        raw_price_text: "1,250.00 EGP".to_owned(),
        source_url: "https://shop.example/cat".to_owned(),
        notes: "profile=woocommerce; page=1".to_owned(),
    }
}

#[test]
fn repeated_runs_accumulate_history_and_refresh_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryStore::new(dir.path().join("products_history.csv"));
    let snapshot_path = dir.path().join("current_snapshot.csv");

    history
        .append(&[
            record("Kettle", "https://shop.example/p/kettle", 1, StockStatus::Available),
            record("Toaster", "https://shop.example/p/toaster", 1, StockStatus::Available),
        ])
        .unwrap();
    assert_eq!(rebuild_snapshot(&history, &snapshot_path).unwrap(), 2);

    history
        .append(&[record("Kettle", "https://shop.example/p/kettle", 2, StockStatus::SoldOut)])
        .unwrap();
    assert_eq!(rebuild_snapshot(&history, &snapshot_path).unwrap(), 2);

    assert_eq!(history.load().unwrap().len(), 3);

    let text = fs::read_to_string(&snapshot_path).unwrap();
    let kettle_row = text
        .lines()
        .find(|line| line.contains("Kettle"))
        .unwrap();
    assert!(kettle_row.contains("Sold Out"));
}

#[test]
fn zero_record_run_still_leaves_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryStore::new(dir.path().join("out/products_history.csv"));
    let snapshot_path = dir.path().join("out/current_snapshot.csv");

    history.append(&[]).unwrap();
    assert_eq!(rebuild_snapshot(&history, &snapshot_path).unwrap(), 0);

    let header = HISTORY_COLUMNS.join(",");
    for path in [history.path(), snapshot_path.as_path()] {
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.trim_start_matches('\u{feff}').trim_end(), header);
    }
}

#[test]
fn snapshot_file_matches_in_memory_build() {
    let dir = tempfile::tempdir().unwrap();
    let history = HistoryStore::new(dir.path().join("products_history.csv"));
    let snapshot_path = dir.path().join("current_snapshot.csv");
    let rows = vec![
        record("Toaster", "https://shop.example/p/toaster", 3, StockStatus::Available),
        record("Kettle", "https://shop.example/p/kettle", 1, StockStatus::Unknown),
        record("Kettle", "https://shop.example/p/kettle", 4, StockStatus::Available),
    ];
    history.append(&rows).unwrap();

    rebuild_snapshot(&history, &snapshot_path).unwrap();

    let on_disk = HistoryStore::new(&snapshot_path).load().unwrap();
    assert_eq!(on_disk, build_snapshot(&rows));
    assert_eq!(on_disk[0].product_name, "Kettle");
    assert_eq!(on_disk[0].status, StockStatus::Available);
}
