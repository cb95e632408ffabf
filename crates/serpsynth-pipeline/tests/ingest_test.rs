//! Raw loader and source client tests.

use std::fs;

use chrono::NaiveDate;
use serpsynth_core::errors::{PipelineError, SourceError};
use serpsynth_core::types::{Device, SourceRecord};
use serpsynth_pipeline::{JsonLinesSource, RawLoader, SearchAnalyticsSource, StaticSource};
use serpsynth_storage::queries::raw;
use serpsynth_storage::DatabaseManager;
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn record(date: NaiveDate, query: &str, device: Device, impressions: i64) -> SourceRecord {
    SourceRecord {
        date,
        query: query.to_string(),
        page_path: format!("/p/{query}"),
        device,
        demand: Some(impressions * 2),
        impressions: Some(impressions),
        clicks: Some(1),
        position: Some(3.0),
    }
}

fn raw_count(db: &DatabaseManager) -> i64 {
    db.with_conn(raw::count).unwrap()
}

#[test]
fn static_source_filters_by_date_and_device() {
    let source = StaticSource::new(vec![
        record(day(1), "a", Device::Desktop, 5),
        record(day(1), "b", Device::Mobile, 5),
        record(day(2), "c", Device::Desktop, 5),
    ]);

    let got = source.fetch_day(day(1), Device::Desktop).unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].query, "a");
    assert!(source.fetch_day(day(3), Device::Desktop).unwrap().is_empty());
}

#[test]
fn lookback_window_ends_yesterday() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let source = StaticSource::default();
    let loader = RawLoader::new(&db, &source, Device::ALL.to_vec(), 3);

    assert_eq!(loader.lookback_window(day(10)), (day(7), day(9)));
    assert_eq!(loader.missing_dates(day(10)).unwrap(), vec![day(7), day(8), day(9)]);
}

#[test]
fn sync_loads_only_missing_dates() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let source = StaticSource::new(vec![
        record(day(7), "a", Device::Desktop, 4),
        record(day(7), "a", Device::Mobile, 2),
        record(day(8), "b", Device::Tablet, 9),
        record(day(9), "c", Device::Desktop, 1),
    ]);
    let loader = RawLoader::new(&db, &source, Device::ALL.to_vec(), 3);

    // Day 8 is already present, so only 7 and 9 are fetched.
    db.with_conn(|c| raw::insert_ignore(c, &record(day(8), "z", Device::Desktop, 1)))
        .unwrap();

    let report = loader.sync(day(10)).unwrap();
    assert_eq!(report.loaded, vec![(day(7), 2), (day(9), 1)]);
    assert_eq!(report.total(), 3);
    assert_eq!(raw_count(&db), 4);

    assert!(loader.missing_dates(day(10)).unwrap().is_empty());
    assert_eq!(loader.sync(day(10)).unwrap().total(), 0);
}

#[test]
fn load_date_skips_existing_natural_keys() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let source = StaticSource::new(vec![
        record(day(3), "a", Device::Desktop, 4),
        record(day(3), "b", Device::Desktop, 4),
    ]);
    let loader = RawLoader::new(&db, &source, vec![Device::Desktop], 20);

    assert_eq!(loader.load_date(day(3)).unwrap(), 2);
    assert_eq!(loader.load_date(day(3)).unwrap(), 0);
    assert_eq!(raw_count(&db), 2);
}

#[test]
fn configured_devices_bound_the_fetch() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let source = StaticSource::new(vec![
        record(day(3), "a", Device::Desktop, 4),
        record(day(3), "a", Device::Mobile, 4),
    ]);
    let loader = RawLoader::new(&db, &source, vec![Device::Mobile], 20);
    assert_eq!(loader.load_date(day(3)).unwrap(), 1);
}

fn write_export(dir: &TempDir, date: &str, lines: &[&str]) {
    fs::write(dir.path().join(format!("{date}.jsonl")), lines.join("\n")).unwrap();
}

#[test]
fn jsonl_source_reads_daily_exports() {
    let dir = TempDir::new().unwrap();
    write_export(
        &dir,
        "2024-05-04",
        &[
            r#"{"date":"2024-05-04","query":"rust","page_path":"/r","device":"DESKTOP","demand":10,"impressions":8,"clicks":2,"position":1.7}"#,
            "",
            r#"{"date":"2024-05-04","query":"rust","page_path":"/r","device":"MOBILE","impressions":3}"#,
        ],
    );
    let source = JsonLinesSource::new(dir.path());

    let desktop = source.fetch_day(day(4), Device::Desktop).unwrap();
    assert_eq!(desktop.len(), 1);
    assert_eq!(desktop[0].position, Some(1.7));

    let mobile = source.fetch_day(day(4), Device::Mobile).unwrap();
    assert_eq!(mobile[0].impressions, Some(3));
    assert_eq!(mobile[0].clicks, None);

    assert!(source.fetch_day(day(5), Device::Desktop).unwrap().is_empty());
}

#[test]
fn jsonl_source_rejects_malformed_lines() {
    let dir = TempDir::new().unwrap();
    write_export(
        &dir,
        "2024-05-04",
        &[
            r#"{"date":"2024-05-04","query":"ok","page_path":"/o","device":"DESKTOP"}"#,
            r#"{"date":"2024-05-04","query":"bad","device":"#,
        ],
    );
    let err = JsonLinesSource::new(dir.path())
        .fetch_day(day(4), Device::Desktop)
        .unwrap_err();
    assert!(matches!(err, SourceError::Malformed { line: 2, .. }));
}

#[test]
fn jsonl_source_rejects_misdated_records() {
    let dir = TempDir::new().unwrap();
    write_export(
        &dir,
        "2024-05-04",
        &[r#"{"date":"2024-05-05","query":"x","page_path":"/x","device":"TABLET"}"#],
    );
    let err = JsonLinesSource::new(dir.path())
        .fetch_day(day(4), Device::Tablet)
        .unwrap_err();
    assert!(err.to_string().contains("2024-05-05"));
}

#[test]
fn source_errors_abort_sync() {
    let dir = TempDir::new().unwrap();
    write_export(&dir, "2024-05-09", &["not json"]);
    let db = DatabaseManager::open_in_memory().unwrap();
    let source = JsonLinesSource::new(dir.path());
    let loader = RawLoader::new(&db, &source, vec![Device::Desktop], 2);

    let err = loader.sync(day(10)).unwrap_err();
    assert!(matches!(err, PipelineError::Source(_)));
    assert_eq!(raw_count(&db), 0);
}

#[test]
fn loader_works_through_a_trait_object() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let source: Box<dyn SearchAnalyticsSource> =
        Box::new(StaticSource::new(vec![record(day(1), "a", Device::Tablet, 2)]));
    let loader = RawLoader::new(&db, source.as_ref(), Device::ALL.to_vec(), 1);
    assert_eq!(loader.sync(day(2)).unwrap().total(), 1);
}
