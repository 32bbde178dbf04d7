mod common;

use access_usage::coordinator::FileOutcome;
use access_usage::store::{MemoryStore, UsageStore};
use common::*;
use std::sync::Arc;
use tempfile::TempDir;

async fn memory_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.create_schema().await.unwrap();
    store
}

#[tokio::test]
async fn test_single_file_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_log(
        temp_dir.path(),
        "localhost_access_log.2023-01-01.txt",
        &[IOS_LINE.to_string(), ANDROID_LINE.to_string()],
    )
    .unwrap();
    let store = memory_store().await;

    let outcomes = coordinator(store.clone(), false)
        .process_files(vec![path])
        .await;

    assert_eq!(outcomes.len(), 1);
    let FileOutcome::Completed(report) = &outcomes[0] else {
        panic!("expected completed outcome, got {:?}", outcomes[0]);
    };
    assert_eq!(report.first.platform, "iOS");
    assert_eq!(report.first.average, 150);
    assert_eq!(report.second.platform, "android");
    assert_eq!(report.second.average, 90);

    let summaries = store.summaries();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.date.to_string(), "2023-01-01");
    assert_eq!(summary.start_time, "10:00:00");
    assert_eq!(summary.end_time, "10:00:00");
    assert_eq!(summary.duration, "0s");
    assert_eq!((summary.first_length, summary.second_length), (1, 1));

    let records = store.usage_records();
    assert_eq!(records.len(), 2);
    let android = records.iter().find(|r| r.platform == "android").unwrap();
    assert_eq!(android.method, "POST");
    assert_eq!(android.version, "3.4.0");
    assert_eq!(android.status, 201);
    assert!(bcrypt::verify("5.6.7.8", &android.hashed_address).unwrap());
}

#[tokio::test]
async fn test_repeated_addresses_are_counted_once_each() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        access_line("10.0.0.1", "08:00:00", "iOS", 100),
        access_line("10.0.0.2", "08:30:00", "iOS", 0),
        access_line("10.0.0.1", "09:15:10", "iOS", 200),
    ];
    let path = write_log(temp_dir.path(), "localhost_access_log.txt", &lines).unwrap();
    let store = memory_store().await;

    let outcome = coordinator(store.clone(), false)
        .process_file(&path)
        .await;

    let FileOutcome::Completed(report) = outcome else {
        panic!("expected completed outcome");
    };
    assert_eq!(report.first.length, 3);
    // zero payloads are left out of the mean
    assert_eq!(report.first.average, 150);
    assert!(report.second.is_empty());

    let combined = report.combined.unwrap();
    assert_eq!(combined.start_time, "08:00:00");
    assert_eq!(combined.end_time, "09:15:10");
    assert_eq!(combined.duration, "1h15m10s");

    let mut counts: Vec<u64> = store.address_counts().iter().map(|c| c.2).collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2]);
}

#[tokio::test]
async fn test_missing_file_does_not_affect_siblings() {
    let temp_dir = TempDir::new().unwrap();
    let present = write_log(
        temp_dir.path(),
        "localhost_access_log.a.txt",
        &[IOS_LINE.to_string()],
    )
    .unwrap();
    let missing = temp_dir.path().join("localhost_access_log.missing.txt");
    let store = memory_store().await;

    let outcomes = coordinator(store.clone(), false)
        .process_files(vec![missing.clone(), present.clone()])
        .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].path(), missing.as_path());
    match &outcomes[0] {
        FileOutcome::Failed { error, .. } => assert!(error.contains("could not be opened")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(outcomes[1].is_completed());
    assert_eq!(store.summaries().len(), 1);
}

#[tokio::test]
async fn test_log_only_writes_summary_rows_only() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_log(
        temp_dir.path(),
        "localhost_access_log.txt",
        &[IOS_LINE.to_string(), ANDROID_LINE.to_string()],
    )
    .unwrap();
    let store = memory_store().await;

    let outcome = coordinator(store.clone(), true).process_file(&path).await;

    assert!(outcome.is_completed());
    assert_eq!(store.summaries().len(), 1);
    assert!(store.usage_records().is_empty());
    assert!(store.address_counts().is_empty());
}

#[tokio::test]
async fn test_short_lines_are_excluded() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        "9.9.9.9 iOS truncated".to_string(),
        access_line("10.0.0.1", "12:00:00", "iOS", 40),
    ];
    let path = write_log(temp_dir.path(), "localhost_access_log.txt", &lines).unwrap();
    let store = memory_store().await;

    let FileOutcome::Completed(report) = coordinator(store.clone(), false)
        .process_file(&path)
        .await
    else {
        panic!("expected completed outcome");
    };

    assert_eq!(report.first.length, 1);
    assert_eq!(report.first.average, 40);
    assert_eq!(store.usage_records().len(), 1);
}

#[tokio::test]
async fn test_failed_writes_are_counted_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        access_line("10.0.0.1", "07:00:00", "android", 10),
        access_line("10.0.0.2", "07:00:01", "android", 20),
        access_line("10.0.0.3", "07:00:02", "iOS", 30),
    ];
    let path = write_log(temp_dir.path(), "localhost_access_log.txt", &lines).unwrap();
    let store = Arc::new(RejectingStore::new("android"));

    let FileOutcome::Completed(report) = coordinator(store.clone(), false)
        .process_file(&path)
        .await
    else {
        panic!("expected completed outcome");
    };

    // 2 records + 2 address counts for android, 1 + 1 for iOS
    assert_eq!(store.finished(), 6);
    assert_eq!(report.second.persisted.attempted, 4);
    assert_eq!(report.second.persisted.failed, 4);
    assert_eq!(report.first.persisted.failed, 0);
    assert_eq!(report.second.average, 15);
    assert!(report.summary_written);
    assert_eq!(store.summaries.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_file_without_platform_lines_writes_no_summary() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![access_line("10.0.0.1", "07:00:00", "Windows NT 10.0", 10)];
    let path = write_log(temp_dir.path(), "localhost_access_log.txt", &lines).unwrap();
    let store = memory_store().await;

    let FileOutcome::Completed(report) = coordinator(store.clone(), false)
        .process_file(&path)
        .await
    else {
        panic!("expected completed outcome");
    };

    assert!(report.combined.is_none());
    assert!(!report.summary_written);
    assert!(store.summaries().is_empty());
}

/// Panics on every android record insert.
struct PanickingStore;

#[async_trait::async_trait]
impl UsageStore for PanickingStore {
    async fn create_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert_usage_record(
        &self,
        record: &access_usage::models::StoredUsageRecord,
    ) -> anyhow::Result<()> {
        if record.platform == "android" {
            panic!("driver crashed");
        }
        Ok(())
    }

    async fn insert_address_count(&self, _platform: &str, _hash: &str, _count: u64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert_summary(
        &self,
        _summary: &access_usage::models::CombinedSummary,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_panicking_file_task_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let healthy = write_log(
        temp_dir.path(),
        "localhost_access_log.ios.txt",
        &[IOS_LINE.to_string()],
    )
    .unwrap();
    let crashing = write_log(
        temp_dir.path(),
        "localhost_access_log.android.txt",
        &[ANDROID_LINE.to_string()],
    )
    .unwrap();

    let outcomes = coordinator(Arc::new(PanickingStore), false)
        .process_files(vec![healthy, crashing])
        .await;

    assert!(outcomes[0].is_completed());
    assert!(matches!(outcomes[1], FileOutcome::Failed { .. }));
}

#[tokio::test]
async fn test_invalid_utf8_lines_keep_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("localhost_access_log.latin1.txt");
    let mut content = Vec::new();
    content.extend_from_slice(IOS_LINE.as_bytes());
    content.extend_from_slice(b"\n9.9.9.9 - - [01/Jan/2023:10:01:00 -0000] \"GET /caf\xe9 HTTP/1.1\" 404 0 \"bot\"\n");
    content.extend_from_slice(
        b"5.6.7.8 - - [01/Jan/2023:10:02:00 -0000] \"GET /api/3.4.0/caf\xe9 HTTP/1.1\" 200 70 \"android\"\n",
    );
    std::fs::write(&path, content).unwrap();
    let store = memory_store().await;

    let FileOutcome::Completed(report) = coordinator(store.clone(), false)
        .process_file(&path)
        .await
    else {
        panic!("expected completed outcome");
    };

    assert_eq!(report.first.length, 1);
    assert_eq!(report.second.length, 1);
    assert_eq!(report.second.average, 70);
    assert_eq!(store.summaries().len(), 1);
    assert_eq!(store.usage_records().len(), 2);
}
