mod common;

use billsearch::application::ingest::{IngestPhase, IngestStatus, IngestionOrchestrator};
use billsearch::domain::entities::collection::CollectionSchema;
use billsearch::domain::error::DomainError;
use billsearch::domain::ports::vector_store::VectorStore;
use billsearch::domain::values::metric::Metric;
use billsearch::infrastructure::sqlite::vector_store::SqliteVectorStore;
use common::{bill, FnEmbedder, VecSource};
use std::sync::Arc;

fn five_bills() -> Vec<billsearch::domain::entities::bill::BillDocument> {
    (1..=5)
        .map(|i| bill(&format!("hr{i}"), &format!("Bill {i}"), Some(&format!("doc{i}"))))
        .collect()
}

fn digit_embedder() -> FnEmbedder {
    FnEmbedder::new(2, |text| {
        if text == "doc3" {
            return Err(DomainError::Embedding("model timed out".into()));
        }
        let n: f32 = text.trim_start_matches("doc").parse().unwrap_or(0.0);
        Ok(vec![n, 1.0])
    })
}

fn orchestrator(
    bills: Vec<billsearch::domain::entities::bill::BillDocument>,
    embedder: Arc<FnEmbedder>,
    store: Arc<SqliteVectorStore>,
) -> IngestionOrchestrator {
    IngestionOrchestrator::new(
        Arc::new(VecSource(bills)),
        embedder,
        store,
        CollectionSchema::new("bills", 2, Metric::L2),
    )
}

#[tokio::test]
async fn test_one_bad_document_does_not_abort_run() {
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    let embedder = Arc::new(digit_embedder());
    let report = orchestrator(five_bills(), embedder, store.clone())
        .run(false)
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::Completed);
    assert_eq!((report.total, report.succeeded, report.failed), (5, 4, 1));
    assert_eq!(report.failures[0].id, "hr3");
    assert!(report.changed());
    for id in ["hr1", "hr2", "hr4", "hr5"] {
        assert!(store.contains("bills", id).unwrap(), "{id} missing");
    }
    assert!(!store.contains("bills", "hr3").unwrap());
}

#[tokio::test]
async fn test_second_run_is_skipped_without_force() {
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    let embedder = Arc::new(digit_embedder());
    let orch = orchestrator(five_bills(), embedder.clone(), store.clone());

    orch.run(false).await.unwrap();
    let calls_after_first = embedder.call_count();
    assert_eq!(calls_after_first, 5);

    let second = orch.run(false).await.unwrap();
    assert_eq!(second.status, IngestStatus::Skipped);
    assert_eq!(second.succeeded, 0);
    assert!(!second.changed());
    assert_eq!(embedder.call_count(), calls_after_first);
    assert_eq!(
        second.phases,
        vec![IngestPhase::NotStarted, IngestPhase::CheckingExisting, IngestPhase::Skipped]
    );
}

#[tokio::test]
async fn test_force_recreate_clears_and_rebuilds() {
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    store
        .ensure_collection(&CollectionSchema::new("bills", 2, Metric::L2))
        .unwrap();
    store.upsert("bills", "stale", &[9.0, 9.0]).unwrap();

    let embedder = Arc::new(digit_embedder());
    let report = orchestrator(five_bills(), embedder, store.clone())
        .run(true)
        .await
        .unwrap();

    assert_eq!(
        report.phases,
        vec![
            IngestPhase::NotStarted,
            IngestPhase::CheckingExisting,
            IngestPhase::Clearing,
            IngestPhase::Building,
            IngestPhase::Fetching,
            IngestPhase::Processing,
            IngestPhase::Done,
        ]
    );
    assert!(!store.contains("bills", "stale").unwrap());
    assert_eq!(store.count("bills").unwrap(), 4);
}

#[tokio::test]
async fn test_pages_through_source() {
    let bills: Vec<_> = (0..7)
        .map(|i| bill(&format!("s{i}"), "t", Some("doc1")))
        .collect();
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    let report = orchestrator(bills, Arc::new(digit_embedder()), store.clone())
        .with_page_size(3)
        .run(false)
        .await
        .unwrap();
    assert_eq!(report.total, 7);
    assert_eq!(store.count("bills").unwrap(), 7);
}

#[tokio::test]
async fn test_dimension_mismatch_is_fatal_before_processing() {
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    let embedder = Arc::new(FnEmbedder::new(3, |_| Ok(vec![1.0, 2.0, 3.0])));
    let err = orchestrator(five_bills(), embedder.clone(), store)
        .run(false)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Schema(_)));
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn test_forced_rebuild_with_wrong_dimension_keeps_existing_vectors() {
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    store.ensure_collection(&CollectionSchema::new("bills", 2, Metric::L2)).unwrap();
    store.upsert("bills", "hr1", &[1.0, 0.0]).unwrap();
    store.upsert("bills", "hr2", &[0.0, 1.0]).unwrap();

    let embedder = Arc::new(FnEmbedder::new(3, |_| Ok(vec![1.0, 2.0, 3.0])));
    let err = orchestrator(five_bills(), embedder.clone(), store.clone())
        .run(true)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Schema(_)));
    assert_eq!(embedder.call_count(), 0);
    assert!(store.exists("bills").unwrap());
    assert_eq!(store.count("bills").unwrap(), 2);
    assert!(store.contains("bills", "hr1").unwrap());
}

#[tokio::test]
async fn test_bill_without_text_counts_as_failure() {
    let bills = vec![bill("ok", "Bill", Some("doc1")), bill("blank", "  ", None)];
    let store = Arc::new(SqliteVectorStore::open(":memory:").unwrap());
    let report = orchestrator(bills, Arc::new(digit_embedder()), store)
        .run(false)
        .await
        .unwrap();
    assert_eq!((report.succeeded, report.failed), (1, 1));
    assert_eq!(report.failures[0].id, "blank");
}
