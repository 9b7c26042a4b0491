use crate::application::pagination::{fetch_all, DEFAULT_PAGE_SIZE};
use crate::domain::entities::bill::BillDocument;
use crate::domain::entities::collection::CollectionSchema;
use crate::domain::error::DomainError;
use crate::domain::ports::bill_repository::DocumentSource;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::ports::vector_store::VectorStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    NotStarted,
    CheckingExisting,
    Skipped,
    Clearing,
    Building,
    Fetching,
    Processing,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// Vectors already existed and recreation was not forced.
    Skipped,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub run_id: String,
    pub status: IngestStatus,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<IngestFailure>,
    pub phases: Vec<IngestPhase>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl IngestReport {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            status: IngestStatus::Completed,
            total: 0,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
            phases: vec![IngestPhase::NotStarted],
            started_at: now,
            finished_at: now,
        }
    }

    fn enter(&mut self, phase: IngestPhase) {
        debug!(run = %self.run_id, ?phase, "Ingestion phase");
        self.phases.push(phase);
    }

    /// True when at least one vector was written.
    pub fn changed(&self) -> bool {
        self.succeeded > 0
    }
}

/// Drives one ingestion run: source documents → embeddings → vector store.
pub struct IngestionOrchestrator {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    schema: CollectionSchema,
    page_size: usize,
}

impl IngestionOrchestrator {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        schema: CollectionSchema,
    ) -> Self {
        Self {
            source,
            embedder,
            vector_store,
            schema,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Setup failures (connection, schema, fetch) abort the run with `Err`.
    /// Per-document failures are counted on the report instead.
    pub async fn run(&self, force_recreate: bool) -> Result<IngestReport, DomainError> {
        let mut report = IngestReport::new();
        let name = self.schema.name.as_str();

        report.enter(IngestPhase::CheckingExisting);
        let exists = self.vector_store.exists(name)?;
        let populated = exists && self.vector_store.count(name)? > 0;

        if populated && !force_recreate {
            info!(collection = name, "Vectors already exist; skipping (use --force-recreate to rebuild)");
            report.enter(IngestPhase::Skipped);
            report.status = IngestStatus::Skipped;
            report.finished_at = Utc::now();
            return Ok(report);
        }

        self.check_dimension(exists, force_recreate)?;

        if exists && force_recreate {
            report.enter(IngestPhase::Clearing);
            self.vector_store.drop_collection(name)?;
        }

        report.enter(IngestPhase::Building);
        let schema = self.vector_store.ensure_collection(&self.schema)?;

        report.enter(IngestPhase::Fetching);
        let bills = fetch_all(self.source.as_ref(), self.page_size, 0)?;
        report.total = bills.len();
        info!(total = bills.len(), "Fetched bills");

        report.enter(IngestPhase::Processing);
        for (i, bill) in bills.iter().enumerate() {
            match self.process_one(&schema.name, bill).await {
                Ok(()) => {
                    report.succeeded += 1;
                    debug!(n = i + 1, of = bills.len(), id = %bill.id, "Stored embedding");
                }
                Err(e) => {
                    warn!(n = i + 1, of = bills.len(), id = %bill.id, error = %e, "Failed to ingest bill");
                    report.failed += 1;
                    report.failures.push(IngestFailure {
                        id: bill.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.enter(IngestPhase::Done);
        report.finished_at = Utc::now();
        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Checked before anything is dropped or written.
    fn check_dimension(&self, exists: bool, force_recreate: bool) -> Result<(), DomainError> {
        let provider_dim = self.embedder.dimension();
        if provider_dim == 0 {
            return Ok(());
        }
        let existing = if exists && !force_recreate {
            self.vector_store.describe(&self.schema.name)?
        } else {
            None
        };
        match existing {
            Some(current) if current.dimension != provider_dim => Err(DomainError::Schema(format!(
                "{} produces {provider_dim}-dimensional vectors but collection {} holds {}; rebuild it with --force-recreate",
                self.embedder.name(),
                current.name,
                current.dimension
            ))),
            Some(_) => Ok(()),
            None if self.schema.dimension != provider_dim => Err(DomainError::Schema(format!(
                "{} produces {provider_dim}-dimensional vectors but collection {} is configured for {}",
                self.embedder.name(),
                self.schema.name,
                self.schema.dimension
            ))),
            None => Ok(()),
        }
    }

    async fn process_one(&self, collection: &str, bill: &BillDocument) -> Result<(), DomainError> {
        let (text, source) = bill
            .embedding_text()
            .ok_or_else(|| DomainError::InvalidInput(format!("bill {} has no text to embed", bill.id)))?;
        debug!(id = %bill.id, ?source, "Embedding bill");
        let vector = self.embedder.embed_one(&text, InputType::Document).await?;
        self.vector_store.upsert(collection, &bill.id, &vector)
    }
}
