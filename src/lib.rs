pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

use crate::application::categorize::{CategorizeReport, CategorizeUseCase, Selection};
use crate::application::classify::AdaptiveClassifier;
use crate::application::ingest::{IngestReport, IngestionOrchestrator};
use crate::application::search::SimilaritySearchEngine;
use crate::config::{AppConfig, EmbeddingBackend};
use crate::domain::entities::bill::BillDocument;
use crate::domain::entities::classification::Classification;
use crate::domain::entities::collection::{CollectionInfo, CollectionSchema};
use crate::domain::entities::search_result::SearchOutcome;
use crate::domain::error::DomainError;
use crate::domain::ports::bill_repository::{BillRepository, DocumentSource};
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::ports::zero_shot::ZeroShotScorer;
use crate::domain::values::category::Category;
use crate::domain::values::metric::Metric;
use crate::infrastructure::classifiers::huggingface::HuggingFaceScorer;
use crate::infrastructure::classifiers::noop::NoopScorer;
use crate::infrastructure::embeddings::hashing::{HashingProvider, DEFAULT_HASHING_DIMENSION};
use crate::infrastructure::embeddings::noop::NoopProvider;
use crate::infrastructure::embeddings::openai::OpenAiProvider;
use crate::infrastructure::embeddings::voyage::VoyageProvider;
use crate::infrastructure::sqlite::bill_repo::SqliteBillRepo;
use crate::infrastructure::sqlite::migrations::run_migrations;
use crate::infrastructure::sqlite::vector_store::SqliteVectorStore;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub bills: usize,
    pub collection: Option<CollectionInfo>,
}

/// One `ingest` run, plus the categorize pass when it was requested.
#[derive(Debug, Serialize)]
pub struct IngestSummary {
    pub ingest: IngestReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorize: Option<CategorizeReport>,
}

/// Owns every long-lived resource (connections, model clients) for one
/// process. Build it once, share it, and call [`BillSearch::close`] on the way out.
pub struct BillSearch {
    config: AppConfig,
    schema: CollectionSchema,
    bills: Arc<dyn BillRepository>,
    vector_store: Arc<dyn VectorStore>,
    search_engine: SimilaritySearchEngine,
    classifier: Arc<AdaptiveClassifier>,
    ingest_uc: IngestionOrchestrator,
    categorize_uc: CategorizeUseCase,
}

fn open_connection(db_path: &str) -> Result<Connection, DomainError> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Connection(format!("cannot open {db_path}: {e}")))?;
    if db_path != ":memory:" {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Connection(format!("WAL error: {e}")))?;
    }
    run_migrations(&conn)?;
    Ok(conn)
}

impl BillSearch {
    pub fn new(config: AppConfig) -> Result<Self, DomainError> {
        let embedder: Arc<dyn EmbeddingProvider> = match config.embedding_provider {
            EmbeddingBackend::OpenAi => Arc::new(OpenAiProvider::new(
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
                config.embedding_url.clone(),
            )),
            EmbeddingBackend::Voyage => Arc::new(VoyageProvider::new(
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
                config.embedding_url.clone(),
            )),
            EmbeddingBackend::Hashing => Arc::new(HashingProvider::new(
                config.dimension.unwrap_or(DEFAULT_HASHING_DIMENSION),
            )),
            EmbeddingBackend::Noop => Arc::new(NoopProvider),
        };

        let scorer: Arc<dyn ZeroShotScorer> = match (&config.classifier_url, &config.classifier_token) {
            (None, None) => Arc::new(NoopScorer),
            _ => Arc::new(HuggingFaceScorer::new(
                config.classifier_token.clone(),
                config.classifier_model.clone(),
                config.classifier_url.clone(),
            )),
        };

        Self::with_providers(config, embedder, scorer)
    }

    pub fn with_providers(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        scorer: Arc<dyn ZeroShotScorer>,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        let repo = Arc::new(SqliteBillRepo::new(open_connection(&config.db_path)?));
        let vector_store: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::new(open_connection(&config.db_path)?));

        let provider_dim = embedder.dimension();
        let dimension = match config.dimension {
            Some(d) if provider_dim > 0 && d != provider_dim => {
                return Err(DomainError::InvalidInput(format!(
                    "BILLSEARCH_DIMENSION is {d} but {} produces {provider_dim}-dimensional vectors",
                    embedder.name()
                )));
            }
            Some(d) => d,
            None if provider_dim > 0 => provider_dim,
            None => DEFAULT_HASHING_DIMENSION,
        };
        let schema =
            CollectionSchema::new(config.collection.clone(), dimension, config.metric).with_index(config.index_kind);
        schema.validate()?;

        if provider_dim > 0 {
            if let Ok(Some(stored)) = vector_store.describe(&schema.name) {
                if stored.dimension != provider_dim {
                    warn!(
                        stored = stored.dimension,
                        provider = provider_dim,
                        "Stored vectors and embedding provider disagree on dimension; run `ingest --force-recreate`"
                    );
                }
            }
        }

        let mut search_engine =
            SimilaritySearchEngine::new(embedder.clone(), vector_store.clone(), schema.name.clone())
                .with_threshold(config.similarity_threshold);
        if config.placeholder_fallback {
            search_engine = search_engine.with_placeholder(Arc::new(HashingProvider::new(dimension)));
        }

        let source: Arc<dyn DocumentSource> = repo.clone();
        let bills: Arc<dyn BillRepository> = repo;
        let classifier = Arc::new(AdaptiveClassifier::new(scorer));

        Ok(Self {
            ingest_uc: IngestionOrchestrator::new(source, embedder, vector_store.clone(), schema.clone())
                .with_page_size(config.page_size),
            categorize_uc: CategorizeUseCase::new(bills.clone(), classifier.clone(), Category::candidate_labels())
                .with_page_size(config.page_size),
            search_engine,
            classifier,
            bills,
            vector_store,
            schema,
            config,
        })
    }

    /// Create the collection if needed, dropping it first when `clear` is set.
    pub fn setup(&self, clear: bool) -> Result<CollectionSchema, DomainError> {
        if clear {
            self.vector_store.drop_collection(&self.schema.name)?;
        }
        self.vector_store.ensure_collection(&self.schema)
    }

    pub async fn ingest(&self, force_recreate: bool) -> Result<IngestReport, DomainError> {
        self.ingest_uc.run(force_recreate).await
    }

    /// Ingest, then classify every bill when `classify_threshold_std` is set.
    pub async fn ingest_with_categories(
        &self,
        force_recreate: bool,
        classify_threshold_std: Option<f64>,
    ) -> Result<IngestSummary, DomainError> {
        let ingest = self.ingest(force_recreate).await?;
        let categorize = match classify_threshold_std {
            Some(k) => Some(self.categorize(k, Selection::All { offset: 0 }).await?),
            None => None,
        };
        Ok(IngestSummary { ingest, categorize })
    }

    /// Search that never fails: errors are logged and yield an empty outcome.
    pub async fn search(&self, query: &str, top_k: usize, metric: Metric) -> SearchOutcome {
        match self.try_search(query, top_k, metric).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Search failed");
                SearchOutcome::empty(metric)
            }
        }
    }

    pub async fn try_search(&self, query: &str, top_k: usize, metric: Metric) -> Result<SearchOutcome, DomainError> {
        self.search_engine.search(query, top_k, metric).await
    }

    /// Classify free text against the bill category vocabulary.
    pub async fn classify(&self, text: &str, threshold_std: f64) -> Result<Classification, DomainError> {
        self.classifier
            .classify(text, &Category::candidate_labels(), threshold_std)
            .await
    }

    pub async fn categorize(&self, threshold_std: f64, selection: Selection) -> Result<CategorizeReport, DomainError> {
        self.categorize_uc.execute(threshold_std, selection).await
    }

    pub fn import_bills(&self, bills: &[BillDocument]) -> Result<usize, DomainError> {
        for bill in bills {
            self.bills.upsert_bill(bill)?;
        }
        info!(count = bills.len(), "Imported bills");
        Ok(bills.len())
    }

    pub fn bill(&self, id: &str) -> Result<Option<BillDocument>, DomainError> {
        self.bills.get(id)
    }

    pub fn stats(&self) -> Result<Stats, DomainError> {
        let collection = match self.vector_store.describe(&self.schema.name)? {
            Some(schema) => Some(CollectionInfo {
                entries: self.vector_store.count(&schema.name)?,
                schema,
            }),
            None => None,
        };
        Ok(Stats {
            bills: self.bills.count()?,
            collection,
        })
    }

    /// Release connections and model clients.
    pub fn close(self) {
        info!(db = %self.config.db_path, "Closing");
        drop(self);
    }
}
