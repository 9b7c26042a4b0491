//! Runtime configuration, read from `BILLSEARCH_*` environment variables.

use crate::application::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::entities::collection::IndexKind;
use crate::domain::error::DomainError;
use crate::domain::values::metric::Metric;
use crate::domain::values::similarity::DEFAULT_SIMILARITY_THRESHOLD;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAi,
    Voyage,
    Hashing,
    Noop,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingBackend::OpenAi),
            "voyage" => Ok(EmbeddingBackend::Voyage),
            "hashing" | "local" => Ok(EmbeddingBackend::Hashing),
            "noop" | "none" => Ok(EmbeddingBackend::Noop),
            _ => Err(format!("Unknown embedding provider: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub db_path: String,
    pub collection: String,
    /// Collection dimension; `None` means "whatever the embedder produces".
    pub dimension: Option<usize>,
    pub metric: Metric,
    /// Index kind recorded when the collection is first created.
    pub index_kind: IndexKind,
    pub similarity_threshold: f64,
    pub page_size: usize,
    pub embedding_provider: EmbeddingBackend,
    #[serde(skip)]
    pub embedding_api_key: String,
    pub embedding_model: Option<String>,
    pub embedding_url: Option<String>,
    pub classifier_url: Option<String>,
    pub classifier_model: Option<String>,
    #[serde(skip)]
    pub classifier_token: Option<String>,
    /// Fall back to hashed placeholder vectors when query embedding fails.
    pub placeholder_fallback: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "./billsearch.db".into(),
            collection: "bill_embeddings".into(),
            dimension: None,
            metric: Metric::L2,
            index_kind: IndexKind::IvfFlat,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            page_size: DEFAULT_PAGE_SIZE,
            embedding_provider: EmbeddingBackend::Hashing,
            embedding_api_key: String::new(),
            embedding_model: None,
            embedding_url: None,
            classifier_url: None,
            classifier_model: None,
            classifier_token: None,
            placeholder_fallback: false,
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(format!("BILLSEARCH_{name}"))
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, DomainError>
where
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| DomainError::InvalidInput(format!("BILLSEARCH_{name}={v}: {e}")))
        })
        .transpose()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        let d = Self::default();
        let cfg = Self {
            db_path: var("DB").unwrap_or(d.db_path),
            collection: var("COLLECTION").unwrap_or(d.collection),
            dimension: parse_var("DIMENSION")?,
            metric: parse_var("METRIC")?.unwrap_or(d.metric),
            index_kind: parse_var("INDEX")?.unwrap_or(d.index_kind),
            similarity_threshold: parse_var("SIMILARITY_THRESHOLD")?.unwrap_or(d.similarity_threshold),
            page_size: parse_var("PAGE_SIZE")?.unwrap_or(d.page_size),
            embedding_provider: parse_var("EMBEDDING_PROVIDER")?.unwrap_or(d.embedding_provider),
            embedding_api_key: var("EMBEDDING_API_KEY").unwrap_or_default(),
            embedding_model: var("EMBEDDING_MODEL"),
            embedding_url: var("EMBEDDING_URL"),
            classifier_url: var("CLASSIFIER_URL"),
            classifier_model: var("CLASSIFIER_MODEL"),
            classifier_token: var("CLASSIFIER_TOKEN"),
            placeholder_fallback: parse_var("PLACEHOLDER_FALLBACK")?.unwrap_or(d.placeholder_fallback),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.page_size == 0 {
            return Err(DomainError::InvalidInput("page size must be positive".into()));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(DomainError::InvalidInput("similarity threshold must be finite".into()));
        }
        if matches!(self.embedding_provider, EmbeddingBackend::OpenAi | EmbeddingBackend::Voyage)
            && self.embedding_api_key.is_empty()
        {
            return Err(DomainError::InvalidInput(
                "BILLSEARCH_EMBEDDING_API_KEY is required for remote embedding providers".into(),
            ));
        }
        Ok(())
    }
}
