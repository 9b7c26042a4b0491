//! Shared test fixtures.
#![allow(dead_code)]

use billsearch::config::AppConfig;
use billsearch::domain::entities::bill::BillDocument;
use billsearch::domain::error::DomainError;
use billsearch::domain::ports::bill_repository::DocumentSource;
use billsearch::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use billsearch::domain::ports::zero_shot::ZeroShotScorer;
use billsearch::BillSearch;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type EmbedFn = dyn Fn(&str) -> Result<Vec<f32>, DomainError> + Send + Sync;

/// Embedder driven by a closure, counting how many texts it was asked for.
pub struct FnEmbedder {
    f: Box<EmbedFn>,
    dimension: usize,
    pub calls: AtomicUsize,
}

impl FnEmbedder {
    pub fn new(
        dimension: usize,
        f: impl Fn(&str) -> Result<Vec<f32>, DomainError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            f: Box::new(f),
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    /// Maps exact texts to vectors; anything else fails.
    pub fn table(dimension: usize, entries: &[(&str, Vec<f32>)]) -> Self {
        let table: HashMap<String, Vec<f32>> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Self::new(dimension, move |text| {
            table
                .get(text)
                .cloned()
                .ok_or_else(|| DomainError::Embedding(format!("no vector for {text:?}")))
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FnEmbedder {
    async fn embed(&self, texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        texts.iter().map(|t| (self.f)(t.as_str())).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

/// Zero-shot scorer returning fixed per-label scores (default for unknown labels).
pub struct ScriptedScorer {
    scores: HashMap<String, f64>,
    default: f64,
}

impl ScriptedScorer {
    pub fn new(scores: &[(&str, f64)], default: f64) -> Self {
        Self {
            scores: scores.iter().map(|(l, s)| (l.to_string(), *s)).collect(),
            default,
        }
    }
}

#[async_trait::async_trait]
impl ZeroShotScorer for ScriptedScorer {
    async fn score(&self, _text: &str, candidate_labels: &[String]) -> Result<Vec<(String, f64)>, DomainError> {
        Ok(candidate_labels
            .iter()
            .map(|l| (l.clone(), self.scores.get(l).copied().unwrap_or(self.default)))
            .collect())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// In-memory document source.
pub struct VecSource(pub Vec<BillDocument>);

impl DocumentSource for VecSource {
    fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<BillDocument>, DomainError> {
        Ok(self.0.iter().skip(offset).take(limit).cloned().collect())
    }
}

pub fn bill(id: &str, title: &str, full_text: Option<&str>) -> BillDocument {
    let b = BillDocument::new(id, title);
    match full_text {
        Some(t) => b.with_full_text(t),
        None => b,
    }
}

pub fn memory_config(dimension: usize) -> AppConfig {
    AppConfig {
        db_path: ":memory:".into(),
        dimension: Some(dimension),
        ..AppConfig::default()
    }
}

pub fn setup(embedder: Arc<dyn EmbeddingProvider>, scorer: Arc<dyn ZeroShotScorer>) -> BillSearch {
    BillSearch::with_providers(memory_config(embedder.dimension().max(1)), embedder, scorer).unwrap()
}
