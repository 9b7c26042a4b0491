use crate::domain::values::metric::{EffectiveMetric, Metric};
use serde::Serialize;

/// One ranked match. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "distance")]
    pub raw_distance: f64,
    #[serde(rename = "score")]
    pub similarity_score: f64,
    pub rank: usize,
}

/// Everything a search produced, including how the metric was resolved.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub metric: EffectiveMetric,
    /// The query vector came from the placeholder embedder, not a real model.
    pub degraded: bool,
}

impl SearchOutcome {
    pub fn empty(requested: Metric) -> Self {
        Self {
            results: Vec::new(),
            metric: EffectiveMetric::resolve(requested, requested),
            degraded: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
