use crate::domain::entities::search_result::{SearchOutcome, SearchResult};
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::metric::{EffectiveMetric, Metric};
use crate::domain::values::similarity::{normalize, score_for, DEFAULT_SIMILARITY_THRESHOLD};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turn raw index hits into ranked results: score them for `metric`, drop
/// anything at or below `threshold`, order by score (then distance, then id).
pub fn rank_hits(hits: Vec<(String, f64)>, metric: Metric, threshold: f64) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = hits
        .into_iter()
        .map(|(id, raw)| SearchResult {
            similarity_score: score_for(metric, raw),
            raw_distance: raw,
            id,
            rank: 0,
        })
        .filter(|r| r.similarity_score > threshold)
        .collect();

    results.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.raw_distance.partial_cmp(&b.raw_distance).unwrap_or(Ordering::Equal))
            .then_with(|| a.id.cmp(&b.id))
    });
    for (i, r) in results.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    results
}

pub struct SimilaritySearchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    placeholder: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
    similarity_threshold: f64,
}

impl SimilaritySearchEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            placeholder: None,
            vector_store,
            collection: collection.into(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Embedder used when the primary one fails. Outcomes produced with it are
    /// flagged `degraded`.
    pub fn with_placeholder(mut self, placeholder: Arc<dyn EmbeddingProvider>) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    async fn query_vector(&self, query: &str) -> Result<(Vec<f32>, bool), DomainError> {
        match self.embedder.embed_one(query, InputType::Query).await {
            Ok(v) => Ok((v, false)),
            Err(e) => match &self.placeholder {
                Some(p) => {
                    warn!(error = %e, placeholder = p.name(), "Query embedding failed; using placeholder vector");
                    Ok((p.embed_one(query, InputType::Query).await?, true))
                }
                None => Err(e),
            },
        }
    }

    fn indexed_metric(&self) -> Metric {
        match self.vector_store.describe(&self.collection) {
            Ok(Some(schema)) => schema.metric,
            Ok(None) => Metric::default(),
            Err(e) => {
                debug!(error = %e, "Could not read index metric; assuming L2");
                Metric::default()
            }
        }
    }

    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        requested: Metric,
    ) -> Result<SearchOutcome, DomainError> {
        if !self.vector_store.exists(&self.collection)? {
            debug!(collection = %self.collection, "Nothing to search: collection absent");
            return Ok(SearchOutcome::empty(requested));
        }
        if top_k == 0 {
            return Ok(SearchOutcome::empty(requested));
        }

        let (mut vector, degraded) = self.query_vector(query).await?;

        let mut metric = EffectiveMetric::resolve(requested, self.indexed_metric());
        if metric.cosine_approximated {
            if !normalize(&mut vector) {
                debug!("Query vector has ~zero norm; skipping normalisation");
            }
            debug!(index_metric = %metric.used, "Approximating cosine with a normalised query");
        } else if metric.substituted {
            warn!(requested = %requested, indexed = %metric.used, "Requested metric differs from index; using index metric");
        }

        let nn = match self
            .vector_store
            .query_nearest(&self.collection, &vector, top_k, metric.used)
        {
            Ok(nn) => nn,
            Err(DomainError::NotFound(what)) => {
                debug!(%what, "Collection vanished before query");
                return Ok(SearchOutcome::empty(requested));
            }
            Err(e) => return Err(e),
        };
        if nn.substituted {
            metric.used = nn.metric;
            metric.substituted = !metric.cosine_approximated;
        }

        let results = rank_hits(nn.hits, nn.metric, self.similarity_threshold);
        info!(
            results = results.len(),
            threshold = self.similarity_threshold,
            metric = %metric.display_name(),
            degraded,
            "Search complete"
        );
        Ok(SearchOutcome { results, metric, degraded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_filtering_keeps_order() {
        let hits = vec![
            ("a".to_string(), 0.9),
            ("b".to_string(), 0.5),
            ("c".to_string(), 0.3),
        ];
        let ranked = rank_hits(hits, Metric::InnerProduct, 0.4);
        let scores: Vec<f64> = ranked.iter().map(|r| r.similarity_score).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // 1 / (1 + 1.5) == 0.4 exactly
        let ranked = rank_hits(vec![("x".to_string(), 1.5)], Metric::L2, 0.4);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_l2_distances_become_scores() {
        let hits = vec![("far".to_string(), 1.0), ("near".to_string(), 0.0)];
        let ranked = rank_hits(hits, Metric::L2, 0.4);
        assert_eq!(ranked[0].id, "near");
        assert_eq!(ranked[0].similarity_score, 1.0);
        assert_eq!(ranked[1].similarity_score, 0.5);
        assert_eq!(ranked[1].raw_distance, 1.0);
    }

    #[test]
    fn test_ties_break_by_id() {
        let hits = vec![("b".to_string(), 0.25), ("a".to_string(), 0.25)];
        let ranked = rank_hits(hits, Metric::L2, 0.0);
        assert_eq!(ranked[0].id, "a");
        assert_eq!(ranked[1].id, "b");
    }
}
