use crate::domain::error::DomainError;
use crate::domain::ports::zero_shot::ZeroShotScorer;

/// Used when no zero-shot endpoint is configured.
pub struct NoopScorer;

#[async_trait::async_trait]
impl ZeroShotScorer for NoopScorer {
    async fn score(&self, _text: &str, _candidate_labels: &[String]) -> Result<Vec<(String, f64)>, DomainError> {
        Err(DomainError::Classification("no zero-shot classifier configured".into()))
    }

    fn name(&self) -> &str {
        "noop"
    }
}
