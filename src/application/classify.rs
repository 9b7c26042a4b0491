use crate::domain::entities::classification::{Classification, LabelScore};
use crate::domain::error::DomainError;
use crate::domain::ports::zero_shot::ZeroShotScorer;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_THRESHOLD_STD: f64 = 0.5;

/// Max-shifted softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Mean and population standard deviation. A constant sequence yields its
/// value and exactly zero, without summation rounding.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let Some(first) = values.first().copied() else {
        return (0.0, 0.0);
    };
    if values.iter().all(|v| *v == first) {
        return (first, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Apply the adaptive threshold to raw multi-label scores.
///
/// Scores are softmax-renormalised, then every label at or above
/// `mean + threshold_std * std_dev` is kept. There is no clamp: a flat
/// distribution admits every label and a sharp one may admit a single label.
pub fn select_labels(raw: &[(String, f64)], threshold_std: f64) -> Classification {
    let raw_scores: Vec<f64> = raw.iter().map(|(_, s)| *s).collect();
    let probs = softmax(&raw_scores);
    let (mean, std_dev) = mean_and_std(&probs);
    let threshold = mean + threshold_std * std_dev;

    let mut labels: Vec<LabelScore> = raw
        .iter()
        .zip(probs)
        .filter(|(_, p)| *p >= threshold)
        .map(|((label, _), p)| LabelScore {
            label: label.clone(),
            score: p,
        })
        .collect();
    labels.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });

    Classification {
        labels,
        mean,
        std_dev,
        threshold,
    }
}

pub struct AdaptiveClassifier {
    scorer: Arc<dyn ZeroShotScorer>,
}

impl AdaptiveClassifier {
    pub fn new(scorer: Arc<dyn ZeroShotScorer>) -> Self {
        Self { scorer }
    }

    pub async fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
        threshold_std: f64,
    ) -> Result<Classification, DomainError> {
        if candidate_labels.is_empty() {
            return Err(DomainError::InvalidInput("no candidate labels".into()));
        }
        if text.trim().is_empty() {
            return Err(DomainError::InvalidInput("nothing to classify in empty text".into()));
        }
        if !threshold_std.is_finite() {
            return Err(DomainError::InvalidInput(format!("threshold_std {threshold_std} is not finite")));
        }

        let scored: HashMap<String, f64> = self
            .scorer
            .score(text, candidate_labels)
            .await?
            .into_iter()
            .collect();

        for label in scored.keys() {
            if !candidate_labels.contains(label) {
                warn!(%label, scorer = self.scorer.name(), "Ignoring label outside the candidate set");
            }
        }

        // Vocabulary order, so ties and logs are stable across scorers.
        let mut raw = Vec::with_capacity(candidate_labels.len());
        for label in candidate_labels {
            match scored.get(label) {
                Some(s) if s.is_finite() => raw.push((label.clone(), *s)),
                Some(s) => {
                    return Err(DomainError::Classification(format!(
                        "non-finite score {s} for {label}"
                    )))
                }
                None => {
                    return Err(DomainError::Classification(format!(
                        "{} returned no score for {label}",
                        self.scorer.name()
                    )))
                }
            }
        }

        let classification = select_labels(&raw, threshold_std);
        debug!(
            kept = classification.labels.len(),
            threshold = classification.threshold,
            "Classified text"
        );
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(scores: &[f64]) -> Vec<(String, f64)> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("L{i}"), *s))
            .collect()
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[0.1, 0.7, 0.2, 0.95]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[3] > p[1] && p[1] > p[2] && p[2] > p[0]);
    }

    #[test]
    fn test_softmax_is_shift_stable() {
        let p = softmax(&[1000.0, 1000.0]);
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_population_std() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
    }

    #[test]
    fn test_equal_scores_admit_every_label() {
        for n in [1, 5, 13] {
            let c = select_labels(&labelled(&vec![0.3; n]), 0.5);
            assert_eq!(c.std_dev, 0.0);
            assert_eq!(c.threshold, c.mean);
            assert_eq!(c.labels.len(), n);
        }
    }

    #[test]
    fn test_peaked_distribution_admits_one_label() {
        let mut scores = vec![0.0; 13];
        scores[4] = 20.0;
        let c = select_labels(&labelled(&scores), 0.5);
        assert_eq!(c.labels.len(), 1);
        assert_eq!(c.labels[0].label, "L4");
    }

    #[test]
    fn test_kept_labels_sorted_descending() {
        let c = select_labels(&labelled(&[0.9, 0.1, 0.95, 0.05, 0.8]), 0.0);
        let scores: Vec<f64> = c.labels.iter().map(|l| l.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(scores, sorted);
        assert_eq!(c.labels[0].label, "L2");
    }
}
