use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::{EmbeddingProvider, InputType};
use crate::domain::values::similarity::normalize;
use std::collections::HashMap;

pub const DEFAULT_HASHING_DIMENSION: usize = 768;

/// Deterministic feature-hashing embedder.
///
/// Words and their character trigrams are hashed into signed buckets and the
/// result is unit-normalised. It carries no semantics beyond shared
/// vocabulary; it exists for offline runs and as the degraded-mode
/// placeholder when a real provider is unavailable.
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    fn fnv1a(bytes: &[u8]) -> u64 {
        bytes.iter().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
            (hash ^ *b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = Self::fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let lower = text.to_lowercase();
        let mut freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1)
        {
            *freq.entry(word).or_default() += 1;
        }
        if freq.is_empty() {
            return Err(DomainError::Embedding("nothing to embed in empty text".into()));
        }

        let mut vector = vec![0.0_f32; self.dimension];
        for (word, count) in &freq {
            let weight = (*count as f32).sqrt();
            self.add_feature(&mut vector, word, weight);
            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for tri in padded.windows(3) {
                let trigram: String = tri.iter().collect();
                self.add_feature(&mut vector, &trigram, 0.5 * weight);
            }
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashingProvider {
    async fn embed(&self, texts: &[String], _input_type: InputType) -> Result<Vec<Vec<f32>>, DomainError> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_unit_vectors() {
        let p = HashingProvider::new(64);
        let a = p.embed_text("Clean energy tax credits").unwrap();
        let b = p.embed_text("Clean energy tax credits").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let p = HashingProvider::default();
        let q = p.embed_text("climate change").unwrap();
        let near = p.embed_text("climate change adaptation grants").unwrap();
        let far = p.embed_text("veterans pension reform").unwrap();
        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&q, &near) > dot(&q, &far));
    }

    #[test]
    fn test_empty_text_fails() {
        let p = HashingProvider::new(8);
        assert!(matches!(p.embed_text("  "), Err(DomainError::Embedding(_))));
    }
}
