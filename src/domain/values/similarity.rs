//! Conversion of raw index distances into bounded similarity scores.

use crate::domain::values::metric::Metric;

/// Minimum score a match needs to be returned.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;

/// Norms below this are treated as zero and left unnormalised.
const NORM_EPSILON: f64 = 1e-12;

/// `1 / (1 + d)`: in (0, 1] for every d >= 0, strictly decreasing in d.
pub fn distance_to_similarity(distance: f64) -> f64 {
    1.0 / (1.0 + distance)
}

/// Score for a raw value produced by an index searched with `metric`.
///
/// IP and COSINE indexes already return a similarity; L2 returns a distance.
pub fn score_for(metric: Metric, raw: f64) -> f64 {
    match metric {
        Metric::InnerProduct | Metric::Cosine => raw,
        Metric::L2 => distance_to_similarity(raw),
    }
}

/// Scale `vector` to unit L2 norm in place. Returns false when the norm is ~0.
pub fn normalize(vector: &mut [f32]) -> bool {
    let norm = vector
        .iter()
        .map(|x| (*x as f64) * (*x as f64))
        .sum::<f64>()
        .sqrt();
    if norm < NORM_EPSILON {
        return false;
    }
    for x in vector.iter_mut() {
        *x = (*x as f64 / norm) as f32;
    }
    true
}
