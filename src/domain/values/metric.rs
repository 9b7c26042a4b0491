use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance/similarity function a collection is indexed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    L2,
    Cosine,
    #[serde(rename = "IP")]
    InnerProduct,
}

impl Metric {
    /// Whether a larger raw value means a closer match.
    pub fn higher_is_closer(&self) -> bool {
        !matches!(self, Metric::L2)
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::L2
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::L2 => write!(f, "L2"),
            Metric::Cosine => write!(f, "COSINE"),
            Metric::InnerProduct => write!(f, "IP"),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "L2" | "EUCLIDEAN" => Ok(Metric::L2),
            "COSINE" => Ok(Metric::Cosine),
            "IP" | "INNER_PRODUCT" | "DOT" => Ok(Metric::InnerProduct),
            _ => Err(format!("Unknown metric: {s}")),
        }
    }
}

/// Outcome of reconciling the caller's metric with the one the index was built for.
///
/// An index can only be searched with its own metric, so a disagreement never
/// fails: the indexed metric is used and `substituted` records that it happened.
/// Requesting COSINE against an L2 or IP index is handled separately: the query
/// is unit-normalised and searched natively, which only approximates cosine
/// ranking (exact when the stored vectors are unit-normalised too).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveMetric {
    pub requested: Metric,
    pub used: Metric,
    pub substituted: bool,
    pub cosine_approximated: bool,
}

impl EffectiveMetric {
    pub fn resolve(requested: Metric, indexed: Metric) -> Self {
        if requested == indexed {
            return Self {
                requested,
                used: indexed,
                substituted: false,
                cosine_approximated: false,
            };
        }
        let cosine_approximated = requested == Metric::Cosine;
        Self {
            requested,
            used: indexed,
            substituted: !cosine_approximated,
            cosine_approximated,
        }
    }

    /// Label used in logs and JSON output, e.g. `COSINE~L2`.
    pub fn display_name(&self) -> String {
        if self.cosine_approximated {
            format!("COSINE~{}", self.used)
        } else {
            self.used.to_string()
        }
    }
}
