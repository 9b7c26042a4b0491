use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed vocabulary of bill categories used as zero-shot candidate labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Healthcare,
    Environmentalism,
    ArmedServices,
    Economy,
    Education,
    Technology,
    Immigration,
    AgricultureFood,
    GovernmentOperations,
    Taxation,
    CivilRights,
    CriminalJustice,
    ForeignPolicy,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Healthcare,
        Category::Environmentalism,
        Category::ArmedServices,
        Category::Economy,
        Category::Education,
        Category::Technology,
        Category::Immigration,
        Category::AgricultureFood,
        Category::GovernmentOperations,
        Category::Taxation,
        Category::CivilRights,
        Category::CriminalJustice,
        Category::ForeignPolicy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Healthcare => "Healthcare",
            Category::Environmentalism => "Environmentalism",
            Category::ArmedServices => "Armed Services",
            Category::Economy => "Economy",
            Category::Education => "Education",
            Category::Technology => "Technology",
            Category::Immigration => "Immigration",
            Category::AgricultureFood => "Agriculture + Food",
            Category::GovernmentOperations => "Government Operations",
            Category::Taxation => "Taxation",
            Category::CivilRights => "Civil Rights",
            Category::CriminalJustice => "Criminal Justice",
            Category::ForeignPolicy => "Foreign Policy",
        }
    }

    /// Candidate label strings in vocabulary order.
    pub fn candidate_labels() -> Vec<String> {
        Self::ALL.iter().map(|c| c.label().to_string()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}
