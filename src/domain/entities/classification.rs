use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Labels that cleared the adaptive threshold, with the statistics behind it.
///
/// An empty `labels` list is a valid answer: nothing stood out above the
/// distribution's centre. A scorer failure is reported as an error instead.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub labels: Vec<LabelScore>,
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.label.clone()).collect()
    }
}
