//! Types produced by the insight pipeline.

use serde::{Deserialize, Serialize};

/// Category assigned when the model omits one.
pub const DEFAULT_CATEGORY: &str = "General";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// One problem statement as returned by the extraction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProblem {
    pub problem: String,
    pub confidence_score: f64,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub example_quote: String,
}

/// Title and summary for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub title: String,
    pub summary: String,
}

/// Result of running extraction over one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The model answered; the list may be empty.
    Extracted(Vec<ExtractedProblem>),
    /// The call or the parse failed; the document yields nothing.
    Failed { reason: String },
}

impl ExtractionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn into_problems(self) -> Vec<ExtractedProblem> {
        match self {
            Self::Extracted(problems) => problems,
            Self::Failed { .. } => Vec::new(),
        }
    }
}

/// Result of summarizing one group.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Generated(ClusterSummary),
    /// The model failed; `summary` holds the deterministic fallback.
    Fallback {
        summary: ClusterSummary,
        reason: String,
    },
}

impl SummaryOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn summary(&self) -> &ClusterSummary {
        match self {
            Self::Generated(summary) | Self::Fallback { summary, .. } => summary,
        }
    }

    pub fn into_summary(self) -> ClusterSummary {
        match self {
            Self::Generated(summary) | Self::Fallback { summary, .. } => summary,
        }
    }
}
