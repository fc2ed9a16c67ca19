//! Cluster titles and summaries.

use std::sync::Arc;

use tracing::warn;

use crate::error::InsightError;
use crate::llm::{slice_json_object, TextGenerator};
use crate::types::{ClusterSummary, SummaryOutcome};

/// Maximum title length, in characters, for the fallback title.
pub const TITLE_MAX_CHARS: usize = 60;

/// Generates a title and summary for a group of similar statements.
pub struct ClusterSummarizer {
    generator: Arc<dyn TextGenerator>,
}

impl ClusterSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn summarize(&self, statements: &[&str]) -> ClusterSummary {
        self.summarize_outcome(statements).await.into_summary()
    }

    /// Summarize, reporting whether the deterministic fallback was used.
    pub async fn summarize_outcome(&self, statements: &[&str]) -> SummaryOutcome {
        match self.generate(statements).await {
            Ok(summary) => SummaryOutcome::Generated(summary),
            Err(e) => {
                warn!(error = %e, members = statements.len(), "Cluster summary failed, using fallback");
                SummaryOutcome::Fallback {
                    summary: fallback_summary(statements),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn generate(&self, statements: &[&str]) -> Result<ClusterSummary, InsightError> {
        if statements.is_empty() {
            return Err(InsightError::EmptyGroup);
        }

        let raw = self.generator.generate(&build_prompt(statements)).await?;
        let literal = slice_json_object(&raw).ok_or_else(|| {
            InsightError::MalformedResponse("no JSON object in response".to_string())
        })?;
        let summary: ClusterSummary = serde_json::from_str(literal)?;

        if summary.title.trim().is_empty() {
            return Err(InsightError::MalformedResponse("empty title".to_string()));
        }
        Ok(summary)
    }
}

fn build_prompt(statements: &[&str]) -> String {
    let listed: Vec<String> = statements
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect();

    format!(
        "Given these similar startup problems, generate:\n\
         1. A concise title (max 60 chars)\n\
         2. A brief summary (max 200 chars)\n\n\
         Problems:\n{}\n\n\
         Return JSON:\n\
         {{\n  \"title\": \"concise problem title\",\n  \"summary\": \"brief summary of the problem space\"\n}}",
        listed.join("\n")
    )
}

/// Deterministic title and summary used when generation fails.
///
/// Identical inputs always yield identical output.
pub fn fallback_summary(statements: &[&str]) -> ClusterSummary {
    let title = statements
        .first()
        .map(|s| s.chars().take(TITLE_MAX_CHARS).collect())
        .unwrap_or_default();
    ClusterSummary {
        title,
        summary: format!(
            "{}{}{}",
            FALLBACK_PREFIX,
            statements.len(),
            FALLBACK_SUFFIX
        ),
    }
}

const FALLBACK_PREFIX: &str = "Common problem in startup discussions (";
const FALLBACK_SUFFIX: &str = " mentions)";

/// Whether `summary` is the text [`fallback_summary`] produces for some
/// member count.
pub fn is_fallback_summary(summary: &str) -> bool {
    summary
        .strip_prefix(FALLBACK_PREFIX)
        .and_then(|rest| rest.strip_suffix(FALLBACK_SUFFIX))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
