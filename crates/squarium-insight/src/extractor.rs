//! Problem extraction from comments and product descriptions.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::InsightError;
use crate::llm::{slice_json_array, TextGenerator};
use crate::types::{ExtractedProblem, ExtractionOutcome};

/// Candidates below this confidence are discarded.
pub const MIN_CONFIDENCE: f64 = 0.3;

const EXTRACTION_PROMPT: &str = r#"You identify problems and pain points mentioned in startup-related discussions.

The input is a single comment or product description.

Respond with a JSON array in this format:
[
  {
    "problem": "short, clear problem statement",
    "confidence_score": 0.0 to 1.0,
    "category": "broad domain such as SaaS, AI, HealthTech, FinTech, E-commerce, Developer Tools",
    "example_quote": "verbatim excerpt from the text that shows the problem"
  }
]

Include only items that express a clear, specific problem or pain point.
If there are none, respond with an empty array.

Text to analyze:
"#;

/// Pulls problem statements out of free text.
pub struct ProblemExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl ProblemExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Extract problems, returning an empty list on any failure.
    pub async fn extract(&self, text: &str) -> Vec<ExtractedProblem> {
        self.extract_outcome(text).await.into_problems()
    }

    /// Extract problems, reporting failures explicitly.
    ///
    /// Empty text yields an empty list without a model call. Whitespace-only
    /// text is sent like any other input.
    pub async fn extract_outcome(&self, text: &str) -> ExtractionOutcome {
        if text.is_empty() {
            return ExtractionOutcome::Extracted(Vec::new());
        }

        let prompt = format!("{}{}", EXTRACTION_PROMPT, text);
        let result = match self.generator.generate(&prompt).await {
            Ok(raw) => parse_problems(&raw),
            Err(e) => Err(e),
        };

        match result {
            Ok(problems) => {
                debug!(count = problems.len(), "Extracted problems");
                ExtractionOutcome::Extracted(problems)
            }
            Err(e) => {
                warn!(error = %e, "Problem extraction failed");
                ExtractionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Parse the array literal out of a raw response and keep acceptable entries.
///
/// Entries that do not deserialize are dropped individually. An entry is
/// kept when its statement is non-empty and its confidence lies in
/// `[MIN_CONFIDENCE, 1.0]`.
fn parse_problems(raw: &str) -> Result<Vec<ExtractedProblem>, InsightError> {
    let literal = slice_json_array(raw)
        .ok_or_else(|| InsightError::MalformedResponse("no JSON array in response".to_string()))?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(literal)?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<ExtractedProblem>(entry).ok())
        .filter(|p| !p.problem.trim().is_empty())
        .filter(|p| (MIN_CONFIDENCE..=1.0).contains(&p.confidence_score))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubGenerator {
        response: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(body.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(reason.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.response.clone().map_err(InsightError::Generation)
        }
    }

    #[tokio::test]
    async fn test_extract_parses_array_with_prose() {
        let stub = StubGenerator::ok(
            r#"Here are the problems:
            [{"problem":"Onboarding flow is confusing","confidence_score":0.8,"category":"SaaS","example_quote":"I got lost"}]
            Let me know if you need more."#,
        );
        let extractor = ProblemExtractor::new(stub.clone());
        let problems = extractor.extract("I got lost during setup").await;

        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].problem, "Onboarding flow is confusing");
        assert_eq!(problems[0].category, "SaaS");
        assert!(stub.prompts.lock().unwrap()[0].ends_with("I got lost during setup"));
    }

    #[tokio::test]
    async fn test_confidence_floor_is_inclusive() {
        let stub = StubGenerator::ok(
            r#"[
                {"problem":"Dropped","confidence_score":0.29,"category":"SaaS","example_quote":""},
                {"problem":"Kept","confidence_score":0.3,"category":"SaaS","example_quote":""}
            ]"#,
        );
        let problems = ProblemExtractor::new(stub).extract("text").await;
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].problem, "Kept");
    }

    #[tokio::test]
    async fn test_invalid_entries_are_dropped_individually() {
        let stub = StubGenerator::ok(
            r#"[
                {"problem":"No score"},
                {"problem":"","confidence_score":0.9},
                {"problem":"Out of range","confidence_score":7.5},
                {"problem":"Valid","confidence_score":0.6}
            ]"#,
        );
        let problems = ProblemExtractor::new(stub).extract("text").await;
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].problem, "Valid");
    }

    #[tokio::test]
    async fn test_generator_failure_yields_empty() {
        let extractor = ProblemExtractor::new(StubGenerator::failing("quota exceeded"));
        assert!(extractor.extract("text").await.is_empty());

        match extractor.extract_outcome("text").await {
            ExtractionOutcome::Failed { reason } => assert!(reason.contains("quota exceeded")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_response_without_array_is_failure() {
        let extractor = ProblemExtractor::new(StubGenerator::ok("I could not find anything."));
        assert!(extractor.extract_outcome("text").await.is_failed());
    }

    #[tokio::test]
    async fn test_empty_array_is_success() {
        let extractor = ProblemExtractor::new(StubGenerator::ok("[]"));
        let outcome = extractor.extract_outcome("Great product, love it").await;
        assert_eq!(outcome, ExtractionOutcome::Extracted(Vec::new()));
    }

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let stub = StubGenerator::ok("[]");
        let extractor = ProblemExtractor::new(stub.clone());
        assert!(extractor.extract("").await.is_empty());
        assert!(stub.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_text_reaches_model() {
        let stub = StubGenerator::ok("[]");
        let extractor = ProblemExtractor::new(stub.clone());
        let outcome = extractor.extract_outcome("  \n ").await;
        assert_eq!(outcome, ExtractionOutcome::Extracted(Vec::new()));
        assert_eq!(stub.prompts.lock().unwrap().len(), 1);
    }
}
