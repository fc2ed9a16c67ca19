//! Text-generation capability and tolerant JSON slicing.
//!
//! Models often wrap JSON in prose or code fences, so callers slice the
//! outermost literal out of the raw text before parsing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InsightError;

/// A model that turns a prompt into raw text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError>;
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Gemini generate request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| InsightError::Generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Generation(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| InsightError::MalformedResponse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .ok_or_else(|| InsightError::MalformedResponse("no candidates returned".to_string()))
    }
}

// =============================================================================
// JSON slicing
// =============================================================================

/// Slice from the first `open` to the last `close`, inclusive.
fn slice_between(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// The outermost `[...]` literal in a model response.
pub fn slice_json_array(raw: &str) -> Option<&str> {
    slice_between(raw, '[', ']')
}

/// The outermost `{...}` literal in a model response.
pub fn slice_json_object(raw: &str) -> Option<&str> {
    slice_between(raw, '{', '}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_array_ignores_prose() {
        let raw = "Sure! Here you go:\n```json\n[{\"a\": 1}, {\"b\": [2]}]\n```\nHope that helps.";
        assert_eq!(slice_json_array(raw), Some("[{\"a\": 1}, {\"b\": [2]}]"));
    }

    #[test]
    fn test_slice_array_missing() {
        assert_eq!(slice_json_array("no problems found"), None);
        assert_eq!(slice_json_array("] backwards ["), None);
    }

    #[test]
    fn test_slice_object() {
        let raw = "Result: {\"title\": \"Billing\", \"summary\": \"{nested}\"} done";
        assert_eq!(
            slice_json_object(raw),
            Some("{\"title\": \"Billing\", \"summary\": \"{nested}\"}")
        );
        assert_eq!(slice_json_object("nothing"), None);
    }

    #[test]
    fn test_gemini_debug_hides_key() {
        let client = GeminiClient::new("https://example.com/", "gemini-pro", "top-secret");
        let debug = format!("{:?}", client);
        assert!(debug.contains("gemini-pro"));
        assert!(debug.contains("https://example.com\""));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_generate_response_parsing() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[1,"},{"text":"2]"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "[1,2]");
    }
}
