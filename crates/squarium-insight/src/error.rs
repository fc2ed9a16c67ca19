use thiserror::Error;

/// Errors raised inside the insight pipeline.
///
/// These never leave the extractor or summarizer; both convert them into
/// explicit outcomes.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("generation error: {0}")]
    Generation(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("empty group")]
    EmptyGroup,
}

impl From<serde_json::Error> for InsightError {
    fn from(err: serde_json::Error) -> Self {
        InsightError::MalformedResponse(err.to_string())
    }
}
