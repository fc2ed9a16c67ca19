//! Squarium Insight crate - problem extraction, grouping, ranking, and summarization.
//!
//! Provides the analysis half of the ingestion pipeline:
//! - Problem extraction from free text via a text-generation model
//! - Greedy seed grouping of statements by shared words
//! - Cluster ranking by mention count, confidence, and recency
//! - Cluster titles and summaries with a deterministic fallback

pub mod cluster;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod ranker;
pub mod summarizer;
pub mod types;

pub use cluster::SimilarityGrouper;
pub use error::InsightError;
pub use extractor::ProblemExtractor;
pub use llm::{GeminiClient, TextGenerator};
pub use ranker::ClusterRanker;
pub use summarizer::ClusterSummarizer;
pub use types::{ClusterSummary, ExtractedProblem, ExtractionOutcome, SummaryOutcome};
