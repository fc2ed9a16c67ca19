//! Squarium Ingest crate - source fetching and the ingestion pipeline.
//!
//! One run fetches recent launches, stores new products and comments,
//! extracts and embeds problems from new text, then regroups every stored
//! problem into ranked clusters.

pub mod pipeline;
pub mod report;
pub mod source;

pub use pipeline::IngestionOrchestrator;
pub use report::{IngestReport, IngestStage};
pub use source::{ProductHuntClient, SourceClient};
