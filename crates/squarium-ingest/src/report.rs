//! Run stages and the per-run report.

use serde::Serialize;

/// Stage of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    FetchSource,
    PersistRawItems,
    ExtractPerDocument,
    ClusterPerCategory,
    Done,
    Failed,
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FetchSource => "fetch_source",
            Self::PersistRawItems => "persist_raw_items",
            Self::ExtractPerDocument => "extract_per_document",
            Self::ClusterPerCategory => "cluster_per_category",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counters for one completed run.
///
/// Only a source fetch failure aborts a run, so a report always describes a
/// successful run; partial failures show up in the `*_failures` counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub success: bool,
    pub items_processed: usize,
    pub items_inserted: usize,
    pub items_existing: usize,
    pub item_insert_failures: usize,
    pub comments_inserted: usize,
    pub comments_existing: usize,
    pub comment_insert_failures: usize,
    pub documents_extracted: usize,
    pub extraction_failures: usize,
    pub problems_stored: usize,
    pub problem_insert_failures: usize,
    pub degraded_embeddings: usize,
    pub clusters_created: usize,
    pub clusters_updated: usize,
    pub summary_fallbacks: usize,
    pub cluster_write_failures: usize,
}

impl IngestReport {
    /// Human-readable line for the trigger response.
    pub fn message(&self) -> String {
        format!("Processed {} products", self.items_processed)
    }
}
