//! Shared domain types for the problem-discovery pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment attached to a source item, as fetched from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceComment {
    /// Upstream identifier, used as the idempotency key.
    pub external_id: String,
    pub author: String,
    pub body: String,
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}

/// A product launch fetched from the upstream source, with its comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Upstream identifier, used as the idempotency key.
    pub external_id: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub votes: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<SourceComment>,
}

/// One extracted problem statement, persisted individually.
///
/// Always linked to the product it was found under; `comment_id` is set when
/// the statement came from a comment rather than the product description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemCandidate {
    pub id: Uuid,
    pub product_id: Uuid,
    pub comment_id: Option<Uuid>,
    pub text: String,
    /// Extractor confidence in `[0, 1]`.
    pub confidence: f64,
    pub category: String,
    pub example_quote: String,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl ProblemCandidate {
    /// The document the statement was extracted from.
    pub fn source_document_id(&self) -> Uuid {
        self.comment_id.unwrap_or(self.product_id)
    }
}

/// Aggregate statistics of one group of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub mention_count: u32,
    pub avg_confidence: f64,
    pub recency_score: f64,
    pub rank_score: f64,
}

/// A ranked, summarized group of similar problems within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemCluster {
    pub id: Uuid,
    /// Stable content key carried across runs. `None` for rows created before
    /// keys existed; those are matched by title and adopt a key on update.
    pub cluster_key: Option<String>,
    pub title: String,
    pub summary: String,
    pub mention_count: u32,
    pub avg_confidence: f64,
    pub recency_score: f64,
    pub rank_score: f64,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProblemCluster {
    pub fn stats(&self) -> ClusterStats {
        ClusterStats {
            mention_count: self.mention_count,
            avg_confidence: self.avg_confidence,
            recency_score: self.recency_score,
            rank_score: self.rank_score,
        }
    }
}
