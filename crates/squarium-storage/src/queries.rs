//! Read-side queries for the browse/search surface.
//!
//! Clusters are filtered by minimum confidence, creation window, category,
//! and a case-insensitive substring over title or summary, then ordered by
//! rank and capped at one page.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use squarium_core::error::SquariumError;
use squarium_core::types::ProblemCluster;

use crate::db::{Database, FOLD_CASE_FN};
use crate::repository::row_to_cluster;

/// Maximum clusters returned by one read.
pub const PAGE_SIZE: u32 = 50;

/// Creation-time window for the cluster read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    Week,
    Month,
    All,
}

impl DateRange {
    /// Parse the `7d` / `30d` / `all` wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "7d" => Some(Self::Week),
            "30d" => Some(Self::Month),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::All => "all",
        }
    }

    /// Earliest `created_at` admitted, or `None` for no bound.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Week => Some(now - Duration::days(7)),
            Self::Month => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }
}

/// Filters for [`ClusterQueryService::search`].
#[derive(Debug, Clone)]
pub struct ClusterFilters {
    pub min_confidence: f64,
    pub date_range: DateRange,
    pub category: Option<String>,
    pub query: Option<String>,
}

impl Default for ClusterFilters {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            date_range: DateRange::Week,
            category: None,
            query: None,
        }
    }
}

/// Row counts across the pipeline tables.
#[derive(Debug, Clone, Default)]
pub struct DbStats {
    pub products: u64,
    pub comments: u64,
    pub problems: u64,
    pub clusters: u64,
}

/// Query service backing the read endpoint.
pub struct ClusterQueryService {
    db: Arc<Database>,
}

impl ClusterQueryService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Filtered clusters, highest rank first, at most [`PAGE_SIZE`].
    pub fn search(
        &self,
        filters: &ClusterFilters,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProblemCluster>, SquariumError> {
        let mut sql = String::from(
            "SELECT id, cluster_key, cluster_title, cluster_summary, mention_count,
                    avg_confidence, recency_score, rank_score, category, created_at, updated_at
             FROM problem_clusters
             WHERE avg_confidence >= ?1",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(filters.min_confidence)];

        if let Some(cutoff) = filters.date_range.cutoff(now) {
            params_vec.push(Box::new(cutoff.timestamp_millis()));
            sql.push_str(&format!(" AND created_at >= ?{}", params_vec.len()));
        }

        if let Some(category) = filters.category.as_deref().filter(|c| !c.is_empty()) {
            params_vec.push(Box::new(category.to_string()));
            sql.push_str(&format!(" AND category = ?{}", params_vec.len()));
        }

        if let Some(query) = filters.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params_vec.push(Box::new(format!("%{}%", escape_like(&query.to_lowercase()))));
            let n = params_vec.len();
            sql.push_str(&format!(
                " AND ({f}(cluster_title) LIKE ?{n} ESCAPE '\\' OR {f}(cluster_summary) LIKE ?{n} ESCAPE '\\')",
                f = FOLD_CASE_FN
            ));
        }

        params_vec.push(Box::new(PAGE_SIZE));
        sql.push_str(&format!(
            " ORDER BY rank_score DESC LIMIT ?{}",
            params_vec.len()
        ));

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| SquariumError::Storage(format!("Cluster query prepare: {}", e)))?;

            let rows = stmt
                .query_map(params_refs.as_slice(), |row| Ok(row_to_cluster(row)))
                .map_err(|e| SquariumError::Storage(format!("Cluster query: {}", e)))?;

            let mut results = Vec::new();
            for row in rows {
                results.push(row.map_err(|e| SquariumError::Storage(e.to_string()))??);
            }
            Ok(results)
        })
    }

    /// Row counts for the health endpoint.
    pub fn stats(&self) -> Result<DbStats, SquariumError> {
        self.db.with_conn(|conn| {
            let count = |table: &str| -> Result<u64, SquariumError> {
                let n: i64 = conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })
                    .map_err(|e| SquariumError::Storage(e.to_string()))?;
                Ok(n as u64)
            };
            Ok(DbStats {
                products: count("products")?,
                comments: count("comments")?,
                problems: count("problems")?,
                clusters: count("problem_clusters")?,
            })
        })
    }
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
