//! Route handler functions for all API endpoints.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use squarium_core::types::ProblemCluster;
use squarium_ingest::IngestReport;
use squarium_storage::{ClusterFilters, DateRange};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Query parameter types
// =============================================================================

/// Query parameters for `GET /problems`. Values arrive as raw strings so
/// malformed input maps to a JSON 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemsParams {
    pub date_range: Option<String>,
    pub category: Option<String>,
    pub min_confidence: Option<String>,
    pub query: Option<String>,
}

impl ProblemsParams {
    fn into_filters(self) -> Result<ClusterFilters, ApiError> {
        let defaults = ClusterFilters::default();

        let date_range = match self.date_range.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => DateRange::parse(raw).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Invalid dateRange '{}': expected 7d, 30d or all",
                    raw
                ))
            })?,
            None => defaults.date_range,
        };

        let min_confidence = match self.min_confidence.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("Invalid minConfidence '{}'", raw))
                })?,
            None => defaults.min_confidence,
        };

        Ok(ClusterFilters {
            min_confidence,
            date_range,
            category: self.category.filter(|c| !c.is_empty()),
            query: self.query.filter(|q| !q.trim().is_empty()),
        })
    }
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub products: u64,
    pub comments: u64,
    pub problems: u64,
    pub clusters: u64,
}

/// One cluster as exposed over HTTP.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClusterResponse {
    pub id: Uuid,
    pub cluster_title: String,
    pub cluster_summary: String,
    pub mention_count: u32,
    pub avg_confidence: f64,
    pub recency_score: f64,
    pub rank_score: f64,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProblemCluster> for ClusterResponse {
    fn from(c: ProblemCluster) -> Self {
        Self {
            id: c.id,
            cluster_title: c.title,
            cluster_summary: c.summary,
            mention_count: c.mention_count,
            avg_confidence: c.avg_confidence,
            recency_score: c.recency_score,
            rank_score: c.rank_score,
            category: c.category,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemsResponse {
    pub problems: Vec<ClusterResponse>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub items_processed: usize,
    pub message: String,
    pub report: IngestReport,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health - liveness plus row counts.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.query_service.stats()?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        products: stats.products,
        comments: stats.comments,
        problems: stats.problems,
        clusters: stats.clusters,
    }))
}

/// GET /problems - ranked clusters matching the filters, at most one page.
pub async fn problems(
    State(state): State<AppState>,
    Query(params): Query<ProblemsParams>,
) -> Result<Json<ProblemsResponse>, ApiError> {
    let filters = params.into_filters()?;
    let clusters = state.query_service.search(&filters, Utc::now())?;

    Ok(Json(ProblemsResponse {
        problems: clusters.into_iter().map(ClusterResponse::from).collect(),
    }))
}

/// POST /cron/ingest - run one ingestion cycle and report the outcome.
pub async fn trigger_ingest(
    State(state): State<AppState>,
) -> Result<Json<IngestResponse>, ApiError> {
    tracing::info!("Ingestion triggered over HTTP");

    let report = state.orchestrator.run().await.map_err(|e| {
        tracing::error!(error = %e, "Triggered ingestion failed");
        ApiError::IngestionFailed(e.to_string())
    })?;

    Ok(Json(IngestResponse {
        success: report.success,
        items_processed: report.items_processed,
        message: report.message(),
        report,
    }))
}
