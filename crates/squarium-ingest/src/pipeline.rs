//! Ingestion orchestrator.
//!
//! A run moves through `FetchSource -> PersistRawItems -> ExtractPerDocument
//! -> ClusterPerCategory -> Done`. Every external call is awaited in turn.
//! Only a fetch failure aborts the run; per-item failures are logged,
//! counted in the [`IngestReport`], and skipped.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use squarium_core::error::SquariumError;
use squarium_core::types::{ClusterStats, ProblemCandidate, ProblemCluster, SourceItem};
use squarium_insight::summarizer::is_fallback_summary;
use squarium_insight::{
    ClusterRanker, ClusterSummarizer, ClusterSummary, ExtractionOutcome, ProblemExtractor,
    SimilarityGrouper,
};
use squarium_storage::{
    ClusterRepository, CommentRepository, Database, ProblemRepository, ProductRepository,
};
use squarium_vector::EmbeddingProvider;

use crate::report::{IngestReport, IngestStage};
use crate::source::SourceClient;

/// Text queued for extraction, with the rows it belongs to.
#[derive(Debug)]
struct Document {
    product_id: Uuid,
    comment_id: Option<Uuid>,
    text: String,
}

enum ClusterWrite {
    Created,
    Updated,
}

/// Runs full ingestion cycles against one database.
pub struct IngestionOrchestrator {
    source: Arc<dyn SourceClient>,
    extractor: ProblemExtractor,
    embedder: EmbeddingProvider,
    summarizer: ClusterSummarizer,
    grouper: SimilarityGrouper,
    ranker: ClusterRanker,
    products: ProductRepository,
    comments: CommentRepository,
    problems: ProblemRepository,
    clusters: ClusterRepository,
    lookback_days: u32,
    /// Serializes runs started from this process.
    run_lock: Mutex<()>,
}

impl IngestionOrchestrator {
    pub fn new(
        db: Arc<Database>,
        source: Arc<dyn SourceClient>,
        extractor: ProblemExtractor,
        embedder: EmbeddingProvider,
        summarizer: ClusterSummarizer,
    ) -> Self {
        Self {
            source,
            extractor,
            embedder,
            summarizer,
            grouper: SimilarityGrouper::default(),
            ranker: ClusterRanker::new(),
            products: ProductRepository::new(Arc::clone(&db)),
            comments: CommentRepository::new(Arc::clone(&db)),
            problems: ProblemRepository::new(Arc::clone(&db)),
            clusters: ClusterRepository::new(db),
            lookback_days: 1,
            run_lock: Mutex::new(()),
        }
    }

    /// Set how many days back each run fetches.
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Run one ingestion cycle using the current time.
    pub async fn run(&self) -> Result<IngestReport, SquariumError> {
        self.run_at(Utc::now()).await
    }

    /// Run one ingestion cycle with `now` as the reference time for new
    /// rows and recency scoring.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<IngestReport, SquariumError> {
        let _guard = self.run_lock.lock().await;
        let mut report = IngestReport::default();

        log_stage(IngestStage::FetchSource);
        let items = match self.source.fetch_recent(self.lookback_days).await {
            Ok(items) => items,
            Err(e) => {
                error!(stage = %IngestStage::Failed, error = %e, "Source fetch failed, aborting run");
                return Err(e);
            }
        };
        report.items_processed = items.len();

        log_stage(IngestStage::PersistRawItems);
        let documents = self.persist_items(&items, &mut report);

        log_stage(IngestStage::ExtractPerDocument);
        self.extract_documents(&documents, now, &mut report).await;

        log_stage(IngestStage::ClusterPerCategory);
        self.recluster(now, &mut report).await;

        report.success = true;
        info!(
            stage = %IngestStage::Done,
            items = report.items_processed,
            new_items = report.items_inserted,
            new_comments = report.comments_inserted,
            problems = report.problems_stored,
            clusters_created = report.clusters_created,
            clusters_updated = report.clusters_updated,
            degraded_embeddings = report.degraded_embeddings,
            summary_fallbacks = report.summary_fallbacks,
            "Ingestion run complete"
        );
        Ok(report)
    }

    /// Store new products and comments, returning the text to extract from.
    ///
    /// Descriptions of already-stored products and bodies of already-stored
    /// comments are not queued again.
    fn persist_items(&self, items: &[SourceItem], report: &mut IngestReport) -> Vec<Document> {
        let mut documents = Vec::new();

        for item in items {
            let product = match self.products.insert_if_absent(item) {
                Ok(upsert) => upsert,
                Err(e) => {
                    warn!(external_id = %item.external_id, error = %e, "Skipping product");
                    report.item_insert_failures += 1;
                    continue;
                }
            };

            if product.is_new() {
                report.items_inserted += 1;
                if !item.description.is_empty() {
                    documents.push(Document {
                        product_id: product.id(),
                        comment_id: None,
                        text: item.description.clone(),
                    });
                }
            } else {
                report.items_existing += 1;
            }

            for comment in &item.comments {
                match self.comments.insert_if_absent(product.id(), comment) {
                    Ok(upsert) if upsert.is_new() => {
                        report.comments_inserted += 1;
                        documents.push(Document {
                            product_id: product.id(),
                            comment_id: Some(upsert.id()),
                            text: comment.body.clone(),
                        });
                    }
                    Ok(_) => report.comments_existing += 1,
                    Err(e) => {
                        warn!(external_id = %comment.external_id, error = %e, "Skipping comment");
                        report.comment_insert_failures += 1;
                    }
                }
            }
        }

        debug!(documents = documents.len(), "Queued documents for extraction");
        documents
    }

    async fn extract_documents(
        &self,
        documents: &[Document],
        now: DateTime<Utc>,
        report: &mut IngestReport,
    ) {
        for document in documents {
            let problems = match self.extractor.extract_outcome(&document.text).await {
                ExtractionOutcome::Extracted(problems) => {
                    report.documents_extracted += 1;
                    problems
                }
                ExtractionOutcome::Failed { reason } => {
                    debug!(product_id = %document.product_id, %reason, "No problems from document");
                    report.extraction_failures += 1;
                    continue;
                }
            };

            for problem in problems {
                let embedding = self.embedder.embed(&problem.problem).await;
                if embedding.is_degraded() {
                    report.degraded_embeddings += 1;
                }

                let candidate = ProblemCandidate {
                    id: Uuid::new_v4(),
                    product_id: document.product_id,
                    comment_id: document.comment_id,
                    text: problem.problem,
                    confidence: problem.confidence_score,
                    category: problem.category,
                    example_quote: problem.example_quote,
                    embedding: Some(embedding.into_vector()),
                    created_at: now,
                };

                match self.problems.insert(&candidate) {
                    Ok(()) => report.problems_stored += 1,
                    Err(e) => {
                        warn!(product_id = %document.product_id, error = %e, "Skipping problem");
                        report.problem_insert_failures += 1;
                    }
                }
            }
        }
    }

    /// Regroup every stored problem and write cluster rows.
    async fn recluster(&self, now: DateTime<Utc>, report: &mut IngestReport) {
        let candidates = match self.problems.list_all() {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(error = %e, "Failed to load problems, skipping clustering");
                return;
            }
        };

        for (category, members) in partition_by_category(candidates) {
            let groups = self.grouper.group(&members);
            debug!(%category, problems = members.len(), groups = groups.len(), "Grouped category");

            for group in groups {
                let stats = match self.ranker.rank(&group, now) {
                    Ok(stats) => stats,
                    Err(e) => {
                        warn!(%category, error = %e, "Skipping group");
                        continue;
                    }
                };
                let key = format!("{}:{}", category, group[0].id);

                match self
                    .write_cluster(&category, &key, &group, &stats, now, report)
                    .await
                {
                    Ok(ClusterWrite::Created) => report.clusters_created += 1,
                    Ok(ClusterWrite::Updated) => report.clusters_updated += 1,
                    Err(e) => {
                        warn!(%category, %key, error = %e, "Failed to write cluster");
                        report.cluster_write_failures += 1;
                    }
                }
            }
        }
    }

    async fn summarize(&self, statements: &[&str], report: &mut IngestReport) -> ClusterSummary {
        let outcome = self.summarizer.summarize_outcome(statements).await;
        if outcome.is_fallback() {
            report.summary_fallbacks += 1;
        }
        outcome.into_summary()
    }

    /// Update the cluster matching `key`, else a key-less cluster with the
    /// generated title, else insert a new one.
    ///
    /// A keyed cluster keeps its text unless it still carries the fallback
    /// summary, in which case generation is retried.
    async fn write_cluster(
        &self,
        category: &str,
        key: &str,
        group: &[&ProblemCandidate],
        stats: &ClusterStats,
        now: DateTime<Utc>,
        report: &mut IngestReport,
    ) -> Result<ClusterWrite, SquariumError> {
        let statements: Vec<&str> = group.iter().map(|c| c.text.as_str()).collect();

        if let Some(existing) = self.clusters.find_by_key(category, key)? {
            self.clusters.update_stats(existing.id, stats, None, now)?;
            if is_fallback_summary(&existing.summary) {
                let summary = self.summarize(&statements, report).await;
                self.clusters
                    .update_text(existing.id, &summary.title, &summary.summary)?;
            }
            return Ok(ClusterWrite::Updated);
        }

        let summary = self.summarize(&statements, report).await;

        if let Some(existing) = self.clusters.find_by_title(category, &summary.title)? {
            if existing.cluster_key.is_none() {
                self.clusters.update_stats(existing.id, stats, Some(key), now)?;
                return Ok(ClusterWrite::Updated);
            }
        }

        self.clusters.insert(&ProblemCluster {
            id: Uuid::new_v4(),
            cluster_key: Some(key.to_string()),
            title: summary.title,
            summary: summary.summary,
            mention_count: stats.mention_count,
            avg_confidence: stats.avg_confidence,
            recency_score: stats.recency_score,
            rank_score: stats.rank_score,
            category: category.to_string(),
            created_at: now,
            updated_at: now,
        })?;
        Ok(ClusterWrite::Created)
    }
}

fn log_stage(stage: IngestStage) {
    info!(%stage, "Ingestion stage");
}

/// Split candidates by category, keeping load order within each.
fn partition_by_category(
    candidates: Vec<ProblemCandidate>,
) -> BTreeMap<String, Vec<ProblemCandidate>> {
    let mut by_category: BTreeMap<String, Vec<ProblemCandidate>> = BTreeMap::new();
    for candidate in candidates {
        by_category
            .entry(candidate.category.clone())
            .or_default()
            .push(candidate);
    }
    by_category
}
