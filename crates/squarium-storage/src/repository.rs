//! Repository implementations for SQLite-backed persistence.
//!
//! Products and comments are upserted idempotently by their upstream
//! identifiers; problems are append-only; clusters are looked up by content
//! key or title within a category and updated in place.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use squarium_core::error::SquariumError;
use squarium_core::types::{
    ClusterStats, ProblemCandidate, ProblemCluster, SourceComment, SourceItem,
};

use crate::db::Database;

/// Outcome of an idempotent insert keyed by an upstream identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new row was written with this internal id.
    Inserted(Uuid),
    /// A row with the same upstream id already existed.
    Existing(Uuid),
}

impl Upsert {
    pub fn id(&self) -> Uuid {
        match self {
            Upsert::Inserted(id) | Upsert::Existing(id) => *id,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Upsert::Inserted(_))
    }
}

/// Repository for launched products.
pub struct ProductRepository {
    db: Arc<Database>,
}

impl ProductRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Look up the internal id for an upstream product id.
    pub fn find_id_by_external(&self, external_id: &str) -> Result<Option<Uuid>, SquariumError> {
        self.db.with_conn(|conn| {
            find_id(conn, "SELECT id FROM products WHERE ph_id = ?1", external_id)
        })
    }

    /// Insert the product unless its upstream id is already stored.
    pub fn insert_if_absent(&self, item: &SourceItem) -> Result<Upsert, SquariumError> {
        self.db.with_conn(|conn| {
            if let Some(id) = find_id(
                conn,
                "SELECT id FROM products WHERE ph_id = ?1",
                &item.external_id,
            )? {
                return Ok(Upsert::Existing(id));
            }

            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO products (id, ph_id, name, tagline, description, category, votes, url, launch_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    id.to_string(),
                    item.external_id,
                    item.name,
                    item.tagline,
                    item.description,
                    "General",
                    item.votes,
                    item.url,
                    item.created_at.format("%Y-%m-%d").to_string(),
                    Utc::now().timestamp_millis(),
                ],
            )
            .map_err(|e| SquariumError::Storage(format!("Failed to insert product: {}", e)))?;
            Ok(Upsert::Inserted(id))
        })
    }

    pub fn count(&self) -> Result<u64, SquariumError> {
        self.db.with_conn(|conn| count_rows(conn, "products"))
    }
}

/// Repository for product comments.
pub struct CommentRepository {
    db: Arc<Database>,
}

impl CommentRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert the comment under `product_id` unless its upstream id is already stored.
    pub fn insert_if_absent(
        &self,
        product_id: Uuid,
        comment: &SourceComment,
    ) -> Result<Upsert, SquariumError> {
        self.db.with_conn(|conn| {
            if let Some(id) = find_id(
                conn,
                "SELECT id FROM comments WHERE ph_comment_id = ?1",
                &comment.external_id,
            )? {
                return Ok(Upsert::Existing(id));
            }

            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO comments (id, ph_comment_id, product_id, author, body, upvotes, posted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id.to_string(),
                    comment.external_id,
                    product_id.to_string(),
                    comment.author,
                    comment.body,
                    comment.votes,
                    comment.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| SquariumError::Storage(format!("Failed to insert comment: {}", e)))?;
            Ok(Upsert::Inserted(id))
        })
    }

    pub fn count(&self) -> Result<u64, SquariumError> {
        self.db.with_conn(|conn| count_rows(conn, "comments"))
    }
}

/// Repository for extracted problem statements.
pub struct ProblemRepository {
    db: Arc<Database>,
}

impl ProblemRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store one extracted problem.
    pub fn insert(&self, problem: &ProblemCandidate) -> Result<(), SquariumError> {
        let embedding = problem
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO problems (id, product_id, comment_id, problem_text, confidence_score,
                                       category, example_quote, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    problem.id.to_string(),
                    problem.product_id.to_string(),
                    problem.comment_id.map(|id| id.to_string()),
                    problem.text,
                    problem.confidence,
                    problem.category,
                    problem.example_quote,
                    embedding,
                    problem.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| SquariumError::Storage(format!("Failed to insert problem: {}", e)))?;
            Ok(())
        })
    }

    /// Every stored problem, oldest first (insertion order breaks ties).
    pub fn list_all(&self) -> Result<Vec<ProblemCandidate>, SquariumError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, product_id, comment_id, problem_text, confidence_score,
                            category, example_quote, embedding, created_at
                     FROM problems
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| SquariumError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| Ok(row_to_problem(row)))
                .map_err(|e| SquariumError::Storage(e.to_string()))?;

            let mut problems = Vec::new();
            for row in rows {
                let problem = row.map_err(|e| SquariumError::Storage(e.to_string()))??;
                problems.push(problem);
            }
            Ok(problems)
        })
    }

    pub fn count(&self) -> Result<u64, SquariumError> {
        self.db.with_conn(|conn| count_rows(conn, "problems"))
    }
}

const CLUSTER_COLUMNS: &str = "id, cluster_key, cluster_title, cluster_summary, mention_count,
     avg_confidence, recency_score, rank_score, category, created_at, updated_at";

/// Repository for ranked problem clusters.
pub struct ClusterRepository {
    db: Arc<Database>,
}

impl ClusterRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Find a cluster by its content key within a category.
    pub fn find_by_key(
        &self,
        category: &str,
        cluster_key: &str,
    ) -> Result<Option<ProblemCluster>, SquariumError> {
        let sql = format!(
            "SELECT {} FROM problem_clusters WHERE category = ?1 AND cluster_key = ?2 LIMIT 1",
            CLUSTER_COLUMNS
        );
        self.db
            .with_conn(|conn| find_cluster(conn, &sql, category, cluster_key))
    }

    /// Find a cluster by exact title within a category.
    pub fn find_by_title(
        &self,
        category: &str,
        title: &str,
    ) -> Result<Option<ProblemCluster>, SquariumError> {
        let sql = format!(
            "SELECT {} FROM problem_clusters WHERE category = ?1 AND cluster_title = ?2
             ORDER BY created_at ASC LIMIT 1",
            CLUSTER_COLUMNS
        );
        self.db.with_conn(|conn| find_cluster(conn, &sql, category, title))
    }

    pub fn insert(&self, cluster: &ProblemCluster) -> Result<(), SquariumError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO problem_clusters (id, cluster_key, cluster_title, cluster_summary,
                    mention_count, avg_confidence, recency_score, rank_score, category,
                    created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    cluster.id.to_string(),
                    cluster.cluster_key,
                    cluster.title,
                    cluster.summary,
                    cluster.mention_count,
                    cluster.avg_confidence,
                    cluster.recency_score,
                    cluster.rank_score,
                    cluster.category,
                    cluster.created_at.timestamp_millis(),
                    cluster.updated_at.timestamp_millis(),
                ],
            )
            .map_err(|e| SquariumError::Storage(format!("Failed to insert cluster: {}", e)))?;
            Ok(())
        })
    }

    /// Overwrite the statistics of an existing cluster.
    ///
    /// Title, summary, category and `created_at` are never touched. When
    /// `cluster_key` is given it replaces the stored key.
    pub fn update_stats(
        &self,
        id: Uuid,
        stats: &ClusterStats,
        cluster_key: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), SquariumError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE problem_clusters
                     SET mention_count = ?1, avg_confidence = ?2, recency_score = ?3,
                         rank_score = ?4, updated_at = ?5,
                         cluster_key = COALESCE(?6, cluster_key)
                     WHERE id = ?7",
                    rusqlite::params![
                        stats.mention_count,
                        stats.avg_confidence,
                        stats.recency_score,
                        stats.rank_score,
                        updated_at.timestamp_millis(),
                        cluster_key,
                        id.to_string(),
                    ],
                )
                .map_err(|e| SquariumError::Storage(format!("Failed to update cluster: {}", e)))?;
            if changed == 0 {
                return Err(SquariumError::Storage(format!("Cluster {} not found", id)));
            }
            Ok(())
        })
    }

    /// Replace the title and summary of an existing cluster.
    pub fn update_text(&self, id: Uuid, title: &str, summary: &str) -> Result<(), SquariumError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE problem_clusters SET cluster_title = ?1, cluster_summary = ?2 WHERE id = ?3",
                    rusqlite::params![title, summary, id.to_string()],
                )
                .map_err(|e| SquariumError::Storage(format!("Failed to update cluster text: {}", e)))?;
            if changed == 0 {
                return Err(SquariumError::Storage(format!("Cluster {} not found", id)));
            }
            Ok(())
        })
    }

    /// All clusters by descending rank.
    pub fn list_all(&self) -> Result<Vec<ProblemCluster>, SquariumError> {
        let sql = format!(
            "SELECT {} FROM problem_clusters ORDER BY rank_score DESC, created_at ASC",
            CLUSTER_COLUMNS
        );
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| SquariumError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_cluster(row)))
                .map_err(|e| SquariumError::Storage(e.to_string()))?;

            let mut clusters = Vec::new();
            for row in rows {
                clusters.push(row.map_err(|e| SquariumError::Storage(e.to_string()))??);
            }
            Ok(clusters)
        })
    }

    pub fn count(&self) -> Result<u64, SquariumError> {
        self.db.with_conn(|conn| count_rows(conn, "problem_clusters"))
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

fn parse_uuid(s: &str) -> Result<Uuid, SquariumError> {
    Uuid::parse_str(s).map_err(|e| SquariumError::Storage(format!("Invalid UUID: {}", e)))
}

fn find_id(conn: &Connection, sql: &str, key: &str) -> Result<Option<Uuid>, SquariumError> {
    let id: Option<String> = conn
        .query_row(sql, rusqlite::params![key], |row| row.get(0))
        .optional()
        .map_err(|e| SquariumError::Storage(e.to_string()))?;
    id.as_deref().map(parse_uuid).transpose()
}

fn find_cluster(
    conn: &Connection,
    sql: &str,
    category: &str,
    value: &str,
) -> Result<Option<ProblemCluster>, SquariumError> {
    let result = conn
        .query_row(sql, rusqlite::params![category, value], |row| {
            Ok(row_to_cluster(row))
        })
        .optional()
        .map_err(|e| SquariumError::Storage(e.to_string()))?;
    result.transpose()
}

fn count_rows(conn: &Connection, table: &str) -> Result<u64, SquariumError> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .map_err(|e| SquariumError::Storage(e.to_string()))?;
    Ok(count as u64)
}

fn row_to_problem(row: &rusqlite::Row<'_>) -> Result<ProblemCandidate, SquariumError> {
    let get_err = |e: rusqlite::Error| SquariumError::Storage(e.to_string());

    let id: String = row.get(0).map_err(get_err)?;
    let product_id: String = row.get(1).map_err(get_err)?;
    let comment_id: Option<String> = row.get(2).map_err(get_err)?;
    let text: String = row.get(3).map_err(get_err)?;
    let confidence: f64 = row.get(4).map_err(get_err)?;
    let category: String = row.get(5).map_err(get_err)?;
    let example_quote: String = row.get(6).map_err(get_err)?;
    let embedding: Option<String> = row.get(7).map_err(get_err)?;
    let created_at: i64 = row.get(8).map_err(get_err)?;

    Ok(ProblemCandidate {
        id: parse_uuid(&id)?,
        product_id: parse_uuid(&product_id)?,
        comment_id: comment_id.as_deref().map(parse_uuid).transpose()?,
        text,
        confidence,
        category,
        example_quote,
        embedding: embedding
            .as_deref()
            .map(serde_json::from_str::<Vec<f32>>)
            .transpose()?,
        created_at: from_millis(created_at),
    })
}

pub(crate) fn row_to_cluster(row: &rusqlite::Row<'_>) -> Result<ProblemCluster, SquariumError> {
    let get_err = |e: rusqlite::Error| SquariumError::Storage(e.to_string());

    let id: String = row.get(0).map_err(get_err)?;
    let cluster_key: Option<String> = row.get(1).map_err(get_err)?;
    let title: String = row.get(2).map_err(get_err)?;
    let summary: String = row.get(3).map_err(get_err)?;
    let mention_count: u32 = row.get(4).map_err(get_err)?;
    let avg_confidence: f64 = row.get(5).map_err(get_err)?;
    let recency_score: f64 = row.get(6).map_err(get_err)?;
    let rank_score: f64 = row.get(7).map_err(get_err)?;
    let category: String = row.get(8).map_err(get_err)?;
    let created_at: i64 = row.get(9).map_err(get_err)?;
    let updated_at: i64 = row.get(10).map_err(get_err)?;

    Ok(ProblemCluster {
        id: parse_uuid(&id)?,
        cluster_key,
        title,
        summary,
        mention_count,
        avg_confidence,
        recency_score,
        rank_score,
        category,
        created_at: from_millis(created_at),
        updated_at: from_millis(updated_at),
    })
}

/// Extension trait for rusqlite to support optional query results.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn make_item(external_id: &str) -> SourceItem {
        SourceItem {
            external_id: external_id.to_string(),
            name: "Acme".to_string(),
            tagline: "Invoices on autopilot".to_string(),
            description: "Acme sends invoices for you.".to_string(),
            votes: 12,
            url: "https://example.com/acme".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            comments: vec![],
        }
    }

    fn make_comment(external_id: &str) -> SourceComment {
        SourceComment {
            external_id: external_id.to_string(),
            author: "dana".to_string(),
            body: "Reconciling payments is painful".to_string(),
            votes: 2,
            created_at: Utc::now(),
        }
    }

    fn make_problem(product_id: Uuid, text: &str, created_at: DateTime<Utc>) -> ProblemCandidate {
        ProblemCandidate {
            id: Uuid::new_v4(),
            product_id,
            comment_id: None,
            text: text.to_string(),
            confidence: 0.75,
            category: "FinTech".to_string(),
            example_quote: "painful".to_string(),
            embedding: None,
            created_at,
        }
    }

    fn make_cluster(title: &str, category: &str, key: Option<&str>) -> ProblemCluster {
        let now = Utc::now();
        ProblemCluster {
            id: Uuid::new_v4(),
            cluster_key: key.map(|k| k.to_string()),
            title: title.to_string(),
            summary: "summary".to_string(),
            mention_count: 3,
            avg_confidence: 0.6,
            recency_score: 1.0,
            rank_score: 1.88,
            category: category.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_insert_if_absent_is_idempotent() {
        let repo = ProductRepository::new(make_db());
        let first = repo.insert_if_absent(&make_item("ph-1")).unwrap();
        let second = repo.insert_if_absent(&make_item("ph-1")).unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(first.id(), second.id());
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.find_id_by_external("ph-1").unwrap(), Some(first.id()));
        assert_eq!(repo.find_id_by_external("ph-2").unwrap(), None);
    }

    #[test]
    fn test_product_launch_date_is_date_part() {
        let db = make_db();
        let repo = ProductRepository::new(Arc::clone(&db));
        let id = repo.insert_if_absent(&make_item("ph-1")).unwrap().id();

        let launch: String = db
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT launch_date FROM products WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| SquariumError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(launch, "2026-03-14");
    }

    #[test]
    fn test_comment_insert_if_absent_is_idempotent() {
        let db = make_db();
        let product_id = ProductRepository::new(Arc::clone(&db))
            .insert_if_absent(&make_item("ph-1"))
            .unwrap()
            .id();
        let repo = CommentRepository::new(db);

        let first = repo.insert_if_absent(product_id, &make_comment("c-1")).unwrap();
        let second = repo.insert_if_absent(product_id, &make_comment("c-1")).unwrap();
        let other = repo.insert_if_absent(product_id, &make_comment("c-2")).unwrap();

        assert!(first.is_new());
        assert_eq!(second, Upsert::Existing(first.id()));
        assert!(other.is_new());
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_problems_listed_oldest_first_with_embedding() {
        let db = make_db();
        let product_id = ProductRepository::new(Arc::clone(&db))
            .insert_if_absent(&make_item("ph-1"))
            .unwrap()
            .id();
        let repo = ProblemRepository::new(db);

        let now = Utc::now();
        let mut newer = make_problem(product_id, "newer", now);
        newer.embedding = Some(vec![0.25, -0.5, 1.0]);
        let older = make_problem(product_id, "older", now - Duration::days(2));
        repo.insert(&newer).unwrap();
        repo.insert(&older).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].text, "older");
        assert_eq!(all[1].text, "newer");
        assert_eq!(all[1].embedding, Some(vec![0.25, -0.5, 1.0]));
        assert!(all[0].embedding.is_none());
        assert_eq!(all[1].created_at.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn test_problems_same_timestamp_keep_insertion_order() {
        let db = make_db();
        let product_id = ProductRepository::new(Arc::clone(&db))
            .insert_if_absent(&make_item("ph-1"))
            .unwrap()
            .id();
        let repo = ProblemRepository::new(db);

        let now = Utc::now();
        for text in ["first", "second", "third"] {
            repo.insert(&make_problem(product_id, text, now)).unwrap();
        }

        let texts: Vec<String> = repo.list_all().unwrap().into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_problem_insert_with_unknown_product_fails() {
        let repo = ProblemRepository::new(make_db());
        let result = repo.insert(&make_problem(Uuid::new_v4(), "orphan", Utc::now()));
        assert!(matches!(result, Err(SquariumError::Storage(_))));
    }

    #[test]
    fn test_cluster_find_by_title_scoped_to_category() {
        let repo = ClusterRepository::new(make_db());
        let cluster = make_cluster("Onboarding confusion", "SaaS", None);
        repo.insert(&cluster).unwrap();

        let found = repo.find_by_title("SaaS", "Onboarding confusion").unwrap();
        assert_eq!(found.map(|c| c.id), Some(cluster.id));
        assert!(repo
            .find_by_title("FinTech", "Onboarding confusion")
            .unwrap()
            .is_none());
        assert!(repo.find_by_title("SaaS", "onboarding confusion").unwrap().is_none());
    }

    #[test]
    fn test_cluster_find_by_key() {
        let repo = ClusterRepository::new(make_db());
        let cluster = make_cluster("Slow payouts", "FinTech", Some("FinTech:abc"));
        repo.insert(&cluster).unwrap();

        assert!(repo.find_by_key("FinTech", "FinTech:abc").unwrap().is_some());
        assert!(repo.find_by_key("FinTech", "FinTech:xyz").unwrap().is_none());
    }

    #[test]
    fn test_cluster_update_stats_in_place() {
        let repo = ClusterRepository::new(make_db());
        let cluster = make_cluster("Onboarding confusion", "SaaS", None);
        repo.insert(&cluster).unwrap();

        let later = cluster.updated_at + Duration::hours(1);
        let stats = ClusterStats {
            mention_count: 4,
            avg_confidence: 0.7,
            recency_score: 0.7,
            rank_score: 2.35,
        };
        repo.update_stats(cluster.id, &stats, Some("SaaS:seed"), later)
            .unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 1);
        let updated = &all[0];
        assert_eq!(updated.mention_count, 4);
        assert_eq!(updated.title, "Onboarding confusion");
        assert_eq!(updated.summary, "summary");
        assert_eq!(updated.cluster_key.as_deref(), Some("SaaS:seed"));
        assert_eq!(updated.updated_at.timestamp_millis(), later.timestamp_millis());
        assert_eq!(
            updated.created_at.timestamp_millis(),
            cluster.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_cluster_update_without_key_keeps_existing_key() {
        let repo = ClusterRepository::new(make_db());
        let cluster = make_cluster("Slow payouts", "FinTech", Some("FinTech:abc"));
        repo.insert(&cluster).unwrap();

        repo.update_stats(cluster.id, &cluster.stats(), None, Utc::now())
            .unwrap();
        let found = repo.find_by_key("FinTech", "FinTech:abc").unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_cluster_update_text() {
        let repo = ClusterRepository::new(make_db());
        let cluster = make_cluster("slow payouts to sellers", "FinTech", Some("FinTech:abc"));
        repo.insert(&cluster).unwrap();

        repo.update_text(cluster.id, "Slow payouts", "Sellers wait days for money.")
            .unwrap();
        let found = repo.find_by_key("FinTech", "FinTech:abc").unwrap().unwrap();
        assert_eq!(found.title, "Slow payouts");
        assert_eq!(found.summary, "Sellers wait days for money.");
        assert_eq!(found.mention_count, cluster.mention_count);

        assert!(repo.update_text(Uuid::new_v4(), "x", "y").is_err());
    }

    #[test]
    fn test_cluster_update_missing_row_errors() {
        let repo = ClusterRepository::new(make_db());
        let stats = ClusterStats {
            mention_count: 1,
            avg_confidence: 0.5,
            recency_score: 1.0,
            rank_score: 0.85,
        };
        let result = repo.update_stats(Uuid::new_v4(), &stats, None, Utc::now());
        assert!(result.is_err());
    }
}
