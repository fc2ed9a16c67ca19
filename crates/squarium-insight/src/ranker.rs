//! Cluster statistics: mention count, mean confidence, recency, and rank.

use chrono::{DateTime, Utc};

use squarium_core::types::{ClusterStats, ProblemCandidate};

use crate::error::InsightError;

pub const MENTION_WEIGHT: f64 = 0.5;
pub const CONFIDENCE_WEIGHT: f64 = 0.3;
pub const RECENCY_WEIGHT: f64 = 0.2;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Computes [`ClusterStats`] for a group. Pure given `now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterRanker;

impl ClusterRanker {
    pub fn new() -> Self {
        Self
    }

    pub fn rank(
        &self,
        group: &[&ProblemCandidate],
        now: DateTime<Utc>,
    ) -> Result<ClusterStats, InsightError> {
        if group.is_empty() {
            return Err(InsightError::EmptyGroup);
        }

        let n = group.len() as f64;
        let avg_confidence = group.iter().map(|c| c.confidence).sum::<f64>() / n;

        let mean_millis = group
            .iter()
            .map(|c| c.created_at.timestamp_millis() as f64)
            .sum::<f64>()
            / n;
        let age_days = (now.timestamp_millis() as f64 - mean_millis) / MILLIS_PER_DAY;
        let recency_score = recency_score(age_days);

        let mention_count = group.len() as u32;
        Ok(ClusterStats {
            mention_count,
            avg_confidence,
            recency_score,
            rank_score: rank_score(mention_count, avg_confidence, recency_score),
        })
    }
}

/// Step function over mean age in days. Boundaries fall to the lower bracket.
pub fn recency_score(age_days: f64) -> f64 {
    if age_days < 7.0 {
        1.0
    } else if age_days < 14.0 {
        0.7
    } else {
        0.4
    }
}

pub fn rank_score(mention_count: u32, avg_confidence: f64, recency_score: f64) -> f64 {
    MENTION_WEIGHT * mention_count as f64
        + CONFIDENCE_WEIGHT * avg_confidence
        + RECENCY_WEIGHT * recency_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn candidate(confidence: f64, created_at: DateTime<Utc>) -> ProblemCandidate {
        ProblemCandidate {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            comment_id: None,
            text: "checkout keeps failing".to_string(),
            confidence,
            category: "E-commerce".to_string(),
            example_quote: String::new(),
            embedding: None,
            created_at,
        }
    }

    #[test]
    fn test_single_member() {
        let now = Utc::now();
        let c = candidate(0.9, now);
        let stats = ClusterRanker::new().rank(&[&c], now).unwrap();
        assert_eq!(stats.mention_count, 1);
        assert_eq!(stats.avg_confidence, 0.9);
        assert_eq!(stats.recency_score, 1.0);
        assert_eq!(stats.rank_score, 0.5 * 1.0 + 0.3 * 0.9 + 0.2 * 1.0);
    }

    #[test]
    fn test_average_confidence_and_rank_formula() {
        let now = Utc::now();
        let members = [
            candidate(0.4, now - Duration::days(1)),
            candidate(0.6, now - Duration::days(2)),
            candidate(0.8, now - Duration::days(3)),
            candidate(1.0, now - Duration::days(4)),
        ];
        let refs: Vec<&ProblemCandidate> = members.iter().collect();
        let stats = ClusterRanker::new().rank(&refs, now).unwrap();

        let expected_avg = (0.4 + 0.6 + 0.8 + 1.0) / 4.0;
        assert_eq!(stats.mention_count, 4);
        assert_eq!(stats.avg_confidence, expected_avg);
        assert_eq!(
            stats.rank_score,
            0.5 * 4.0 + 0.3 * stats.avg_confidence + 0.2 * stats.recency_score
        );
    }

    #[test]
    fn test_recency_boundaries() {
        assert_eq!(recency_score(0.0), 1.0);
        assert_eq!(recency_score(6.99), 1.0);
        assert_eq!(recency_score(7.0), 0.7);
        assert_eq!(recency_score(13.99), 0.7);
        assert_eq!(recency_score(14.0), 0.4);
        assert_eq!(recency_score(400.0), 0.4);
    }

    #[test]
    fn test_recency_uses_mean_timestamp() {
        let now = Utc::now();
        // Mean age is exactly 7 days.
        let members = [
            candidate(0.5, now - Duration::days(2)),
            candidate(0.5, now - Duration::days(12)),
        ];
        let refs: Vec<&ProblemCandidate> = members.iter().collect();
        let stats = ClusterRanker::new().rank(&refs, now).unwrap();
        assert_eq!(stats.recency_score, 0.7);

        let old = candidate(0.5, now - Duration::days(14));
        let stats = ClusterRanker::new().rank(&[&old], now).unwrap();
        assert_eq!(stats.recency_score, 0.4);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let now = Utc::now();
        let c = candidate(0.7, now - Duration::hours(5));
        let ranker = ClusterRanker::new();
        assert_eq!(ranker.rank(&[&c], now).unwrap(), ranker.rank(&[&c], now).unwrap());
    }

    #[test]
    fn test_empty_group_is_error() {
        let result = ClusterRanker::new().rank(&[], Utc::now());
        assert!(matches!(result, Err(InsightError::EmptyGroup)));
    }
}
