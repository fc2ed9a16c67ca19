//! Greedy seed grouping of problem statements by shared words.
//!
//! Candidates are visited in input order. Each unassigned candidate seeds a
//! new group and pulls in every later unassigned candidate similar to the
//! seed. Similarity is checked against the seed only, so two members of a
//! group need not be similar to each other.

use squarium_core::types::ProblemCandidate;

/// Words must be longer than this many characters to count.
const MIN_WORD_CHARS: usize = 3;
/// Shared-word count at which two statements are similar.
const MIN_SHARED_WORDS: usize = 2;

/// Groups statements within one category.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityGrouper;

impl SimilarityGrouper {
    /// Group candidates, preserving input order within and across groups.
    pub fn group<'a>(&self, candidates: &'a [ProblemCandidate]) -> Vec<Vec<&'a ProblemCandidate>> {
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        self.group_indices(&texts)
            .into_iter()
            .map(|group| group.into_iter().map(|i| &candidates[i]).collect())
            .collect()
    }

    /// Group statements, returning indices into `texts`.
    pub fn group_indices(&self, texts: &[&str]) -> Vec<Vec<usize>> {
        let words: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();
        let mut assigned = vec![false; texts.len()];
        let mut groups = Vec::new();

        for seed in 0..texts.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut group = vec![seed];

            for other in (seed + 1)..texts.len() {
                if !assigned[other] && self.words_similar(&words[seed], &words[other]) {
                    assigned[other] = true;
                    group.push(other);
                }
            }
            groups.push(group);
        }

        groups
    }

    /// Whether `candidate` is similar to `seed`.
    pub fn are_similar(&self, seed: &str, candidate: &str) -> bool {
        self.words_similar(&tokenize(seed), &tokenize(candidate))
    }

    /// Counts seed words (repeats included) that are long enough and occur
    /// anywhere in the candidate.
    fn words_similar(&self, seed: &[String], candidate: &[String]) -> bool {
        let shared = seed
            .iter()
            .filter(|w| w.chars().count() > MIN_WORD_CHARS && candidate.contains(w))
            .count();
        shared >= MIN_SHARED_WORDS
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn candidate(text: &str) -> ProblemCandidate {
        ProblemCandidate {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            comment_id: None,
            text: text.to_string(),
            confidence: 0.8,
            category: "SaaS".to_string(),
            example_quote: String::new(),
            embedding: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_two_shared_long_words_are_similar() {
        let grouper = SimilarityGrouper::default();
        assert!(grouper.are_similar(
            "Onboarding flow is confusing",
            "the onboarding flow confuses users"
        ));
    }

    #[test]
    fn test_case_insensitive() {
        let grouper = SimilarityGrouper::default();
        assert!(grouper.are_similar("BILLING Invoices late", "billing invoices are late"));
    }

    #[test]
    fn test_exact_words_only_no_stemming() {
        let grouper = SimilarityGrouper::default();
        // Only "onboarding" matches; "confusing" and "confuses" differ.
        assert!(!grouper.are_similar(
            "onboarding flow is confusing",
            "the onboarding process confuses users"
        ));
    }

    #[test]
    fn test_short_words_do_not_count() {
        let grouper = SimilarityGrouper::default();
        // "the", "app", "is", "too" are all three characters or fewer.
        assert!(!grouper.are_similar("the app is too", "the app is too"));
        assert!(!grouper.are_similar("app slow", "app slow"));
    }

    #[test]
    fn test_word_length_threshold() {
        let grouper = SimilarityGrouper::default();
        // Four characters is enough; the non-ASCII word counts by chars.
        assert!(grouper.are_similar("slow sync", "sync is slow"));
        assert!(grouper.are_similar("café menü", "menü café"));
        assert!(!grouper.are_similar("slow app", "app is slow"));
    }

    #[test]
    fn test_repeated_seed_words_count_again() {
        let grouper = SimilarityGrouper::default();
        assert!(grouper.are_similar("sync sync", "sync broke"));
    }

    #[test]
    fn test_similarity_is_seed_directed() {
        let grouper = SimilarityGrouper::default();
        assert!(grouper.are_similar("export export", "export"));
        assert!(!grouper.are_similar("export", "export export"));
    }

    #[test]
    fn test_groups_similar_and_separates_unrelated() {
        let grouper = SimilarityGrouper::default();
        let candidates = vec![
            candidate("onboarding flow is confusing"),
            candidate("pricing is too expensive"),
            candidate("confusing onboarding flow for teams"),
        ];
        let groups = grouper.group(&candidates);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][0].id, candidates[0].id);
        assert_eq!(groups[0][1].id, candidates[2].id);
        assert_eq!(groups[1].len(), 1);
        assert_eq!(groups[1][0].id, candidates[1].id);
    }

    #[test]
    fn test_grouping_is_not_transitive() {
        let grouper = SimilarityGrouper::default();
        let texts = [
            "alpha beta gamma delta",
            "alpha beta zeta theta",
            "gamma delta omega sigma",
            "zeta theta omega sigma",
        ];
        // Seed 0 pulls in 1 and 2; 3 is similar to 1 and 2 but not to 0.
        assert_eq!(grouper.group_indices(&texts), vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn test_groups_are_disjoint_and_cover_input() {
        let grouper = SimilarityGrouper::default();
        let texts = [
            "slow search results today",
            "search results slow again",
            "billing page crashes",
            "billing page crashes often",
            "nothing related here",
        ];
        let groups = grouper.group_indices(&texts);
        let mut seen: Vec<usize> = groups.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert!(groups.iter().all(|g| !g.is_empty()));
    }

    #[test]
    fn test_empty_input() {
        let grouper = SimilarityGrouper::default();
        assert!(grouper.group(&[]).is_empty());
    }
}
