use std::collections::HashMap;

use crate::models::UserId;

use super::RatingMatrix;

/// Result of comparing the target user against everyone else
#[derive(Debug, Clone, PartialEq)]
pub enum SimilarityOutcome {
    /// The target has no row in the matrix, or an all-zero one.
    TargetUnrated,
    /// Cosine similarity of every other non-empty row against the target
    Scores(HashMap<UserId, f64>),
}

/// Cosine similarity of two equal-length vectors.
///
/// Returns `None` when either vector has zero magnitude. Absent ratings are
/// plain 0.0 components, so users with disjoint rating sets score 0.0.
///
/// Each vector is divided by its largest absolute component first. Cosine is
/// invariant under positive scaling, and the scaled components lie in
/// [-1.0, 1.0], so the sums neither overflow nor underflow for any finite input.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    let scale_a = max_abs(a)?;
    let scale_b = max_abs(b)?;

    let mut dot_product = 0.0;
    let mut norm_sq_a = 0.0;
    let mut norm_sq_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = x / scale_a;
        let y = y / scale_b;
        dot_product += x * y;
        norm_sq_a += x * x;
        norm_sq_b += y * y;
    }

    let similarity = dot_product / (norm_sq_a * norm_sq_b).sqrt();
    similarity
        .is_finite()
        .then(|| similarity.clamp(-1.0, 1.0))
}

/// Largest absolute component, `None` for an all-zero vector
fn max_abs(values: &[f64]) -> Option<f64> {
    let max = values.iter().fold(0.0_f64, |max, value| max.max(value.abs()));
    (max > 0.0).then_some(max)
}

/// Scores every other user in the matrix against `target`.
///
/// The target itself never appears in the result, nor does any user whose row
/// is all zeros.
pub fn score_users(matrix: &RatingMatrix, target: UserId) -> SimilarityOutcome {
    let target_row = match matrix.row(target) {
        Some(row) if row.iter().any(|score| *score != 0.0) => row,
        _ => {
            tracing::debug!(user_id = target, "Target user has no ratings");
            return SimilarityOutcome::TargetUnrated;
        }
    };

    let scores: HashMap<UserId, f64> = matrix
        .users()
        .iter()
        .filter(|user_id| **user_id != target)
        .filter_map(|user_id| {
            let row = matrix.row(*user_id)?;
            cosine_similarity(target_row, row).map(|similarity| (*user_id, similarity))
        })
        .collect();

    tracing::debug!(
        user_id = target,
        candidates = scores.len(),
        "Computed user similarities"
    );

    SimilarityOutcome::Scores(scores)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::rating;
    use super::*;

    fn scores(outcome: SimilarityOutcome) -> HashMap<UserId, f64> {
        match outcome {
            SimilarityOutcome::Scores(scores) => scores,
            SimilarityOutcome::TargetUnrated => panic!("expected scores"),
        }
    }

    #[test]
    fn test_cosine_similarity_basic() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), Some(0.0));
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), None);

        let value = cosine_similarity(&[3.0, 4.0], &[4.0, 3.0]).unwrap();
        assert!((value - 0.96).abs() < 1e-12);
    }

    #[test]
    fn test_identical_ratings_are_exactly_one() {
        let records = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 3.0),
            rating(1, 3, 4.5),
            rating(2, 1, 5.0),
            rating(2, 2, 3.0),
            rating(2, 3, 4.5),
        ];
        let matrix = RatingMatrix::build(&records).unwrap();
        let scores = scores(score_users(&matrix, 1));

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[&2], 1.0);
    }

    fn identical_pair(score: f64) -> RatingMatrix {
        let records = vec![
            rating(1, 1, score),
            rating(1, 2, score),
            rating(2, 1, score),
            rating(2, 2, score),
        ];
        RatingMatrix::build(&records).unwrap()
    }

    #[test]
    fn test_huge_identical_ratings_stay_exactly_one() {
        let scores = scores(score_users(&identical_pair(1e200), 1));
        assert_eq!(scores[&2], 1.0);
    }

    #[test]
    fn test_tiny_identical_ratings_stay_exactly_one() {
        let scores = scores(score_users(&identical_pair(1e-170), 1));
        assert_eq!(scores[&2], 1.0);
    }

    #[test]
    fn test_extreme_magnitudes_stay_in_range() {
        let value = cosine_similarity(&[f64::MAX, -f64::MAX, 1.0], &[-f64::MAX, f64::MAX, 0.0])
            .unwrap();
        assert!(value.is_finite());
        assert!((-1.0..=1.0).contains(&value));
        assert!((value + 1.0).abs() < 1e-12);

        assert_eq!(
            cosine_similarity(&[f64::MIN_POSITIVE, 0.0], &[5e-324, 0.0]),
            Some(1.0)
        );
    }

    #[test]
    fn test_self_is_excluded() {
        let records = vec![rating(1, 1, 4.0), rating(2, 1, 2.0), rating(3, 2, 5.0)];
        let matrix = RatingMatrix::build(&records).unwrap();
        let scores = scores(score_users(&matrix, 1));

        assert!(!scores.contains_key(&1));
        assert_eq!(scores[&2], 1.0);
        assert_eq!(scores[&3], 0.0);
    }

    #[test]
    fn test_disjoint_ratings_score_zero() {
        let records = vec![
            rating(1, 1, 5.0),
            rating(2, 2, 4.0),
            rating(3, 3, 3.0),
            rating(3, 4, 1.0),
        ];
        let matrix = RatingMatrix::build(&records).unwrap();
        let scores = scores(score_users(&matrix, 1));

        assert_eq!(scores.len(), 2);
        assert!(scores.values().all(|s| *s == 0.0));
    }

    #[test]
    fn test_unrated_target_short_circuits() {
        let records = vec![rating(2, 1, 4.0)];
        let matrix = RatingMatrix::build(&records).unwrap();
        assert_eq!(score_users(&matrix, 1), SimilarityOutcome::TargetUnrated);

        let zero_only = vec![rating(1, 1, 0.0), rating(2, 1, 4.0)];
        let matrix = RatingMatrix::build(&zero_only).unwrap();
        assert_eq!(score_users(&matrix, 1), SimilarityOutcome::TargetUnrated);
    }

    #[test]
    fn test_all_zero_rows_are_skipped() {
        let records = vec![rating(1, 1, 4.0), rating(2, 1, 0.0), rating(3, 1, 1.0)];
        let matrix = RatingMatrix::build(&records).unwrap();
        let scores = scores(score_users(&matrix, 1));

        assert!(!scores.contains_key(&2));
        assert_eq!(scores[&3], 1.0);
    }
}
