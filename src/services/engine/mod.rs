//! User-based collaborative filtering.
//!
//! The engine is three pure stages run in order on every request:
//!
//! 1. [`RatingMatrix::build`] turns the raw rating records into a dense
//!    user x movie matrix (0.0 = no rating recorded).
//! 2. [`similarity::score_users`] computes cosine similarity between the
//!    target user's row and every other non-empty row.
//! 3. [`selector::select`] applies the cold-start, similar-users and
//!    popularity-padding policy to produce the final movie ids.
//!
//! None of the stages keep state between calls.

use thiserror::Error;

use crate::models::{Movie, MovieId, RatingRecord, UserId};

pub mod matrix;
pub mod selector;
pub mod similarity;

pub use matrix::RatingMatrix;
pub use selector::SelectorSettings;
pub use similarity::SimilarityOutcome;

/// Error types for the recommendation engine
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("rating record {index} is missing a user id")]
    MissingUserId { index: usize },
    #[error("rating record {index} is missing a movie id")]
    MissingMovieId { index: usize },
    #[error("rating record {index} has a non-finite score")]
    NonFiniteScore { index: usize },
}

/// Runs the full pipeline over an in-memory snapshot.
pub fn recommend(
    user_id: UserId,
    records: &[RatingRecord],
    catalog: &[Movie],
    limit: usize,
    settings: &SelectorSettings,
) -> Result<Vec<MovieId>, EngineError> {
    let matrix = RatingMatrix::build(records)?;
    let outcome = similarity::score_users(&matrix, user_id);
    Ok(selector::select(
        user_id, &matrix, &outcome, catalog, limit, settings,
    ))
}


#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use proptest::prelude::*;

    use super::fixtures::{catalog, movie, rating};
    use super::*;

    #[test]
    fn test_similar_user_pick_ranks_before_padding() {
        let catalog = vec![movie(1, "Sci-Fi"), movie(2, "Action"), movie(3, "Comedy")];
        let records = vec![rating(10, 1, 5.0), rating(20, 1, 5.0), rating(20, 2, 4.5)];

        let result =
            recommend(10, &records, &catalog, 5, &SelectorSettings::default()).unwrap();

        assert_eq!(result, vec![2, 3]);
    }

    #[test]
    fn test_guarantees_hold_on_mixed_history() {
        let catalog = catalog(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let records = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 3.0),
            rating(1, 3, 1.0),
            rating(2, 1, 4.0),
            rating(2, 4, 5.0),
            rating(2, 5, 4.0),
            rating(3, 2, 2.0),
            rating(3, 6, 4.5),
            rating(3, 4, 2.0),
            rating(4, 7, 5.0),
        ];
        let rated: HashSet<MovieId> = [1, 2, 3].into_iter().collect();

        for limit in 0..10 {
            let result =
                recommend(1, &records, &catalog, limit, &SelectorSettings::default()).unwrap();
            let unique: HashSet<MovieId> = result.iter().copied().collect();

            assert!(result.len() <= limit);
            assert_eq!(unique.len(), result.len());
            assert!(unique.is_disjoint(&rated));
            assert_eq!(result.len(), limit.min(catalog.len() - rated.len()));
        }
    }

    #[test]
    fn test_idempotent() {
        let catalog = catalog(&[1, 2, 3, 4]);
        let records = vec![
            rating(1, 1, 4.0),
            rating(2, 1, 4.0),
            rating(2, 2, 5.0),
            rating(3, 3, 4.0),
        ];
        let settings = SelectorSettings::default();

        let first = recommend(1, &records, &catalog, 3, &settings).unwrap();
        let second = recommend(1, &records, &catalog, 3, &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_record_fails_fast() {
        let mut bad = rating(1, 1, 4.0);
        bad.movie_id = None;
        let result = recommend(1, &[bad], &catalog(&[1]), 5, &SelectorSettings::default());
        assert_eq!(result, Err(EngineError::MissingMovieId { index: 0 }));
    }

    fn score() -> impl Strategy<Value = f64> {
        prop_oneof![Just(0.0), Just(4.0), Just(-4.0), -5.0..5.0f64]
    }

    proptest! {
        #[test]
        fn test_guarantees_hold_for_generated_histories(
            raw in proptest::collection::vec((1i64..6, 1i64..10, score()), 0..40),
            ids in proptest::collection::btree_set(1i64..12, 0..12),
            limit in 0usize..15,
            target in 1i64..7,
            min_similarity in prop_oneof![Just(0.0), Just(-1.0), -1.0..1.0f64],
        ) {
            let records: Vec<RatingRecord> =
                raw.iter().map(|(u, m, s)| rating(*u, *m, *s)).collect();
            let ids: Vec<MovieId> = ids.into_iter().collect();
            let catalog = catalog(&ids);
            let settings = SelectorSettings {
                min_similarity,
                ..SelectorSettings::default()
            };

            let rated: BTreeSet<MovieId> = raw
                .iter()
                .filter(|(u, _, _)| *u == target)
                .map(|(_, m, _)| *m)
                .collect();
            let available = ids.iter().filter(|id| !rated.contains(id)).count();

            let result = recommend(target, &records, &catalog, limit, &settings).unwrap();
            let unique: HashSet<MovieId> = result.iter().copied().collect();

            prop_assert!(result.len() <= limit);
            prop_assert_eq!(unique.len(), result.len());
            prop_assert!(result.iter().all(|id| !rated.contains(id)));
            prop_assert!(result.iter().all(|id| ids.contains(id)));
            prop_assert_eq!(result.len(), limit.min(available));

            let again = recommend(target, &records, &catalog, limit, &settings).unwrap();
            prop_assert_eq!(result, again);
        }
    }
}
