use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};

/// A validated rating: one user's score for one movie.
///
/// The score is a magnitude; its nominal 1.0-5.0 range is not enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub score: f64,
}

/// A rating as read from the store, before identifiers are checked.
///
/// Rows with a missing id are a precondition violation and are rejected by
/// the matrix builder instead of being skipped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct RatingRecord {
    pub user_id: Option<UserId>,
    pub movie_id: Option<MovieId>,
    pub score: f64,
}

impl From<Rating> for RatingRecord {
    fn from(rating: Rating) -> Self {
        Self {
            user_id: Some(rating.user_id),
            movie_id: Some(rating.movie_id),
            score: rating.score,
        }
    }
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, score: f64) -> Self {
        Self {
            user_id,
            movie_id,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_into_record() {
        let record = RatingRecord::from(Rating::new(7, 42, 4.5));
        assert_eq!(record.user_id, Some(7));
        assert_eq!(record.movie_id, Some(42));
        assert_eq!(record.score, 4.5);
    }

    #[test]
    fn test_record_deserializes_missing_ids() {
        let record: RatingRecord = serde_json::from_str(r#"{"score": 3.0}"#).unwrap();
        assert_eq!(record.user_id, None);
        assert_eq!(record.movie_id, None);
    }
}
