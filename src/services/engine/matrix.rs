use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{MovieId, RatingRecord, UserId};

use super::EngineError;

/// Dense user x movie rating matrix.
///
/// Rows are users and columns are movies, both ordered by ascending id.
/// A cell holds 0.0 when no rating was recorded. Whether a user rated a movie
/// is tracked separately, so a recorded score of 0.0 still counts as rated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingMatrix {
    users: Vec<UserId>,
    movies: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    cells: Vec<Vec<f64>>,
    rated: Vec<BTreeSet<usize>>,
}

impl RatingMatrix {
    /// Builds the matrix from the full rating collection.
    ///
    /// If a (user, movie) pair appears more than once the last record wins;
    /// scores are never averaged.
    pub fn build(records: &[RatingRecord]) -> Result<Self, EngineError> {
        let mut observed: BTreeMap<(UserId, MovieId), f64> = BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            let user_id = record.user_id.ok_or(EngineError::MissingUserId { index })?;
            let movie_id = record
                .movie_id
                .ok_or(EngineError::MissingMovieId { index })?;
            if !record.score.is_finite() {
                return Err(EngineError::NonFiniteScore { index });
            }
            observed.insert((user_id, movie_id), record.score);
        }

        let users: Vec<UserId> = observed
            .keys()
            .map(|(user_id, _)| *user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let movies: Vec<MovieId> = observed
            .keys()
            .map(|(_, movie_id)| *movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let user_index: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(row, id)| (*id, row)).collect();
        let movie_index: HashMap<MovieId, usize> =
            movies.iter().enumerate().map(|(col, id)| (*id, col)).collect();

        let mut cells = vec![vec![0.0; movies.len()]; users.len()];
        let mut rated = vec![BTreeSet::new(); users.len()];

        for ((user_id, movie_id), score) in observed {
            let row = user_index[&user_id];
            let col = movie_index[&movie_id];
            cells[row][col] = score;
            rated[row].insert(col);
        }

        tracing::debug!(
            users = users.len(),
            movies = movies.len(),
            records = records.len(),
            "Built rating matrix"
        );

        Ok(Self {
            users,
            movies,
            user_index,
            movie_index,
            cells,
            rated,
        })
    }

    /// User ids in row order
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Movie ids in column order
    pub fn movies(&self) -> &[MovieId] {
        &self.movies
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn user_row(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn movie_column(&self, movie_id: MovieId) -> Option<usize> {
        self.movie_index.get(&movie_id).copied()
    }

    /// The user's rating vector over all movie columns
    pub fn row(&self, user_id: UserId) -> Option<&[f64]> {
        self.user_row(user_id).map(|row| self.cells[row].as_slice())
    }

    /// Score for a (user, movie) pair; 0.0 when unrated or unknown.
    pub fn score(&self, user_id: UserId, movie_id: MovieId) -> f64 {
        match (self.user_row(user_id), self.movie_column(movie_id)) {
            (Some(row), Some(col)) => self.cells[row][col],
            _ => 0.0,
        }
    }

    /// Movies the user has a recorded rating for, with their scores
    pub fn rated_by(&self, user_id: UserId) -> Vec<(MovieId, f64)> {
        match self.user_row(user_id) {
            Some(row) => self.rated[row]
                .iter()
                .map(|col| (self.movies[*col], self.cells[row][*col]))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of distinct users that rated each movie
    pub fn rating_counts(&self) -> HashMap<MovieId, usize> {
        let mut counts: HashMap<MovieId, usize> = HashMap::new();
        for columns in &self.rated {
            for col in columns {
                *counts.entry(self.movies[*col]).or_default() += 1;
            }
        }
        counts
    }
}
