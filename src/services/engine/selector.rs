use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{Movie, MovieId, UserId};

use super::{RatingMatrix, SimilarityOutcome};

/// Policy knobs for the selector
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSettings {
    /// A neighbour's score must reach this to count as "liked"
    pub liked_threshold: f64,
    /// Neighbours must have similarity strictly above this
    pub min_similarity: f64,
    /// Consult at most this many neighbours; `None` consults all of them
    pub max_similar_users: Option<usize>,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            liked_threshold: 4.0,
            min_similarity: 0.0,
            max_similar_users: None,
        }
    }
}

/// Which policy branch produced a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Cold start: the target has nothing rated
    Popular,
    /// Picks from similar users, padded with popular movies if short
    SimilarUsers,
    /// The target has ratings but no neighbour contributed a movie
    PopularFallback,
}

/// Produces the ordered recommendation list for `target`.
///
/// The result never contains a movie the target rated, never repeats a movie
/// and holds at most `limit` ids. It is shorter only when the catalog runs
/// out of unrated movies.
pub fn select(
    target: UserId,
    matrix: &RatingMatrix,
    outcome: &SimilarityOutcome,
    catalog: &[Movie],
    limit: usize,
    settings: &SelectorSettings,
) -> Vec<MovieId> {
    select_with_branch(target, matrix, outcome, catalog, limit, settings).0
}

/// Same as [`select`], also reporting the branch taken
pub fn select_with_branch(
    target: UserId,
    matrix: &RatingMatrix,
    outcome: &SimilarityOutcome,
    catalog: &[Movie],
    limit: usize,
    settings: &SelectorSettings,
) -> (Vec<MovieId>, Branch) {
    let rated: HashSet<MovieId> = matrix
        .rated_by(target)
        .into_iter()
        .map(|(movie_id, _)| movie_id)
        .collect();
    let in_catalog: HashSet<MovieId> = catalog.iter().map(|movie| movie.id).collect();

    let mut picks = Recommendations::new(limit);

    let branch = match outcome {
        SimilarityOutcome::TargetUnrated => Branch::Popular,
        SimilarityOutcome::Scores(scores) => {
            let neighbours = rank_neighbours(scores, settings);
            for (user_id, similarity) in &neighbours {
                if picks.is_full() {
                    break;
                }
                for movie_id in liked_movies(matrix, *user_id, settings.liked_threshold) {
                    if rated.contains(&movie_id) || !in_catalog.contains(&movie_id) {
                        continue;
                    }
                    if picks.push(movie_id) {
                        tracing::trace!(
                            user_id = target,
                            neighbour = user_id,
                            similarity = similarity,
                            movie_id = movie_id,
                            "Picked from similar user"
                        );
                    }
                    if picks.is_full() {
                        break;
                    }
                }
            }

            if picks.is_empty() {
                Branch::PopularFallback
            } else {
                Branch::SimilarUsers
            }
        }
    };

    let personalised = picks.len();
    for movie_id in popularity_ranking(matrix, catalog) {
        if picks.is_full() {
            break;
        }
        if !rated.contains(&movie_id) {
            picks.push(movie_id);
        }
    }

    tracing::debug!(
        user_id = target,
        limit = limit,
        branch = ?branch,
        personalised = personalised,
        padded = picks.len() - personalised,
        "Selected recommendations"
    );

    (picks.into_inner(), branch)
}

/// Catalog movies by descending rating count, ties by ascending id
pub fn popularity_ranking(matrix: &RatingMatrix, catalog: &[Movie]) -> Vec<MovieId> {
    let counts = matrix.rating_counts();
    let mut ranked: Vec<(MovieId, usize)> = catalog
        .iter()
        .map(|movie| (movie.id, counts.get(&movie.id).copied().unwrap_or(0)))
        .collect();

    ranked.sort_by(|(a_id, a_count), (b_id, b_count)| {
        b_count.cmp(a_count).then_with(|| a_id.cmp(b_id))
    });
    ranked.dedup_by_key(|(movie_id, _)| *movie_id);

    ranked.into_iter().map(|(movie_id, _)| movie_id).collect()
}

/// Neighbours above the similarity floor, most similar first, ties by id
fn rank_neighbours(
    scores: &HashMap<UserId, f64>,
    settings: &SelectorSettings,
) -> Vec<(UserId, f64)> {
    let mut neighbours: Vec<(UserId, f64)> = scores
        .iter()
        .filter(|(_, similarity)| **similarity > settings.min_similarity)
        .map(|(user_id, similarity)| (*user_id, *similarity))
        .collect();

    neighbours.sort_by(|(a_id, a_sim), (b_id, b_sim)| {
        b_sim
            .partial_cmp(a_sim)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_id.cmp(b_id))
    });

    if let Some(max) = settings.max_similar_users {
        neighbours.truncate(max);
    }

    neighbours
}

/// Movies a user scored at or above `threshold`, best first, ties by id
fn liked_movies(matrix: &RatingMatrix, user_id: UserId, threshold: f64) -> Vec<MovieId> {
    let mut liked: Vec<(MovieId, f64)> = matrix
        .rated_by(user_id)
        .into_iter()
        .filter(|(_, score)| *score >= threshold)
        .collect();

    liked.sort_by(|(a_id, a_score), (b_id, b_score)| {
        b_score
            .partial_cmp(a_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a_id.cmp(b_id))
    });

    liked.into_iter().map(|(movie_id, _)| movie_id).collect()
}

/// Bounded, de-duplicated, insertion-ordered list of movie ids
struct Recommendations {
    limit: usize,
    order: Vec<MovieId>,
    seen: HashSet<MovieId>,
}

impl Recommendations {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            order: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.order.len() >= self.limit
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns false if the list is full or already holds the id
    fn push(&mut self, movie_id: MovieId) -> bool {
        if self.is_full() || !self.seen.insert(movie_id) {
            return false;
        }
        self.order.push(movie_id);
        true
    }

    fn into_inner(self) -> Vec<MovieId> {
        self.order
    }
}
