use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{Movie, MovieId, UserId},
    services::engine::{self, SelectorSettings},
};

/// Generates movie recommendations from the ratings of all users
///
/// Every call reads a fresh snapshot from the store and rebuilds the rating
/// matrix; nothing is cached between calls.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn RatingStore>,
    settings: SelectorSettings,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn RatingStore>, settings: SelectorSettings) -> Self {
        Self { store, settings }
    }

    /// Ordered movie ids to recommend to `user_id`, at most `limit` of them
    pub async fn recommend(&self, user_id: UserId, limit: usize) -> AppResult<Vec<MovieId>> {
        let (movie_ids, _) = self.run(user_id, limit).await?;
        Ok(movie_ids)
    }

    /// Same as [`Self::recommend`] but resolves ids to catalog movies
    pub async fn recommend_movies(&self, user_id: UserId, limit: usize) -> AppResult<Vec<Movie>> {
        let (movie_ids, catalog) = self.run(user_id, limit).await?;

        let mut by_id: HashMap<MovieId, Movie> =
            catalog.into_iter().map(|movie| (movie.id, movie)).collect();

        Ok(movie_ids
            .iter()
            .filter_map(|movie_id| by_id.remove(movie_id))
            .collect())
    }

    /// Reads the snapshot and runs the engine, handing the catalog back to the caller
    async fn run(&self, user_id: UserId, limit: usize) -> AppResult<(Vec<MovieId>, Vec<Movie>)> {
        let start = Instant::now();

        let ratings = self.store.list_all_ratings().await?;
        let catalog = self.store.list_all_movies().await?;

        let movie_ids = engine::recommend(user_id, &ratings, &catalog, limit, &self.settings)?;

        tracing::info!(
            user_id = user_id,
            limit = limit,
            ratings = ratings.len(),
            catalog = catalog.len(),
            returned = movie_ids.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Generated recommendations"
        );

        Ok((movie_ids, catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockRatingStore;
    use crate::error::AppError;
    use crate::services::engine::fixtures::{catalog, rating};
    use crate::services::engine::EngineError;

    fn service(store: MockRatingStore) -> RecommendationService {
        RecommendationService::new(Arc::new(store), SelectorSettings::default())
    }

    #[tokio::test]
    async fn test_reads_fresh_snapshot_each_call() {
        let mut store = MockRatingStore::new();
        store
            .expect_list_all_ratings()
            .times(2)
            .returning(|| Ok(vec![rating(1, 1, 5.0), rating(2, 1, 5.0), rating(2, 2, 4.0)]));
        store
            .expect_list_all_movies()
            .times(2)
            .returning(|| Ok(catalog(&[1, 2, 3])));

        let service = service(store);
        let first = service.recommend(1, 5).await.unwrap();
        let second = service.recommend(1, 5).await.unwrap();

        assert_eq!(first, vec![2, 3]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_unchanged() {
        let mut store = MockRatingStore::new();
        store
            .expect_list_all_ratings()
            .returning(|| Err(AppError::StoreUnavailable("connection refused".to_string())));
        store.expect_list_all_movies().never();

        let result = service(store).recommend(1, 5).await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(msg)) if msg == "connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_rating_surfaces_as_engine_error() {
        let mut store = MockRatingStore::new();
        store.expect_list_all_ratings().returning(|| {
            let mut bad = rating(1, 1, 4.0);
            bad.user_id = None;
            Ok(vec![bad])
        });
        store
            .expect_list_all_movies()
            .returning(|| Ok(catalog(&[1])));

        let result = service(store).recommend(1, 5).await;
        assert!(matches!(
            result,
            Err(AppError::Engine(EngineError::MissingUserId { index: 0 }))
        ));
    }

    #[tokio::test]
    async fn test_recommend_movies_keeps_engine_order() {
        let mut store = MockRatingStore::new();
        store.expect_list_all_ratings().returning(|| {
            Ok(vec![
                rating(5, 3, 4.0),
                rating(6, 3, 4.0),
                rating(6, 2, 4.0),
            ])
        });
        store
            .expect_list_all_movies()
            .returning(|| Ok(catalog(&[1, 2, 3])));

        let movies = service(store).recommend_movies(1, 2).await.unwrap();
        let ids: Vec<MovieId> = movies.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_list() {
        let mut store = MockRatingStore::new();
        store.expect_list_all_ratings().returning(|| Ok(vec![]));
        store.expect_list_all_movies().returning(|| Ok(vec![]));

        let result = service(store).recommend(1, 5).await.unwrap();
        assert!(result.is_empty());
    }
}
