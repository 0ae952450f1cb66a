use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, NewMovie, NewUser, Rating, RatingRecord, User, UserId},
};

use super::{CatalogStore, RatingStore};

/// Process-local store used when no database is configured
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    users: BTreeMap<UserId, User>,
    movies: BTreeMap<MovieId, Movie>,
    ratings: Vec<Rating>,
    next_user_id: UserId,
    next_movie_id: MovieId,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RatingStore for InMemoryStore {
    async fn list_all_ratings(&self) -> AppResult<Vec<RatingRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.ratings.iter().copied().map(RatingRecord::from).collect())
    }

    async fn list_all_movies(&self) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.values().cloned().collect())
    }

    async fn list_ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .iter()
            .filter(|rating| rating.user_id == user_id)
            .copied()
            .map(RatingRecord::from)
            .collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::InvalidInput("Email already registered".to_string()));
        }
        if inner
            .users
            .values()
            .any(|existing| existing.username == user.username)
        {
            return Err(AppError::InvalidInput("Username already taken".to_string()));
        }

        inner.next_user_id += 1;
        let created = User {
            id: inner.next_user_id,
            username: user.username,
            email: user.email,
            created_at: Utc::now(),
        };
        inner.users.insert(created.id, created.clone());

        tracing::debug!(user_id = created.id, "Created user");
        Ok(created)
    }

    async fn get_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;

        inner.next_movie_id += 1;
        let created = Movie {
            id: inner.next_movie_id,
            title: movie.title,
            description: movie.description,
            genre: movie.genre,
            release_year: movie.release_year,
            created_at: Utc::now(),
        };
        inner.movies.insert(created.id, created.clone());

        tracing::debug!(movie_id = created.id, "Created movie");
        Ok(created)
    }

    async fn get_movie(&self, movie_id: MovieId) -> AppResult<Option<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.get(&movie_id).cloned())
    }

    async fn list_movies(&self, skip: usize, limit: usize) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.values().skip(skip).take(limit).cloned().collect())
    }

    async fn upsert_rating(&self, rating: Rating) -> AppResult<Rating> {
        let mut inner = self.inner.write().await;

        let existing = inner
            .ratings
            .iter()
            .position(|r| r.user_id == rating.user_id && r.movie_id == rating.movie_id);

        match existing {
            Some(index) => inner.ratings[index].score = rating.score,
            None => inner.ratings.push(rating),
        }

        Ok(rating)
    }

    async fn reset(&self) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        *inner = StoreInner::default();
        tracing::info!("In-memory store reset");
        Ok(())
    }
}
