//! Store collaborators.
//!
//! The recommendation engine only reads through [`RatingStore`]. Everything
//! the HTTP surface writes goes through [`CatalogStore`]. Both are implemented
//! by an in-memory store (default) and a PostgreSQL store.
use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Movie, MovieId, NewMovie, NewUser, Rating, RatingRecord, User, UserId},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{create_pool, PgStore};

/// Read access the recommendation engine needs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Every rating recorded, in insertion order
    async fn list_all_ratings(&self) -> AppResult<Vec<RatingRecord>>;

    /// The full movie catalog
    async fn list_all_movies(&self) -> AppResult<Vec<Movie>>;

    /// Ratings of a single user
    async fn list_ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingRecord>>;
}

/// Users, movies and rating writes
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn get_user(&self, user_id: UserId) -> AppResult<Option<User>>;

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie>;

    async fn get_movie(&self, movie_id: MovieId) -> AppResult<Option<Movie>>;

    /// A page of the catalog ordered by id
    async fn list_movies(&self, skip: usize, limit: usize) -> AppResult<Vec<Movie>>;

    /// Records a rating, replacing any earlier score for the same pair
    async fn upsert_rating(&self, rating: Rating) -> AppResult<Rating>;

    /// Removes all users, movies and ratings
    async fn reset(&self) -> AppResult<()>;
}
