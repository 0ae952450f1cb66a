use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, NewMovie, NewUser, Rating, RatingRecord, User, UserId},
};

use super::{CatalogStore, RatingStore};

/// Creates a PostgreSQL connection pool and applies pending migrations
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Unique constraint Postgres names for `users.username`
const USERS_USERNAME_KEY: &str = "users_username_key";

/// Store backed by the `users`, `movies` and `ratings` tables
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Connection-level failures mean the store is unreachable, not that the query is wrong.
fn classify(error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            tracing::warn!(error = %error, "Ratings store unavailable");
            AppError::StoreUnavailable(error.to_string())
        }
        other => AppError::Database(other),
    }
}

/// Maps a unique violation on `users` to the field that clashed
fn duplicate_user(constraint: Option<&str>) -> AppError {
    match constraint {
        Some(USERS_USERNAME_KEY) => AppError::InvalidInput("Username already taken".to_string()),
        _ => AppError::InvalidInput("Email already registered".to_string()),
    }
}

/// Pagination values must fit the BIGINT parameters of OFFSET/LIMIT
fn sql_count(value: usize, name: &str) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|_| AppError::InvalidInput(format!("{} is too large: {}", name, value)))
}

#[async_trait]
impl RatingStore for PgStore {
    async fn list_all_ratings(&self) -> AppResult<Vec<RatingRecord>> {
        sqlx::query_as::<_, RatingRecord>(
            r#"
            SELECT user_id, movie_id, rating AS score
            FROM ratings
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    async fn list_all_movies(&self) -> AppResult<Vec<Movie>> {
        sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, description, genre, release_year, created_at
            FROM movies
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    async fn list_ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingRecord>> {
        sqlx::query_as::<_, RatingRecord>(
            r#"
            SELECT user_id, movie_id, rating AS score
            FROM ratings
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .filter(|db| db.is_unique_violation())
                .map(|db| duplicate_user(db.constraint()));
            duplicate.unwrap_or_else(|| classify(e))
        })
    }

    async fn get_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn create_movie(&self, movie: NewMovie) -> AppResult<Movie> {
        sqlx::query_as::<_, Movie>(
            r#"
            INSERT INTO movies (title, description, genre, release_year)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, genre, release_year, created_at
            "#,
        )
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(&movie.genre)
        .bind(movie.release_year)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn get_movie(&self, movie_id: MovieId) -> AppResult<Option<Movie>> {
        sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, description, genre, release_year, created_at
            FROM movies
            WHERE id = $1
            "#,
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn list_movies(&self, skip: usize, limit: usize) -> AppResult<Vec<Movie>> {
        let offset = sql_count(skip, "skip")?;
        let limit = sql_count(limit, "limit")?;

        sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, description, genre, release_year, created_at
            FROM movies
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    async fn upsert_rating(&self, rating: Rating) -> AppResult<Rating> {
        sqlx::query(
            r#"
            INSERT INTO ratings (user_id, movie_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, movie_id)
            DO UPDATE SET rating = EXCLUDED.rating, updated_at = now()
            "#,
        )
        .bind(rating.user_id)
        .bind(rating.movie_id)
        .bind(rating.score)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(rating)
    }

    async fn reset(&self) -> AppResult<()> {
        sqlx::query("TRUNCATE ratings, movies, users RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        tracing::info!("Database reset");
        Ok(())
    }
}
