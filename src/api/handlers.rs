use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Movie, MovieId, NewMovie, NewUser, Rating, User, UserId},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_page_size")]
    pub limit: usize,
}

fn default_page_size() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RateMovieRequest {
    pub movie_id: MovieId,
    pub rating: f64,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            user_id: rating.user_id,
            movie_id: rating.movie_id,
            rating: rating.score,
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Register a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    request.validate().map_err(AppError::InvalidInput)?;
    let user = state.catalog.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Page through the movie catalog
pub async fn get_movies(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.catalog.list_movies(page.skip, page.limit).await?;
    Ok(Json(movies))
}

/// Add a movie to the catalog
pub async fn create_movie(
    State(state): State<AppState>,
    Json(request): Json<NewMovie>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    request.validate().map_err(AppError::InvalidInput)?;
    let movie = state.catalog.create_movie(request).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// Record (or replace) a user's rating for a movie
pub async fn rate_movie(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(request): Json<RateMovieRequest>,
) -> AppResult<(StatusCode, Json<RatingResponse>)> {
    if !request.rating.is_finite() {
        return Err(AppError::InvalidInput("Rating must be a finite number".to_string()));
    }

    ensure_user_exists(&state, user_id).await?;
    if state.catalog.get_movie(request.movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Movie {}", request.movie_id)));
    }

    let rating = state
        .catalog
        .upsert_rating(Rating::new(user_id, request.movie_id, request.rating))
        .await?;

    tracing::info!(
        user_id = user_id,
        movie_id = rating.movie_id,
        rating = rating.score,
        "Rating recorded"
    );

    Ok((StatusCode::CREATED, Json(RatingResponse::from(rating))))
}

/// Recommend movies to a user
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let limit = query.limit.unwrap_or(state.default_limit);
    if limit > state.max_limit {
        return Err(AppError::InvalidInput(format!(
            "limit must be at most {}",
            state.max_limit
        )));
    }

    ensure_user_exists(&state, user_id).await?;

    tracing::info!(
        request_id = %request_id,
        user_id = user_id,
        limit = limit,
        "Processing recommendation request"
    );

    let movies = state
        .recommendations
        .recommend_movies(user_id, limit)
        .await?;

    Ok(Json(movies))
}

/// Drop all users, movies and ratings
pub async fn reset(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.catalog.reset().await?;
    Ok(Json(json!({ "message": "Database reset successfully" })))
}

async fn ensure_user_exists(state: &AppState, user_id: UserId) -> AppResult<()> {
    match state.catalog.get_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("User {}", user_id))),
    }
}
