//! Read-only JSON endpoints backing the site's client-side features.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::application::blog::BlogError;
use crate::application::featured::FeaturedError;
use crate::application::repos::RepoError;
use crate::application::search::SearchError;

use super::error::{ApiError, codes};
use super::models::{SearchHit, StatsResponse};
use super::state::ApiState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
}

/// Current featured feed, reconciled against live view counts.
pub async fn featured_feed(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .featured
        .get_featured()
        .await
        .map_err(featured_to_api)?;
    Ok(Json(entries))
}

pub async fn search_posts(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.search.search(&query.q).await.map_err(search_to_api)?;
    let hits: Vec<SearchHit> = posts.iter().map(SearchHit::from_record).collect();
    Ok(Json(hits))
}

pub async fn site_stats(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let totals = state.blog.site_totals().await.map_err(blog_to_api)?;
    Ok(Json(StatsResponse::from_totals(totals)))
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

fn featured_to_api(err: FeaturedError) -> ApiError {
    match err {
        FeaturedError::Repo(err) => repo_to_api(err),
    }
}

fn search_to_api(err: SearchError) -> ApiError {
    match err {
        SearchError::Repo(err) => repo_to_api(err),
    }
}

fn blog_to_api(err: BlogError) -> ApiError {
    match err {
        BlogError::NotFound => ApiError::not_found("post not found"),
        BlogError::NotAuthor => ApiError::new(
            StatusCode::FORBIDDEN,
            codes::FORBIDDEN,
            "Only the author may modify this post",
            None,
        ),
        BlogError::Domain(err) => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(err.to_string()),
        ),
        BlogError::Repo(err) => repo_to_api(err),
    }
}
