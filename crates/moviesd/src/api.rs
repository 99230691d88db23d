//! HTTP routes over [`MovieService`].
//!
//! Every handler hands the blocking store call to `spawn_blocking` and maps
//! [`MovieError`] onto a status code with a JSON `{error, message}` body.

use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use movies_core::{GraphProjection, MovieDetails, MovieId, MovieKey, MoviePage, MovieSearchResult};
use movies_service::{MovieError, MovieService, PageRequest};
use movies_store::SqliteGraphStore;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

pub type SharedService = Arc<MovieService<SqliteGraphStore>>;

#[derive(Clone)]
pub struct AppState {
    service: SharedService,
}

pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/movie/released", get(update_released))
        .route("/movie/examplePage", get(query_page))
        .route("/movie/id/{id}", delete(delete_by_id))
        .route("/movie/{title}", get(fetch_details).delete(delete_by_title))
        .route("/movie/{title}/vote", post(vote))
        .route("/search", get(search))
        .route("/graph", get(graph))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Movie(MovieError),
    BadRequest(String),
    Worker(String),
}

impl From<MovieError> for ApiError {
    fn from(err: MovieError) -> Self {
        Self::Movie(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::Movie(err) => {
                let status = match &err {
                    MovieError::Validation(_) => StatusCode::BAD_REQUEST,
                    MovieError::NotFound(_) => StatusCode::NOT_FOUND,
                    MovieError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.kind(), err.to_string())
            }
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "validation", message),
            Self::Worker(message) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", message),
        };

        if status.is_server_error() {
            tracing::error!(error, %message, "request failed");
        }
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

async fn with_service<T, F>(state: AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&MovieService<SqliteGraphStore>) -> Result<T, MovieError> + Send + 'static,
{
    let service = state.service;
    let outcome = tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|err| ApiError::Worker(format!("movie task failed: {err}")))?;
    Ok(outcome?)
}

async fn fetch_details(
    State(state): State<AppState>,
    title: Result<Path<String>, PathRejection>,
) -> Result<Json<MovieDetails>, ApiError> {
    let Path(title) = title?;
    let details = with_service(state, move |service| service.fetch_details_by_title(&title)).await?;
    Ok(Json(details))
}

async fn vote(
    State(state): State<AppState>,
    title: Result<Path<String>, PathRejection>,
) -> Result<Json<u64>, ApiError> {
    let Path(title) = title?;
    let applied = with_service(state, move |service| service.vote_in_movie_by_title(&title)).await?;
    Ok(Json(applied))
}

#[derive(Debug, Deserialize)]
struct ReleasedParams {
    id: Option<MovieId>,
    title: Option<String>,
    released: Option<i64>,
}

async fn update_released(
    State(state): State<AppState>,
    params: Result<Query<ReleasedParams>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(params) = params?;
    // An id wins over a title when both are given.
    let key = match (params.id, params.title) {
        (Some(id), _) => MovieKey::Id(id),
        (None, Some(title)) => MovieKey::Title(title),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "either 'id' or 'title' is required".to_owned(),
            ));
        }
    };

    with_service(state, move |service| {
        service.update_released(&key, params.released)
    })
    .await?;
    Ok(StatusCode::OK)
}

async fn delete_by_title(
    State(state): State<AppState>,
    title: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(title) = title?;
    with_service(state, move |service| {
        service.delete_by_key(&MovieKey::Title(title))
    })
    .await?;
    Ok(StatusCode::OK)
}

async fn delete_by_id(
    State(state): State<AppState>,
    id: Result<Path<MovieId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    with_service(state, move |service| service.delete_by_key(&MovieKey::Id(id))).await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    #[serde(default)]
    title: String,
    sorter: Option<String>,
    page_size: u32,
    current_page: u32,
}

async fn query_page(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<MoviePage>, ApiError> {
    let Query(params) = params?;
    let request = PageRequest {
        title: params.title,
        sort: params.sorter,
        page_size: params.page_size,
        current_page: params.current_page,
    };

    let page = with_service(state, move |service| service.query_page(&request)).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<MovieSearchResult>>, ApiError> {
    let Query(params) = params?;
    let results = with_service(state, move |service| service.search_by_title(&params.q)).await?;
    Ok(Json(results))
}

async fn graph(State(state): State<AppState>) -> Result<Json<GraphProjection>, ApiError> {
    let graph = with_service(state, |service| service.fetch_graph()).await?;
    Ok(Json(graph))
}
