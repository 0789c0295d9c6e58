use super::dto::{MovieForm, MovieFormSchema, MovieId, PageQuery, PageRequest};
use super::model::Movie;
use super::service::{MovieService, UPDATED};
use crate::common::error::AppResult;
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

/// List movies, one page at a time
#[utoipa::path(
    get,
    path = "/api/movies",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of movies with pagination meta", body = ApiResponse<Vec<Movie>>),
        (status = 400, description = "Malformed page or size"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Movies",
    security(("bearer_auth" = []))
)]
pub async fn list_movies(
    State(state): State<AppState>,
    page: PageRequest,
) -> AppResult<impl IntoResponse> {
    let (movies, meta) = MovieService::list_movies(&state, page).await?;

    Ok(ApiSuccess(ApiResponse::paginated(movies, meta), StatusCode::OK))
}

#[utoipa::path(
    get,
    path = "/api/movies/{id}",
    params(("id" = uuid::Uuid, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie details", body = ApiResponse<Movie>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Movie not found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Movies",
    security(("bearer_auth" = []))
)]
pub async fn get_movie(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> AppResult<impl IntoResponse> {
    let movie = MovieService::get_movie(&state, id).await?;

    Ok(ApiSuccess(ApiResponse::data(movie), StatusCode::OK))
}

/// Create a movie with its photo
#[utoipa::path(
    post,
    path = "/api/movies",
    request_body(content = MovieFormSchema, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Movie created", body = ApiResponse<Movie>),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "Upload too large"),
        (status = 422, description = "Missing or invalid photo, or nothing was stored"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Movies",
    security(("bearer_auth" = []))
)]
pub async fn create_movie(
    State(state): State<AppState>,
    form: MovieForm,
) -> AppResult<impl IntoResponse> {
    let movie = MovieService::create_movie(&state, form).await?;

    Ok(ApiSuccess(ApiResponse::data(movie), StatusCode::OK))
}

/// Update a movie
///
/// Fields left out of the form keep their stored value, including the photo.
#[utoipa::path(
    put,
    path = "/api/movies/{id}",
    params(("id" = uuid::Uuid, Path, description = "Movie ID")),
    request_body(content = MovieFormSchema, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Movie updated", body = ApiResponse<String>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Movie not found"),
        (status = 413, description = "Upload too large"),
        (status = 422, description = "Invalid photo"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Movies",
    security(("bearer_auth" = []))
)]
pub async fn update_movie(
    State(state): State<AppState>,
    MovieId(id): MovieId,
    form: MovieForm,
) -> AppResult<impl IntoResponse> {
    MovieService::update_movie(&state, id, form).await?;

    Ok(ApiSuccess(ApiResponse::<()>::message(UPDATED), StatusCode::OK))
}

/// Delete a movie, returning the row as it was
#[utoipa::path(
    delete,
    path = "/api/movies/{id}",
    params(("id" = uuid::Uuid, Path, description = "Movie ID")),
    responses(
        (status = 200, description = "Movie deleted", body = ApiResponse<Movie>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Movie not found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Movies",
    security(("bearer_auth" = []))
)]
pub async fn delete_movie(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> AppResult<impl IntoResponse> {
    let movie = MovieService::delete_movie(&state, id).await?;

    Ok(ApiSuccess(ApiResponse::data(movie), StatusCode::OK))
}
