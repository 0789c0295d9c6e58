use crate::state::AppState;
use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

/// Every movie route sits behind the bearer-token gate.
pub fn router(state: AppState) -> Router<AppState> {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/api/movies", get(handler::list_movies).post(handler::create_movie))
        .route(
            "/api/movies/{id}",
            get(handler::get_movie)
                .put(handler::update_movie)
                .delete(handler::delete_movie),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
