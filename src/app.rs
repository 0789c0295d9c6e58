use crate::state::AppState;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Outermost first: trace, then CORS, then the per-router body limit and auth gate.
pub fn create_app(state: AppState) -> Router {
    crate::routes::configure_routes(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
