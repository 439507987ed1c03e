use axum::{http::Method, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod orders;
pub mod prices;
pub mod shutdown;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // The order lookup sets its own fixed CORS headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .merge(orders::routes())
        .merge(prices::routes().layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
