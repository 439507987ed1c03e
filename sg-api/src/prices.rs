use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use sg_catalog::PriceState;
use tokio_stream::wrappers::WatchStream;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products/active/price", get(current_price))
        .route("/v1/products/active/price/stream", get(price_stream))
}

/// GET /v1/products/active/price
async fn current_price(State(state): State<AppState>) -> Json<PriceState> {
    Json(state.prices.borrow().clone())
}

/// GET /v1/products/active/price/stream
///
/// A new subscriber is a viewer coming back, so the price is re-read before
/// the stream settles.
async fn price_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    state.visibility.mark_visible();

    let stream = WatchStream::new(state.prices.clone())
        .map(|price| Event::default().event("price").json_data(price));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
