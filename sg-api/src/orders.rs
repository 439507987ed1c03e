use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sg_core::Order;
use tower_http::{catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer};

use crate::error::{panic_response, AppError};
use crate::state::AppState;

pub const ORDER_ID_REQUIRED: &str = "order_id is required";
pub const ORDER_NOT_FOUND: &str = "Order not found";

/// Request headers browsers may send to the order lookup
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Debug, Deserialize)]
pub struct OrderLookupRequest {
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    pub order: Order,
}

/// The `get-order` function. Every response, including panics and
/// pre-flights, carries the CORS and JSON content-type headers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/functions/v1/get-order", any(get_order))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
}

/// ANY /functions/v1/get-order
/// Look up one order with the service role
pub async fn get_order(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Response, AppError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }

    let order_id = requested_order_id(&body)?;
    let order_id = order_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::ValidationError(ORDER_ID_REQUIRED.to_string()))?;

    let order = state
        .orders
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(ORDER_NOT_FOUND.to_string()))?;

    tracing::info!("Order {} looked up ({})", order.id, order.status);

    Ok(Json(OrderEnvelope { order }).into_response())
}

/// A blank body, `null`, or any JSON value that is not an object carries no
/// `order_id`. Only bytes that are not JSON, or an `order_id` that is not a
/// string, are unexpected.
fn requested_order_id(body: &[u8]) -> Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body).context("order lookup body is not JSON")?;
    if !value.is_object() {
        return Ok(None);
    }

    let req: OrderLookupRequest =
        serde_json::from_value(value).context("order lookup order_id is not a string")?;
    Ok(req.order_id)
}
