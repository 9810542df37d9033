//! Order HTTP handlers

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::web::{
    AppState,
    responses::{created, handle_error, ok},
};

#[derive(Debug, Deserialize)]
pub struct SubmitOrderRequest {
    pub user_name: String,
    #[serde(default)]
    pub note: String,
}

/// Order history, most recent first
pub async fn list_orders(State(state): State<AppState>) -> impl IntoResponse {
    ok(state.orders.orders().await)
}

/// Submit the current cart as an order
pub async fn submit_order(
    State(state): State<AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Response {
    match state.orders.submit(&request.user_name, &request.note).await {
        Ok(order) => created(order).into_response(),
        Err(e) => handle_error(e).into_response(),
    }
}
