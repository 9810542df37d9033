//! Cart HTTP handlers

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::CartItem;
use crate::services::cart::total_quantity;
use crate::web::{
    AppState,
    responses::{handle_error, handle_result, ok},
};

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total_count: u64,
}

impl CartView {
    fn from_items(items: Vec<CartItem>) -> Self {
        let total_count = total_quantity(&items);
        Self { items, total_count }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    /// Zero or negative removes the line; above the line cap is rejected
    pub quantity: i64,
}

pub async fn get_cart(State(state): State<AppState>) -> impl IntoResponse {
    ok(CartView::from_items(state.cart.items().await))
}

/// Add one of a catalog dish to the cart
pub async fn add_cart_item(
    State(state): State<AppState>,
    Path(dish_id): Path<String>,
) -> Response {
    let Some(dish) = state.catalog.dish_by_id(&dish_id).await else {
        return handle_error(AppError::not_found("dish", dish_id)).into_response();
    };
    ok(CartView::from_items(state.cart.add_item(dish).await)).into_response()
}

pub async fn set_cart_quantity(
    State(state): State<AppState>,
    Path(dish_id): Path<String>,
    Json(request): Json<QuantityRequest>,
) -> Response {
    handle_result(
        state
            .cart
            .update_quantity(&dish_id, request.quantity)
            .await
            .map(CartView::from_items),
    )
}

pub async fn remove_cart_item(
    State(state): State<AppState>,
    Path(dish_id): Path<String>,
) -> impl IntoResponse {
    ok(CartView::from_items(state.cart.remove_item(&dish_id).await))
}

pub async fn clear_cart(State(state): State<AppState>) -> impl IntoResponse {
    state.cart.clear().await;
    ok(CartView::from_items(Vec::new()))
}
