//! Catalog HTTP handlers
//!
//! Mutations answer with a [`MutationResponse`] carrying the sync outcome:
//! `synced` and `sync_failed` both mean the local catalog was updated, the
//! latter only that the hosted backend did not accept the change.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::models::{CatalogState, Category, CategoryPatch, Dish, DishPatch};
use crate::services::SyncOutcome;
use crate::web::{
    AppState,
    responses::{MutationResponse, created, handle_error, handle_result, ok},
};

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
    pub catalog: CatalogState,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub sync: SyncOutcome,
    pub catalog: CatalogState,
}

pub async fn get_menu(State(state): State<AppState>) -> impl IntoResponse {
    ok(state.catalog.snapshot().await)
}

/// Re-read the catalog from the hosted backend
pub async fn refresh_menu(State(state): State<AppState>) -> impl IntoResponse {
    let refreshed = state.catalog.refresh().await;
    ok(RefreshResponse {
        refreshed,
        catalog: state.catalog.snapshot().await,
    })
}

/// Replace the catalog with the bundled default menu
pub async fn reset_menu(State(state): State<AppState>) -> impl IntoResponse {
    let sync = state.catalog.reset_to_default().await;
    ok(ResetResponse {
        sync,
        catalog: state.catalog.snapshot().await,
    })
}

pub async fn create_dish(State(state): State<AppState>, Json(dish): Json<Dish>) -> Response {
    let dish_id = dish.id.clone();
    match state.catalog.add_dish(dish).await {
        Ok(sync) => created(MutationResponse {
            sync,
            item: state.catalog.dish_by_id(&dish_id).await,
        })
        .into_response(),
        Err(e) => handle_error(e).into_response(),
    }
}

pub async fn update_dish(
    State(state): State<AppState>,
    Path(dish_id): Path<String>,
    Json(patch): Json<DishPatch>,
) -> Response {
    match state.catalog.update_dish(&dish_id, patch).await {
        Ok(sync) => ok(MutationResponse {
            sync,
            item: state.catalog.dish_by_id(&dish_id).await,
        })
        .into_response(),
        Err(e) => handle_error(e).into_response(),
    }
}

pub async fn delete_dish(State(state): State<AppState>, Path(dish_id): Path<String>) -> Response {
    handle_result(
        state
            .catalog
            .delete_dish(&dish_id)
            .await
            .map(|sync| MutationResponse::<Dish> { sync, item: None }),
    )
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(category): Json<Category>,
) -> Response {
    let category_id = category.id.clone();
    match state.catalog.add_category(category).await {
        Ok(sync) => created(MutationResponse {
            sync,
            item: state.catalog.category_by_id(&category_id).await,
        })
        .into_response(),
        Err(e) => handle_error(e).into_response(),
    }
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Json(patch): Json<CategoryPatch>,
) -> Response {
    match state.catalog.update_category(&category_id, patch).await {
        Ok(sync) => ok(MutationResponse {
            sync,
            item: state.catalog.category_by_id(&category_id).await,
        })
        .into_response(),
        Err(e) => handle_error(e).into_response(),
    }
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Response {
    handle_result(
        state
            .catalog
            .delete_category(&category_id)
            .await
            .map(|sync| MutationResponse::<Category> { sync, item: None }),
    )
}
