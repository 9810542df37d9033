//! Image HTTP handlers

use axum::{
    Json,
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::web::{
    AppState,
    responses::{created, handle_error, ok},
};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// `None` when the image store is unavailable
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteImageResponse {
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub url: String,
    pub cached: bool,
}

/// Upload a dish image from the multipart field `file`
pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return handle_error(AppError::validation(format!("invalid multipart body: {e}")))
                    .into_response();
            }
        };
        if field.name() != Some("file") {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return handle_error(AppError::validation(format!("failed to read upload: {e}")))
                    .into_response();
            }
        };

        return match state
            .uploads
            .upload(&file_name, &content_type, bytes.to_vec())
            .await
        {
            Ok(url) => created(UploadResponse { url }).into_response(),
            Err(e) => handle_error(e).into_response(),
        };
    }

    handle_error(AppError::validation("multipart field 'file' is required")).into_response()
}

/// Delete a previously uploaded image by public URL
pub async fn delete_image(
    State(state): State<AppState>,
    Json(request): Json<DeleteImageRequest>,
) -> impl IntoResponse {
    ok(DeleteImageResponse {
        deleted: state.uploads.delete(&request.url).await,
    })
}

/// Resolve an image reference to the URL that would be fetched
pub async fn resolve_image(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> impl IntoResponse {
    let url = state.resolver.resolve(&params.path);
    let cached = state.images.is_cached(&url);
    ok(ResolveResponse { url, cached })
}
