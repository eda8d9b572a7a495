use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use elroi_shared::clients::db::get_conn;
use elroi_shared::clients::storage::secure_filename;
use elroi_shared::errors::{AppError, AppResult, ErrorCode};
use elroi_shared::types::auth::AuthUser;
use elroi_shared::types::ApiResponse;

use crate::services::user_directory;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub profile_photo: String,
    pub photo_url: String,
}

/// POST /profile/photo - multipart upload, first file field wins
pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<PhotoUploadResponse>>> {
    let field = loop {
        let next = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, state.config.max_upload_bytes))?;
        match next {
            Some(field) if field.file_name().is_some() => break field,
            Some(_) => continue,
            None => return Err(AppError::new(ErrorCode::PhotoUploadFailed, "no file provided")),
        }
    };

    let ext = match field.content_type().unwrap_or("application/octet-stream") {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => {
            return Err(AppError::new(
                ErrorCode::PhotoUploadFailed,
                "unsupported image format, accepted: jpeg, png, webp, gif",
            ));
        }
    };

    // Sanitize before prefixing so the basename step cannot eat the prefix.
    // The extension always follows the declared content type, since /uploads
    // is served with a MIME type guessed from it.
    let stem = field
        .file_name()
        .and_then(secure_filename)
        .and_then(|name| file_stem(&name))
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let file_name = format!("user_{}_{}.{}", user.id, stem, ext);

    let data = field
        .bytes()
        .await
        .map_err(|e| multipart_error(e, state.config.max_upload_bytes))?;
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::PhotoUploadFailed, "uploaded file is empty"));
    }

    let stored = state
        .photos
        .upload(&file_name, &data)
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, e))?;

    let mut conn = get_conn(&state.db)?;
    user_directory::set_profile_photo(&mut conn, user.id, &stored)?;

    let photo_url = state.photos.public_url(&stored);
    tracing::info!(user_id = user.id, photo_url = %photo_url, "profile photo uploaded");

    Ok(Json(ApiResponse::ok_with_message(
        PhotoUploadResponse { profile_photo: stored, photo_url },
        "Profile photo updated!",
    )))
}

fn file_stem(name: &str) -> Option<String> {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) => stem.trim_end_matches('.'),
        None => name,
    };
    (!stem.is_empty()).then(|| stem.to_string())
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::with_details(
            ErrorCode::PayloadTooLarge,
            "photo exceeds the upload limit",
            serde_json::json!({ "max_bytes": max_bytes }),
        );
    }
    AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read multipart: {err}"))
}
