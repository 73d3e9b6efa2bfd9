//! Upload and distribution of the Android package.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use mytone_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    middleware::AdminSession,
    services::{storage::DOWNLOAD_URL_TTL, ServiceError, APK_CONTENT_TYPE, APK_KEY},
    utils::{ApkMultipart, QueryParams},
    AppState,
};

/// Upper bound for an uploaded package.
pub const MAX_APK_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadLink {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct SignedDownloadQuery {
    pub expires: i64,
    pub signature: String,
}

/// Replace the published APK. The `file` part must be named `*.apk`; its
/// bytes are only read once the session and file name have been checked.
#[instrument(skip_all, fields(admin = %session.sub))]
pub async fn upload_apk(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    ApkMultipart(mut multipart): ApkMultipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.ends_with(".apk") {
            warn!(file_name = %file_name, "Rejected non-APK upload");
            return Err(ServiceError::InvalidFileType.into());
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::Validation(format!("Failed to read file: {}", e)))?;

        state.storage.put(APK_KEY, APK_CONTENT_TYPE, data.clone()).await?;
        info!(file_name = %file_name, size = data.len(), "APK uploaded");

        return Ok(Json(UploadResponse {
            success: true,
            message: "APK uploaded successfully".to_string(),
            file_name: APK_KEY.to_string(),
        }));
    }

    Err(ServiceError::Validation("No file provided".to_string()).into())
}

/// Signed link to the current APK, or 404 before the first upload.
pub async fn apk_link(State(state): State<AppState>) -> Result<Json<DownloadLink>, AppError> {
    if !state.storage.exists(APK_KEY).await? {
        return Err(ServiceError::NotFound("APK not available".to_string()).into());
    }

    let url = state.storage.signed_url(APK_KEY, DOWNLOAD_URL_TTL).await?;
    Ok(Json(DownloadLink {
        url,
        expires_in: DOWNLOAD_URL_TTL.as_secs(),
    }))
}

/// Target of locally signed links.
pub async fn signed_download(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SignedDownloadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let data = state
        .storage
        .open_signed(APK_KEY, query.expires, &query.signature)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, APK_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", APK_KEY),
            ),
        ],
        data,
    ))
}
