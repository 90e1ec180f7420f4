//! Public update endpoints: eligibility checks and downloads.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use ota_core::{eligibility, DeviceInfo, EligibilityResult, Platform};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check", post(check_for_updates))
        .route("/download/{update_id}", post(download_update))
}

/// Wire form of the device info. `platform` arrives as a free-form string
/// and is validated here rather than in the deserializer, so an unknown
/// value maps to a 400 instead of a framework rejection.
#[derive(Debug, Deserialize)]
pub struct DeviceInfoRequest {
    pub device_id: String,
    pub platform: String,
    pub current_version: String,
    pub build_number: u64,
    #[serde(default)]
    pub device_model: String,
    #[serde(default)]
    pub os_version: String,
}

impl DeviceInfoRequest {
    fn into_device(self) -> Result<DeviceInfo, AppError> {
        let platform = Platform::parse(&self.platform).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown platform: '{}'", self.platform))
        })?;
        Ok(DeviceInfo {
            device_id: self.device_id,
            platform,
            current_version: self.current_version,
            build_number: self.build_number,
            device_model: self.device_model,
            os_version: self.os_version,
        })
    }
}

/// POST /api/v1/updates/check
///
/// Evaluates eligibility for the submitted device. Public, read-only.
async fn check_for_updates(
    State(state): State<AppState>,
    Json(request): Json<DeviceInfoRequest>,
) -> Result<Json<EligibilityResult>, AppError> {
    let device = request.into_device()?;
    let result = eligibility::check(&device, &state.catalog);
    tracing::debug!(
        device_id = %device.device_id,
        platform = %device.platform,
        build_number = device.build_number,
        has_update = result.has_update,
        "update check"
    );
    Ok(Json(result))
}

/// POST /api/v1/updates/download/{update_id}
///
/// Streams the artifact for an active update. Unknown ids, inactive
/// records, and missing artifact files all produce the same NotFound so
/// the catalog's structure is not observable from outside.
async fn download_update(
    State(state): State<AppState>,
    Path(update_id): Path<String>,
) -> Result<Response, AppError> {
    let record = state.catalog.get(&update_id)?;
    if !record.is_active {
        return Err(AppError::NotFound("Update not found".to_string()));
    }

    let path = state.store.resolve(&record.update_id, record.platform).await?;
    let file = state.store.open_for_read(&path).await?;

    tracing::info!(%update_id, size = record.file_size, "update download");

    // The file handle is owned by the stream, so a client disconnect
    // drops it along with the body.
    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", record.artifact_filename()),
        )
        .header(header::CONTENT_LENGTH, record.file_size)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}
