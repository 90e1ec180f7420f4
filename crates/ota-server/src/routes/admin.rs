//! Admin endpoints: upload, listing, and deactivation.
//!
//! Every handler authenticates before reading the request body, so a
//! rejected call never touches the catalog or storage.

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use ota_core::{Platform, StagedArtifact, UpdateRecord};

use crate::auth;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_updates))
        .route("/upload", post(upload_update))
        .route("/{update_id}/deactivate", post(deactivate_update))
}

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub update_id: String,
    pub message: String,
    pub checksum: String,
    pub file_size: u64,
}

#[derive(Debug, Serialize)]
pub struct ListUpdatesResponse {
    pub updates: Vec<UpdateRecord>,
}

#[derive(Debug, Serialize)]
pub struct DeactivateResponse {
    pub update_id: String,
    pub message: String,
}

/// POST /admin/updates/upload
///
/// Multipart fields: `file`, `version`, `build_number`, `platform`,
/// `changelog`, `is_mandatory`, and optionally `min_required_version`.
/// The binary is staged to a temp file while being hashed; the catalog
/// entry appears only after the artifact is atomically published.
async fn upload_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    auth::require_admin(&state, &headers)?;

    let mut staged = None;
    match process_upload(&state, &mut multipart, &mut staged).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            // A failed upload must leave no staged bytes behind.
            if let Some(staged) = staged.take() {
                staged.discard().await;
            }
            Err(e)
        }
    }
}

async fn process_upload(
    state: &AppState,
    multipart: &mut Multipart,
    staged_slot: &mut Option<StagedArtifact>,
) -> Result<UploadResponse, AppError> {
    let mut version = None;
    let mut build_number = None;
    let mut platform = None;
    let mut changelog = None;
    let mut is_mandatory = false;
    let mut min_required_version = None;

    while let Some(mut field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "file" => {
                if let Some(previous) = staged_slot.take() {
                    previous.discard().await;
                }
                let staged = staged_slot.insert(state.store.stage().await?);
                while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
                    staged.write_chunk(&chunk).await?;
                }
            }
            "version" => version = Some(field.text().await.map_err(bad_multipart)?),
            "build_number" => build_number = Some(field.text().await.map_err(bad_multipart)?),
            "platform" => platform = Some(field.text().await.map_err(bad_multipart)?),
            "changelog" => changelog = Some(field.text().await.map_err(bad_multipart)?),
            "is_mandatory" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                is_mandatory = parse_bool(&raw)?;
            }
            "min_required_version" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                if !raw.is_empty() {
                    min_required_version = Some(raw);
                }
            }
            _ => {}
        }
    }

    let version = version.ok_or_else(|| missing_field("version"))?;
    let build_raw = build_number.ok_or_else(|| missing_field("build_number"))?;
    let build_number: u64 = build_raw.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "build_number must be a non-negative integer: '{}'",
            build_raw
        ))
    })?;
    let platform_raw = platform.ok_or_else(|| missing_field("platform"))?;
    let platform = Platform::parse(&platform_raw)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown platform: '{}'", platform_raw)))?;
    let changelog = changelog.ok_or_else(|| missing_field("changelog"))?;
    let staged = staged_slot.take().ok_or_else(|| missing_field("file"))?;

    let update_id = UpdateRecord::derive_id(&version, platform, build_number);
    let stored = staged.publish(&state.store, &update_id, platform).await?;

    let record = UpdateRecord {
        update_id: update_id.clone(),
        version,
        build_number,
        platform,
        file_size: stored.size,
        checksum: stored.checksum.clone(),
        changelog,
        is_mandatory,
        min_required_version,
        release_date: Utc::now(),
        is_active: true,
    };
    state.catalog.put(record);

    tracing::info!(
        %update_id,
        %platform,
        build_number,
        file_size = stored.size,
        "update published"
    );

    Ok(UploadResponse {
        update_id,
        message: "Update uploaded successfully".to_string(),
        checksum: stored.checksum,
        file_size: stored.size,
    })
}

/// GET /admin/updates
///
/// Lists every record, active and inactive. Metadata only.
async fn list_updates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListUpdatesResponse>, AppError> {
    auth::require_admin(&state, &headers)?;
    Ok(Json(ListUpdatesResponse {
        updates: state.catalog.list(),
    }))
}

/// POST /admin/updates/{update_id}/deactivate
///
/// Retires a record. The artifact stays on disk and the record stays
/// listable; checks and downloads stop seeing it.
async fn deactivate_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(update_id): Path<String>,
) -> Result<Json<DeactivateResponse>, AppError> {
    auth::require_admin(&state, &headers)?;
    state.catalog.deactivate(&update_id)?;

    tracing::info!(%update_id, "update deactivated");

    Ok(Json(DeactivateResponse {
        update_id,
        message: "Update deactivated".to_string(),
    }))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", e))
}

fn missing_field(name: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {}", name))
}

fn parse_bool(raw: &str) -> Result<bool, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(AppError::BadRequest(format!(
            "is_mandatory must be a boolean: '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepts_common_forms() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("True").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(!parse_bool("0").unwrap());
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        assert!(parse_bool("yes").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_missing_field_message() {
        let err = missing_field("version");
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Missing required field: version"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
