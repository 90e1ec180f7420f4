//! Core types for the update catalog.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platforms that receive OTA builds. Build numbers are ordered within a
/// platform only; comparing them across platforms is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Parses a platform name case-insensitively. Returns `None` for
    /// anything that is not a recognized platform.
    pub fn parse(s: &str) -> Option<Platform> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing one published build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    /// Deterministic key derived from (version, platform, build_number).
    /// Doubles as the artifact storage key.
    pub update_id: String,
    /// Human-facing semantic version string.
    pub version: String,
    /// Authoritative ordering key, monotonically increasing per platform.
    pub build_number: u64,
    pub platform: Platform,
    /// Size of the stored artifact in bytes, measured server-side.
    pub file_size: u64,
    /// SHA-256 hex digest of the stored artifact, computed server-side.
    pub checksum: String,
    pub changelog: String,
    /// Advisory flag; enforcement happens on the client.
    pub is_mandatory: bool,
    /// Recorded but not consulted by the eligibility decision.
    pub min_required_version: Option<String>,
    pub release_date: DateTime<Utc>,
    /// Inactive records are hidden from checks and downloads but remain
    /// listable for audit.
    pub is_active: bool,
}

impl UpdateRecord {
    /// Derives the update id for a (version, platform, build_number) triple.
    /// Re-publishing the same triple yields the same id, which makes
    /// re-uploads idempotent.
    pub fn derive_id(version: &str, platform: Platform, build_number: u64) -> String {
        format!("tauos-{}-{}-{}", version, platform, build_number)
    }

    /// Returns the public download path for this record.
    pub fn download_path(&self) -> String {
        format!("/api/v1/updates/download/{}", self.update_id)
    }

    /// Returns the filename offered to clients downloading this build.
    pub fn artifact_filename(&self) -> String {
        format!("tauos-{}-{}.{}", self.version, self.platform, self.platform)
    }
}

/// Device-submitted state, evaluated per request and never stored.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub device_id: String,
    pub platform: Platform,
    pub current_version: String,
    pub build_number: u64,
    pub device_model: String,
    pub os_version: String,
}

/// Outcome of an update check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub has_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_info: Option<UpdateInfo>,
}

/// The slice of an `UpdateRecord` exposed to devices in a check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    pub build_number: u64,
    pub download_url: String,
    pub file_size: u64,
    pub checksum: String,
    pub changelog: String,
    pub is_mandatory: bool,
    pub release_date: DateTime<Utc>,
}

impl From<&UpdateRecord> for UpdateInfo {
    fn from(record: &UpdateRecord) -> Self {
        UpdateInfo {
            version: record.version.clone(),
            build_number: record.build_number,
            download_url: record.download_path(),
            file_size: record.file_size,
            checksum: record.checksum.clone(),
            changelog: record.changelog.clone(),
            is_mandatory: record.is_mandatory,
            release_date: record.release_date,
        }
    }
}
