//! Server configuration, loaded from the environment.

use std::env;
use std::path::PathBuf;

/// Default cap on upload request bodies (512 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, e.g. "0.0.0.0:8000".
    pub listen: String,

    /// Directory holding published update binaries.
    pub builds_dir: PathBuf,

    /// Shared secret for the admin endpoints.
    pub admin_token: String,

    /// Upper bound on upload request bodies in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Reads configuration from the environment. `OTA_ADMIN_TOKEN` is
    /// required; everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        let listen = env::var("OTA_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let builds_dir = env::var("OTA_BUILDS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("builds"));
        let admin_token = env::var("OTA_ADMIN_TOKEN")
            .map_err(|_| anyhow::anyhow!("OTA_ADMIN_TOKEN not set"))?;
        if admin_token.trim().is_empty() {
            anyhow::bail!("OTA_ADMIN_TOKEN must not be empty");
        }
        let max_upload_bytes = match env::var("OTA_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("OTA_MAX_UPLOAD_BYTES must be an integer: {raw}"))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            listen,
            builds_dir,
            admin_token,
            max_upload_bytes,
        })
    }
}
