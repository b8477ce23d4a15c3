// SPDX-License-Identifier: GPL-3.0-only

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    DEFAULT_ADDR, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PUBLIC_DIR, DEFAULT_RECORDINGS_DIR,
    DEFAULT_TLS_CERT, DEFAULT_TLS_KEY,
};
use crate::errors::{AppError, AppResult};

/// Ingest server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address
    pub addr: String,
    /// TLS certificate (PEM); empty disables TLS
    pub tls_cert: Option<PathBuf>,
    /// TLS private key (PEM); empty disables TLS
    pub tls_key: Option<PathBuf>,
    /// Directory served at `/`
    pub public_dir: PathBuf,
    /// Directory uploads are saved to
    pub recordings_dir: PathBuf,
    /// Directory raw uploads are spooled to while received
    pub temp_dir: PathBuf,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            tls_cert: Some(PathBuf::from(DEFAULT_TLS_CERT)),
            tls_key: Some(PathBuf::from(DEFAULT_TLS_KEY)),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            recordings_dir: PathBuf::from(DEFAULT_RECORDINGS_DIR),
            temp_dir: std::env::temp_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), ?config, "Loaded config");
        Ok(config)
    }

    /// Parsed listen address
    ///
    /// A bare `:port` listens on all interfaces.
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let addr = match self.addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.addr.clone(),
        };
        addr.parse()
            .map_err(|e| AppError::Config(format!("invalid listen address {:?}: {}", self.addr, e)))
    }

    /// Certificate and key, when TLS is configured
    ///
    /// An empty path on either side disables TLS.
    pub fn tls_paths(&self) -> Option<(&Path, &Path)> {
        let cert = self.tls_cert.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        let key = self.tls_key.as_deref().filter(|p| !p.as_os_str().is_empty())?;
        Some((cert, key))
    }
}
