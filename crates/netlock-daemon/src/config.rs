//! Daemon configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::DaemonError;

/// File name of the settings document inside `data_path`
pub const SETTINGS_FILE: &str = "data.conf";

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address to bind the HTTP server to
    pub host: String,

    /// Port to bind the HTTP server to
    pub port: u16,

    /// Directory holding the settings document
    pub data_path: PathBuf,

    /// Passphrase for encrypting the settings document at rest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,

    /// Admin password used when the document has none yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    /// Origins allowed by CORS (empty means derived from host and port)
    pub allowed_origins: Vec<String>,

    /// Directory with a pre-built front-end to serve at `/`
    pub static_dir: Option<PathBuf>,

    /// Seed admin addresses from local network interfaces on first start
    pub seed_admin_from_interfaces: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_path: Self::default_data_path(),
            encryption_key: None,
            admin_password: None,
            allowed_origins: Vec::new(),
            static_dir: None,
            seed_admin_from_interfaces: true,
        }
    }
}

impl DaemonConfig {
    fn default_data_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("netlock")
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `_HOSTNAME`, `_PORT`, `_ENC_KEY` and `_ADMIN_PASSWORD` overrides
    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, var: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("_HOSTNAME") {
            self.host = host;
        }
        if let Some(port) = var("_PORT") {
            self.port = port
                .parse()
                .map_err(|_| DaemonError::Config(format!("Invalid _PORT: {}", port)))?;
        }
        if let Some(key) = var("_ENC_KEY") {
            self.encryption_key = Some(key);
        }
        if let Some(password) = var("_ADMIN_PASSWORD") {
            self.admin_password = Some(password);
        }
        Ok(())
    }

    /// Path of the settings document
    pub fn settings_path(&self) -> PathBuf {
        self.data_path.join(SETTINGS_FILE)
    }

    pub fn bind_addr(&self) -> crate::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid bind address: {}", e)))
    }

    /// Origins for CORS, defaulting to the daemon itself and the dev front-end
    pub fn cors_origins(&self) -> Vec<String> {
        if !self.allowed_origins.is_empty() {
            return self.allowed_origins.clone();
        }
        vec![
            format!("http://{}:{}", self.host, self.port),
            "http://localhost:3001".to_string(),
        ]
    }

    /// Create directories if they don't exist
    pub fn ensure_directories(&self) -> crate::Result<()> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}
