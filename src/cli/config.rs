use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::QoscError;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct DeviceConfig {
    /// Switch hostname or IP address
    pub host: Option<String>,
    /// NX-API HTTPS port (443 when unset)
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Verify the switch certificate (true when unset)
    pub verify_tls: Option<bool>,
    /// Request timeout in seconds (30 when unset)
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ExecutionConfig {
    /// Never send commands, only report what would be sent
    #[serde(default)]
    pub dry_run: bool,
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, QoscError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| QoscError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }
}
