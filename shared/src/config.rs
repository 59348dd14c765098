use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::{GatewayConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::intake::DEFAULT_UPLOAD_LIMIT_BYTES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("upload_limit_bytes must be greater than zero")]
    ZeroUploadLimit,
}

/// Page-level settings, embedded in the host page as a JSON document.
/// Every field is optional.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub upload_limit_bytes: u64,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
            debug: false,
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Empty("endpoint"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Empty("model"));
        }
        if self.upload_limit_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key: self
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            ..GatewayConfig::default()
        }
    }
}
