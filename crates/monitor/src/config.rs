//! Service configuration

use anyhow::Result;
use serde::Deserialize;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding model.onnx, scaler.json, and labels.json
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    /// Namespace prefix for persisted verdict documents
    #[serde(default = "default_app_namespace")]
    pub app_namespace: String,

    /// Verdict store base URL; persistence is skipped when unset
    #[serde(default)]
    pub store_base_url: Option<String>,
}

fn default_api_port() -> u16 {
    8080
}

fn default_artifacts_dir() -> String {
    std::env::var("ARTIFACTS_DIR").unwrap_or_else(|_| "./artifacts".to_string())
}

fn default_app_namespace() -> String {
    "herd-monitor".to_string()
}

impl MonitorConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MONITOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| MonitorConfig {
            api_port: default_api_port(),
            artifacts_dir: default_artifacts_dir(),
            app_namespace: default_app_namespace(),
            store_base_url: None,
        }))
    }
}
