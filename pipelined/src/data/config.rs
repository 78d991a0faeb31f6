use anyhow::Result;
use serde::Deserialize;
use slog::{Logger, error, info};
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Pipeline apps in order.  Main table numbers are assigned in this
    // order, so changing it renumbers the pipeline.
    pub apps: Vec<String>,

    // How long the hub waits for a barrier reply before expiring a
    // transaction.  Callers wait at least this long on their channels.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    // Retry budget for low-level single-message sends.
    #[serde(default = "default_send_retries")]
    pub send_retries: u32,
}

fn default_response_timeout_ms() -> u64 {
    2000
}

fn default_send_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Config {
            apps: [
                "access_control",
                "check_quota",
                "ipv6_solicitation",
                "ipfix",
                "enforcement",
                "egress",
            ]
            .map(String::from)
            .to_vec(),
            response_timeout_ms: default_response_timeout_ms(),
            send_retries: default_send_retries(),
        }
    }
}

/// Load the pipeline config from a TOML file.
pub fn load_config_file(filename: &str, logger: &Logger) -> Result<Config> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load config file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    let config: Config = toml::from_str(&contents)?;
    info!(
        logger,
        "Loaded pipeline config from {filename}: {} apps",
        config.apps.len()
    );
    Ok(config)
}
