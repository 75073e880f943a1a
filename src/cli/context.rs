use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::BridgeConfig;

pub struct CliContext {
    config: Arc<BridgeConfig>,
    config_path: PathBuf,
    metrics_port: u16,
}

impl CliContext {
    pub fn new(config: BridgeConfig, config_path: PathBuf, metrics_port: u16) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            metrics_port,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn metrics_port(&self) -> u16 {
        self.metrics_port
    }
}
