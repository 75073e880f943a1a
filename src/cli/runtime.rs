use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use dedalus_client::DedalusClient;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webhook_adapter::ports::NoopOrchestrator;
use webhook_adapter::{AdapterBootstrap, OrchestratorPort};

use super::env::LogFormat;
use crate::config::BridgeConfig;

const LOCAL_ENV_PATH: &str = "config/local.env";

/// What loading `config/local.env` did. It runs before logging is set up
/// (it may carry `RUST_LOG`), so the report is logged afterwards.
#[derive(Debug)]
pub enum LocalEnvReport {
    Absent,
    Loaded {
        path: PathBuf,
        applied: usize,
        skipped_lines: Vec<usize>,
    },
    Unreadable {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl LocalEnvReport {
    pub fn log(&self) {
        match self {
            Self::Absent => {}
            Self::Loaded {
                path,
                applied,
                skipped_lines,
            } => {
                for line in skipped_lines {
                    warn!(path = %path.display(), line, "invalid local.env entry; skipping");
                }
                info!(path = %path.display(), applied, "Loaded environment overrides from local.env");
            }
            Self::Unreadable { path, error } => {
                warn!(path = %path.display(), ?error, "failed to read local.env overrides");
            }
        }
    }
}

pub fn load_local_env_overrides() -> LocalEnvReport {
    apply_local_env(Path::new(LOCAL_ENV_PATH))
}

/// Sets every `KEY=value` from `path` that is not already in the environment.
fn apply_local_env(path: &Path) -> LocalEnvReport {
    if !path.exists() {
        return LocalEnvReport::Absent;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            let parsed = parse_env_lines(&contents);
            let mut applied = 0;
            for (key, value) in parsed.pairs {
                if env::var(&key).is_ok() {
                    continue;
                }
                env::set_var(key, value);
                applied += 1;
            }
            LocalEnvReport::Loaded {
                path: path.to_path_buf(),
                applied,
                skipped_lines: parsed.skipped_lines,
            }
        }
        Err(error) => LocalEnvReport::Unreadable {
            path: path.to_path_buf(),
            error,
        },
    }
}

#[derive(Debug, Default, PartialEq)]
struct EnvLines {
    pairs: Vec<(String, String)>,
    skipped_lines: Vec<usize>,
}

/// `KEY=value` pairs, skipping blanks and comments. Lines without `=` are
/// reported by 1-based line number.
fn parse_env_lines(contents: &str) -> EnvLines {
    let mut parsed = EnvLines::default();
    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            parsed.skipped_lines.push(idx + 1);
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        parsed
            .pairs
            .push((key.to_string(), unescape_value(value.trim())));
    }
    parsed
}

/// Logs go to stderr so `call` can print its envelope cleanly on stdout.
pub fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Human => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    Ok(())
}

pub struct LoadedConfig {
    pub config: BridgeConfig,
    pub path: PathBuf,
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => {
            // Priority: ./config/config.yaml > ~/.config/vapi-bridge/config.yaml
            let local_config = PathBuf::from("config/config.yaml");
            if local_config.exists() {
                local_config
            } else {
                let mut path = dirs::config_dir().context("Failed to get config directory")?;
                path.push("vapi-bridge");
                path.push("config.yaml");
                path
            }
        }
    };

    let mut config = read_config_file(&config_path).await?;
    config.apply_env_overrides();
    Ok(LoadedConfig {
        config,
        path: config_path,
    })
}

async fn read_config_file(path: &Path) -> Result<BridgeConfig> {
    if !path.exists() {
        warn!("Config file not found, using defaults: {}", path.display());
        return Ok(BridgeConfig::default());
    }

    let content = fs::read_to_string(path)
        .await
        .context("Failed to read config file")?;
    let config: BridgeConfig =
        serde_yaml::from_str(&content).context("Failed to parse config file")?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Wires the Dedalus client into the adapter. With `allow_offline`, a
/// missing API key degrades to an orchestrator that fails every remote call,
/// so `get_datetime` still works.
pub fn build_adapter(config: &BridgeConfig, allow_offline: bool) -> Result<AdapterBootstrap> {
    let orchestrator: Arc<dyn OrchestratorPort> = match config.dedalus_config() {
        Ok(dedalus) => {
            info!(api_base = %dedalus.api_base, "Dedalus orchestrator configured");
            Arc::new(DedalusClient::new(dedalus)?)
        }
        Err(err) if allow_offline => {
            warn!("{err}; remote tool calls will fail");
            Arc::new(NoopOrchestrator)
        }
        Err(err) => return Err(err),
    };

    let bootstrap = AdapterBootstrap::new(orchestrator)
        .with_context_zone_name(&config.date_context_zone)
        .context("invalid date_context_zone")?;
    Ok(bootstrap)
}

fn unescape_value(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\r", "\r")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn env_lines_skip_comments_and_unquote() {
        let parsed = parse_env_lines("# comment\n\nDEDALUS_API_KEY=\"abc\\n\"\nbroken line\n=novalue\n");
        assert_eq!(
            parsed.pairs,
            vec![("DEDALUS_API_KEY".to_string(), "abc\n".to_string())]
        );
        assert_eq!(parsed.skipped_lines, vec![4]);
    }

    #[test]
    fn local_env_report_counts_applied_and_skipped_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "VAPI_BRIDGE_LOCAL_ENV_TEST=1\nnot an entry").unwrap();

        match apply_local_env(file.path()) {
            LocalEnvReport::Loaded {
                applied,
                skipped_lines,
                ..
            } => {
                assert_eq!(applied, 1);
                assert_eq!(skipped_lines, vec![2]);
            }
            other => panic!("unexpected report: {other:?}"),
        }
        assert_eq!(env::var("VAPI_BRIDGE_LOCAL_ENV_TEST").unwrap(), "1");
    }

    #[test]
    fn missing_local_env_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            apply_local_env(&dir.path().join("local.env")),
            LocalEnvReport::Absent
        ));
    }

    #[tokio::test]
    async fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_config_file(&dir.path().join("absent.yaml"))
            .await
            .unwrap();
        assert_eq!(config.port, BridgeConfig::default().port);
    }

    #[tokio::test]
    async fn config_file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: 9191\ndate_context_zone: Europe/Paris").unwrap();
        let config = read_config_file(file.path()).await.unwrap();
        assert_eq!(config.port, 9191);
        assert_eq!(config.date_context_zone, "Europe/Paris");
    }

    #[test]
    fn offline_adapter_requires_opt_in() {
        let config = BridgeConfig::default();
        assert!(build_adapter(&config, false).is_err());
        assert!(build_adapter(&config, true).is_ok());
    }

    #[test]
    fn unknown_context_zone_is_rejected() {
        let mut config = BridgeConfig::default();
        config.date_context_zone = "Mars/Phobos".into();
        assert!(build_adapter(&config, true).is_err());
    }
}
