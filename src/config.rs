use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::resolver::ServicePattern;

const DEFAULT_CONFIG_FILE: &str = "mcprobe.json";

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Per-query DNS timeout; the resolver's own default when unset.
    #[serde(default)]
    pub dns_timeout_ms: Option<u64>,
    #[serde(default = "ServicePattern::defaults")]
    pub srv_patterns: Vec<ServicePattern>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default = "default_metrics")]
    pub metrics: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

fn default_metrics() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            probe_timeout_ms: default_probe_timeout_ms(),
            dns_timeout_ms: None,
            srv_patterns: ServicePattern::defaults(),
            locale: None,
            metrics: default_metrics(),
        }
    }
}

impl AppConfig {
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" | "warning" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            other => Err(anyhow::anyhow!(
                "invalid log level {:?}, expected one of trace, debug, info, warn, error",
                other
            )),
        }
    }

    pub fn validate_log_level(&self) -> Result<()> {
        self.get_tracing_level().map(|_| ())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn dns_timeout(&self) -> Option<Duration> {
        self.dns_timeout_ms.map(Duration::from_millis)
    }

    /// Load from `path`, else `MCPROBE_CONFIG`, else `mcprobe.json` if present.
    ///
    /// Only the implicit default file may be missing.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("MCPROBE_CONFIG").map(PathBuf::from));

        let config = match explicit {
            Some(file) => Self::load_file_config(&file).await?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load_file_config(Path::new(DEFAULT_CONFIG_FILE)).await?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.validate_log_level()?;
        if self.srv_patterns.is_empty() {
            return Err(anyhow::anyhow!("srv_patterns must not be empty"));
        }
        if self.probe_timeout_ms == 0 {
            return Err(anyhow::anyhow!("probe_timeout_ms must be positive"));
        }
        Ok(())
    }

    async fn load_file_config(file_path: &Path) -> Result<AppConfig> {
        if !file_path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", file_path.display()));
        }

        let content = fs::read_to_string(file_path).await?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}
