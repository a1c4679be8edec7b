use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Monthly allowance used when neither the usage source, the environment
/// nor the settings file provide one.
pub const DEFAULT_TOTAL_TARGET: f64 = 300.0;

/// Environment variable that overrides `total_target` from the settings file.
pub const TARGET_ENV_VAR: &str = "QUOTA_TOTAL_TARGET";

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_holiday_url() -> String {
    "https://raw.githubusercontent.com/NateScarlet/holiday-cn/master/{year}.json".to_string()
}

fn default_usage_api_base() -> String {
    "https://api.github.com".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_user: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Calendar document URL; `{year}` is replaced with the requested year.
    #[serde(default = "default_holiday_url")]
    pub holiday_url: String,
    #[serde(default = "default_usage_api_base")]
    pub usage_api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            total_target: None,
            github_user: None,
            data_dir: default_data_dir(),
            holiday_url: default_holiday_url(),
            usage_api_base: default_usage_api_base(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`, falling back to defaults when the file
    /// does not exist. A file that exists but does not parse is an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let settings: Settings = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse settings: {}", path.display()))?
        } else {
            tracing::debug!("No settings at {}, using defaults", path.display());
            Self::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(target) = self.total_target {
            if !target.is_finite() || target < 0.0 {
                bail!("total_target must be a non-negative number, got {}", target);
            }
        }
        if self.data_dir.as_os_str().is_empty() {
            bail!("data_dir must not be empty");
        }
        if !self.holiday_url.contains("{year}") {
            bail!("holiday_url must contain a {{year}} placeholder");
        }
        if self.usage_api_base.is_empty() {
            bail!("usage_api_base must not be empty");
        }
        Ok(())
    }

    pub fn holiday_url_for(&self, year: i32) -> String {
        self.holiday_url.replace("{year}", &year.to_string())
    }

    /// Picks the monthly target: a limit reported by the usage source wins,
    /// then the environment override, then the settings file, then
    /// [`DEFAULT_TOTAL_TARGET`].
    pub fn resolve_target(&self, fetched_limit: Option<f64>, env_override: Option<&str>) -> f64 {
        if let Some(limit) = fetched_limit.filter(|l| l.is_finite() && *l > 0.0) {
            return limit;
        }

        if let Some(raw) = env_override {
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => return value,
                _ => tracing::warn!("Ignoring invalid {}={:?}", TARGET_ENV_VAR, raw),
            }
        }

        self.total_target.unwrap_or(DEFAULT_TOTAL_TARGET)
    }

    pub fn env_target() -> Option<String> {
        std::env::var(TARGET_ENV_VAR).ok()
    }
}
