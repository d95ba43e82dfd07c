mod selectors;

pub use selectors::SelectorConfig;

use std::path::PathBuf;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ClasspilotError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// CDP connection defaults
    #[serde(default)]
    pub cdp: CdpConfig,

    /// Host-page selection contracts
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Poll / cooldown / redirect timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Policy knobs
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpConfig {
    /// Endpoint used when no session was connected yet: a port number or
    /// a ws:// URL
    #[serde(default = "default_cdp_endpoint")]
    pub endpoint: String,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_cdp_endpoint(),
        }
    }
}

fn default_cdp_endpoint() -> String {
    "9222".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Player poll interval while locating
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Minimum interval between handled end-of-video signals, and between
    /// an advance and the next one. Also rate-limits the "player not
    /// found" notice.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Delay before the completion redirect fires
    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            cooldown_ms: default_cooldown_ms(),
            redirect_delay_ms: default_redirect_delay_ms(),
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_cooldown_ms() -> u64 {
    5000
}

fn default_redirect_delay_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BehaviorConfig {
    /// Only attempt auto-play after the user clicked the on-page
    /// "Play Video" button once. Some browsers refuse unsolicited
    /// playback without a prior gesture.
    #[serde(default)]
    pub require_user_gesture: bool,
}

impl Config {
    /// Load configuration from all sources (defaults, file, env)
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("CLASSPILOT_").split("__"))
            .extract()
            .map_err(|e| ClasspilotError::ConfigError(e.to_string()))?;

        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("classpilot")
            .join("config.toml")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClasspilotError::ConfigError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_matches_documented_constants() {
        let timing = TimingConfig::default();

        assert_eq!(timing.poll_interval(), Duration::from_millis(500));
        assert_eq!(timing.cooldown(), Duration::from_millis(5000));
        assert_eq!(timing.redirect_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn default_config_uses_port_9222() {
        let config = Config::default();

        assert_eq!(config.cdp.endpoint, "9222");
        assert!(!config.behavior.require_user_gesture);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [timing]
                cooldown_ms = 8000

                [selectors]
                frame_title = "lesson"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.timing.cooldown_ms, 8000);
        assert_eq!(config.timing.poll_interval_ms, 500);
        assert_eq!(config.selectors.frame_title, "lesson");
        assert_eq!(config.selectors.done_color, "rgb(0, 197, 65)");
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.cdp.endpoint, config.cdp.endpoint);
        assert_eq!(parsed.timing.cooldown_ms, config.timing.cooldown_ms);
        assert_eq!(
            parsed.selectors.completion_markers,
            config.selectors.completion_markers
        );
    }
}
