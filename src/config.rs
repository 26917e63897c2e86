use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

fn default_hub_url() -> String {
    "wss://api.example.invalid/session-hub".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    300
}

fn default_stop_timeout_secs() -> u64 {
    150
}

fn default_audio_fade_secs() -> f32 {
    3.0
}

fn default_image_fade_in_secs() -> f32 {
    4.0
}

fn default_image_fade_out_secs() -> f32 {
    4.0
}

fn default_timer_linger_secs() -> u64 {
    4
}

fn default_reconnect_attempts() -> u32 {
    6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// WebSocket URL of the session hub
    #[serde(default = "default_hub_url")]
    pub hub_url: String,

    /// Overall timeout for opening the transport and handshaking
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout for the graceful close during stop()
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    /// Background-track crossfade duration (used for both fade directions)
    #[serde(default = "default_audio_fade_secs")]
    pub audio_fade_secs: f32,

    /// Image slot fade-in duration
    #[serde(default = "default_image_fade_in_secs")]
    pub image_fade_in_secs: f32,

    /// Image slot fade-out duration
    #[serde(default = "default_image_fade_out_secs")]
    pub image_fade_out_secs: f32,

    /// How long the ended timer lingers on screen after reaching zero
    #[serde(default = "default_timer_linger_secs")]
    pub timer_linger_secs: u64,

    /// Automatic reconnection attempts before the connection is declared dead
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            stop_timeout_secs: default_stop_timeout_secs(),
            audio_fade_secs: default_audio_fade_secs(),
            image_fade_in_secs: default_image_fade_in_secs(),
            image_fade_out_secs: default_image_fade_out_secs(),
            timer_linger_secs: default_timer_linger_secs(),
            reconnect_attempts: default_reconnect_attempts(),
        }
    }
}

impl Config {
    /// Load configuration from the exe-relative config directory.
    /// Creates default config if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::LoadFailed {
                path: config_path.display().to_string(),
                source: Box::new(e),
            })?;
            let config: Config =
                serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: config_path.display().to_string(),
                    source: Box::new(e),
                })?;
            config.validate()?;

            tracing::info!("Loaded config from: {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            tracing::info!("Created default config at: {}", config_path.display());
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed {
                path: config_path.display().to_string(),
                source: Box::new(e),
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(&config_path, json).map_err(|e| ConfigError::SaveFailed {
            path: config_path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub_url.is_empty() {
            return Err(ConfigError::Invalid("hub_url must not be empty".into()));
        }
        if self.connect_timeout_secs == 0 || self.stop_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Get the config file path (in app's base directory)
    fn config_path() -> Result<PathBuf, ConfigError> {
        let exe_path = env::current_exe().map_err(|e| ConfigError::LoadFailed {
            path: "<exe>".to_string(),
            source: Box::new(e),
        })?;
        let exe_dir = exe_path.parent().ok_or_else(|| {
            ConfigError::Invalid("Could not determine executable directory".into())
        })?;

        Ok(exe_dir.join("config").join("config.json"))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn audio_fade(&self) -> Duration {
        Duration::from_secs_f32(self.audio_fade_secs)
    }

    pub fn image_fade_in(&self) -> Duration {
        Duration::from_secs_f32(self.image_fade_in_secs)
    }

    pub fn image_fade_out(&self) -> Duration {
        Duration::from_secs_f32(self.image_fade_out_secs)
    }
}
