//! Configuration settings for Switchboard.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub backend: BackendSettings,
    pub dispatcher: DispatcherSettings,
    pub memory: MemorySettings,
    pub tools: ToolSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (subtitle downloads).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/switchboard".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Language model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Model used by agents that do not pin their own.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum completion tokens per call.
    pub max_tokens: u32,
    /// HTTP timeout for a single completion call.
    pub timeout_seconds: u64,
    /// How many times a failed completion is retried before giving up.
    pub max_retries: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
            max_retries: 1,
        }
    }
}

/// Delegation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Maximum agent invocations per request.
    pub max_steps: usize,
    /// Number of messages kept in a session's conversation window.
    pub history_capacity: usize,
    /// Timeout applied to every data tool call.
    pub tool_timeout_seconds: u64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            max_steps: 15,
            history_capacity: 10,
            tool_timeout_seconds: 60,
        }
    }
}

impl DispatcherSettings {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_seconds)
    }
}

/// Sharing scope of the episode catalog cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemoryScope {
    /// One store shared by every session in the process.
    Global,
    /// Each session owns its own store.
    #[default]
    Session,
}

impl std::str::FromStr for MemoryScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global" | "shared" => Ok(MemoryScope::Global),
            "session" => Ok(MemoryScope::Session),
            _ => Err(format!("Unknown memory scope: {}", s)),
        }
    }
}

impl std::fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryScope::Global => write!(f, "global"),
            MemoryScope::Session => write!(f, "session"),
        }
    }
}

/// Catalog memory settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemorySettings {
    pub scope: MemoryScope,
}

/// External data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Tavily API key. Falls back to `TAVILY_API_KEY`.
    pub tavily_api_key: Option<String>,
    /// Tavily search depth (basic, advanced).
    pub search_depth: String,
    /// Number of hits returned by video search.
    pub max_video_results: usize,
    /// Preferred subtitle language for transcripts.
    pub transcript_language: String,
    /// iTunes storefront used for podcast lookups.
    pub podcast_country: String,
    /// Maximum episodes fetched per podcast.
    pub episode_limit: u32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            search_depth: "basic".to_string(),
            max_video_results: 5,
            transcript_language: "en".to_string(),
            podcast_country: "US".to_string(),
            episode_limit: 200,
        }
    }
}

impl ToolSettings {
    /// Resolve the Tavily key from config or environment.
    pub fn tavily_key(&self) -> Option<String> {
        self.tavily_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("TAVILY_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory containing an `agents.toml` that overrides agent instructions.
    pub custom_dir: Option<String>,
    /// Custom variables available in all instructions as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values the dispatcher cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SwitchboardError;

        if self.dispatcher.max_steps == 0 {
            return Err(SwitchboardError::Configuration(
                "dispatcher.max_steps must be at least 1".to_string(),
            ));
        }
        if self.dispatcher.history_capacity == 0 {
            return Err(SwitchboardError::Configuration(
                "dispatcher.history_capacity must be at least 1".to_string(),
            ));
        }
        if self.backend.model.trim().is_empty() {
            return Err(SwitchboardError::Configuration(
                "backend.model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SwitchboardError::Configuration(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("switchboard")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [dispatcher]
            max_steps = 4

            [memory]
            scope = "global"
            "#,
        )
        .unwrap();

        assert_eq!(settings.dispatcher.max_steps, 4);
        assert_eq!(settings.dispatcher.history_capacity, 10);
        assert_eq!(settings.memory.scope, MemoryScope::Global);
        assert_eq!(settings.backend.model, "gpt-4o");
    }

    #[test]
    fn test_zero_step_budget_is_rejected() {
        let mut settings = Settings::default();
        settings.dispatcher.max_steps = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_memory_scope_from_str() {
        assert_eq!("Global".parse::<MemoryScope>().unwrap(), MemoryScope::Global);
        assert_eq!("session".parse::<MemoryScope>().unwrap(), MemoryScope::Session);
        assert!("cluster".parse::<MemoryScope>().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.tools.episode_limit = 50;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.tools.episode_limit, 50);
    }
}
