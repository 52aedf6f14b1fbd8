//! Service configuration.

use choreo_coach::AgentConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Chat endpoint used when none is configured
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Where reports and pose files live
    pub storage: StorageConfig,

    /// Natural-language feedback
    pub coach: CoachConfig,

    /// Caller-side input limits
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per report
    pub reports_dir: PathBuf,

    /// Directory searched for relative pose-sequence paths
    pub poses_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            poses_dir: PathBuf::from("poses"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Disable to always use the canned feedback text
    pub enabled: bool,

    /// OpenAI-compatible API base URL
    pub api_base: String,

    /// Bearer token; `OPENAI_API_KEY` is used when unset
    pub api_key: Option<String>,

    /// Model and sampling parameters
    pub agent: AgentConfig,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            agent: AgentConfig::default(),
        }
    }
}

impl CoachConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Whether a backend should be built: the coach is enabled and either
    /// holds a key or points at a custom (possibly keyless) endpoint.
    pub fn wants_backend(&self) -> bool {
        self.enabled && (self.resolved_api_key().is_some() || self.api_base != DEFAULT_API_BASE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest accepted sequence; alignment costs O(n·m) memory
    pub max_frames: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_frames: 5000 }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("CHOREO")
        .prefix_separator("_")
        .separator("__")
}

impl ServiceConfig {
    /// Load configuration from file, overridden by `CHOREO_*` variables
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables, e.g. `CHOREO_LIMITS__MAX_FRAMES=2000`
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> choreo_core::Result<()> {
        if self.limits.max_frames == 0 {
            return Err(choreo_core::Error::Config(
                "limits.max_frames must be positive".to_string(),
            ));
        }
        if self.coach.agent.max_tokens == 0 {
            return Err(choreo_core::Error::Config(
                "coach.agent.max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
