/// Analyzer configuration
use crate::error::{AnalyzerError, Result};
use ambience_storage::ProfileStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ambience.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreSettings {
    /// Directory holding `playbackProfiles.json`; platform data dir when unset
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` overrides the default `ambience.toml` lookup; an explicit path
    /// must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with AMBIENCE_)
        settings = settings.add_source(
            config::Environment::with_prefix("AMBIENCE")
                .separator("_")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .map_err(|e| AnalyzerError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AnalyzerError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.workers == 0 {
            return Err(AnalyzerError::Config(
                "analysis.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved store directory
    pub fn store_directory(&self) -> Result<PathBuf> {
        match &self.store.directory {
            Some(dir) => Ok(dir.clone()),
            None => Ok(ProfileStore::default_directory()?),
        }
    }
}

// Default values
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, 16)
}

fn default_filter() -> String {
    "ambience_analyzer=info,ambience_loudness=info,ambience_storage=info".to_string()
}
