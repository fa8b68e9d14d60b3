use crate::utils::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub lsdvd: String,
    pub mplayer: String,
    pub mencoder: String,
    pub mkvmerge: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub show_timestamps: bool,
    pub colored_output: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemuxConfig {
    /// Subtitle languages kept when no explicit subtitle selection is given.
    pub sub_langcodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
    pub remux: RemuxConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)?;
        let config: Config = serde_yaml::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the given file when it exists, otherwise falls back to the
    /// built-in defaults. A missing config file is not an error.
    pub fn load_with_fallback<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("lsdvd", &self.tools.lsdvd),
            ("mplayer", &self.tools.mplayer),
            ("mencoder", &self.tools.mencoder),
            ("mkvmerge", &self.tools.mkvmerge),
        ] {
            if path.is_empty() {
                return Err(Error::validation(format!(
                    "Tool path for '{}' must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolsConfig {
                lsdvd: "lsdvd".to_string(),
                mplayer: "mplayer".to_string(),
                mencoder: "mencoder".to_string(),
                mkvmerge: "mkvmerge".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                show_timestamps: false,
                colored_output: true,
            },
            remux: RemuxConfig {
                sub_langcodes: vec!["ru".to_string(), "en".to_string()],
            },
        }
    }
}
