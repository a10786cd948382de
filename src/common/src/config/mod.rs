use std::path::Path;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use once_cell::sync::OnceCell;

pub static CONFIG: OnceCell<Configuration> = OnceCell::new();

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "promcheck.toml";

/// Prefix of environment overrides, e.g. `PROMCHECK__OUTPUT__PRETTY=false`
pub const ENV_PREFIX: &str = "PROMCHECK__";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// Pretty-print JSON results
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level used when neither `RUST_LOG` nor a CLI flag selects one
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("warn"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Configuration {
    /// How results are rendered
    pub output: OutputConfig,
    /// Diagnostic logging on stderr
    pub logging: LoggingConfig,
}

impl Configuration {
    /// Load defaults, then `promcheck.toml` if present, then the environment
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::layered(Toml::file(DEFAULT_CONFIG_FILE))
    }

    /// Like [`Configuration::load`], reading the TOML layer from `path`
    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        Self::layered(Toml::file(path))
    }

    fn layered(file: figment::providers::Data<Toml>) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }
}
