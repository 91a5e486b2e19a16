//! yumc configuration.
//!
//! The configuration is stored (by default) in a `.yumc.yml` file next to
//! the source file. There are currently three options that can be
//! specified, all optional; CLI flags override them.
//!
//! * `target` (optional) -- Name of the sprite or stage new blocks are
//!   added to. If absent, it must be supplied via `--target`.
//!
//! * `max_stack_size` (optional, default: [`DEFAULT_MAX_STACK_SIZE`]) --
//!   Upper bound on a function's `_Stack` frame size before compilation
//!   fails with a stack-overflow error.
//!
//! * `warp` (optional, default: `false`) -- Default value of newly lowered
//!   functions' `warp` mutation field.
//!
//! # Examples
//!
//! ```yml
//! target: Sprite1
//! max_stack_size: 200
//! warp: true
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, prelude::*};
use std::path::Path;

use yaml_rust::{ScanError, YamlLoader};

pub use crate::omitter::DEFAULT_MAX_STACK_SIZE;

/// Configuration structure.
#[derive(Debug)]
pub struct Config {
    pub target: Option<String>,
    pub max_stack_size: u32,
    pub warp: bool,
}

#[derive(Debug)]
pub enum LoadConfigError {
    Io(io::Error),
    Yaml(ScanError),
    Invalid(String),
    UnknownOption(String),
}

impl fmt::Display for LoadConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadConfigError::Io(error) => write!(f, "{}", error),
            LoadConfigError::Yaml(error) => write!(f, "invalid configuration syntax: {}", error),
            LoadConfigError::Invalid(error) => write!(f, "invalid configuration format: {}", error),
            LoadConfigError::UnknownOption(error) => {
                write!(f, "unknown configuration option: {}", error)
            }
        }
    }
}

impl std::error::Error for LoadConfigError {}

impl Config {
    /// Default configuration: no target, the default stack bound, warp off.
    pub fn default_config() -> Self {
        Config {
            target: None,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            warp: false,
        }
    }

    /// Loads the configuration from given file. Any option not present
    /// keeps its default value.
    pub fn load_from_file<P: AsRef<Path>>(filepath: P) -> Result<Self, LoadConfigError> {
        let mut file = File::open(&filepath).map_err(LoadConfigError::Io)?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(LoadConfigError::Io)?;

        let yaml = YamlLoader::load_from_str(&content).map_err(LoadConfigError::Yaml)?;

        let document = yaml
            .first()
            .ok_or_else(|| LoadConfigError::Invalid("empty file".to_string()))?;
        let hash = document
            .as_hash()
            .ok_or_else(|| LoadConfigError::Invalid("expected a mapping".to_string()))?;

        let mut config = Config::default_config();

        for (key, value) in hash {
            match key
                .as_str()
                .ok_or_else(|| LoadConfigError::Invalid("expected a string key".to_string()))?
            {
                "target" => {
                    config.target = Some(
                        value
                            .as_str()
                            .ok_or_else(|| LoadConfigError::Invalid("expected a string".to_string()))?
                            .to_string(),
                    );
                }
                "max_stack_size" => {
                    config.max_stack_size = value
                        .as_i64()
                        .ok_or_else(|| LoadConfigError::Invalid("expected an integer".to_string()))?
                        as u32;
                }
                "warp" => {
                    config.warp = value
                        .as_bool()
                        .ok_or_else(|| LoadConfigError::Invalid("expected a boolean".to_string()))?;
                }
                option => return Err(LoadConfigError::UnknownOption(option.to_string())),
            }
        }

        Ok(config)
    }
}
