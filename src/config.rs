//! Round engine settings.
//!
//! Settings come from defaults, optionally overridden by a small TOML file
//! and then by the command line:
//!
//! ```toml
//! # Length of the audio snippet hint, in milliseconds.
//! clip_length_ms = 1500
//!
//! # Where the binary writes snippet WAV files.
//! snippet_dir = "/tmp/snippets"
//! ```
//!
//! Unknown keys are rejected so that typos do not go unnoticed.

use std::{fs, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    snippet::DEFAULT_CLIP_LENGTH,
};

/// Round engine settings.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Config {
    /// Length of the audio snippet hint.
    pub clip_length: Duration,

    /// Where the binary writes snippet WAV files. Printed as base64 when
    /// unset.
    pub snippet_dir: Option<PathBuf>,
}

/// On-disk representation, all keys optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    clip_length_ms: Option<u64>,
    snippet_dir: Option<PathBuf>,
}

impl Config {
    /// Config files are a handful of keys; refuse to read anything larger.
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Loads settings from a TOML file, falling back to defaults for
    /// missing keys.
    ///
    /// ```toml
    /// clip_length_ms = 2000
    /// snippet_dir = "/tmp/snippets"
    /// ```
    pub fn from_file(path: &str) -> Result<Self> {
        // Prevent out-of-memory condition: config file should be small.
        let file_size = fs::metadata(path)?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!("{path} is too large")));
        }

        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        trace!("config from {path}: {config:?}");
        Ok(config)
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        let mut config = Self::default();
        if let Some(ms) = file.clip_length_ms {
            config = config.with_clip_length(Duration::from_millis(ms))?;
        }
        config.snippet_dir = file.snippet_dir;
        Ok(config)
    }

    /// Sets the snippet length, rejecting zero.
    pub fn with_clip_length(mut self, clip_length: Duration) -> Result<Self> {
        if clip_length.is_zero() {
            return Err(Error::invalid_argument("clip length must be positive"));
        }
        self.clip_length = clip_length;
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clip_length: DEFAULT_CLIP_LENGTH,
            snippet_dir: None,
        }
    }
}
