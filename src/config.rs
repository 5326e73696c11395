use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// The session clock counts whole seconds, so it always ticks once a second.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Board dimensions and timing for one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub match_settle_ms: u64,
    pub mismatch_settle_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            grid_cols: 4,
            grid_rows: 4,
            match_settle_ms: 500,
            mismatch_settle_ms: 1000,
        }
    }
}

impl GameConfig {
    pub fn cell_count(&self) -> usize {
        self.grid_cols as usize * self.grid_rows as usize
    }

    pub fn pairs_count(&self) -> usize {
        self.cell_count() / 2
    }

    pub fn match_settle(&self) -> Duration {
        Duration::from_millis(self.match_settle_ms)
    }

    pub fn mismatch_settle(&self) -> Duration {
        Duration::from_millis(self.mismatch_settle_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        TICK_INTERVAL
    }

    /// Checks that a board of this shape can be dealt from `alphabet_len`
    /// distinct symbols.
    pub fn validate(&self, alphabet_len: usize) -> Result<(), ConfigError> {
        let cells = self.cell_count();
        if cells == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if cells % 2 != 0 {
            return Err(ConfigError::OddCellCount { cells });
        }
        let needed = self.pairs_count();
        if needed > alphabet_len {
            return Err(ConfigError::AlphabetTooSmall {
                needed,
                available: alphabet_len,
            });
        }
        Ok(())
    }

    /// Reads a config file. A missing file is not an error and yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(GameConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "ignoring unusable config file");
                GameConfig::default()
            }
        }
    }
}
