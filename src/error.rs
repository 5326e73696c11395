use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::game::Phase;

/// A board that cannot be dealt, or a config file that cannot be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("board has no cells")]
    EmptyBoard,
    #[error("board has {cells} cells; pairs need an even count")]
    OddCellCount { cells: usize },
    #[error("board needs {needed} distinct symbols but the alphabet only has {available}")]
    AlphabetTooSmall { needed: usize, available: usize },
    #[error("layout has {actual} cards but the grid holds {expected}")]
    LayoutSize { expected: usize, actual: usize },
    #[error("symbol {symbol:?} appears {count} times; every symbol must appear exactly twice")]
    UnpairedLayout { symbol: String, count: usize },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An operation invoked in a phase that does not permit it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while the session is {phase}")]
    InvalidTransition { phase: Phase, action: &'static str },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("records i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("records are malformed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
