//! Headless engine for a pairs memory game.
//!
//! The [`game::Game`] type owns the session, the board and every pending
//! timer, and is driven exclusively through [`game::Game::update`]. Any
//! renderer only reads snapshots and feeds commands back in.

pub mod config;
pub mod error;
pub mod game;
pub mod records;

pub use config::GameConfig;
pub use error::{ConfigError, GameError, SessionError, StoreError};
pub use game::{
    Card, CardId, CardStatus, Command, FinishSummary, Game, GameEvent, ManualClock, Phase,
    Scheduler, Snapshot, TaskId,
};
pub use records::{BestScoreStore, JsonFileStore, MemoryStore};
