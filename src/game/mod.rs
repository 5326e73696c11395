//! Game state machine: a session controller and a board engine behind one
//! serialized entry point.

mod board;
mod card;
mod engine;
mod schedule;
mod session;
pub mod symbols;

pub use board::{Board, PairOutcome, RejectReason, Selection, Settled};
pub use card::{Card, CardId, CardStatus};
pub use engine::{Command, Game, GameEvent, Snapshot};
pub use schedule::{ManualClock, Scheduler, TaskId};
pub use session::{FinishSummary, Phase, Session};
