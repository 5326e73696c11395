use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::engine::Command;
use super::schedule::{Scheduler, TaskId};
use crate::error::SessionError;
use crate::records::BestScoreStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    #[default]
    NotStarted,
    InProgress,
    Finished,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::NotStarted => "not started",
            Phase::InProgress => "in progress",
            Phase::Finished => "finished",
        }
    }

    pub fn can_start(self) -> bool {
        matches!(self, Phase::NotStarted | Phase::Finished)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FinishSummary {
    pub moves: u32,
    pub elapsed_secs: u32,
    pub best_moves: u32,
    pub new_record: bool,
}

/// Phase, clock and score bookkeeping. The only reader and writer of the
/// persisted best score.
pub struct Session {
    phase: Phase,
    moves: u32,
    elapsed_secs: u32,
    best_moves: Option<u32>,
    store: Box<dyn BestScoreStore>,
    ticker: Option<TaskId>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("moves", &self.moves)
            .field("elapsed_secs", &self.elapsed_secs)
            .field("best_moves", &self.best_moves)
            .field("ticker", &self.ticker)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Box<dyn BestScoreStore>) -> Self {
        let best_moves = match store.load() {
            Ok(best) => best,
            Err(err) => {
                warn!(%err, "could not read best score, starting without one");
                None
            }
        };
        debug!(?best_moves, "session created");
        Session {
            phase: Phase::NotStarted,
            moves: 0,
            elapsed_secs: 0,
            best_moves,
            store,
            ticker: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn best_moves(&self) -> Option<u32> {
        self.best_moves
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Enters `InProgress` with a zeroed counter and clock, and schedules the
    /// elapsed-time ticker tagged with `generation`.
    pub fn start(
        &mut self,
        scheduler: &mut dyn Scheduler,
        interval: Duration,
        generation: u64,
    ) -> Result<(), SessionError> {
        if !self.phase.can_start() {
            return Err(self.invalid("start"));
        }
        self.stop_ticker(scheduler);
        self.moves = 0;
        self.elapsed_secs = 0;
        self.phase = Phase::InProgress;
        self.ticker = Some(scheduler.schedule_repeating(interval, Command::Tick { generation }));
        info!(generation, "session started");
        Ok(())
    }

    /// Counts one second. Returns false outside `InProgress`.
    pub fn tick(&mut self) -> bool {
        if self.phase != Phase::InProgress {
            return false;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        true
    }

    pub fn record_move(&mut self) -> Result<u32, SessionError> {
        if self.phase != Phase::InProgress {
            return Err(self.invalid("record a move"));
        }
        self.moves = self.moves.saturating_add(1);
        Ok(self.moves)
    }

    /// Ends the game, stops the clock and persists the move count if it beats
    /// the current best. A second call fails without writing again.
    pub fn finish(&mut self, scheduler: &mut dyn Scheduler) -> Result<FinishSummary, SessionError> {
        if self.phase != Phase::InProgress {
            return Err(self.invalid("finish"));
        }
        self.stop_ticker(scheduler);
        self.phase = Phase::Finished;

        let new_record = self.best_moves.is_none_or(|best| self.moves < best);
        if new_record {
            self.best_moves = Some(self.moves);
            if let Err(err) = self.store.save(self.moves) {
                warn!(%err, moves = self.moves, "could not persist best score");
            }
        }
        let summary = FinishSummary {
            moves: self.moves,
            elapsed_secs: self.elapsed_secs,
            best_moves: self.best_moves.unwrap_or(self.moves),
            new_record,
        };
        info!(
            moves = summary.moves,
            elapsed_secs = summary.elapsed_secs,
            new_record,
            "session finished"
        );
        Ok(summary)
    }

    /// Returns to `NotStarted` from any phase. The best score is kept.
    pub fn reset(&mut self, scheduler: &mut dyn Scheduler) {
        self.stop_ticker(scheduler);
        if self.phase != Phase::NotStarted {
            info!(from = %self.phase, "session reset");
        }
        self.phase = Phase::NotStarted;
        self.moves = 0;
        self.elapsed_secs = 0;
    }

    fn stop_ticker(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(task) = self.ticker.take() {
            scheduler.cancel(task);
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.phase,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::game::ManualClock;
    use crate::records::MemoryStore;

    const SECOND: Duration = Duration::from_secs(1);

    struct BrokenStore;

    impl BestScoreStore for BrokenStore {
        fn load(&self) -> Result<Option<u32>, StoreError> {
            Err(std::io::Error::other("disk on fire").into())
        }

        fn save(&mut self, _best_moves: u32) -> Result<(), StoreError> {
            Err(std::io::Error::other("disk on fire").into())
        }
    }

    fn play(session: &mut Session, clock: &mut ManualClock, moves: u32) -> FinishSummary {
        session.start(clock, SECOND, 1).unwrap();
        for _ in 0..moves {
            session.record_move().unwrap();
        }
        session.finish(clock).unwrap()
    }

    #[test]
    fn start_zeroes_counters_and_schedules_ticker() {
        let mut clock = ManualClock::new();
        let mut session = Session::new(Box::new(MemoryStore::default()));
        assert_eq!(session.phase(), Phase::NotStarted);

        session.start(&mut clock, SECOND, 1).unwrap();
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.elapsed_secs(), 0);
        assert!(session.is_ticking());
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn start_while_in_progress_is_rejected() {
        let mut clock = ManualClock::new();
        let mut session = Session::new(Box::new(MemoryStore::default()));
        session.start(&mut clock, SECOND, 1).unwrap();
        session.record_move().unwrap();

        let err = session.start(&mut clock, SECOND, 2).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                phase: Phase::InProgress,
                action: "start"
            }
        );
        assert_eq!(session.moves(), 1);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn tick_only_counts_in_progress() {
        let mut clock = ManualClock::new();
        let mut session = Session::new(Box::new(MemoryStore::default()));
        assert!(!session.tick());
        session.start(&mut clock, SECOND, 1).unwrap();
        assert!(session.tick());
        assert!(session.tick());
        assert_eq!(session.elapsed_secs(), 2);
        session.finish(&mut clock).unwrap();
        assert!(!session.tick());
        assert_eq!(session.elapsed_secs(), 2);
    }

    #[test]
    fn record_move_requires_in_progress() {
        let mut session = Session::new(Box::new(MemoryStore::default()));
        assert!(session.record_move().is_err());
        assert_eq!(session.moves(), 0);
    }

    #[test]
    fn finish_stops_ticker_and_writes_once() {
        let store = MemoryStore::default();
        let mut clock = ManualClock::new();
        let mut session = Session::new(Box::new(store.clone()));

        let summary = play(&mut session, &mut clock, 4);
        assert_eq!(
            summary,
            FinishSummary {
                moves: 4,
                elapsed_secs: 0,
                best_moves: 4,
                new_record: true
            }
        );
        assert!(!session.is_ticking());
        assert_eq!(clock.pending(), 0);
        assert_eq!(store.writes(), 1);

        assert!(session.finish(&mut clock).is_err());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn best_only_improves() {
        let store = MemoryStore::with_best(5);
        let mut clock = ManualClock::new();
        let mut session = Session::new(Box::new(store.clone()));
        assert_eq!(session.best_moves(), Some(5));

        let first = play(&mut session, &mut clock, 3);
        assert!(first.new_record);
        assert_eq!(session.best_moves(), Some(3));

        let second = play(&mut session, &mut clock, 8);
        assert!(!second.new_record);
        assert_eq!(second.best_moves, 3);
        assert_eq!(session.best_moves(), Some(3));

        let tie = play(&mut session, &mut clock, 3);
        assert!(!tie.new_record);
        assert_eq!(store.best_moves(), Some(3));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn reset_clears_counters_but_keeps_best() {
        let mut clock = ManualClock::new();
        let mut session = Session::new(Box::new(MemoryStore::with_best(6)));
        session.start(&mut clock, SECOND, 1).unwrap();
        session.record_move().unwrap();
        session.tick();

        session.reset(&mut clock);
        assert_eq!(session.phase(), Phase::NotStarted);
        assert_eq!(session.moves(), 0);
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.best_moves(), Some(6));
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn broken_store_degrades_to_memory_only() {
        let mut clock = ManualClock::new();
        let mut session = Session::new(Box::new(BrokenStore));
        assert_eq!(session.best_moves(), None);

        let summary = play(&mut session, &mut clock, 2);
        assert!(summary.new_record);
        assert_eq!(session.best_moves(), Some(2));
    }
}
