use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, trace};

use super::board::{Board, PairOutcome, Selection, Settled};
use super::card::{Card, CardId};
use super::schedule::Scheduler;
use super::session::{FinishSummary, Phase, Session};
use super::symbols::SYMBOL_ALPHABET;
use crate::config::GameConfig;
use crate::error::{ConfigError, GameError, SessionError};
use crate::records::BestScoreStore;

/// Everything that can change game state. Player input, timer expiry and
/// lifecycle actions all arrive as commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Start with a fixed card order instead of a random deal.
    StartWithLayout(Vec<String>),
    Select(CardId),
    Tick { generation: u64 },
    Settle { generation: u64 },
    Reset,
}

/// What changed as a result of a command, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum GameEvent {
    Started {
        generation: u64,
    },
    CardFlipped(CardId),
    PairSelected {
        first: CardId,
        second: CardId,
        outcome: PairOutcome,
    },
    PairMatched {
        first: CardId,
        second: CardId,
    },
    PairHidden {
        first: CardId,
        second: CardId,
    },
    Ticked {
        elapsed_secs: u32,
    },
    Finished(FinishSummary),
    Reset,
}

/// Read-only view handed to renderers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub moves: u32,
    pub elapsed_secs: u32,
    pub best_moves: Option<u32>,
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub cards: Vec<Card>,
    pub locked: bool,
}

/// Owns the session, the current board and every pending timer. All state
/// changes go through [`Game::update`].
pub struct Game {
    config: GameConfig,
    session: Session,
    board: Option<Board>,
    scheduler: Box<dyn Scheduler>,
    rng: StdRng,
    generation: u64,
}

impl Game {
    pub fn new(
        config: GameConfig,
        store: Box<dyn BestScoreStore>,
        scheduler: Box<dyn Scheduler>,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, store, scheduler, StdRng::from_os_rng())
    }

    pub fn with_rng(
        config: GameConfig,
        store: Box<dyn BestScoreStore>,
        scheduler: Box<dyn Scheduler>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate(SYMBOL_ALPHABET.len())?;
        Ok(Game {
            config,
            session: Session::new(store),
            board: None,
            scheduler,
            rng,
            generation: 0,
        })
    }

    pub fn update(&mut self, command: Command) -> Result<Vec<GameEvent>, GameError> {
        trace!(?command, generation = self.generation, "update");
        match command {
            Command::Start => self.start(None),
            Command::StartWithLayout(symbols) => self.start(Some(symbols)),
            Command::Select(id) => self.select(id),
            Command::Tick { generation } => Ok(self.tick(generation)),
            Command::Settle { generation } => self.settle(generation),
            Command::Reset => Ok(self.reset()),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Bumped on every start and reset; deferred commands carry the value
    /// current when they were scheduled.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.session.phase(),
            moves: self.session.moves(),
            elapsed_secs: self.session.elapsed_secs(),
            best_moves: self.session.best_moves(),
            grid_cols: self.config.grid_cols,
            grid_rows: self.config.grid_rows,
            cards: self
                .board
                .as_ref()
                .map(|board| board.cards().to_vec())
                .unwrap_or_default(),
            locked: self.board.as_ref().is_some_and(Board::is_locked),
        }
    }

    fn start(&mut self, layout: Option<Vec<String>>) -> Result<Vec<GameEvent>, GameError> {
        let phase = self.session.phase();
        if !phase.can_start() {
            return Err(SessionError::InvalidTransition {
                phase,
                action: "start",
            }
            .into());
        }

        let generation = self.generation.wrapping_add(1);
        let board = match layout {
            Some(symbols) => {
                let expected = self.config.cell_count();
                if symbols.len() != expected {
                    return Err(ConfigError::LayoutSize {
                        expected,
                        actual: symbols.len(),
                    }
                    .into());
                }
                Board::from_layout(generation, symbols.as_slice())?
            }
            None => Board::deal(
                generation,
                self.config.pairs_count(),
                &SYMBOL_ALPHABET,
                &mut self.rng,
            )?,
        };

        self.discard_board();
        self.generation = generation;
        self.session.start(
            self.scheduler.as_mut(),
            self.config.tick_interval(),
            generation,
        )?;
        self.board = Some(board);
        Ok(vec![GameEvent::Started { generation }])
    }

    fn select(&mut self, id: CardId) -> Result<Vec<GameEvent>, GameError> {
        if self.session.phase() != Phase::InProgress {
            debug!(card = %id, phase = %self.session.phase(), "selection outside a game ignored");
            return Ok(Vec::new());
        }
        let Some(board) = self.board.as_mut() else {
            return Ok(Vec::new());
        };

        match board.select(id, &self.config, self.scheduler.as_mut()) {
            Selection::Rejected(reason) => {
                debug!(card = %id, ?reason, "selection ignored");
                Ok(Vec::new())
            }
            Selection::Flipped => Ok(vec![GameEvent::CardFlipped(id)]),
            Selection::PairSelected {
                first,
                second,
                outcome,
            } => {
                let moves = self.session.record_move()?;
                debug!(%first, %second, ?outcome, moves, "pair selected");
                Ok(vec![
                    GameEvent::CardFlipped(id),
                    GameEvent::PairSelected {
                        first,
                        second,
                        outcome,
                    },
                ])
            }
        }
    }

    fn settle(&mut self, generation: u64) -> Result<Vec<GameEvent>, GameError> {
        let Some(board) = self
            .board
            .as_mut()
            .filter(|board| board.generation() == generation)
        else {
            debug!(generation, current = self.generation, "stale settle ignored");
            return Ok(Vec::new());
        };
        let Some(settled) = board.settle() else {
            return Ok(Vec::new());
        };

        match settled {
            Settled::Hidden { first, second } => Ok(vec![GameEvent::PairHidden { first, second }]),
            Settled::Matched {
                first,
                second,
                complete,
            } => {
                let mut events = vec![GameEvent::PairMatched { first, second }];
                if complete {
                    let summary = self.session.finish(self.scheduler.as_mut())?;
                    events.push(GameEvent::Finished(summary));
                }
                Ok(events)
            }
        }
    }

    fn tick(&mut self, generation: u64) -> Vec<GameEvent> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale tick ignored");
            return Vec::new();
        }
        if self.session.tick() {
            vec![GameEvent::Ticked {
                elapsed_secs: self.session.elapsed_secs(),
            }]
        } else {
            Vec::new()
        }
    }

    fn reset(&mut self) -> Vec<GameEvent> {
        self.discard_board();
        self.session.reset(self.scheduler.as_mut());
        self.generation = self.generation.wrapping_add(1);
        vec![GameEvent::Reset]
    }

    fn discard_board(&mut self) {
        if let Some(mut board) = self.board.take() {
            board.discard(self.scheduler.as_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::game::ManualClock;
    use crate::records::MemoryStore;

    fn game(cols: u32, rows: u32) -> (Game, ManualClock) {
        let clock = ManualClock::new();
        let config = GameConfig {
            grid_cols: cols,
            grid_rows: rows,
            ..GameConfig::default()
        };
        let game = Game::with_rng(
            config,
            Box::new(MemoryStore::default()),
            Box::new(clock.clone()),
            StdRng::seed_from_u64(5),
        )
        .unwrap();
        (game, clock)
    }

    fn layout(symbols: &[&str]) -> Command {
        Command::StartWithLayout(symbols.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn invalid_config_is_refused_up_front() {
        let result = Game::new(
            GameConfig {
                grid_cols: 3,
                grid_rows: 1,
                ..GameConfig::default()
            },
            Box::new(MemoryStore::default()),
            Box::new(ManualClock::new()),
        );
        assert!(matches!(result, Err(ConfigError::OddCellCount { cells: 3 })));
    }

    #[test]
    fn random_start_deals_full_board() {
        let (mut game, clock) = game(4, 4);
        let events = game.update(Command::Start).unwrap();
        assert_eq!(events, vec![GameEvent::Started { generation: 1 }]);
        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(game.board().unwrap().cards().len(), 16);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn wrong_layout_size_leaves_state_untouched() {
        let (mut game, clock) = game(2, 2);
        let err = game.update(layout(&["A", "A"])).unwrap_err();
        assert!(matches!(
            err,
            GameError::Config(ConfigError::LayoutSize {
                expected: 4,
                actual: 2
            })
        ));
        assert_eq!(game.phase(), Phase::NotStarted);
        assert!(game.board().is_none());
        assert_eq!(game.generation(), 0);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn start_during_game_is_an_error() {
        let (mut game, _clock) = game(2, 2);
        game.update(Command::Start).unwrap();
        let before = game.snapshot();
        assert!(matches!(
            game.update(Command::Start),
            Err(GameError::Session(SessionError::InvalidTransition {
                phase: Phase::InProgress,
                ..
            }))
        ));
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn selection_before_start_is_ignored() {
        let (mut game, _clock) = game(2, 2);
        assert!(game.update(Command::Select(CardId(0))).unwrap().is_empty());
        assert_eq!(game.snapshot().cards.len(), 0);
    }

    #[test]
    fn stale_settle_does_not_touch_new_board() {
        let (mut game, clock) = game(2, 2);
        game.update(layout(&["A", "B", "A", "B"])).unwrap();
        game.update(Command::Select(CardId(0))).unwrap();
        game.update(Command::Select(CardId(1))).unwrap();

        let events = game.update(Command::Settle { generation: 0 }).unwrap();
        assert!(events.is_empty());
        assert!(game.board().unwrap().is_locked());

        clock.advance(&mut game, Duration::from_secs(1)).unwrap();
        assert!(!game.board().unwrap().is_locked());
    }

    #[test]
    fn snapshot_mirrors_state() {
        let (mut game, _clock) = game(2, 1);
        game.update(layout(&["A", "A"])).unwrap();
        game.update(Command::Select(CardId(1))).unwrap();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.phase, Phase::InProgress);
        assert_eq!((snapshot.grid_cols, snapshot.grid_rows), (2, 1));
        assert!(snapshot.cards[1].is_face_up());
        assert!(!snapshot.locked);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "InProgress");
    }
}
