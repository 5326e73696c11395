use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::Serialize;
use tracing::debug;

use super::card::{Card, CardId, CardStatus};
use super::engine::Command;
use super::schedule::{Scheduler, TaskId};
use crate::config::GameConfig;
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PairOutcome {
    Match,
    Mismatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    Locked,
    UnknownCard,
    AlreadyMatched,
    AlreadyFaceUp,
}

/// Result of one card selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Rejected(RejectReason),
    /// First card of a pair turned over.
    Flipped,
    /// Second card turned over; the board is locked until the outcome settles.
    PairSelected {
        first: CardId,
        second: CardId,
        outcome: PairOutcome,
    },
}

/// Result of a settle delay elapsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    Matched {
        first: CardId,
        second: CardId,
        complete: bool,
    },
    Hidden {
        first: CardId,
        second: CardId,
    },
}

#[derive(Debug)]
struct PendingSettle {
    task: TaskId,
    first: CardId,
    second: CardId,
    outcome: PairOutcome,
}

/// One dealt board and its selection lock.
#[derive(Debug)]
pub struct Board {
    generation: u64,
    cards: Vec<Card>,
    selected: Vec<CardId>,
    locked: bool,
    pending: Option<PendingSettle>,
}

impl Board {
    /// Draws `pairs` distinct symbols from `alphabet`, doubles them and deals
    /// them in a uniformly random order.
    pub fn deal<R: Rng + ?Sized>(
        generation: u64,
        pairs: usize,
        alphabet: &[&str],
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        if pairs == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        if pairs > alphabet.len() {
            return Err(ConfigError::AlphabetTooSmall {
                needed: pairs,
                available: alphabet.len(),
            });
        }

        let mut deck: Vec<&str> = Vec::with_capacity(pairs * 2);
        for &symbol in alphabet.choose_multiple(rng, pairs) {
            deck.push(symbol);
            deck.push(symbol);
        }
        deck.shuffle(rng);

        debug!(generation, cards = deck.len(), "dealt board");
        Ok(Self::from_deck(generation, deck))
    }

    /// Deals `symbols` in the given order. Every symbol must occur exactly
    /// twice.
    pub fn from_layout<S: AsRef<str>>(generation: u64, symbols: &[S]) -> Result<Self, ConfigError> {
        if symbols.is_empty() {
            return Err(ConfigError::EmptyBoard);
        }
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for symbol in symbols {
            *counts.entry(symbol.as_ref()).or_default() += 1;
        }
        if let Some((symbol, count)) = counts.into_iter().find(|(_, count)| *count != 2) {
            return Err(ConfigError::UnpairedLayout {
                symbol: symbol.to_string(),
                count,
            });
        }
        Ok(Self::from_deck(
            generation,
            symbols.iter().map(|s| s.as_ref()),
        ))
    }

    fn from_deck<'a>(generation: u64, deck: impl IntoIterator<Item = &'a str>) -> Self {
        let cards = deck
            .into_iter()
            .enumerate()
            .map(|(index, symbol)| Card::new(CardId(index), symbol))
            .collect();
        Board {
            generation,
            cards,
            selected: Vec::with_capacity(2),
            locked: false,
            pending: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id.index())
    }

    /// Face-up cards awaiting a match decision, in selection order.
    pub fn selected(&self) -> &[CardId] {
        &self.selected
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_complete(&self) -> bool {
        self.cards.iter().all(Card::is_matched)
    }

    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|card| card.is_matched()).count() / 2
    }

    /// Turns a card over. Completing a pair locks the board and schedules
    /// the settle command for this board's generation.
    pub fn select(
        &mut self,
        id: CardId,
        config: &GameConfig,
        scheduler: &mut dyn Scheduler,
    ) -> Selection {
        if self.locked {
            return Selection::Rejected(RejectReason::Locked);
        }
        let Some(card) = self.cards.get_mut(id.index()) else {
            return Selection::Rejected(RejectReason::UnknownCard);
        };
        match card.status {
            CardStatus::Matched => return Selection::Rejected(RejectReason::AlreadyMatched),
            CardStatus::FaceUp => return Selection::Rejected(RejectReason::AlreadyFaceUp),
            CardStatus::Hidden => card.status = CardStatus::FaceUp,
        }
        self.selected.push(id);

        let &[first, second] = self.selected.as_slice() else {
            return Selection::Flipped;
        };
        self.locked = true;
        let outcome = if self.cards[first.index()].symbol == self.cards[second.index()].symbol {
            PairOutcome::Match
        } else {
            PairOutcome::Mismatch
        };
        let delay = match outcome {
            PairOutcome::Match => config.match_settle(),
            PairOutcome::Mismatch => config.mismatch_settle(),
        };
        let task = scheduler.schedule_once(
            delay,
            Command::Settle {
                generation: self.generation,
            },
        );
        self.pending = Some(PendingSettle {
            task,
            first,
            second,
            outcome,
        });
        Selection::PairSelected {
            first,
            second,
            outcome,
        }
    }

    /// Applies the pending outcome and unlocks the board. `None` when nothing
    /// was pending.
    pub fn settle(&mut self) -> Option<Settled> {
        let PendingSettle {
            first,
            second,
            outcome,
            ..
        } = self.pending.take()?;
        let status = match outcome {
            PairOutcome::Match => CardStatus::Matched,
            PairOutcome::Mismatch => CardStatus::Hidden,
        };
        for id in [first, second] {
            self.cards[id.index()].status = status;
        }
        self.selected.clear();
        self.locked = false;

        Some(match outcome {
            PairOutcome::Match => Settled::Matched {
                first,
                second,
                complete: self.is_complete(),
            },
            PairOutcome::Mismatch => Settled::Hidden { first, second },
        })
    }

    /// Cancels any outstanding settle task before the board is dropped or
    /// replaced.
    pub fn discard(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(pending) = self.pending.take() {
            debug!(generation = self.generation, "cancelling pending settle");
            scheduler.cancel(pending.task);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::game::ManualClock;
    use crate::game::symbols::SYMBOL_ALPHABET;

    fn layout(symbols: &[&str]) -> Board {
        Board::from_layout(1, symbols).unwrap()
    }

    fn symbol_counts(board: &Board) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for card in board.cards() {
            *counts.entry(card.symbol.as_str()).or_insert(0) += 1;
        }
        counts
    }

    proptest! {
        #[test]
        fn every_dealt_symbol_appears_twice(seed in any::<u64>(), pairs in 1usize..=32) {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = Board::deal(1, pairs, &SYMBOL_ALPHABET, &mut rng).unwrap();
            prop_assert_eq!(board.cards().len(), pairs * 2);
            let counts = symbol_counts(&board);
            prop_assert_eq!(counts.len(), pairs);
            prop_assert!(counts.values().all(|&count| count == 2));
            for (index, card) in board.cards().iter().enumerate() {
                prop_assert_eq!(card.id, CardId(index));
                prop_assert_eq!(card.status, CardStatus::Hidden);
            }
        }
    }

    #[test]
    fn deal_rejects_small_alphabet() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = Board::deal(1, 3, &["a", "b"], &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::AlphabetTooSmall {
                needed: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn deal_order_varies_with_seed() {
        let deal = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            Board::deal(1, 8, &SYMBOL_ALPHABET, &mut rng)
                .unwrap()
                .cards()
                .iter()
                .map(|card| card.symbol.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(deal(11), deal(11));
        assert!((12..20).any(|seed| deal(seed) != deal(11)));
    }

    #[test]
    fn layout_must_be_paired() {
        assert!(matches!(
            Board::from_layout(1, &["A", "A", "B"]),
            Err(ConfigError::UnpairedLayout { ref symbol, count: 1 }) if symbol == "B"
        ));
        assert!(matches!(
            Board::from_layout(1, &["A", "A", "A", "A"]),
            Err(ConfigError::UnpairedLayout { count: 4, .. })
        ));
        assert!(matches!(
            Board::from_layout::<&str>(1, &[]),
            Err(ConfigError::EmptyBoard)
        ));
    }

    #[test]
    fn matching_pair_locks_then_settles_matched() {
        let config = GameConfig::default();
        let mut clock = ManualClock::new();
        let mut board = layout(&["A", "A", "B", "B"]);

        assert_eq!(board.select(CardId(0), &config, &mut clock), Selection::Flipped);
        assert_eq!(
            board.select(CardId(1), &config, &mut clock),
            Selection::PairSelected {
                first: CardId(0),
                second: CardId(1),
                outcome: PairOutcome::Match
            }
        );
        assert!(board.is_locked());
        assert_eq!(clock.pending(), 1);

        assert_eq!(
            board.settle(),
            Some(Settled::Matched {
                first: CardId(0),
                second: CardId(1),
                complete: false
            })
        );
        assert!(!board.is_locked());
        assert!(board.selected().is_empty());
        assert!(board.card(CardId(0)).unwrap().is_matched());
        assert!(board.card(CardId(1)).unwrap().is_face_up());
        assert_eq!(board.matched_pairs(), 1);
    }

    #[test]
    fn mismatched_pair_turns_back_down() {
        let config = GameConfig::default();
        let mut clock = ManualClock::new();
        let mut board = layout(&["A", "B", "A", "B"]);

        board.select(CardId(0), &config, &mut clock);
        board.select(CardId(1), &config, &mut clock);
        assert_eq!(
            board.settle(),
            Some(Settled::Hidden {
                first: CardId(0),
                second: CardId(1)
            })
        );
        assert!(board.cards().iter().all(|card| !card.is_face_up()));
        assert!(!board.is_locked());
    }

    #[test]
    fn third_card_is_ignored_while_locked() {
        let config = GameConfig::default();
        let mut clock = ManualClock::new();
        let mut board = layout(&["A", "B", "A", "B"]);

        board.select(CardId(0), &config, &mut clock);
        board.select(CardId(1), &config, &mut clock);
        assert_eq!(
            board.select(CardId(2), &config, &mut clock),
            Selection::Rejected(RejectReason::Locked)
        );
        assert!(!board.card(CardId(2)).unwrap().is_face_up());
        assert_eq!(board.selected(), &[CardId(0), CardId(1)]);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn reselecting_a_face_up_card_is_ignored() {
        let config = GameConfig::default();
        let mut clock = ManualClock::new();
        let mut board = layout(&["A", "A"]);

        board.select(CardId(0), &config, &mut clock);
        assert_eq!(
            board.select(CardId(0), &config, &mut clock),
            Selection::Rejected(RejectReason::AlreadyFaceUp)
        );
        assert_eq!(
            board.select(CardId(9), &config, &mut clock),
            Selection::Rejected(RejectReason::UnknownCard)
        );
        assert_eq!(board.selected(), &[CardId(0)]);
        assert!(!board.is_locked());
    }

    #[test]
    fn matched_cards_cannot_be_selected() {
        let config = GameConfig::default();
        let mut clock = ManualClock::new();
        let mut board = layout(&["A", "A", "B", "B"]);
        board.select(CardId(0), &config, &mut clock);
        board.select(CardId(1), &config, &mut clock);
        board.settle();

        assert_eq!(
            board.select(CardId(1), &config, &mut clock),
            Selection::Rejected(RejectReason::AlreadyMatched)
        );
    }

    #[test]
    fn discard_cancels_pending_settle() {
        let config = GameConfig::default();
        let mut clock = ManualClock::new();
        let mut board = layout(&["A", "B", "A", "B"]);
        board.select(CardId(0), &config, &mut clock);
        board.select(CardId(1), &config, &mut clock);
        assert_eq!(clock.pending(), 1);

        board.discard(&mut clock);
        assert_eq!(clock.pending(), 0);
        assert_eq!(board.settle(), None);
    }
}
