use std::fmt;

use serde::Serialize;

/// Position-derived identifier, unique within one dealt board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CardId(pub usize);

impl CardId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CardStatus {
    Hidden,
    FaceUp,
    Matched,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub symbol: String,
    pub status: CardStatus,
}

impl Card {
    pub fn new(id: CardId, symbol: impl Into<String>) -> Self {
        Card {
            id,
            symbol: symbol.into(),
            status: CardStatus::Hidden,
        }
    }

    /// Matched cards stay face up for the rest of the game.
    pub fn is_face_up(&self) -> bool {
        self.status != CardStatus::Hidden
    }

    pub fn is_matched(&self) -> bool {
        self.status == CardStatus::Matched
    }
}
