//! Identifier newtypes for game entities.
//!
//! Every entity the engine tracks is addressed by a typed id:
//! - `Symbol`: a stock's ticker symbol, the unique key for stocks.
//! - `EventId`: a market-event card, allocated per game.
//! - `ActionCardId`: a corporate-action card, allocated per game.
//! - `GameId`: a game instance inside a [`crate::store::GameStore`].
//!
//! Ids are opaque: the engine compares them for equality and uses them as
//! map keys, nothing else.

use serde::{Deserialize, Serialize};

/// A stock's ticker symbol. The unique key for stocks within a game.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol. Tickers are stored uppercase.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self(ticker.into().to_uppercase())
    }

    /// The ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier for a market-event card.
///
/// Allocated monotonically per game by `GameState::alloc_event_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl EventId {
    /// Create an event ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// Identifier for a corporate-action card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionCardId(pub u32);

impl ActionCardId {
    /// Create a corporate-action card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ActionCardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActionCard({})", self.0)
    }
}

/// Identifier for a game instance in a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub u64);

impl GameId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Game({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_uppercased() {
        let s = Symbol::new("tech");
        assert_eq!(s.as_str(), "TECH");
        assert_eq!(format!("{}", s), "TECH");
        assert_eq!(s, Symbol::from("TECH"));
    }

    #[test]
    fn test_symbol_ordering() {
        let mut symbols = vec![Symbol::new("TECH"), Symbol::new("AUTO"), Symbol::new("BANK")];
        symbols.sort();
        assert_eq!(symbols[0], Symbol::new("AUTO"));
        assert_eq!(symbols[2], Symbol::new("TECH"));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", EventId::new(7)), "Event(7)");
        assert_eq!(format!("{}", ActionCardId::new(3)), "ActionCard(3)");
        assert_eq!(format!("{}", GameId(1)), "Game(1)");
    }
}
