//! # bourse
//!
//! A turn-based multiplayer stock-trading board game engine.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: A game is a pure function of its configuration,
//!    player roster, and seed. Replaying the same operations reproduces
//!    the same state, card draws included.
//!
//! 2. **Single-Writer**: One operation mutates a game at a time, runs to
//!    completion, and is all-or-nothing through the store layer.
//!
//! 3. **Configuration Over Convention**: Round counts, hand composition,
//!    leadership thresholds, and corporate-action terms all live in
//!    `GameConfig`; house rules are knobs, not forks.
//!
//! ## Architecture
//!
//! - **Explicit Phases**: A round is `Trading` → `AwaitingExclusion` →
//!   `Settling`; every operation checks the phase it needs.
//!
//! - **Persistent Data Structures**: Price history and per-player audit
//!   logs use `im` vectors for cheap snapshots.
//!
//! - **Money as Decimal**: All cash and prices use `rust_decimal`,
//!   rounded to cents at every boundary.
//!
//! ## Modules
//!
//! - `core`: IDs, players, money, RNG, configuration, errors, game state
//! - `market`: Stocks, holdings, price-impact math
//! - `cards`: Market-event and corporate-action cards, the round deck
//! - `corporate`: Dividends, rights issues, bonus issues
//! - `leadership`: Chairman/director tracking and the veto phase
//! - `round`: Turn rotation and end-of-round settlement
//! - `engine`: The operation facade, one instance per game
//! - `store`: Snapshot persistence with per-game locking

pub mod cards;
pub mod core;
pub mod corporate;
pub mod engine;
pub mod leadership;
pub mod market;
pub mod round;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    config::{GameConfig, StockSpec},
    state::{GameState, Player, RoundPhase, TurnAction, TurnActionKind},
    ActionCardId, EngineError, EngineResult, EventId, GameId, GameRng, GameRngState, PlayerId,
    PlayerMap, Symbol,
};

pub use crate::cards::{
    CardDeck, CorporateAction, CorporateActionKind, MarketEvent, RightsStatus, Severity,
};

pub use crate::engine::{GameEngine, Standing, TradeAction, TradeOutcome};

pub use crate::leadership::{ExclusionStatus, Leader, LeaderOpportunities, LeaderRole};

pub use crate::market::{Holding, PricePoint, Stock};

pub use crate::round::{SettlementReport, TurnOutcome};

pub use crate::store::{GameStore, MemoryStore};
