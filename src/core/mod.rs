//! Shared primitives: identifiers, player containers, money math,
//! deterministic RNG, configuration, errors, and the game state itself.

pub mod config;
pub mod error;
pub mod ids;
pub mod money;
pub mod player;
pub mod rng;
pub mod state;

pub use error::{EngineError, EngineResult};
pub use ids::{ActionCardId, EventId, GameId, Symbol};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
