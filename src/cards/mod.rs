//! Cards: market-event cards, corporate-action cards, and the round deck.

pub mod corporate;
pub mod deck;
pub mod event;

pub use corporate::{CorporateAction, CorporateActionKind, RightsStatus};
pub use deck::CardDeck;
pub use event::{MarketEvent, Severity};
