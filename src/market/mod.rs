//! The market: listed stocks, player holdings, and price movement.

pub mod pricing;
pub mod stock;

pub use stock::{Holding, PricePoint, Stock};
