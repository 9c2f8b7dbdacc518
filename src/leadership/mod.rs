//! Leadership: chairman/director titles and the veto (exclusion) phase.

pub mod exclusion;
pub mod tracker;

pub use exclusion::{ExclusionStatus, LeaderOpportunities, LeaderRole, StockOpportunity};
pub use tracker::Leader;
