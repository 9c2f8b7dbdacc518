//! Round flow: turn rotation and end-of-round settlement.

pub mod scheduler;
pub mod settlement;

pub use scheduler::TurnOutcome;
pub use settlement::SettlementReport;
