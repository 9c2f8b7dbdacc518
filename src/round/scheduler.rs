//! Turn and round advancement.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::settlement::{self, SettlementReport};
use crate::core::config::GameConfig;
use crate::core::error::{EngineError, EngineResult};
use crate::core::state::{GameState, RoundPhase};
use crate::core::PlayerId;
use crate::corporate;
use crate::leadership::exclusion::ExclusionStatus;
use crate::leadership::tracker::{self, Leader};

/// What ending a turn did.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Did this turn close the round?
    pub round_ended: bool,
    /// Did the game complete?
    pub game_over: bool,
    /// Is settlement gated behind a leadership exclusion phase?
    pub leadership_phase_required: bool,
    /// The leaders of that phase, in veto order.
    pub leaders: Vec<Leader>,
    /// The settlement report, when the round settled immediately.
    pub settlement: Option<SettlementReport>,
}

impl TurnOutcome {
    fn turn_only() -> Self {
        Self {
            round_ended: false,
            game_over: false,
            leadership_phase_required: false,
            leaders: Vec::new(),
            settlement: None,
        }
    }
}

/// End the current player's turn.
///
/// Advances the rotation; when the rotation wraps past the last turn of the
/// round, the round ends. If any stock has a leader, settlement waits for
/// the exclusion phase and `leadership_phase_required` is set; otherwise
/// the round settles immediately.
///
/// Also closes any rights-issue window whose playing player's turn is now
/// arriving (one full rotation after it was played).
pub fn end_turn(state: &mut GameState, config: &GameConfig) -> EngineResult<TurnOutcome> {
    if state.complete {
        return Err(EngineError::conflict("an active game", "game complete"));
    }
    if state.phase != RoundPhase::Trading {
        return Err(EngineError::conflict("trading phase", state.phase.name()));
    }

    let next = PlayerId::new(((state.current_player.index() + 1) % state.player_count()) as u8);
    state.current_player = next;
    corporate::expire_rights_for_player(state, next);

    if next.index() != 0 {
        return Ok(TurnOutcome::turn_only());
    }

    state.turn_in_round += 1;
    if state.turn_in_round <= config.turns_per_round {
        return Ok(TurnOutcome::turn_only());
    }

    // Round boundary
    let leaders = tracker::leaders(state);
    if !leaders.is_empty() {
        info!(
            round = state.round,
            leaders = leaders.len(),
            "round ended; exclusion phase required"
        );
        state.phase = RoundPhase::AwaitingExclusion(ExclusionStatus::new(leaders.clone()));
        return Ok(TurnOutcome {
            round_ended: true,
            game_over: false,
            leadership_phase_required: true,
            leaders,
            settlement: None,
        });
    }

    let report = settlement::process(state, config)?;
    Ok(TurnOutcome {
        round_ended: true,
        game_over: report.game_over,
        leadership_phase_required: false,
        leaders: Vec::new(),
        settlement: Some(report),
    })
}
