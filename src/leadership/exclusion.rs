//! The leadership exclusion phase: a per-round veto window.
//!
//! When a round ends with any stock led, settlement is gated behind this
//! state machine. Leaders take their window in strict order (chairmen
//! first); each may veto pending events on stocks they lead, then the
//! caller advances to the next leader. Once every leader has had their
//! window the phase is complete and the caller must settle the round.
//!
//! Visibility rules: a chairman sees every player's events on their stock;
//! a director sees only their own events, and only on stocks with no
//! chairman. A chairman on a stock always supersedes its director.
//!
//! The engine enforces per-event rules only ("not already excluded" plus
//! leadership eligibility); it deliberately does not cap vetoes at one per
//! stock - that is a client-side convention layered above this module.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::tracker::Leader;
use crate::core::error::{EngineError, EngineResult};
use crate::core::state::{GameState, RoundPhase, TurnActionKind};
use crate::core::{EventId, PlayerId, Symbol};

/// Progress of an in-flight exclusion phase.
///
/// Exists only between round end and settlement; destroyed on completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExclusionStatus {
    /// Leaders in veto order.
    pub leaders: Vec<Leader>,
    /// Index of the leader whose window is open.
    pub current: usize,
    /// Leaders whose windows have closed.
    pub completed: Vec<PlayerId>,
}

impl ExclusionStatus {
    /// Start a phase with the given ordered leaders.
    #[must_use]
    pub fn new(leaders: Vec<Leader>) -> Self {
        Self {
            leaders,
            current: 0,
            completed: Vec::new(),
        }
    }

    /// The leader whose window is currently open, if any remain.
    #[must_use]
    pub fn current_leader(&self) -> Option<&Leader> {
        self.leaders.get(self.current)
    }

    /// Have all leaders had their window?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.leaders.len()
    }

    /// Close the current leader's window. Returns true once the phase is
    /// complete.
    pub fn advance(&mut self) -> bool {
        if let Some(leader) = self.leaders.get(self.current) {
            self.completed.push(leader.player);
            self.current += 1;
        }
        self.is_complete()
    }
}

/// A leader's role on one stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderRole {
    Chairman,
    Director,
}

/// Veto opportunities on one stock for one leader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockOpportunity {
    /// The led stock.
    pub symbol: Symbol,
    /// The leader's role on it.
    pub role: LeaderRole,
    /// Vetoable events, in deal order. Never contains excluded events.
    pub events: Vec<EventId>,
}

/// All veto opportunities for one leader, grouped per stock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderOpportunities {
    /// The leader.
    pub player: PlayerId,
    /// One group per led stock, chaired stocks first.
    pub groups: Vec<StockOpportunity>,
}

/// Opportunity groups for every leader, in veto order.
///
/// Requires an active exclusion phase. Already-excluded events are never
/// re-offered.
pub fn opportunities(state: &GameState) -> EngineResult<Vec<LeaderOpportunities>> {
    let status = active_status(state)?;

    let mut out = Vec::with_capacity(status.leaders.len());
    for leader in &status.leaders {
        let mut groups = Vec::new();

        for symbol in &leader.chaired {
            groups.push(StockOpportunity {
                symbol: symbol.clone(),
                role: LeaderRole::Chairman,
                events: vetoable_events(state, symbol, None),
            });
        }
        for symbol in &leader.directed {
            groups.push(StockOpportunity {
                symbol: symbol.clone(),
                role: LeaderRole::Director,
                events: vetoable_events(state, symbol, Some(leader.player)),
            });
        }

        out.push(LeaderOpportunities {
            player: leader.player,
            groups,
        });
    }
    Ok(out)
}

/// Veto one event on behalf of a leader.
///
/// The caller must be the leader whose window is open. Chairmen may veto
/// any player's event on a chaired stock; directors only their own events
/// on chairman-less stocks they direct.
pub fn exclude_event(state: &mut GameState, event_id: EventId, leader: PlayerId) -> EngineResult<()> {
    let entry = {
        let status = active_status(state)?;
        status
            .current_leader()
            .cloned()
            .ok_or_else(|| EngineError::conflict("an open veto window", "phase already complete"))?
    };
    if entry.player != leader {
        return Err(EngineError::conflict(
            format!("veto window of {}", entry.player),
            format!("request from {leader}"),
        ));
    }

    let (owner, affected, headline) = {
        let event = state.event(event_id)?;
        if event.round != state.round {
            return Err(EngineError::validation(format!(
                "{event_id} does not belong to the current round"
            )));
        }
        if event.is_excluded() {
            return Err(EngineError::validation(format!(
                "{event_id} is already excluded"
            )));
        }
        (
            event.owner,
            event.affected.to_vec(),
            event.headline.clone(),
        )
    };

    let chairs = affected.iter().any(|s| entry.chaired.contains(s));
    let directs = affected.iter().any(|s| entry.directed.contains(s));

    if !chairs {
        if !directs {
            warn!(%leader, %event_id, "veto rejected: caller leads no affected stock");
            return Err(EngineError::Leadership {
                player: leader,
                reason: "not chairman or director of an affected stock".into(),
            });
        }
        if owner != leader {
            warn!(%leader, %event_id, "veto rejected: directors may only veto their own events");
            return Err(EngineError::Leadership {
                player: leader,
                reason: "directors may only veto their own events".into(),
            });
        }
    }

    state.event_mut(event_id)?.excluded_by = Some(leader);
    state.log_action(
        leader,
        TurnActionKind::Veto,
        format!("vetoed \"{headline}\""),
    );
    info!(%leader, %event_id, "event excluded from settlement");
    Ok(())
}

/// Close the current leader's window and move to the next. Returns true
/// once every leader has had their window.
pub fn advance_to_next_leader(state: &mut GameState) -> EngineResult<bool> {
    match &mut state.phase {
        RoundPhase::AwaitingExclusion(status) => {
            if status.is_complete() {
                return Err(EngineError::conflict(
                    "an open veto window",
                    "phase already complete",
                ));
            }
            let done = status.advance();
            info!(complete = done, "advanced exclusion phase");
            Ok(done)
        }
        phase => Err(EngineError::conflict("awaiting exclusion", phase.name())),
    }
}

fn active_status(state: &GameState) -> EngineResult<&ExclusionStatus> {
    match &state.phase {
        RoundPhase::AwaitingExclusion(status) => Ok(status),
        phase => Err(EngineError::conflict("awaiting exclusion", phase.name())),
    }
}

/// Non-excluded current-round events on a stock, optionally filtered to one
/// owner (director visibility).
fn vetoable_events(state: &GameState, symbol: &Symbol, owned_by: Option<PlayerId>) -> Vec<EventId> {
    state
        .current_round_events()
        .filter(|e| !e.is_excluded() && e.affects(symbol))
        .filter(|e| owned_by.map_or(true, |p| e.owner == p))
        .map(|e| e.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;

    fn leader(player: u8) -> Leader {
        Leader {
            player: PlayerId::new(player),
            chaired: vec![Symbol::new("TECH")],
            directed: vec![],
        }
    }

    #[test]
    fn test_status_walks_leaders_in_order() {
        let mut status = ExclusionStatus::new(vec![leader(2), leader(0)]);

        assert_eq!(status.current_leader().unwrap().player, PlayerId::new(2));
        assert!(!status.advance());
        assert_eq!(status.current_leader().unwrap().player, PlayerId::new(0));
        assert!(status.advance());
        assert!(status.is_complete());
        assert_eq!(status.completed, vec![PlayerId::new(2), PlayerId::new(0)]);
    }

    #[test]
    fn test_advance_past_end_is_noop() {
        let mut status = ExclusionStatus::new(vec![leader(0)]);
        status.advance();
        assert!(status.advance());
        assert_eq!(status.completed.len(), 1);
    }

    #[test]
    fn test_empty_phase_is_immediately_complete() {
        let status = ExclusionStatus::new(vec![]);
        assert!(status.is_complete());
        assert!(status.current_leader().is_none());
    }
}
