//! The game engine: the operation surface a transport layer exposes.
//!
//! One `GameEngine` per game instance, single-writer: every operation runs
//! to completion before the next is accepted (see [`crate::store`] for the
//! per-game locking wrapper). All sub-engines are composed by explicit
//! construction; there are no process-wide singletons.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::corporate::CorporateActionKind;
use crate::cards::deck;
use crate::core::config::GameConfig;
use crate::core::error::{EngineError, EngineResult};
use crate::core::money::round_cents;
use crate::core::state::{GameState, RoundPhase, TurnActionKind};
use crate::core::{ActionCardId, EventId, PlayerId, Symbol};
use crate::corporate;
use crate::leadership::exclusion::{self, LeaderOpportunities};
use crate::leadership::tracker;
use crate::market::stock::Holding;
use crate::round::scheduler::{self, TurnOutcome};
use crate::round::settlement;

/// A trade-surface request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TradeAction {
    /// Buy shares from the market at the current price.
    Buy { symbol: Symbol, quantity: u64 },
    /// Sell held shares back to the market at the current price.
    Sell { symbol: Symbol, quantity: u64 },
    /// Do nothing this turn.
    Skip,
    /// Play a dealt corporate-action card, binding it to a stock.
    /// `quantity` is an optional immediate rights-issue subscription.
    PlayCorporateAction {
        card: ActionCardId,
        symbol: Symbol,
        quantity: Option<u64>,
    },
}

/// Result of a successful trade-surface request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// What happened, for the acting player.
    pub message: String,
    /// Toast-style side effects visible to everyone (dividends paid,
    /// rights windows opened, grants scaled).
    pub notices: Vec<String>,
}

/// One row of the game-over report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player: PlayerId,
    pub name: String,
    /// Cash plus holdings at final prices.
    pub net_worth: Decimal,
}

/// A single game instance and its rule configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
}

impl GameEngine {
    /// Create a game: fund players, list stocks, deal round 1.
    pub fn new(config: GameConfig, player_names: &[String], seed: u64) -> EngineResult<Self> {
        let mut state = GameState::new(&config, player_names, seed)?;
        deck::deal_round(&mut state, &config);
        info!(
            players = player_names.len(),
            rounds = config.max_rounds,
            seed,
            "game created"
        );
        Ok(Self { config, state })
    }

    /// The rule configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Read-only access to the game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    // === Trading ===

    /// Execute a trade-surface request for the acting player.
    pub fn execute_trade(
        &mut self,
        player: PlayerId,
        action: TradeAction,
    ) -> EngineResult<TradeOutcome> {
        self.require_turn_of(player)?;

        match action {
            TradeAction::Buy { symbol, quantity } => self.buy(player, &symbol, quantity),
            TradeAction::Sell { symbol, quantity } => self.sell(player, &symbol, quantity),
            TradeAction::Skip => {
                self.state.log_action(player, TurnActionKind::Skip, "skipped");
                Ok(TradeOutcome {
                    message: "turn skipped".into(),
                    notices: Vec::new(),
                })
            }
            TradeAction::PlayCorporateAction {
                card,
                symbol,
                quantity,
            } => self.play_corporate(player, card, &symbol, quantity),
        }
    }

    fn buy(&mut self, player: PlayerId, symbol: &Symbol, quantity: u64) -> EngineResult<TradeOutcome> {
        if quantity == 0 {
            return Err(EngineError::validation("quantity must be positive"));
        }
        let (price, available) = {
            let stock = self.state.stock(symbol)?;
            (stock.price, stock.available)
        };
        if quantity > available {
            return Err(EngineError::rule(format!(
                "only {available} {symbol} shares available in the market"
            )));
        }
        let cost = round_cents(price * Decimal::from(quantity));
        if self.state.players[player].cash < cost {
            return Err(EngineError::rule(format!(
                "insufficient funds: need {cost}, have {}",
                self.state.players[player].cash
            )));
        }

        self.state.players[player].cash -= cost;
        self.state.players[player]
            .holdings
            .entry(symbol.clone())
            .or_insert_with(Holding::default)
            .add_shares(quantity, price);
        self.state.stock_mut(symbol)?.available -= quantity;

        tracker::recompute(&mut self.state, symbol, &self.config)?;
        self.state.check_conservation()?;
        self.state.log_action(
            player,
            TurnActionKind::Buy,
            format!("bought {quantity} {symbol} at {price}"),
        );
        Ok(TradeOutcome {
            message: format!("bought {quantity} {symbol} for {cost}"),
            notices: Vec::new(),
        })
    }

    fn sell(&mut self, player: PlayerId, symbol: &Symbol, quantity: u64) -> EngineResult<TradeOutcome> {
        if quantity == 0 {
            return Err(EngineError::validation("quantity must be positive"));
        }
        let price = self.state.stock(symbol)?.price;
        let held = self.state.players[player].quantity_of(symbol);
        if quantity > held {
            return Err(EngineError::rule(format!(
                "holding only {held} {symbol} shares, cannot sell {quantity}"
            )));
        }

        let proceeds = round_cents(price * Decimal::from(quantity));
        {
            let p = &mut self.state.players[player];
            let holding = p
                .holdings
                .get_mut(symbol)
                .ok_or_else(|| EngineError::internal("held quantity without holding entry"))?;
            holding.remove_shares(quantity);
            if holding.quantity == 0 {
                p.holdings.remove(symbol);
            }
            p.cash = round_cents(p.cash + proceeds);
        }
        self.state.stock_mut(symbol)?.available += quantity;

        tracker::recompute(&mut self.state, symbol, &self.config)?;
        self.state.check_conservation()?;
        self.state.log_action(
            player,
            TurnActionKind::Sell,
            format!("sold {quantity} {symbol} at {price}"),
        );
        Ok(TradeOutcome {
            message: format!("sold {quantity} {symbol} for {proceeds}"),
            notices: Vec::new(),
        })
    }

    fn play_corporate(
        &mut self,
        player: PlayerId,
        card_id: ActionCardId,
        symbol: &Symbol,
        quantity: Option<u64>,
    ) -> EngineResult<TradeOutcome> {
        self.state.stock(symbol)?;
        let kind = {
            let card = self.state.corporate(card_id)?;
            if card.owner != player {
                return Err(EngineError::validation(format!(
                    "{card_id} was not dealt to {player}"
                )));
            }
            if card.round != self.state.round {
                return Err(EngineError::validation(format!(
                    "{card_id} is not part of the current round's hand"
                )));
            }
            if card.played {
                return Err(EngineError::conflict("an unplayed card", "already played"));
            }
            card.kind.clone()
        };

        let mut notices = Vec::new();
        let message = match kind {
            CorporateActionKind::Dividend { pct } => {
                let report = corporate::pay_dividend(&mut self.state, symbol, pct)?;
                for payout in &report.payouts {
                    notices.push(format!(
                        "{} received a {} dividend on {symbol}",
                        self.state.players[payout.player].name, payout.amount
                    ));
                }
                let card = self.state.corporate_mut(card_id)?;
                card.played = true;
                card.symbol = Some(symbol.clone());
                format!("dividend of {} distributed on {symbol}", report.total)
            }
            CorporateActionKind::RightsIssue { .. } => {
                // The play and any immediate subscription land together or
                // not at all: a rejected subscription must not leave the
                // card opened behind the error.
                let checkpoint = self.state.clone();
                match self.open_rights(card_id, symbol, player, quantity) {
                    Ok((message, opened)) => {
                        notices.extend(opened);
                        message
                    }
                    Err(e) => {
                        self.state = checkpoint;
                        return Err(e);
                    }
                }
            }
            CorporateActionKind::BonusIssue { base, ratio } => {
                let report = corporate::bonus_issue(&mut self.state, symbol, base, ratio)?;
                let card = self.state.corporate_mut(card_id)?;
                card.played = true;
                card.symbol = Some(symbol.clone());
                if report.scaled {
                    notices.push(format!(
                        "bonus grants on {symbol} were scaled down to the issuance cap"
                    ));
                }
                tracker::recompute(&mut self.state, symbol, &self.config)?;
                self.state.check_conservation()?;
                format!(
                    "bonus issue on {symbol}: {} shares granted",
                    report.total_granted
                )
            }
        };

        self.state
            .log_action(player, TurnActionKind::PlayCorporate, message.clone());
        Ok(TradeOutcome { message, notices })
    }

    fn open_rights(
        &mut self,
        card_id: ActionCardId,
        symbol: &Symbol,
        player: PlayerId,
        quantity: Option<u64>,
    ) -> EngineResult<(String, Vec<String>)> {
        corporate::activate_rights(&mut self.state, card_id, symbol, player)?;
        let mut notices = vec![format!("rights issue opened on {symbol}")];
        if let Some(shares) = quantity {
            let cost = corporate::subscribe_rights(&mut self.state, card_id, player, shares)?;
            tracker::recompute(&mut self.state, symbol, &self.config)?;
            self.state.check_conservation()?;
            notices.push(format!(
                "{} subscribed for {shares} shares at {cost}",
                self.state.players[player].name
            ));
        }
        Ok((
            format!("rights issue active on {symbol} until your next turn"),
            notices,
        ))
    }

    /// Subscribe to an active rights issue on the subscriber's turn.
    pub fn subscribe_rights(
        &mut self,
        player: PlayerId,
        card: ActionCardId,
        shares: u64,
    ) -> EngineResult<TradeOutcome> {
        self.require_turn_of(player)?;

        let cost = corporate::subscribe_rights(&mut self.state, card, player, shares)?;
        let symbol = self
            .state
            .corporate(card)?
            .symbol
            .clone()
            .ok_or_else(|| EngineError::internal("subscribed rights issue has no symbol"))?;
        tracker::recompute(&mut self.state, &symbol, &self.config)?;
        self.state.check_conservation()?;
        self.state.log_action(
            player,
            TurnActionKind::SubscribeRights,
            format!("subscribed {shares} {symbol} at {cost}"),
        );
        Ok(TradeOutcome {
            message: format!("subscribed for {shares} {symbol} shares at {cost}"),
            notices: Vec::new(),
        })
    }

    // === Turn and round flow ===

    /// End the current player's turn.
    pub fn end_turn(&mut self) -> EngineResult<TurnOutcome> {
        scheduler::end_turn(&mut self.state, &self.config)
    }

    /// Veto opportunities for every leader of the active exclusion phase,
    /// grouped per leader in veto order.
    pub fn leadership_opportunities(&self) -> EngineResult<Vec<LeaderOpportunities>> {
        exclusion::opportunities(&self.state)
    }

    /// Veto one event on behalf of the active leader.
    pub fn exclude_event(&mut self, event: EventId, leader: PlayerId) -> EngineResult<()> {
        exclusion::exclude_event(&mut self.state, event, leader)
    }

    /// Close the active leader's veto window. Returns true once every
    /// leader has had theirs.
    pub fn advance_to_next_leader(&mut self) -> EngineResult<bool> {
        exclusion::advance_to_next_leader(&mut self.state)
    }

    /// Finish the exclusion phase and settle the round.
    pub fn complete_leadership_phase(&mut self) -> EngineResult<TurnOutcome> {
        match &self.state.phase {
            RoundPhase::AwaitingExclusion(status) if status.is_complete() => {}
            RoundPhase::AwaitingExclusion(status) => {
                return Err(EngineError::conflict(
                    "all veto windows closed",
                    format!("{} leaders remaining", status.leaders.len() - status.current),
                ));
            }
            phase => return Err(EngineError::conflict("awaiting exclusion", phase.name())),
        }

        let report = settlement::process(&mut self.state, &self.config)?;
        Ok(TurnOutcome {
            round_ended: true,
            game_over: report.game_over,
            leadership_phase_required: false,
            leaders: Vec::new(),
            settlement: Some(report),
        })
    }

    /// Final net worth per player, best first; ties break to the earlier
    /// seat.
    #[must_use]
    pub fn final_standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .state
            .players
            .iter()
            .map(|(player, p)| Standing {
                player,
                name: p.name.clone(),
                net_worth: self.state.net_worth(player),
            })
            .collect();
        standings.sort_by(|a, b| b.net_worth.cmp(&a.net_worth).then(a.player.cmp(&b.player)));
        standings
    }

    fn require_turn_of(&self, player: PlayerId) -> EngineResult<()> {
        if player.index() >= self.state.player_count() {
            return Err(EngineError::not_found("player", player));
        }
        if self.state.complete {
            return Err(EngineError::conflict("an active game", "game complete"));
        }
        if self.state.phase != RoundPhase::Trading {
            return Err(EngineError::conflict("trading phase", self.state.phase.name()));
        }
        if self.state.current_player != player {
            return Err(EngineError::conflict(
                format!("turn of {}", self.state.current_player),
                format!("request from {player}"),
            ));
        }
        Ok(())
    }
}
