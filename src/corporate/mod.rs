//! Corporate-action settlement: dividends, rights issues, bonus issues.
//!
//! All functions either fully apply or fail with no state change; callers
//! re-derive leadership afterwards where holdings changed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::corporate::{CorporateActionKind, RightsStatus};
use crate::core::error::{EngineError, EngineResult};
use crate::core::money::{percent_of, round_cents};
use crate::core::state::GameState;
use crate::core::{ActionCardId, PlayerId, Symbol};
use crate::market::stock::Holding;

/// One shareholder's dividend payment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendPayout {
    pub player: PlayerId,
    pub shares: u64,
    pub amount: Decimal,
}

/// Result of a dividend distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendReport {
    pub symbol: Symbol,
    pub payouts: Vec<DividendPayout>,
    pub total: Decimal,
}

/// One shareholder's bonus-share grant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonusGrant {
    pub player: PlayerId,
    pub intended: u64,
    pub granted: u64,
}

/// Result of a bonus issue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonusReport {
    pub symbol: Symbol,
    pub grants: Vec<BonusGrant>,
    pub total_granted: u64,
    /// True when grants were scaled down to respect the issuance cap.
    pub scaled: bool,
}

/// Pay `quantity × price × pct/100` to every shareholder of `symbol`,
/// rounded to cents. An empty shareholder register is a legitimate no-op.
pub fn pay_dividend(
    state: &mut GameState,
    symbol: &Symbol,
    pct: Decimal,
) -> EngineResult<DividendReport> {
    let price = state.stock(symbol)?.price;
    let holders = state.holders_of(symbol);

    let mut payouts = Vec::with_capacity(holders.len());
    let mut total = Decimal::ZERO;
    for (player, shares) in holders {
        // One rounding of the whole product, not per share
        let amount = round_cents(Decimal::from(shares) * price * pct / Decimal::from(100));
        state.players[player].cash = round_cents(state.players[player].cash + amount);
        total += amount;
        payouts.push(DividendPayout {
            player,
            shares,
            amount,
        });
    }

    info!(%symbol, %total, holders = payouts.len(), "dividend distributed");
    Ok(DividendReport {
        symbol: symbol.clone(),
        payouts,
        total,
    })
}

/// Open a rights-issue subscription window: snapshot the current
/// shareholders as eligible and mark the card active. The window closes
/// when `playing_player`'s turn next arrives, or at round end.
pub fn activate_rights(
    state: &mut GameState,
    card_id: ActionCardId,
    symbol: &Symbol,
    playing_player: PlayerId,
) -> EngineResult<()> {
    state.stock(symbol)?;
    let eligible_now: Vec<PlayerId> = state
        .holders_of(symbol)
        .into_iter()
        .map(|(p, _)| p)
        .collect();

    let card = state.corporate_mut(card_id)?;
    match &mut card.kind {
        CorporateActionKind::RightsIssue {
            status,
            eligible,
            expires_at,
            ..
        } => {
            if *status != RightsStatus::Pending {
                return Err(EngineError::conflict(
                    "a pending rights issue",
                    "already played or expired",
                ));
            }
            *status = RightsStatus::Active;
            *eligible = eligible_now;
            *expires_at = Some(playing_player);
            card.symbol = Some(symbol.clone());
            card.played = true;
            info!(%card_id, %symbol, "rights issue opened");
            Ok(())
        }
        _ => Err(EngineError::validation(format!(
            "{card_id} is not a rights issue"
        ))),
    }
}

/// Subscribe to an active rights issue. Returns the cash cost.
///
/// Only players in the eligibility snapshot may subscribe, up to
/// `floor(quantity / base) × ratio` shares at the discounted price.
pub fn subscribe_rights(
    state: &mut GameState,
    card_id: ActionCardId,
    player: PlayerId,
    shares: u64,
) -> EngineResult<Decimal> {
    if shares == 0 {
        return Err(EngineError::validation("subscription must be positive"));
    }

    let (symbol, base, ratio, price_pct) = {
        let card = state.corporate(card_id)?;
        let CorporateActionKind::RightsIssue {
            base,
            ratio,
            price_pct,
            status,
            eligible,
            ..
        } = &card.kind
        else {
            return Err(EngineError::validation(format!(
                "{card_id} is not a rights issue"
            )));
        };
        if *status != RightsStatus::Active {
            return Err(EngineError::conflict(
                "an active rights issue",
                match status {
                    RightsStatus::Pending => "not yet played",
                    RightsStatus::Expired => "expired",
                    RightsStatus::Active => unreachable!(),
                },
            ));
        }
        if !eligible.contains(&player) {
            return Err(EngineError::rule(format!(
                "{player} was not a shareholder when the rights issue opened"
            )));
        }
        let symbol = card.symbol.clone().ok_or_else(|| {
            EngineError::internal(format!("active rights issue {card_id} has no symbol"))
        })?;
        (symbol, *base, *ratio, *price_pct)
    };

    let held = state.players[player].quantity_of(&symbol);
    let entitlement = held / base * ratio;
    if shares > entitlement {
        return Err(EngineError::rule(format!(
            "entitled to at most {entitlement} shares, requested {shares}"
        )));
    }

    let stock = state.stock(&symbol)?;
    if shares > stock.available {
        return Err(EngineError::rule(format!(
            "only {} shares available in the market",
            stock.available
        )));
    }
    let price_per_share = percent_of(stock.price, price_pct);
    let cost = round_cents(price_per_share * Decimal::from(shares));
    if state.players[player].cash < cost {
        return Err(EngineError::rule(format!(
            "insufficient funds: need {cost}, have {}",
            state.players[player].cash
        )));
    }

    state.players[player].cash -= cost;
    state.players[player]
        .holdings
        .entry(symbol.clone())
        .or_insert_with(Holding::default)
        .add_shares(shares, price_per_share);
    state.stock_mut(&symbol)?.available -= shares;

    info!(%player, %symbol, shares, %cost, "rights subscription filled");
    Ok(cost)
}

/// Expire every active rights issue whose window closes on this player's
/// turn. Returns the expired card ids.
pub fn expire_rights_for_player(state: &mut GameState, player: PlayerId) -> Vec<ActionCardId> {
    expire_rights_where(state, |expires_at| expires_at == Some(player))
}

/// Expire all still-active rights issues (round end). Returns card ids.
pub fn expire_all_rights(state: &mut GameState) -> Vec<ActionCardId> {
    expire_rights_where(state, |_| true)
}

fn expire_rights_where(
    state: &mut GameState,
    pred: impl Fn(Option<PlayerId>) -> bool,
) -> Vec<ActionCardId> {
    let mut expired = Vec::new();
    for (id, card) in state.corporate_actions.iter_mut() {
        if let CorporateActionKind::RightsIssue {
            status, expires_at, ..
        } = &mut card.kind
        {
            if *status == RightsStatus::Active && pred(*expires_at) {
                *status = RightsStatus::Expired;
                expired.push(*id);
            }
        }
    }
    expired.sort();
    for id in &expired {
        info!(card = %id, "rights issue expired");
    }
    expired
}

/// Grant `floor(quantity / base) × ratio` bonus shares per shareholder,
/// scaled down proportionally when the grants would exceed the issuance
/// cap. The cap is never exceeded; integer rounding loss falls on the
/// shareholders in proportion.
pub fn bonus_issue(
    state: &mut GameState,
    symbol: &Symbol,
    base: u64,
    ratio: u64,
) -> EngineResult<BonusReport> {
    let available = state.stock(symbol)?.available;
    let holders = state.holders_of(symbol);

    let intended: Vec<(PlayerId, u64)> = holders
        .into_iter()
        .map(|(p, qty)| (p, qty / base * ratio))
        .collect();
    let total_intended: u64 = intended.iter().map(|(_, n)| n).sum();

    let scaled = total_intended > available;
    let mut grants = Vec::with_capacity(intended.len());
    let mut total_granted = 0u64;
    for (player, want) in intended {
        let granted = if !scaled {
            want
        } else if total_intended == 0 {
            0
        } else {
            // floor(intended * (cap headroom) / total_intended); u128 to
            // avoid overflow on large registers
            ((want as u128 * available as u128) / total_intended as u128) as u64
        };

        if granted > 0 {
            state.players[player]
                .holdings
                .get_mut(symbol)
                .ok_or_else(|| EngineError::internal("holder without holding entry"))?
                .add_bonus_shares(granted);
            total_granted += granted;
        }
        grants.push(BonusGrant {
            player,
            intended: want,
            granted,
        });
    }

    state.stock_mut(symbol)?.available -= total_granted;

    info!(%symbol, total_granted, scaled, "bonus issue settled");
    Ok(BonusReport {
        symbol: symbol.clone(),
        grants,
        total_granted,
        scaled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameConfig;
    use crate::core::money::{cents, dec};

    fn setup() -> (GameConfig, GameState) {
        let config = GameConfig::default();
        let names: Vec<String> = (0..3).map(|i| format!("Player {i}")).collect();
        let state = GameState::new(&config, &names, 42).unwrap();
        (config, state)
    }

    fn give_shares(state: &mut GameState, symbol: &Symbol, player: PlayerId, qty: u64) {
        state.players[player]
            .holdings
            .entry(symbol.clone())
            .or_insert_with(Holding::default)
            .add_shares(qty, dec(100));
        state.stocks.get_mut(symbol).unwrap().available -= qty;
    }

    #[test]
    fn test_dividend_pays_every_holder() {
        let (_, mut state) = setup();
        let symbol = Symbol::new("TECH"); // price 100
        give_shares(&mut state, &symbol, PlayerId::new(0), 10);
        give_shares(&mut state, &symbol, PlayerId::new(2), 4);
        let cash_before = state.players[PlayerId::new(0)].cash;

        let report = pay_dividend(&mut state, &symbol, dec(5)).unwrap();

        // 10 shares * 100 * 5% = 50; 4 shares => 20
        assert_eq!(report.payouts.len(), 2);
        assert_eq!(report.total, dec(70));
        assert_eq!(state.players[PlayerId::new(0)].cash, cash_before + dec(50));
        // Player 1 holds nothing and receives nothing
        assert_eq!(state.players[PlayerId::new(1)].cash, dec(10_000));
    }

    #[test]
    fn test_dividend_rounds_to_cents() {
        let (_, mut state) = setup();
        let symbol = Symbol::new("TECH");
        state.stocks.get_mut(&symbol).unwrap().price = cents(3333); // 33.33
        give_shares(&mut state, &symbol, PlayerId::new(0), 3);

        let report = pay_dividend(&mut state, &symbol, dec(5)).unwrap();
        // 3 * 33.33 * 5% = 4.9995, rounded once to 5.00
        assert_eq!(report.total, dec(5));
    }

    #[test]
    fn test_dividend_with_no_holders_is_noop() {
        let (_, mut state) = setup();
        let report = pay_dividend(&mut state, &Symbol::new("TECH"), dec(5)).unwrap();
        assert!(report.payouts.is_empty());
        assert_eq!(report.total, Decimal::ZERO);
    }

    #[test]
    fn test_rights_lifecycle() {
        let (_, mut state) = setup();
        let symbol = Symbol::new("BANK"); // price 150
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        give_shares(&mut state, &symbol, p0, 10);

        let card_id = state.alloc_action_id();
        state.corporate_actions.insert(
            card_id,
            crate::cards::corporate::CorporateAction {
                id: card_id,
                kind: CorporateActionKind::RightsIssue {
                    base: 2,
                    ratio: 1,
                    price_pct: dec(50),
                    status: RightsStatus::Pending,
                    eligible: vec![],
                    expires_at: None,
                },
                owner: p0,
                round: 1,
                played: false,
                symbol: None,
            },
        );

        activate_rights(&mut state, card_id, &symbol, p0).unwrap();

        // Player 1 bought in after the snapshot: not eligible
        give_shares(&mut state, &symbol, p1, 10);
        let err = subscribe_rights(&mut state, card_id, p1, 1).unwrap_err();
        assert!(matches!(err, EngineError::BusinessRule { .. }));

        // Entitlement: floor(10/2) * 1 = 5 shares at 75.00
        let err = subscribe_rights(&mut state, card_id, p0, 6).unwrap_err();
        assert!(matches!(err, EngineError::BusinessRule { .. }));

        let cost = subscribe_rights(&mut state, card_id, p0, 5).unwrap();
        assert_eq!(cost, dec(375));
        assert_eq!(state.players[p0].quantity_of(&symbol), 15);
        state.check_conservation().unwrap();

        // Expiry on the playing player's next turn
        let expired = expire_rights_for_player(&mut state, p0);
        assert_eq!(expired, vec![card_id]);
        let err = subscribe_rights(&mut state, card_id, p0, 1).unwrap_err();
        assert!(matches!(err, EngineError::StateConflict { .. }));
    }

    #[test]
    fn test_rights_expiry_ignores_other_players() {
        let (_, mut state) = setup();
        let symbol = Symbol::new("BANK");
        let p0 = PlayerId::new(0);
        give_shares(&mut state, &symbol, p0, 4);

        let card_id = state.alloc_action_id();
        state.corporate_actions.insert(
            card_id,
            crate::cards::corporate::CorporateAction {
                id: card_id,
                kind: CorporateActionKind::RightsIssue {
                    base: 2,
                    ratio: 1,
                    price_pct: dec(50),
                    status: RightsStatus::Pending,
                    eligible: vec![],
                    expires_at: None,
                },
                owner: p0,
                round: 1,
                played: false,
                symbol: None,
            },
        );
        activate_rights(&mut state, card_id, &symbol, p0).unwrap();

        assert!(expire_rights_for_player(&mut state, PlayerId::new(1)).is_empty());
        assert_eq!(expire_all_rights(&mut state), vec![card_id]);
    }

    #[test]
    fn test_bonus_issue_unscaled() {
        let (config, mut state) = setup();
        let symbol = Symbol::new("TECH");
        let p0 = PlayerId::new(0);
        give_shares(&mut state, &symbol, p0, 12);

        let report = bonus_issue(
            &mut state,
            &symbol,
            config.bonus_base_shares,
            config.bonus_ratio,
        )
        .unwrap();

        // floor(12/5) * 1 = 2
        assert!(!report.scaled);
        assert_eq!(report.total_granted, 2);
        assert_eq!(state.players[p0].quantity_of(&symbol), 14);
        state.check_conservation().unwrap();
    }

    #[test]
    fn test_bonus_issue_scales_at_cap() {
        let (_, mut state) = setup();
        let symbol = Symbol::new("TECH"); // total 1000
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        give_shares(&mut state, &symbol, p0, 600);
        give_shares(&mut state, &symbol, p1, 395);
        // 5 shares left available; intended = 120 + 79 = 199

        let report = bonus_issue(&mut state, &symbol, 5, 1).unwrap();

        assert!(report.scaled);
        // floor(120*5/199)=3, floor(79*5/199)=1
        assert_eq!(report.grants[0].granted, 3);
        assert_eq!(report.grants[1].granted, 1);
        assert_eq!(report.total_granted, 4);

        let stock = state.stock(&symbol).unwrap();
        assert!(stock.issued_to_players() <= stock.total);
        assert_eq!(stock.available, 1);
        state.check_conservation().unwrap();
    }
}
