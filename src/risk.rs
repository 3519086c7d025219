// 6.0: risk math. gain/loss against the mark, the liability/asset settlement
// split, margin requirements, and liquidation eligibility. everything here is
// pure; the orchestrator decides what to do with the numbers.

use crate::fixed::Fixed;
use crate::types::{Side, SignedBps};
use serde::{Deserialize, Serialize};

/// Unrealized result of a position at the current mark, in saturating
/// unsigned halves: exactly one of gain/loss is nonzero (both zero at entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainLoss {
    pub gain: Fixed,
    pub loss: Fixed,
    pub notional: Fixed,
}

// 6.1: longs gain when the mark notional exceeds the entry notional, shorts
// the other way around. notional is always the mark-side value.
pub fn gain_loss(size: Fixed, entry_price: Fixed, mark_price: Fixed, side: Side) -> GainLoss {
    let entry_notional = size.mul(entry_price);
    let mark_notional = size.mul(mark_price);
    let (gain, loss) = match side {
        Side::Long => (
            mark_notional.sub_sat(entry_notional),
            entry_notional.sub_sat(mark_notional),
        ),
        Side::Short => (
            entry_notional.sub_sat(mark_notional),
            mark_notional.sub_sat(entry_notional),
        ),
    };
    GainLoss {
        gain,
        loss,
        notional: mark_notional,
    }
}

/// Outcome of settling a position (or a closed fraction of one).
/// `net` is the collateral figure owed back to the owner; `shortfall` is the
/// amount the insurance fund must cover. at most one of them is nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub assets: Fixed,
    pub liabilities: Fixed,
    pub net: Fixed,
    pub shortfall: Fixed,
}

// 6.2: the liability/asset split. funding lands on whichever side the payer
// rule says; a positive fee is paid by the user, a negative fee is received.
pub fn settle(
    collateral: Fixed,
    gl: &GainLoss,
    side: Side,
    funding: SignedBps,
    fee: SignedBps,
) -> Settlement {
    let funding_abs = gl.notional.bps(funding.magnitude);
    let fee_abs = gl.notional.bps(fee.magnitude);

    let mut liabilities = gl.loss;
    let mut assets = collateral.add(gl.gain);

    if side.pays(funding.sign) {
        liabilities = liabilities.add(funding_abs);
    } else {
        assets = assets.add(funding_abs);
    }
    if fee.sign.is_positive() {
        liabilities = liabilities.add(fee_abs);
    } else {
        assets = assets.add(fee_abs);
    }

    Settlement {
        assets,
        liabilities,
        net: assets.sub_sat(liabilities),
        shortfall: liabilities.sub_sat(assets),
    }
}

// 6.3: guards. each is a hard precondition on one action.

pub fn required_margin(size: Fixed, price: Fixed, margin_bps: u64) -> Fixed {
    size.mul(price).bps(margin_bps)
}

pub fn meets_initial_margin(collateral: Fixed, size: Fixed, price: Fixed, im_bps: u64) -> bool {
    collateral >= required_margin(size, price, im_bps)
}

pub fn within_fee_cap(fee: SignedBps, max_fee_bps: u64) -> bool {
    fee.magnitude <= max_fee_bps
}

// limit-is-min protects sellers (mark must not fall below the limit),
// otherwise the limit is a ceiling
pub fn within_slippage(mark_price: Fixed, limit_price: Fixed, limit_is_min: bool) -> bool {
    if limit_is_min {
        mark_price >= limit_price
    } else {
        mark_price <= limit_price
    }
}

// 6.4: eligibility uses base equity only: collateral and price pnl, no
// funding. funding still enters the settlement once liquidation proceeds.
pub fn is_liquidatable(collateral: Fixed, gl: &GainLoss, mm_bps: u64) -> bool {
    let equity = collateral.add(gl.gain).sub_sat(gl.loss);
    equity < gl.notional.bps(mm_bps)
}
