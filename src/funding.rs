// 5.0: funding rates. the engine keeps one signed EMA of the mark/index
// spread per asset, persisted as a (magnitude, sign) leaf, and charges the
// rate accrued over the elapsed interval on every settlement.
// the sign/magnitude split is deliberate: the EMA combination must produce
// identical rounding and sign outcomes on a substrate with no negative
// numbers. 5.1 has the rate derivations.

use crate::fixed::{Fixed, BPS_DENOM};
use crate::ledger::{derive_key, hash_leaf, LeafHash, LedgerKey, EMPTY_LEAF};
use crate::types::{AssetId, Sign, SignedBps};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FUNDING_KEY_DOMAIN: &[u8] = b"perp.key.funding";
pub const FUNDING_LEAF_DOMAIN: &[u8] = b"perp.leaf.funding";

const SECONDS_PER_HOUR: u128 = 3600;

/// Per-asset funding EMA, one ledger leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingState {
    pub magnitude: u64,
    pub sign: Sign,
}

impl FundingState {
    pub fn new(magnitude: u64, sign: Sign) -> Self {
        Self { magnitude, sign }
    }

    // the state every asset starts in: zero spread, positive sign
    pub fn flat() -> Self {
        Self {
            magnitude: 0,
            sign: Sign::Positive,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.magnitude == 0 && self.sign == Sign::Positive
    }

    pub fn key(asset: AssetId) -> LedgerKey {
        derive_key(FUNDING_KEY_DOMAIN, &[&asset.to_le_bytes()])
    }

    // the flat state encodes as the absent leaf, so unseeded assets verify
    // with an exclusion proof
    pub fn leaf(&self) -> LeafHash {
        if self.is_flat() {
            return EMPTY_LEAF;
        }
        hash_leaf(
            FUNDING_LEAF_DOMAIN,
            &[&self.magnitude.to_le_bytes(), &[self.sign.as_byte()]],
        )
    }
}

impl fmt::Display for FundingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}bps/h", self.sign, self.magnitude)
    }
}

// 5.1: instantaneous rate from the current spread. mark above index pushes
// the rate positive (longs pay), mark below pushes it negative. the spread
// ratio in bps is scaled by the sensitivity K and clamped to the hourly cap.
pub fn instant_rate(mark: Fixed, index: Fixed, sensitivity: u64, cap_bps: u64) -> SignedBps {
    debug_assert!(!index.is_zero(), "index price must be positive");
    let diff = mark.abs_diff(index);
    let sign = if mark < index {
        Sign::Negative
    } else {
        Sign::Positive
    };
    let ratio_bps = diff.raw() * BPS_DENOM / index.raw();
    let scaled = ratio_bps * sensitivity as u128 / BPS_DENOM;
    SignedBps::new(scaled.min(cap_bps as u128) as u64, sign)
}

// 5.2: signed EMA step over (magnitude, sign) pairs. equal signs add their
// scaled terms; opposing signs subtract, and the larger scaled term decides
// the sign. a tie keeps the previous sign. final division floors.
pub fn ema_next(
    prev: &FundingState,
    instant: SignedBps,
    alpha_num: u64,
    alpha_den: u64,
) -> FundingState {
    debug_assert!(alpha_den > 0 && alpha_num <= alpha_den, "invalid EMA alpha");
    let scaled_prev = prev.magnitude as u128 * (alpha_den - alpha_num) as u128;
    let scaled_inst = instant.magnitude as u128 * alpha_num as u128;

    let (combined, sign) = if prev.sign == instant.sign {
        (scaled_prev + scaled_inst, prev.sign)
    } else if scaled_prev >= scaled_inst {
        (scaled_prev - scaled_inst, prev.sign)
    } else {
        (scaled_inst - scaled_prev, instant.sign)
    };

    FundingState::new((combined / alpha_den as u128) as u64, sign)
}

// 5.3: the rate effective for an elapsed interval, read from the freshly
// updated EMA. hourly magnitude prorated by seconds, flooring.
pub fn effective_rate(state: &FundingState, elapsed_secs: u64) -> SignedBps {
    let magnitude = state.magnitude as u128 * elapsed_secs as u128 / SECONDS_PER_HOUR;
    SignedBps::new(magnitude as u64, state.sign)
}
