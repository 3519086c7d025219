// 2.0: fixed-point arithmetic. every price and amount in the engine is an
// unsigned integer scaled by 1e6, and every division floors. truncation is
// one-directional: repeated small operations bias results slightly low, and
// that bias is part of the committed semantics, so none of these ops round.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCALE: u128 = 1_000_000;
pub const BPS_DENOM: u128 = 10_000;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Fixed(u128);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    // whole units, e.g. from_units(100) = $100.000000
    pub const fn from_units(units: u64) -> Self {
        Self(units as u128 * SCALE)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    // 2.1: floor(a * b / SCALE)
    pub fn mul(self, other: Fixed) -> Fixed {
        Fixed(self.0 * other.0 / SCALE)
    }

    // 2.2: floor(a * SCALE / b). denominator must be nonzero.
    pub fn div(self, denom: Fixed) -> Fixed {
        debug_assert!(!denom.is_zero(), "fixed-point division by zero");
        Fixed(self.0 * SCALE / denom.0)
    }

    // 2.3: floor(a * bps / 10_000)
    pub fn bps(self, bps: u64) -> Fixed {
        Fixed(self.0 * bps as u128 / BPS_DENOM)
    }

    // 2.4: clamps at zero instead of underflowing
    pub fn sub_sat(self, other: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(other.0))
    }

    pub fn add(self, other: Fixed) -> Fixed {
        Fixed(self.0 + other.0)
    }

    // 2.5: floor(a * num / den). scales a quantity proportionally, e.g.
    // splitting collateral by a size fraction. exact when num == den.
    pub fn ratio(self, num: Fixed, den: Fixed) -> Fixed {
        debug_assert!(!den.is_zero(), "fixed-point ratio with zero denominator");
        Fixed(self.0 * num.0 / den.0)
    }

    pub fn abs_diff(self, other: Fixed) -> Fixed {
        Fixed(self.0.abs_diff(other.0))
    }

    pub fn to_le_bytes(&self) -> [u8; 16] {
        self.0.to_le_bytes()
    }

    // human-readable value. display/reporting only, never feeds back into
    // settlement math.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.0 as i128, 6)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal().normalize())
    }
}
