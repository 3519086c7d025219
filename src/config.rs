// 8.0 config.rs: all tunable parameters in one place. margins, fees, funding
// shape. admin-mutated as a unit via set_params; validate() is the gate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    // Taker fee in basis points, the fee schedule callers are expected to
    // quote in their updates
    pub taker_fee_bps: u64,
    // Initial margin requirement in basis points of notional
    pub initial_margin_bps: u64,
    // Maintenance margin requirement in basis points of notional
    pub maintenance_margin_bps: u64,
    // Hard cap on any per-action fee magnitude
    pub max_fee_bps: u64,
    // Funding sensitivity K: spread bps scaled by K/10_000
    pub funding_sensitivity: u64,
    // Cap on the instantaneous funding rate, bps per hour
    pub funding_cap_bps: u64,
    // EMA smoothing factor as a fraction num/den
    pub ema_alpha_num: u64,
    pub ema_alpha_den: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            taker_fee_bps: 10,
            initial_margin_bps: 500,      // 5%
            maintenance_margin_bps: 250,  // 2.5%
            max_fee_bps: 100,             // 1%
            funding_sensitivity: 10_000,  // pass spread through 1:1
            funding_cap_bps: 75,          // 0.75% per hour
            ema_alpha_num: 1,
            ema_alpha_den: 10,
        }
    }
}

impl Params {
    pub fn validate(&self) -> bool {
        self.ema_alpha_den > 0
            && self.ema_alpha_num <= self.ema_alpha_den
            && self.maintenance_margin_bps <= self.initial_margin_bps
            && self.initial_margin_bps <= 10_000
            && self.max_fee_bps <= 10_000
    }

    // canonical encoding for the admin authorization message
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        for value in [
            self.taker_fee_bps,
            self.initial_margin_bps,
            self.maintenance_margin_bps,
            self.max_fee_bps,
            self.funding_sensitivity,
            self.funding_cap_bps,
            self.ema_alpha_num,
            self.ema_alpha_den,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Params::default().validate());
    }

    #[test]
    fn degenerate_params_rejected() {
        let mut zero_den = Params::default();
        zero_den.ema_alpha_den = 0;
        assert!(!zero_den.validate());

        let mut heavy_alpha = Params::default();
        heavy_alpha.ema_alpha_num = 11;
        heavy_alpha.ema_alpha_den = 10;
        assert!(!heavy_alpha.validate());

        let mut inverted_margins = Params::default();
        inverted_margins.maintenance_margin_bps = 600;
        assert!(!inverted_margins.validate());
    }

    #[test]
    fn encoding_is_field_order_sensitive() {
        let a = Params::default();
        let mut b = a;
        b.ema_alpha_num = 2;
        assert_ne!(a.encode(), b.encode());
        assert_eq!(a.encode().len(), 64);
    }
}
