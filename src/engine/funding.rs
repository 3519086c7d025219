// 12.2 engine/funding.rs: the per-tick ledger work every action performs
// before touching a position. oracle gateway (signature, clock proof,
// monotonic timestamp, clock bump) and funding EMA (proof, update, interval
// read) are one inseparable step; even actions that discard the resulting
// rate still commit both bumps.

use super::core::State;
use super::results::EngineError;
use crate::funding::{effective_rate, ema_next, instant_rate, FundingState};
use crate::ledger::{compute_new_root, verify_against, Root};
use crate::oracle::{clock_key, clock_leaf, OracleSnapshot};
use crate::types::SignedBps;
use crate::update::TickWitness;

/// Result of the tick step: both bumped roots, the updated EMA, and the rate
/// effective for the elapsed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct FundingBump {
    pub clock_root: Root,
    pub funding_root: Root,
    pub funding_state: FundingState,
    pub rate: SignedBps,
}

impl State {
    pub(super) fn derive_funding_and_bump(
        &self,
        oracle: &OracleSnapshot,
        witness: &TickWitness,
    ) -> Result<FundingBump, EngineError> {
        if !oracle.is_well_formed() {
            return Err(EngineError::InvariantViolation);
        }
        if !oracle.verify(&self.oracle_key) {
            return Err(EngineError::SignatureInvalid("oracle"));
        }

        // clock: the witness must bind the recorded timestamp for this asset
        // to the committed clock root, and the tick may not regress
        if witness.clock_proof.key != clock_key(oracle.asset) {
            return Err(EngineError::StateMismatch("clock"));
        }
        if !verify_against(
            &self.clock_root,
            &clock_leaf(witness.prior_timestamp),
            &witness.clock_proof,
        ) {
            return Err(EngineError::StateMismatch("clock"));
        }
        if oracle.timestamp < witness.prior_timestamp {
            return Err(EngineError::StaleOracle {
                submitted: oracle.timestamp,
                recorded: witness.prior_timestamp,
            });
        }
        let clock_root = compute_new_root(&witness.clock_proof, &clock_leaf(oracle.timestamp));

        // funding: fold the instantaneous spread into the EMA, commit the
        // updated state, and read the interval rate from the fresh value
        if witness.funding_proof.key != FundingState::key(oracle.asset) {
            return Err(EngineError::StateMismatch("funding"));
        }
        if !verify_against(
            &self.funding_root,
            &witness.prior_funding.leaf(),
            &witness.funding_proof,
        ) {
            return Err(EngineError::StateMismatch("funding"));
        }
        let instant = instant_rate(
            oracle.mark_price,
            oracle.index_price,
            self.params.funding_sensitivity,
            self.params.funding_cap_bps,
        );
        let funding_state = ema_next(
            &witness.prior_funding,
            instant,
            self.params.ema_alpha_num,
            self.params.ema_alpha_den,
        );
        let funding_root = compute_new_root(&witness.funding_proof, &funding_state.leaf());

        let elapsed = oracle.timestamp.seconds_since(witness.prior_timestamp);
        let rate = effective_rate(&funding_state, elapsed);

        Ok(FundingBump {
            clock_root,
            funding_root,
            funding_state,
            rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz;
    use crate::config::Params;
    use crate::fixed::Fixed;
    use crate::ledger::LedgerStore;
    use crate::types::{AssetId, Authorization, PublicKey, Sign, Timestamp};
    use ed25519_dalek::SigningKey;

    struct Tick {
        state: State,
        clock: LedgerStore,
        funding: LedgerStore,
        oracle_sk: SigningKey,
    }

    impl Tick {
        fn new() -> Self {
            let oracle_sk = SigningKey::from_bytes(&[2u8; 32]);
            let admin_sk = SigningKey::from_bytes(&[1u8; 32]);
            Self {
                state: State::genesis(
                    Params::default(),
                    authz::public_key(&oracle_sk),
                    authz::public_key(&admin_sk),
                ),
                clock: LedgerStore::new(),
                funding: LedgerStore::new(),
                oracle_sk,
            }
        }

        fn snapshot(&self, mark: u64, index: u64, secs: u64) -> OracleSnapshot {
            let mut snap = OracleSnapshot {
                mark_price: Fixed::from_units(mark),
                index_price: Fixed::from_units(index),
                asset: AssetId(1),
                timestamp: Timestamp::from_secs(secs),
                authorization: Authorization([0u8; 64]),
            };
            snap.authorization = authz::sign(&self.oracle_sk, &snap.message());
            snap
        }

        fn witness(&self, prior_ts: u64, prior_funding: FundingState) -> TickWitness {
            TickWitness {
                prior_timestamp: Timestamp::from_secs(prior_ts),
                clock_proof: self.clock.prove(&clock_key(AssetId(1))),
                prior_funding,
                funding_proof: self.funding.prove(&FundingState::key(AssetId(1))),
            }
        }
    }

    #[test]
    fn first_tick_bumps_from_genesis() {
        let tick = Tick::new();
        let snap = tick.snapshot(100, 100, 1_000);
        let bump = tick
            .state
            .derive_funding_and_bump(&snap, &tick.witness(0, FundingState::flat()))
            .unwrap();

        let mut clock = tick.clock.clone();
        clock.insert(&clock_key(AssetId(1)), clock_leaf(snap.timestamp));
        assert_eq!(bump.clock_root, clock.root());
        // flat market: EMA stays flat, funding root unchanged
        assert_eq!(bump.funding_root, tick.state.funding_root);
        assert!(bump.rate.is_zero());
    }

    #[test]
    fn skewed_market_moves_the_ema() {
        let tick = Tick::new();
        // 1% premium, sensitivity 1:1, cap 75 -> instant 75, EMA (0*9+75)/10
        let snap = tick.snapshot(101, 100, 3_600);
        let bump = tick
            .state
            .derive_funding_and_bump(&snap, &tick.witness(0, FundingState::flat()))
            .unwrap();
        assert_eq!(bump.funding_state, FundingState::new(7, Sign::Positive));
        // one hour elapsed: the full hourly magnitude applies
        assert_eq!(bump.rate, SignedBps::new(7, Sign::Positive));
    }

    #[test]
    fn equal_timestamp_allowed_stale_rejected() {
        let mut tick = Tick::new();
        tick.clock
            .insert(&clock_key(AssetId(1)), clock_leaf(Timestamp::from_secs(500)));
        tick.state.clock_root = tick.clock.root();

        let equal = tick.snapshot(100, 100, 500);
        let bump = tick
            .state
            .derive_funding_and_bump(&equal, &tick.witness(500, FundingState::flat()))
            .unwrap();
        assert!(bump.rate.is_zero()); // zero elapsed interval

        let stale = tick.snapshot(100, 100, 499);
        assert_eq!(
            tick.state
                .derive_funding_and_bump(&stale, &tick.witness(500, FundingState::flat())),
            Err(EngineError::StaleOracle {
                submitted: Timestamp::from_secs(499),
                recorded: Timestamp::from_secs(500),
            })
        );
    }

    #[test]
    fn misdeclared_prior_timestamp_rejected() {
        let tick = Tick::new();
        let snap = tick.snapshot(100, 100, 1_000);
        // claims 900 but the committed leaf is absent (zero)
        assert_eq!(
            tick.state
                .derive_funding_and_bump(&snap, &tick.witness(900, FundingState::flat())),
            Err(EngineError::StateMismatch("clock"))
        );
    }

    #[test]
    fn unsigned_snapshot_rejected() {
        let tick = Tick::new();
        let mut snap = tick.snapshot(100, 100, 1_000);
        snap.authorization = Authorization([0u8; 64]);
        assert_eq!(
            tick.state
                .derive_funding_and_bump(&snap, &tick.witness(0, FundingState::flat())),
            Err(EngineError::SignatureInvalid("oracle"))
        );
    }

    #[test]
    fn foreign_oracle_rejected() {
        let mut tick = Tick::new();
        tick.state.oracle_key = PublicKey([5u8; 32]);
        let snap = tick.snapshot(100, 100, 1_000);
        assert_eq!(
            tick.state
                .derive_funding_and_bump(&snap, &tick.witness(0, FundingState::flat())),
            Err(EngineError::SignatureInvalid("oracle"))
        );
    }
}
