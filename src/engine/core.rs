// 12.1 engine/core.rs: the committed state value and the admin surface.
// three ledger roots, two identities, the parameter set, and the insurance
// fund balance. action handlers live in engine/actions.rs.

use super::results::{EngineError, Transition};
use crate::authz;
use crate::config::Params;
use crate::events::{
    Event, FundingSeededEvent, IdentityRotatedEvent, InsuranceFlowEvent, ParamsUpdatedEvent,
};
use crate::fixed::Fixed;
use crate::funding::FundingState;
use crate::ledger::{compute_new_root, empty_root, verify_against, MerkleProof, Root, EMPTY_LEAF};
use crate::types::{AssetId, Authorization, PublicKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub positions_root: Root,
    pub clock_root: Root,
    pub funding_root: Root,
    pub params: Params,
    pub oracle_key: PublicKey,
    pub admin_key: PublicKey,
    pub insurance_fund: Fixed,
}

impl State {
    pub fn genesis(params: Params, oracle_key: PublicKey, admin_key: PublicKey) -> Self {
        debug_assert!(params.validate(), "genesis params must validate");
        Self {
            positions_root: empty_root(),
            clock_root: empty_root(),
            funding_root: empty_root(),
            params,
            oracle_key,
            admin_key,
            insurance_fund: Fixed::ZERO,
        }
    }

    fn require_admin(
        &self,
        message: &[u8],
        authorization: &Authorization,
    ) -> Result<(), EngineError> {
        if !authz::verify(&self.admin_key, message, authorization) {
            return Err(EngineError::SignatureInvalid("admin"));
        }
        Ok(())
    }

    /// Replace the whole parameter set atomically.
    pub fn set_params(
        &self,
        new_params: Params,
        authorization: &Authorization,
    ) -> Result<Transition, EngineError> {
        self.require_admin(&authz::admin_params_message(&new_params), authorization)?;
        if !new_params.validate() {
            return Err(EngineError::GuardViolation("params"));
        }
        let mut state = *self;
        state.params = new_params;
        Ok(Transition {
            state,
            event: Event::ParamsUpdated(ParamsUpdatedEvent { params: new_params }),
        })
    }

    pub fn set_oracle_identity(
        &self,
        new_key: PublicKey,
        authorization: &Authorization,
    ) -> Result<Transition, EngineError> {
        self.require_admin(&authz::admin_rotate_oracle_message(&new_key), authorization)?;
        let mut state = *self;
        state.oracle_key = new_key;
        Ok(Transition {
            state,
            event: Event::OracleRotated(IdentityRotatedEvent {
                previous: self.oracle_key,
                next: new_key,
            }),
        })
    }

    pub fn set_admin(
        &self,
        new_key: PublicKey,
        authorization: &Authorization,
    ) -> Result<Transition, EngineError> {
        self.require_admin(&authz::admin_rotate_admin_message(&new_key), authorization)?;
        let mut state = *self;
        state.admin_key = new_key;
        Ok(Transition {
            state,
            event: Event::AdminRotated(IdentityRotatedEvent {
                previous: self.admin_key,
                next: new_key,
            }),
        })
    }

    /// Anyone may add to the insurance fund; nothing to authorize.
    pub fn deposit_insurance(&self, amount: Fixed) -> Transition {
        let mut state = *self;
        state.insurance_fund = self.insurance_fund.add(amount);
        Transition {
            state,
            event: Event::InsuranceDeposited(InsuranceFlowEvent {
                amount,
                balance: state.insurance_fund,
            }),
        }
    }

    /// Admin withdrawal, bounded by the current balance. the fund can never
    /// go negative.
    pub fn withdraw_insurance(
        &self,
        amount: Fixed,
        authorization: &Authorization,
    ) -> Result<Transition, EngineError> {
        self.require_admin(&authz::admin_withdraw_message(amount), authorization)?;
        if amount > self.insurance_fund {
            return Err(EngineError::InsufficientReserve {
                required: amount,
                available: self.insurance_fund,
            });
        }
        let mut state = *self;
        state.insurance_fund = self.insurance_fund.sub_sat(amount);
        Ok(Transition {
            state,
            event: Event::InsuranceWithdrawn(InsuranceFlowEvent {
                amount,
                balance: state.insurance_fund,
            }),
        })
    }

    /// Install an initial funding EMA for an asset. only valid against an
    /// absent prior leaf, so a seeded asset can never be silently re-seeded.
    pub fn seed_funding_state(
        &self,
        asset: AssetId,
        seed: FundingState,
        proof: &MerkleProof,
        authorization: &Authorization,
    ) -> Result<Transition, EngineError> {
        self.require_admin(
            &authz::admin_seed_funding_message(asset, seed.magnitude, seed.sign),
            authorization,
        )?;
        if proof.key != FundingState::key(asset) {
            return Err(EngineError::StateMismatch("funding"));
        }
        if !verify_against(&self.funding_root, &EMPTY_LEAF, proof) {
            return Err(EngineError::StateMismatch("funding"));
        }
        let mut state = *self;
        state.funding_root = compute_new_root(proof, &seed.leaf());
        Ok(Transition {
            state,
            event: Event::FundingSeeded(FundingSeededEvent { asset, state: seed }),
        })
    }
}
