// 12.3 engine/actions.rs: the five action handlers. each one runs the same
// spine: tag check, tick bump (oracle + funding), user authorization,
// position proof verification, guards, settlement, root assembly. a failure
// anywhere returns before any root is built, so the committed state is
// untouched by construction.

use super::core::State;
use super::funding::FundingBump;
use super::results::{EngineError, Transition};
use crate::authz;
use crate::events::{
    Event, PositionClosedEvent, PositionIncreasedEvent, PositionLiquidatedEvent,
    PositionOpenedEvent, PositionReducedEvent,
};
use crate::fixed::Fixed;
use crate::ledger::{compute_new_root, verify_against, LeafHash, EMPTY_LEAF};
use crate::oracle::OracleSnapshot;
use crate::risk::{self, GainLoss};
use crate::types::SignedBps;
use crate::update::{Action, TickWitness, Update};

impl State {
    /// Dispatch an update to its handler. the tag is matched exhaustively;
    /// the reserved Noop tag has no handler and is rejected outright.
    pub fn apply(
        &self,
        update: &Update,
        oracle: &OracleSnapshot,
        witness: &TickWitness,
    ) -> Result<Transition, EngineError> {
        match update.action {
            Action::Open => self.open(update, oracle, witness),
            Action::Close => self.close(update, oracle, witness),
            Action::Liquidate => self.liquidate(update, oracle, witness),
            Action::Increase => self.increase(update, oracle, witness),
            Action::Reduce => self.reduce(update, oracle, witness),
            Action::Noop => Err(EngineError::InvariantViolation),
        }
    }

    /// Open a fresh position. the claimed value is the position to write;
    /// its entry price must equal the oracle mark and its collateral must
    /// satisfy initial margin. the funding bump still runs even though the
    /// resulting rate plays no part in the economics of an open.
    pub fn open(
        &self,
        update: &Update,
        oracle: &OracleSnapshot,
        witness: &TickWitness,
    ) -> Result<Transition, EngineError> {
        if update.action != Action::Open {
            return Err(EngineError::InvariantViolation);
        }
        let bump = self.derive_funding_and_bump(oracle, witness)?;
        self.authorize_user(update, oracle)?;
        self.verify_position_entry(update, oracle, true)?;

        let position = &update.claimed;
        if !position.is_well_formed() {
            return Err(EngineError::InvariantViolation);
        }
        if position.entry_price != oracle.mark_price {
            return Err(EngineError::GuardViolation("entry price"));
        }
        if !risk::meets_initial_margin(
            position.collateral,
            position.size,
            position.entry_price,
            self.params.initial_margin_bps,
        ) {
            return Err(EngineError::GuardViolation("initial margin"));
        }

        let state = self.committed(update, &bump, &position.leaf());
        Ok(Transition {
            state,
            event: Event::PositionOpened(PositionOpenedEvent {
                owner: position.owner,
                asset: oracle.asset,
                side: position.side,
                size: position.size,
                entry_price: position.entry_price,
                collateral: position.collateral,
                timestamp: oracle.timestamp,
            }),
        })
    }

    /// Close the full position at the current mark, settling price pnl,
    /// funding over the elapsed interval, and the quoted fee. any shortfall
    /// is drawn from the insurance fund; the leaf collapses to absent.
    pub fn close(
        &self,
        update: &Update,
        oracle: &OracleSnapshot,
        witness: &TickWitness,
    ) -> Result<Transition, EngineError> {
        if update.action != Action::Close {
            return Err(EngineError::InvariantViolation);
        }
        let bump = self.derive_funding_and_bump(oracle, witness)?;
        self.authorize_user(update, oracle)?;
        self.verify_position_entry(update, oracle, false)?;

        let position = &update.claimed;
        if !position.is_well_formed() {
            return Err(EngineError::InvariantViolation);
        }
        if !risk::within_slippage(oracle.mark_price, update.limit_price, update.limit_is_min) {
            return Err(EngineError::GuardViolation("slippage"));
        }
        if !risk::within_fee_cap(update.fee, self.params.max_fee_bps) {
            return Err(EngineError::GuardViolation("fee cap"));
        }

        let gl = risk::gain_loss(
            position.size,
            position.entry_price,
            oracle.mark_price,
            position.side,
        );
        let settlement = risk::settle(position.collateral, &gl, position.side, bump.rate, update.fee);
        let insurance_fund = self.cover_shortfall(settlement.shortfall)?;

        let mut state = self.committed(update, &bump, &EMPTY_LEAF);
        state.insurance_fund = insurance_fund;
        Ok(Transition {
            state,
            event: Event::PositionClosed(PositionClosedEvent {
                owner: position.owner,
                asset: oracle.asset,
                size: position.size,
                returned: settlement.net,
                shortfall: settlement.shortfall,
                funding: bump.rate,
                fee: update.fee,
                timestamp: oracle.timestamp,
            }),
        })
    }

    /// Forced close of an undercollateralized position. eligibility is
    /// judged on base equity only; once eligible, the settlement includes
    /// funding but the fee is forced to zero-and-payable.
    pub fn liquidate(
        &self,
        update: &Update,
        oracle: &OracleSnapshot,
        witness: &TickWitness,
    ) -> Result<Transition, EngineError> {
        if update.action != Action::Liquidate {
            return Err(EngineError::InvariantViolation);
        }
        let bump = self.derive_funding_and_bump(oracle, witness)?;
        self.authorize_user(update, oracle)?;
        self.verify_position_entry(update, oracle, false)?;

        let position = &update.claimed;
        if !position.is_well_formed() {
            return Err(EngineError::InvariantViolation);
        }

        let gl = risk::gain_loss(
            position.size,
            position.entry_price,
            oracle.mark_price,
            position.side,
        );
        if !risk::is_liquidatable(position.collateral, &gl, self.params.maintenance_margin_bps) {
            return Err(EngineError::GuardViolation("liquidation eligibility"));
        }

        let settlement = risk::settle(
            position.collateral,
            &gl,
            position.side,
            bump.rate,
            SignedBps::zero(),
        );
        let insurance_fund = self.cover_shortfall(settlement.shortfall)?;

        let mut state = self.committed(update, &bump, &EMPTY_LEAF);
        state.insurance_fund = insurance_fund;
        Ok(Transition {
            state,
            event: Event::PositionLiquidated(PositionLiquidatedEvent {
                owner: position.owner,
                asset: oracle.asset,
                size: position.size,
                returned: settlement.net,
                shortfall: settlement.shortfall,
                funding: bump.rate,
                timestamp: oracle.timestamp,
            }),
        })
    }

    /// Grow the position at the current mark. entry becomes the volume-
    /// weighted average; collateral is unchanged and must still satisfy
    /// initial margin on the combined size.
    pub fn increase(
        &self,
        update: &Update,
        oracle: &OracleSnapshot,
        witness: &TickWitness,
    ) -> Result<Transition, EngineError> {
        if update.action != Action::Increase {
            return Err(EngineError::InvariantViolation);
        }
        let bump = self.derive_funding_and_bump(oracle, witness)?;
        self.authorize_user(update, oracle)?;
        self.verify_position_entry(update, oracle, false)?;

        let position = &update.claimed;
        if !position.is_well_formed() {
            return Err(EngineError::InvariantViolation);
        }
        if update.delta_size.is_zero() {
            return Err(EngineError::GuardViolation("size delta"));
        }

        let grown = position.increased(update.delta_size, oracle.mark_price);
        if !risk::meets_initial_margin(
            grown.collateral,
            grown.size,
            oracle.mark_price,
            self.params.initial_margin_bps,
        ) {
            return Err(EngineError::GuardViolation("initial margin"));
        }

        let state = self.committed(update, &bump, &grown.leaf());
        Ok(Transition {
            state,
            event: Event::PositionIncreased(PositionIncreasedEvent {
                owner: position.owner,
                asset: oracle.asset,
                delta: update.delta_size,
                new_size: grown.size,
                new_entry_price: grown.entry_price,
                timestamp: oracle.timestamp,
            }),
        })
    }

    /// Settle a fraction of the position at the current mark. the closed
    /// fraction carries its proportional collateral and pnl plus funding and
    /// fee on the closed notional; the result folds back into the remaining
    /// position's collateral, or is returned outright when the reduce
    /// collapses the entry to absent.
    pub fn reduce(
        &self,
        update: &Update,
        oracle: &OracleSnapshot,
        witness: &TickWitness,
    ) -> Result<Transition, EngineError> {
        if update.action != Action::Reduce {
            return Err(EngineError::InvariantViolation);
        }
        let bump = self.derive_funding_and_bump(oracle, witness)?;
        self.authorize_user(update, oracle)?;
        self.verify_position_entry(update, oracle, false)?;

        let position = &update.claimed;
        if !position.is_well_formed() {
            return Err(EngineError::InvariantViolation);
        }
        if update.delta_size.is_zero() || update.delta_size > position.size {
            return Err(EngineError::GuardViolation("size delta"));
        }
        if !risk::within_slippage(oracle.mark_price, update.limit_price, update.limit_is_min) {
            return Err(EngineError::GuardViolation("slippage"));
        }
        if !risk::within_fee_cap(update.fee, self.params.max_fee_bps) {
            return Err(EngineError::GuardViolation("fee cap"));
        }

        let delta = update.delta_size;
        let collateral_share = position.collateral.ratio(delta, position.size);
        let full = risk::gain_loss(
            position.size,
            position.entry_price,
            oracle.mark_price,
            position.side,
        );
        // pnl scales by the closed fraction; funding and fee apply to the
        // closed notional only
        let closed = GainLoss {
            gain: full.gain.ratio(delta, position.size),
            loss: full.loss.ratio(delta, position.size),
            notional: delta.mul(oracle.mark_price),
        };
        let settlement = risk::settle(collateral_share, &closed, position.side, bump.rate, update.fee);
        let insurance_fund = self.cover_shortfall(settlement.shortfall)?;

        let remaining_size = position.size.sub_sat(delta);
        let new_collateral = position
            .collateral
            .sub_sat(collateral_share)
            .add(settlement.net);

        let new_leaf = if remaining_size.is_zero() {
            EMPTY_LEAF
        } else {
            position.reduced(delta, new_collateral).leaf()
        };

        let mut state = self.committed(update, &bump, &new_leaf);
        state.insurance_fund = insurance_fund;
        Ok(Transition {
            state,
            event: Event::PositionReduced(PositionReducedEvent {
                owner: position.owner,
                asset: oracle.asset,
                closed_size: delta,
                remaining_size,
                new_collateral,
                shortfall: settlement.shortfall,
                funding: bump.rate,
                fee: update.fee,
                timestamp: oracle.timestamp,
            }),
        })
    }

    // shared spine pieces

    fn authorize_user(&self, update: &Update, oracle: &OracleSnapshot) -> Result<(), EngineError> {
        let message = authz::user_action_message(
            update.action.domain_tag(),
            &update.claimed,
            update.delta_size,
            update.fee,
            update.limit_price,
            update.limit_is_min,
            oracle.mark_price,
            oracle.index_price,
            oracle.asset,
            oracle.timestamp,
        );
        if !authz::verify(&update.claimed.owner, &message, &update.authorization) {
            return Err(EngineError::SignatureInvalid("user"));
        }
        Ok(())
    }

    // the update's key, proof path, and expected prior leaf must all agree
    // with the claimed position and the committed positions root
    fn verify_position_entry(
        &self,
        update: &Update,
        oracle: &OracleSnapshot,
        prior_absent: bool,
    ) -> Result<(), EngineError> {
        let expected_key = update.claimed.key(oracle.asset);
        if update.key != expected_key || update.proof.key != expected_key {
            return Err(EngineError::StateMismatch("position"));
        }
        let expected_prior = if prior_absent {
            EMPTY_LEAF
        } else {
            update.claimed.leaf()
        };
        if update.prior_leaf != expected_prior {
            return Err(EngineError::StateMismatch("position"));
        }
        if !verify_against(&self.positions_root, &update.prior_leaf, &update.proof) {
            return Err(EngineError::StateMismatch("position"));
        }
        Ok(())
    }

    fn cover_shortfall(&self, shortfall: Fixed) -> Result<Fixed, EngineError> {
        if shortfall > self.insurance_fund {
            return Err(EngineError::InsufficientReserve {
                required: shortfall,
                available: self.insurance_fund,
            });
        }
        Ok(self.insurance_fund.sub_sat(shortfall))
    }

    // all three roots commit together: an action either lands atomically or
    // not at all
    fn committed(
        &self,
        update: &Update,
        bump: &FundingBump,
        new_position_leaf: &LeafHash,
    ) -> State {
        let mut state = *self;
        state.positions_root = compute_new_root(&update.proof, new_position_leaf);
        state.clock_root = bump.clock_root;
        state.funding_root = bump.funding_root;
        state
    }
}
