// 11.0: every committed transition produces exactly one event. the core is
// pure, so events come back by value alongside the new state instead of
// accumulating in an internal log; callers keep the audit trail.

use crate::config::Params;
use crate::fixed::Fixed;
use crate::funding::FundingState;
use crate::types::{AssetId, PublicKey, Side, SignedBps, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // position events
    PositionOpened(PositionOpenedEvent),
    PositionIncreased(PositionIncreasedEvent),
    PositionReduced(PositionReducedEvent),
    PositionClosed(PositionClosedEvent),
    PositionLiquidated(PositionLiquidatedEvent),

    // admin events
    ParamsUpdated(ParamsUpdatedEvent),
    OracleRotated(IdentityRotatedEvent),
    AdminRotated(IdentityRotatedEvent),
    InsuranceDeposited(InsuranceFlowEvent),
    InsuranceWithdrawn(InsuranceFlowEvent),
    FundingSeeded(FundingSeededEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub owner: PublicKey,
    pub asset: AssetId,
    pub side: Side,
    pub size: Fixed,
    pub entry_price: Fixed,
    pub collateral: Fixed,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionIncreasedEvent {
    pub owner: PublicKey,
    pub asset: AssetId,
    pub delta: Fixed,
    pub new_size: Fixed,
    pub new_entry_price: Fixed,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReducedEvent {
    pub owner: PublicKey,
    pub asset: AssetId,
    pub closed_size: Fixed,
    pub remaining_size: Fixed,
    /// post-settlement collateral: the remaining position's collateral, or
    /// the amount returned when the reduce collapses the entry
    pub new_collateral: Fixed,
    pub shortfall: Fixed,
    pub funding: SignedBps,
    pub fee: SignedBps,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub owner: PublicKey,
    pub asset: AssetId,
    pub size: Fixed,
    pub returned: Fixed,
    pub shortfall: Fixed,
    pub funding: SignedBps,
    pub fee: SignedBps,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub owner: PublicKey,
    pub asset: AssetId,
    pub size: Fixed,
    pub returned: Fixed,
    pub shortfall: Fixed,
    pub funding: SignedBps,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsUpdatedEvent {
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRotatedEvent {
    pub previous: PublicKey,
    pub next: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceFlowEvent {
    pub amount: Fixed,
    pub balance: Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSeededEvent {
    pub asset: AssetId,
    pub state: FundingState,
}
