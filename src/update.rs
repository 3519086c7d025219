// 10.0: per-call intent. an Update names one action against one position
// entry, carries the claimed prior value with its proof, and the user's
// authorization binding all of it to one oracle tick. the TickWitness
// carries the clock and funding witnesses every action must present.

use crate::fixed::Fixed;
use crate::funding::FundingState;
use crate::ledger::{LeafHash, LedgerKey, MerkleProof};
use crate::position::Position;
use crate::types::{Authorization, SignedBps, Timestamp};
use serde::{Deserialize, Serialize};

/// The action tags. Noop is reserved wire space; no handler accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Open,
    Close,
    Liquidate,
    Increase,
    Reduce,
    Noop,
}

impl Action {
    pub fn domain_tag(&self) -> &'static [u8] {
        match self {
            Action::Open => b"perp.act.open",
            Action::Close => b"perp.act.close",
            Action::Liquidate => b"perp.act.liquidate",
            Action::Increase => b"perp.act.increase",
            Action::Reduce => b"perp.act.reduce",
            Action::Noop => b"perp.act.noop",
        }
    }
}

/// One atomic transition attempt against a position entry.
#[derive(Debug, Clone)]
pub struct Update {
    pub action: Action,
    /// target entry, hash(owner, asset). must agree with the claimed
    /// position and the proof path
    pub key: LedgerKey,
    /// claimed prior position value; the fresh value for Open
    pub claimed: Position,
    /// size delta for Increase/Reduce, zero otherwise
    pub delta_size: Fixed,
    pub fee: SignedBps,
    pub limit_price: Fixed,
    /// true: mark must be at least the limit. false: at most
    pub limit_is_min: bool,
    /// expected prior leaf: the claimed position's hash, or empty for Open
    pub prior_leaf: LeafHash,
    pub proof: MerkleProof,
    pub authorization: Authorization,
}

/// Clock and funding witnesses for the asset being touched. presented by
/// every action; verified and bumped before any position logic runs.
#[derive(Debug, Clone)]
pub struct TickWitness {
    pub prior_timestamp: Timestamp,
    pub clock_proof: MerkleProof,
    pub prior_funding: FundingState,
    pub funding_proof: MerkleProof,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_distinct() {
        let actions = [
            Action::Open,
            Action::Close,
            Action::Liquidate,
            Action::Increase,
            Action::Reduce,
            Action::Noop,
        ];
        for (i, a) in actions.iter().enumerate() {
            for b in &actions[i + 1..] {
                assert_ne!(a.domain_tag(), b.domain_tag());
            }
        }
    }
}
