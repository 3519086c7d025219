// 4.0: position record and its ledger encoding. one (owner, asset) pair maps
// to one ledger entry; there is no portfolio netting across assets.
// 4.1 has the increase/reduce mutation helpers at the bottom.

use crate::fixed::Fixed;
use crate::ledger::{derive_key, hash_leaf, LeafHash, LedgerKey};
use crate::types::{AssetId, PublicKey, Side};
use serde::{Deserialize, Serialize};

pub const POSITION_KEY_DOMAIN: &[u8] = b"perp.key.position";
pub const POSITION_LEAF_DOMAIN: &[u8] = b"perp.leaf.position";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub owner: PublicKey,
    pub collateral: Fixed,
    pub size: Fixed,
    pub side: Side,
    pub entry_price: Fixed,
    // bound into the leaf hash and every authorization message, but no
    // handler advances it
    pub nonce: u64,
}

impl Position {
    pub fn new(
        owner: PublicKey,
        collateral: Fixed,
        size: Fixed,
        side: Side,
        entry_price: Fixed,
        nonce: u64,
    ) -> Self {
        Self {
            owner,
            collateral,
            size,
            side,
            entry_price,
            nonce,
        }
    }

    // a committed position always has positive size and entry price.
    // direction is enforced by the Side type.
    pub fn is_well_formed(&self) -> bool {
        !self.size.is_zero() && !self.entry_price.is_zero()
    }

    pub fn key(&self, asset: AssetId) -> LedgerKey {
        derive_key(
            POSITION_KEY_DOMAIN,
            &[self.owner.as_bytes(), &asset.to_le_bytes()],
        )
    }

    // canonical field encoding shared by the leaf hash and the signed
    // authorization messages. fixed-width little-endian throughout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 + 16 + 16 + 1 + 16 + 8);
        out.extend_from_slice(self.owner.as_bytes());
        out.extend_from_slice(&self.collateral.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.push(self.side.as_byte());
        out.extend_from_slice(&self.entry_price.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out
    }

    pub fn leaf(&self) -> LeafHash {
        hash_leaf(POSITION_LEAF_DOMAIN, &[&self.encode()])
    }

    // 4.1: add to the position. entry becomes the volume-weighted average of
    // the old entry and the fill, flooring; repeated small adds bias low.
    pub fn increased(&self, delta: Fixed, fill_price: Fixed) -> Position {
        let new_size = self.size.add(delta);
        let blended_notional = self.size.mul(self.entry_price).add(delta.mul(fill_price));
        Position {
            size: new_size,
            entry_price: blended_notional.div(new_size),
            ..*self
        }
    }

    // shrink the position after a partial settlement. entry and nonce are
    // untouched; the caller supplies the post-settlement collateral.
    pub fn reduced(&self, delta: Fixed, new_collateral: Fixed) -> Position {
        Position {
            size: self.size.sub_sat(delta),
            collateral: new_collateral,
            ..*self
        }
    }
}
