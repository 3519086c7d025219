// 9.0: oracle gateway types. a snapshot is an ephemeral signed price tick;
// only its timestamp persists, one clock leaf per asset, and timestamps may
// never regress. the gateway sequence itself (verify, prove, bump) is
// composed in engine/funding.rs because it touches committed roots.

use crate::authz;
use crate::fixed::Fixed;
use crate::ledger::{derive_key, hash_leaf, LeafHash, LedgerKey, EMPTY_LEAF};
use crate::types::{AssetId, Authorization, PublicKey, Timestamp};

pub const CLOCK_KEY_DOMAIN: &[u8] = b"perp.key.clock";
pub const CLOCK_LEAF_DOMAIN: &[u8] = b"perp.leaf.clock";

/// A price attestation for one asset at one instant, signed by the oracle
/// identity over (mark, index, asset, timestamp).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleSnapshot {
    pub mark_price: Fixed,
    pub index_price: Fixed,
    pub asset: AssetId,
    pub timestamp: Timestamp,
    pub authorization: Authorization,
}

impl OracleSnapshot {
    pub fn is_well_formed(&self) -> bool {
        !self.mark_price.is_zero() && !self.index_price.is_zero()
    }

    pub fn message(&self) -> Vec<u8> {
        authz::oracle_price_message(self.mark_price, self.index_price, self.asset, self.timestamp)
    }

    pub fn verify(&self, oracle_key: &PublicKey) -> bool {
        authz::verify(oracle_key, &self.message(), &self.authorization)
    }
}

pub fn clock_key(asset: AssetId) -> LedgerKey {
    derive_key(CLOCK_KEY_DOMAIN, &[&asset.to_le_bytes()])
}

// the zero timestamp encodes as the absent leaf: an asset that has never
// seen a tick verifies with an exclusion proof
pub fn clock_leaf(timestamp: Timestamp) -> LeafHash {
    if timestamp.is_zero() {
        return EMPTY_LEAF;
    }
    hash_leaf(CLOCK_LEAF_DOMAIN, &[&timestamp.as_secs().to_le_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    fn signed_snapshot(sk: &SigningKey) -> OracleSnapshot {
        let mut snap = OracleSnapshot {
            mark_price: Fixed::from_units(100),
            index_price: Fixed::from_units(100),
            asset: AssetId(1),
            timestamp: Timestamp::from_secs(1_000),
            authorization: Authorization([0u8; 64]),
        };
        snap.authorization = authz::sign(sk, &snap.message());
        snap
    }

    #[test]
    fn snapshot_verifies_under_oracle_key() {
        let sk = SigningKey::from_bytes(&[3u8; 32]);
        let snap = signed_snapshot(&sk);
        assert!(snap.verify(&authz::public_key(&sk)));
    }

    #[test]
    fn snapshot_rejects_field_tamper() {
        let sk = SigningKey::from_bytes(&[3u8; 32]);
        let mut snap = signed_snapshot(&sk);
        snap.mark_price = Fixed::from_units(101);
        assert!(!snap.verify(&authz::public_key(&sk)));
    }

    #[test]
    fn snapshot_rejects_zero_prices() {
        let sk = SigningKey::from_bytes(&[3u8; 32]);
        let mut snap = signed_snapshot(&sk);
        snap.index_price = Fixed::ZERO;
        assert!(!snap.is_well_formed());
    }

    #[test]
    fn clock_leaf_zero_is_absent() {
        assert_eq!(clock_leaf(Timestamp::from_secs(0)), EMPTY_LEAF);
        assert_ne!(clock_leaf(Timestamp::from_secs(1)), EMPTY_LEAF);
    }

    #[test]
    fn clock_keys_distinct_per_asset() {
        assert_ne!(clock_key(AssetId(1)), clock_key(AssetId(2)));
    }
}
