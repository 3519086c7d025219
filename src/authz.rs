// 7.0: authorization. every mutation is gated by an ed25519 signature over a
// domain-separated message, so a signature for one purpose can never be
// replayed for another. user action messages additionally bind the claimed
// prior position and the exact oracle tick, which pins each authorization to
// one snapshot of the world.

use crate::config::Params;
use crate::fixed::Fixed;
use crate::position::Position;
use crate::types::{AssetId, Authorization, PublicKey, Sign, SignedBps, Timestamp};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

pub const ORACLE_PRICE_DOMAIN: &[u8] = b"perp.auth.oracle-price";
pub const ADMIN_PARAMS_DOMAIN: &[u8] = b"perp.admin.set-params";
pub const ADMIN_ROTATE_ORACLE_DOMAIN: &[u8] = b"perp.admin.rotate-oracle";
pub const ADMIN_ROTATE_ADMIN_DOMAIN: &[u8] = b"perp.admin.rotate-admin";
pub const ADMIN_WITHDRAW_DOMAIN: &[u8] = b"perp.admin.withdraw-insurance";
pub const ADMIN_SEED_FUNDING_DOMAIN: &[u8] = b"perp.admin.seed-funding";

/// Verify a detached signature against an identity. malformed keys simply
/// fail verification; the core treats them the same as a bad signature.
pub fn verify(key: &PublicKey, message: &[u8], authorization: &Authorization) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(key.as_bytes()) else {
        return false;
    };
    let signature = Signature::from_bytes(authorization.as_bytes());
    verifying_key.verify_strict(message, &signature).is_ok()
}

/// Produce a detached authorization. used by the simulation harness and
/// tests; the core itself only ever verifies.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Authorization {
    Authorization(signing_key.sign(message).to_bytes())
}

pub fn public_key(signing_key: &SigningKey) -> PublicKey {
    PublicKey(signing_key.verifying_key().to_bytes())
}

// 7.1: message builders. fixed-width little-endian field encoding, one
// domain tag per purpose.

pub fn oracle_price_message(
    mark_price: Fixed,
    index_price: Fixed,
    asset: AssetId,
    timestamp: Timestamp,
) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ORACLE_PRICE_DOMAIN.len() + 16 + 16 + 4 + 8);
    msg.extend_from_slice(ORACLE_PRICE_DOMAIN);
    msg.extend_from_slice(&mark_price.to_le_bytes());
    msg.extend_from_slice(&index_price.to_le_bytes());
    msg.extend_from_slice(&asset.to_le_bytes());
    msg.extend_from_slice(&timestamp.as_secs().to_le_bytes());
    msg
}

/// The message a user signs for one action: per-action tag, the full claimed
/// position, the action parameters, and the oracle tick it executes against.
#[allow(clippy::too_many_arguments)]
pub fn user_action_message(
    action_tag: &[u8],
    claimed: &Position,
    delta_size: Fixed,
    fee: SignedBps,
    limit_price: Fixed,
    limit_is_min: bool,
    mark_price: Fixed,
    index_price: Fixed,
    asset: AssetId,
    timestamp: Timestamp,
) -> Vec<u8> {
    let mut msg = Vec::with_capacity(160);
    msg.extend_from_slice(action_tag);
    msg.extend_from_slice(&claimed.encode());
    msg.extend_from_slice(&delta_size.to_le_bytes());
    msg.extend_from_slice(&fee.magnitude.to_le_bytes());
    msg.push(fee.sign.as_byte());
    msg.extend_from_slice(&limit_price.to_le_bytes());
    msg.push(limit_is_min as u8);
    msg.extend_from_slice(&mark_price.to_le_bytes());
    msg.extend_from_slice(&index_price.to_le_bytes());
    msg.extend_from_slice(&asset.to_le_bytes());
    msg.extend_from_slice(&timestamp.as_secs().to_le_bytes());
    msg
}

pub fn admin_params_message(params: &Params) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ADMIN_PARAMS_DOMAIN.len() + 64);
    msg.extend_from_slice(ADMIN_PARAMS_DOMAIN);
    msg.extend_from_slice(&params.encode());
    msg
}

pub fn admin_rotate_oracle_message(new_key: &PublicKey) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ADMIN_ROTATE_ORACLE_DOMAIN.len() + 32);
    msg.extend_from_slice(ADMIN_ROTATE_ORACLE_DOMAIN);
    msg.extend_from_slice(new_key.as_bytes());
    msg
}

pub fn admin_rotate_admin_message(new_key: &PublicKey) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ADMIN_ROTATE_ADMIN_DOMAIN.len() + 32);
    msg.extend_from_slice(ADMIN_ROTATE_ADMIN_DOMAIN);
    msg.extend_from_slice(new_key.as_bytes());
    msg
}

pub fn admin_withdraw_message(amount: Fixed) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ADMIN_WITHDRAW_DOMAIN.len() + 16);
    msg.extend_from_slice(ADMIN_WITHDRAW_DOMAIN);
    msg.extend_from_slice(&amount.to_le_bytes());
    msg
}

pub fn admin_seed_funding_message(asset: AssetId, magnitude: u64, sign: Sign) -> Vec<u8> {
    let mut msg = Vec::with_capacity(ADMIN_SEED_FUNDING_DOMAIN.len() + 13);
    msg.extend_from_slice(ADMIN_SEED_FUNDING_DOMAIN);
    msg.extend_from_slice(&asset.to_le_bytes());
    msg.extend_from_slice(&magnitude.to_le_bytes());
    msg.push(sign.as_byte());
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn keypair(seed: u8) -> (SigningKey, PublicKey) {
        let signing_key = SigningKey::from_bytes(&[seed; 32]);
        let key = public_key(&signing_key);
        (signing_key, key)
    }

    fn claimed() -> Position {
        Position::new(
            PublicKey([7u8; 32]),
            Fixed::from_units(5),
            Fixed::from_units(1),
            Side::Long,
            Fixed::from_units(100),
            0,
        )
    }

    #[test]
    fn sign_verify_roundtrip() {
        let (sk, pk) = keypair(1);
        let msg = admin_withdraw_message(Fixed::from_units(10));
        let auth = sign(&sk, &msg);
        assert!(verify(&pk, &msg, &auth));
    }

    #[test]
    fn wrong_signer_rejected() {
        let (sk, _) = keypair(1);
        let (_, other_pk) = keypair(2);
        let msg = admin_withdraw_message(Fixed::from_units(10));
        let auth = sign(&sk, &msg);
        assert!(!verify(&other_pk, &msg, &auth));
    }

    #[test]
    fn tampered_message_rejected() {
        let (sk, pk) = keypair(1);
        let auth = sign(&sk, &admin_withdraw_message(Fixed::from_units(10)));
        assert!(!verify(&pk, &admin_withdraw_message(Fixed::from_units(11)), &auth));
    }

    #[test]
    fn domains_separate_actions() {
        // the same parameters under two different tags must produce
        // different messages, so one signature cannot serve both
        let build = |tag: &[u8]| {
            user_action_message(
                tag,
                &claimed(),
                Fixed::ZERO,
                SignedBps::zero(),
                Fixed::from_units(99),
                true,
                Fixed::from_units(100),
                Fixed::from_units(100),
                AssetId(1),
                Timestamp::from_secs(1000),
            )
        };
        assert_ne!(build(b"perp.act.close"), build(b"perp.act.reduce"));
    }

    #[test]
    fn message_binds_oracle_tick() {
        let at = |secs: u64| {
            user_action_message(
                b"perp.act.close",
                &claimed(),
                Fixed::ZERO,
                SignedBps::zero(),
                Fixed::from_units(99),
                true,
                Fixed::from_units(100),
                Fixed::from_units(100),
                AssetId(1),
                Timestamp::from_secs(secs),
            )
        };
        assert_ne!(at(1000), at(1001));
    }

    #[test]
    fn invalid_key_bytes_fail_closed() {
        // not a valid curve point
        let bogus = PublicKey([0xff; 32]);
        let (sk, _) = keypair(1);
        let msg = admin_withdraw_message(Fixed::ZERO);
        let auth = sign(&sk, &msg);
        assert!(!verify(&bogus, &msg, &auth));
    }
}
