// 1.0: all the primitives live here. nothing in the core works without these types.
// asset IDs, timestamps, direction, sign/magnitude pairs, identities. each is a
// newtype so the compiler catches mixups between the three ledgers.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl AssetId {
    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

// 1.1: second-granularity timestamp carried by oracle snapshots. the core never
// reads a clock; every instant comes in signed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    // elapsed seconds since an earlier instant, clamped at zero
    pub fn seconds_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    // longs pay positive funding, shorts pay negative funding
    pub fn pays(&self, funding_sign: Sign) -> bool {
        (*self == Side::Long) == (funding_sign == Sign::Positive)
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Side::Long => 1,
            Side::Short => 2,
        }
    }
}

// 1.2: explicit sign for magnitudes that have no native negative representation.
// funding EMA state and fee directions are stored as (magnitude, sign) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn flip(&self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Sign::Positive)
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Sign::Positive => 1,
            Sign::Negative => 2,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Positive => write!(f, "+"),
            Sign::Negative => write!(f, "-"),
        }
    }
}

// 1.3: a signed basis-point quantity. used for funding rates and fees.
// positive fee = user pays, negative fee = user receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBps {
    pub magnitude: u64,
    pub sign: Sign,
}

impl SignedBps {
    pub fn new(magnitude: u64, sign: Sign) -> Self {
        Self { magnitude, sign }
    }

    pub fn zero() -> Self {
        Self {
            magnitude: 0,
            sign: Sign::Positive,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude == 0
    }
}

impl fmt::Display for SignedBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}bps", self.sign, self.magnitude)
    }
}

// 1.4: an ed25519 verifying key. owner identity, oracle identity, admin identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // first four bytes are enough to tell identities apart in logs
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}..",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

// 1.5: a detached ed25519 signature over a domain-separated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorization(pub [u8; 64]);

impl Authorization {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Long.opposite(), Side::Short);
        assert_eq!(Side::Short.opposite(), Side::Long);
    }

    #[test]
    fn funding_payer_matrix() {
        // longs pay when funding is positive, shorts pay when it is negative
        assert!(Side::Long.pays(Sign::Positive));
        assert!(!Side::Long.pays(Sign::Negative));
        assert!(!Side::Short.pays(Sign::Positive));
        assert!(Side::Short.pays(Sign::Negative));
    }

    #[test]
    fn sign_flip() {
        assert_eq!(Sign::Positive.flip(), Sign::Negative);
        assert_eq!(Sign::Negative.flip(), Sign::Positive);
    }

    #[test]
    fn timestamp_elapsed_clamps() {
        let earlier = Timestamp::from_secs(100);
        let later = Timestamp::from_secs(160);
        assert_eq!(later.seconds_since(earlier), 60);
        assert_eq!(earlier.seconds_since(later), 0);
    }

    #[test]
    fn signed_bps_zero() {
        assert!(SignedBps::zero().is_zero());
        assert!(!SignedBps::new(1, Sign::Negative).is_zero());
    }
}
