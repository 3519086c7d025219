// 12.0.2: result types and errors for engine operations.

use super::core::State;
use crate::events::Event;
use crate::fixed::Fixed;
use crate::types::Timestamp;

/// A committed transition: the replacement state and its audit event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: State,
    pub event: Event,
}

/// Every failure is terminal for the attempt. nothing is retried internally
/// and no ledger root moves on any of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("{0} authorization does not verify")]
    SignatureInvalid(&'static str),

    #[error("supplied proof does not reconstruct the committed {0} state")]
    StateMismatch(&'static str),

    #[error("malformed position or wrong action tag")]
    InvariantViolation,

    #[error("{0} guard failed")]
    GuardViolation(&'static str),

    #[error("insurance fund holds {available}, cannot cover {required}")]
    InsufficientReserve { required: Fixed, available: Fixed },

    #[error("oracle timestamp {submitted} behind recorded {recorded}")]
    StaleOracle {
        submitted: Timestamp,
        recorded: Timestamp,
    },
}
