// perps-ledger: perpetual futures trading engine as a deterministic
// state-transition function over authenticated key-value ledgers.
// proof-first architecture: every mutation verifies an inclusion/exclusion
// proof against a committed root and replaces the commitment atomically.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, Timestamp, Side, Sign, identities
//   2.x  fixed.rs: fixed-point arithmetic, scale 1e6, floor division
//   3.x  ledger.rs: sparse Merkle map, proofs, roots, mirror store
//   4.x  position.rs: position record, leaf/key hashing, VWAP math
//   5.x  funding.rs: spread rate, sign/magnitude EMA, interval accrual
//   6.x  risk.rs: gain/loss, settlement split, margin and guard checks
//   7.x  authz.rs: domain-separated messages, ed25519 verification
//   8.x  config.rs: global parameter set, defaults, validation
//   9.x  oracle.rs: signed price snapshots, per-asset clock leaves
//   10.x update.rs: action tags, per-call intent, tick witnesses
//   11.x events.rs: one audit event per committed transition
//   12.x engine/: orchestrator: state value, admin surface, five actions

// arithmetic and data primitives
pub mod fixed;
pub mod types;

// authenticated storage
pub mod ledger;

// domain records and math
pub mod funding;
pub mod position;
pub mod risk;

// authorization and inputs
pub mod authz;
pub mod config;
pub mod oracle;
pub mod update;

// orchestration
pub mod engine;
pub mod events;

// re exports for convenience
pub use config::Params;
pub use engine::{EngineError, State, Transition};
pub use events::Event;
pub use fixed::Fixed;
pub use funding::FundingState;
pub use ledger::{LedgerKey, LedgerStore, LeafHash, MerkleProof, Root, EMPTY_LEAF};
pub use oracle::OracleSnapshot;
pub use position::Position;
pub use risk::{GainLoss, Settlement};
pub use types::{AssetId, Authorization, PublicKey, Side, Sign, SignedBps, Timestamp};
pub use update::{Action, TickWitness, Update};
