// 3.0: authenticated key-value ledger. a depth-256 sparse Merkle map over
// Sha256 with one root commitment per ledger. the transition core only ever
// consumes three primitives: derive_key, verify_against, compute_new_root —
// it never holds a full tree. LedgerStore at the bottom is the in-memory
// mirror that produces proofs for the simulation binary and tests.
//
// the engine runs three independent instances: positions, oracle clocks,
// funding EMA state. an absent entry is the all-zero leaf.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey(pub [u8; 32]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeafHash(pub [u8; 32]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root(pub [u8; 32]);

// absent-entry sentinel. deleting a position writes this back.
pub const EMPTY_LEAF: LeafHash = LeafHash([0u8; 32]);

/// Inclusion/exclusion proof: the key fixes the path, the siblings walk it
/// from the leaf back up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub key: LedgerKey,
    pub siblings: Vec<[u8; 32]>,
}

/// Derive a ledger key from a domain tag and identity material.
pub fn derive_key(domain: &[u8], material: &[&[u8]]) -> LedgerKey {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    for part in material {
        hasher.update(part);
    }
    LedgerKey(hasher.finalize().into())
}

/// Hash a leaf value from a domain tag and its encoded fields.
pub fn hash_leaf(domain: &[u8], material: &[&[u8]]) -> LeafHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    for part in material {
        hasher.update(part);
    }
    LeafHash(hasher.finalize().into())
}

fn hash_node(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"perp.node");
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

// empty-subtree hashes by depth: table[DEPTH] is the empty leaf, table[0] the
// root of a fully empty tree.
fn empty_hash(depth: usize) -> [u8; 32] {
    static TABLE: OnceLock<Vec<[u8; 32]>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut table = vec![[0u8; 32]; DEPTH + 1];
        for d in (0..DEPTH).rev() {
            table[d] = hash_node(&table[d + 1], &table[d + 1]);
        }
        table
    });
    table[depth]
}

/// Root of a ledger with no entries. every genesis state starts here.
pub fn empty_root() -> Root {
    Root(empty_hash(0))
}

// bit d of the key, MSB first. node at depth d branches on bit d.
fn bit(key: &[u8; 32], depth: usize) -> bool {
    (key[depth / 8] >> (7 - (depth % 8))) & 1 == 1
}

// key with all bits at index >= depth zeroed: the path of the depth-d node.
fn prefix(key: &[u8; 32], depth: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    let full = depth / 8;
    out[..full].copy_from_slice(&key[..full]);
    if depth % 8 != 0 {
        out[full] = key[full] & (0xffu8 << (8 - depth % 8));
    }
    out
}

fn fold(proof: &MerkleProof, leaf: &LeafHash) -> [u8; 32] {
    let mut h = leaf.0;
    for (step, sibling) in proof.siblings.iter().enumerate() {
        let depth = DEPTH - 1 - step;
        h = if bit(&proof.key.0, depth) {
            hash_node(sibling, &h)
        } else {
            hash_node(&h, sibling)
        };
    }
    h
}

/// True iff the proof binds `claimed_leaf` at `proof.key` to exactly `root`.
pub fn verify_against(root: &Root, claimed_leaf: &LeafHash, proof: &MerkleProof) -> bool {
    proof.siblings.len() == DEPTH && fold(proof, claimed_leaf) == root.0
}

/// Recompute the root after replacing the proven leaf with `new_leaf`.
/// Only meaningful after `verify_against` has accepted the same proof.
pub fn compute_new_root(proof: &MerkleProof, new_leaf: &LeafHash) -> Root {
    Root(fold(proof, new_leaf))
}

// 3.1: full-map mirror. tracks every node on every inserted path so it can
// hand out proofs against its current root. the committed engine state never
// contains one of these; it lives in the surrounding harness.
#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    nodes: HashMap<(u16, [u8; 32]), [u8; 32]>,
    leaves: HashMap<[u8; 32], LeafHash>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Root {
        self.node_at(0, [0u8; 32])
            .map(Root)
            .unwrap_or_else(empty_root)
    }

    pub fn get(&self, key: &LedgerKey) -> LeafHash {
        self.leaves.get(&key.0).copied().unwrap_or(EMPTY_LEAF)
    }

    fn node_at(&self, depth: usize, path: [u8; 32]) -> Option<[u8; 32]> {
        self.nodes.get(&(depth as u16, path)).copied()
    }

    fn sibling(&self, key: &[u8; 32], branch_depth: usize) -> [u8; 32] {
        let mut path = prefix(key, branch_depth + 1);
        path[branch_depth / 8] ^= 1 << (7 - (branch_depth % 8));
        self.node_at(branch_depth + 1, path)
            .unwrap_or_else(|| empty_hash(branch_depth + 1))
    }

    /// Proof for `key` against the current root. works for absent keys too,
    /// in which case it proves the empty leaf.
    pub fn prove(&self, key: &LedgerKey) -> MerkleProof {
        let mut siblings = Vec::with_capacity(DEPTH);
        for step in 0..DEPTH {
            siblings.push(self.sibling(&key.0, DEPTH - 1 - step));
        }
        MerkleProof { key: *key, siblings }
    }

    /// Write a leaf and rehash its path. inserting EMPTY_LEAF deletes.
    pub fn insert(&mut self, key: &LedgerKey, leaf: LeafHash) {
        self.leaves.insert(key.0, leaf);
        let mut h = leaf.0;
        self.nodes.insert((DEPTH as u16, key.0), h);
        for depth in (0..DEPTH).rev() {
            let sibling = self.sibling(&key.0, depth);
            h = if bit(&key.0, depth) {
                hash_node(&sibling, &h)
            } else {
                hash_node(&h, &sibling)
            };
            self.nodes.insert((depth as u16, prefix(&key.0, depth)), h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tag: u8) -> LedgerKey {
        derive_key(b"test.key", &[&[tag]])
    }

    fn leaf(tag: u8) -> LeafHash {
        hash_leaf(b"test.leaf", &[&[tag]])
    }

    #[test]
    fn empty_tree_proves_absence() {
        let store = LedgerStore::new();
        assert_eq!(store.root(), empty_root());

        let proof = store.prove(&key(1));
        assert!(verify_against(&store.root(), &EMPTY_LEAF, &proof));
        assert!(!verify_against(&store.root(), &leaf(1), &proof));
    }

    #[test]
    fn insert_then_prove_roundtrip() {
        let mut store = LedgerStore::new();
        store.insert(&key(1), leaf(1));
        store.insert(&key(2), leaf(2));

        let proof = store.prove(&key(1));
        assert!(verify_against(&store.root(), &leaf(1), &proof));
        assert!(!verify_against(&store.root(), &leaf(2), &proof));
    }

    #[test]
    fn compute_new_root_matches_mirror() {
        let mut store = LedgerStore::new();
        store.insert(&key(1), leaf(1));

        // proof taken before the write must predict the post-write root
        let proof = store.prove(&key(2));
        let predicted = compute_new_root(&proof, &leaf(2));
        store.insert(&key(2), leaf(2));
        assert_eq!(predicted, store.root());
    }

    #[test]
    fn stale_proof_rejected_after_update() {
        let mut store = LedgerStore::new();
        store.insert(&key(1), leaf(1));
        let stale = store.prove(&key(1));

        store.insert(&key(1), leaf(3));
        assert!(!verify_against(&store.root(), &leaf(1), &stale));
        // the refreshed proof binds the new value
        let fresh = store.prove(&key(1));
        assert!(verify_against(&store.root(), &leaf(3), &fresh));
    }

    #[test]
    fn delete_restores_absence() {
        let mut store = LedgerStore::new();
        store.insert(&key(1), leaf(1));
        store.insert(&key(1), EMPTY_LEAF);

        let proof = store.prove(&key(1));
        assert!(verify_against(&store.root(), &EMPTY_LEAF, &proof));
    }

    #[test]
    fn deterministic_roots() {
        let mut a = LedgerStore::new();
        let mut b = LedgerStore::new();
        // insertion order must not matter
        a.insert(&key(1), leaf(1));
        a.insert(&key(2), leaf(2));
        b.insert(&key(2), leaf(2));
        b.insert(&key(1), leaf(1));
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn truncated_proof_rejected() {
        let mut store = LedgerStore::new();
        store.insert(&key(1), leaf(1));
        let mut proof = store.prove(&key(1));
        proof.siblings.pop();
        assert!(!verify_against(&store.root(), &leaf(1), &proof));
    }
}
