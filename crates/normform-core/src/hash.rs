//! Stable hashing helpers for inputs, relations, and manifests.

use blake3::Hasher;
use serde::Serialize;

use crate::relation::Relation;
use crate::types::hash_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }

    /// Combine two digests (order-sensitive).
    pub fn chain(&self, next: &Hash256) -> Hash256 {
        let mut h = Hasher::new();
        h.update(&self.0);
        h.update(&next.0);
        Hash256(h.finalize().into())
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    let out = h.finalize();
    Hash256(out.into())
}

pub fn hash_str(s: &str) -> Hash256 {
    hash_bytes(s.as_bytes())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v).map_err(|e| crate::error::Error::Hash(e.to_string()))?;
    Ok(hash_bytes(&bytes))
}

/// Content digest of a relation: attributes, key, and every cell in row order.
/// The name and origin are not part of the digest.
pub fn hash_relation(relation: &Relation) -> Hash256 {
    let mut h = Hasher::new();
    for attr in relation.attributes() {
        h.update(&(attr.len() as u64).to_le_bytes());
        h.update(attr.as_bytes());
    }
    h.update(&[0xff]);
    for k in relation.key() {
        h.update(&(k.len() as u64).to_le_bytes());
        h.update(k.as_bytes());
    }
    h.update(&(relation.num_rows() as u64).to_le_bytes());
    for row in 0..relation.num_rows() {
        for col in relation.columns() {
            hash_value(&col.values[row], &mut h);
        }
    }
    Hash256(h.finalize().into())
}
