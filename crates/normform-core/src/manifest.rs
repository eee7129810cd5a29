//! Deterministic run manifest for audit/replay.
//!
//! The engine emits a manifest after every run; identical inputs and config
//! reproduce identical input and output hashes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::form::NormalForm;
use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Stable hash of the input relations, dependencies, and config.
    pub input_hash: Hash256,

    /// Normal form the run targeted.
    pub target: NormalForm,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Digest over every output relation, in output order.
    pub output_hash: Option<Hash256>,

    /// Source relations that failed to normalize.
    pub failures: usize,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(input_hash: Hash256, target: NormalForm, started_ms: u64) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            input_hash,
            target,
            engine_version: crate::VERSION.to_string(),
            output_hash: None,
            failures: 0,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, output_hash: Option<Hash256>, failures: usize) -> Self {
        self.finished_ms = finished_ms;
        self.output_hash = output_hash;
        self.failures = failures;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
