//! Running transcript hash over the ALS handshake.
//!
//! Both peers feed the raw payload of every handshake-layer record, in
//! send/receive order, into a SHA-256 state. Keys are derived from
//! intermediate digests, obtained by cloning the state.

use sha2::{Digest, Sha256};

use crate::record::Record;

/// Running SHA-256 transcript hash over handshake record payloads.
#[derive(Clone, Default)]
pub struct TranscriptHash {
    hasher: Sha256,
}

impl TranscriptHash {
    /// Create a new empty transcript hash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw handshake payload bytes into the transcript.
    pub fn update(&mut self, message: &[u8]) {
        self.hasher.update(message);
    }

    /// Feed a handshake record's payload as it stands on the wire.
    pub fn absorb(&mut self, record: &Record) {
        self.update(record.payload());
    }

    /// Current 32-byte digest, without consuming the state.
    pub fn current_hash(&self) -> [u8; 32] {
        self.hasher.clone().finalize().into()
    }
}
