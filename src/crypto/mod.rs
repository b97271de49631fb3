//! Cryptographic primitives for ALS record protection and key agreement.
//!
//! ALS needs a handful of primitives: two AEAD families for record
//! protection (AES-128-GCM and the NaCl box construction), secretbox for
//! session tickets, ephemeral Diffie-Hellman over P-256 and X25519, and a
//! single-round PBKDF2 key schedule. The [`RecordCipher`] trait is the seam
//! between the record layer and the two AEAD families.

mod aead;
pub mod ecdh;
pub mod key_schedule;
pub mod rustcrypto;

pub use aead::{RecordCipher, TAG_LEN};
pub use key_schedule::{KeyMaterial, TicketKey};
pub use rustcrypto::{AesGcmCipher, BoxCipher};

use rand::RngCore;

/// XOR a 32-bit sequence number into the tail of `nonce`.
///
/// The little-endian bytes of `seq` are applied from the last nonce byte
/// backwards: `nonce[len-1-i] ^= seq_le[i]` for `i` in `0..4`.
pub fn xor_nonce(nonce: &mut [u8], seq: u32) {
    let seq_bytes = seq.to_le_bytes();
    let len = nonce.len();
    for (i, b) in seq_bytes.iter().enumerate() {
        nonce[len - 1 - i] ^= b;
    }
}

/// Fill a fixed-size array from the operating system RNG.
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut out);
    out
}
