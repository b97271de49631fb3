//! ALS key schedule.
//!
//! Every key is one PBKDF2-HMAC-SHA256 evaluation with a single round:
//!
//! ```text
//!   key = PBKDF2(password = secret, salt = label || transcript_digest, rounds = 1)
//! ```
//!
//! The secret is the Diffie-Hellman shared secret for a full handshake, or
//! the ticket key for a resumption. The label separates the early, master
//! and ticket keys. The round count is part of the wire protocol: peers that
//! disagree on it derive different keys.

use sha2::Sha256;
use zeroize::Zeroize;

use crate::record::ProtocolVersion;

/// Label for the 0-RTT early-data key.
pub const EARLY_LABEL: &[u8] = b"the early kdf key";
/// Label for the master key protecting the server's records.
pub const MASTER_LABEL: &[u8] = b"the master kdf key";
/// Label for the resumption secret embedded in session tickets.
pub const TICKET_LABEL: &[u8] = b"the ticket kdf key";

/// PBKDF2 round count.
pub const KDF_ROUNDS: u32 = 1;

/// AES-128 key length.
pub const AES_KEY_LEN: usize = 16;
/// GCM base nonce length.
pub const AES_NONCE_LEN: usize = 12;
/// NaCl box nonce length.
pub const BOX_NONCE_LEN: usize = 24;
/// Ticket key length.
pub const TICKET_KEY_LEN: usize = 32;

/// Derive `out.len()` bytes from `secret`, bound to `label` and the
/// transcript digest.
pub fn derive_key(secret: &[u8], label: &[u8], transcript_digest: &[u8; 32], out: &mut [u8]) {
    let mut salt = Vec::with_capacity(label.len() + transcript_digest.len());
    salt.extend_from_slice(label);
    salt.extend_from_slice(transcript_digest);
    pbkdf2::pbkdf2_hmac::<Sha256>(secret, &salt, KDF_ROUNDS, out);
}

/// Per-phase key material, shaped by the record family it protects.
pub enum KeyMaterial {
    /// AES-128-GCM key and base nonce.
    AesGcm {
        key: [u8; AES_KEY_LEN],
        base_nonce: [u8; AES_NONCE_LEN],
    },
    /// Nonce for the NaCl box; the box key comes from the DH key pair.
    Box { nonce: [u8; BOX_NONCE_LEN] },
}

impl KeyMaterial {
    /// Record family this material is valid for.
    pub fn family(&self) -> ProtocolVersion {
        match self {
            KeyMaterial::AesGcm { .. } => ProtocolVersion::AesGcm,
            KeyMaterial::Box { .. } => ProtocolVersion::XSalsa20Poly1305,
        }
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        match self {
            KeyMaterial::AesGcm { key, base_nonce } => {
                key.zeroize();
                base_nonce.zeroize();
            }
            KeyMaterial::Box { nonce } => nonce.zeroize(),
        }
    }
}

impl core::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "KeyMaterial::{:?}(..)", self.family())
    }
}

/// 32-byte resumption secret carried inside a session ticket.
#[derive(Clone, PartialEq, Eq)]
pub struct TicketKey([u8; TICKET_KEY_LEN]);

impl TicketKey {
    pub fn from_bytes(bytes: [u8; TICKET_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TICKET_KEY_LEN] {
        &self.0
    }
}

impl Drop for TicketKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl core::fmt::Debug for TicketKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("TicketKey(..)")
    }
}

/// Derive AES-GCM key material: 16-byte key followed by 12-byte base nonce.
pub fn derive_aes_gcm(secret: &[u8], label: &[u8], transcript_digest: &[u8; 32]) -> KeyMaterial {
    let mut okm = [0u8; AES_KEY_LEN + AES_NONCE_LEN];
    derive_key(secret, label, transcript_digest, &mut okm);

    let mut key = [0u8; AES_KEY_LEN];
    let mut base_nonce = [0u8; AES_NONCE_LEN];
    key.copy_from_slice(&okm[..AES_KEY_LEN]);
    base_nonce.copy_from_slice(&okm[AES_KEY_LEN..]);
    okm.zeroize();

    KeyMaterial::AesGcm { key, base_nonce }
}

/// Derive a 24-byte box nonce.
pub fn derive_box(secret: &[u8], label: &[u8], transcript_digest: &[u8; 32]) -> KeyMaterial {
    let mut nonce = [0u8; BOX_NONCE_LEN];
    derive_key(secret, label, transcript_digest, &mut nonce);
    KeyMaterial::Box { nonce }
}

/// Derive the resumption secret for a new ticket.
pub fn derive_ticket_key(secret: &[u8], transcript_digest: &[u8; 32]) -> TicketKey {
    let mut key = [0u8; TICKET_KEY_LEN];
    derive_key(secret, TICKET_LABEL, transcript_digest, &mut key);
    TicketKey(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn single_round_matches_pbkdf2_vector() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1, 32)
        let mut out = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(b"password", b"salt", KDF_ROUNDS, &mut out);
        assert_eq!(
            out,
            hex!("120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b")
        );
    }

    #[test]
    fn master_aes_gcm_vector() {
        let secret = [0x22u8; 32];
        let digest = [0x11u8; 32];
        let km = derive_aes_gcm(&secret, MASTER_LABEL, &digest);
        match &km {
            KeyMaterial::AesGcm { key, base_nonce } => {
                assert_eq!(*key, hex!("a6be74be13e9d10d7e8c7c2abf97a11d"));
                assert_eq!(*base_nonce, hex!("34f3d24668fc9219f21eceec"));
            }
            KeyMaterial::Box { .. } => panic!("wrong family"),
        }
    }

    #[test]
    fn early_aes_gcm_vector() {
        let km = derive_aes_gcm(&[0x22u8; 32], EARLY_LABEL, &[0x11u8; 32]);
        match &km {
            KeyMaterial::AesGcm { key, base_nonce } => {
                assert_eq!(*key, hex!("2cbd10296714aa903b084ba91803ff47"));
                assert_eq!(*base_nonce, hex!("623dd29b3feb9b57fc1db084"));
            }
            KeyMaterial::Box { .. } => panic!("wrong family"),
        }
    }

    #[test]
    fn ticket_key_vector() {
        let tk = derive_ticket_key(&[0x22u8; 32], &[0x11u8; 32]);
        assert_eq!(
            *tk.as_bytes(),
            hex!("106df6bd6d04fadd6fd01b7db307add62bb6e83c9d54b11ad672bce207f15fd6")
        );
    }

    #[test]
    fn box_nonce_is_prefix_of_longer_output() {
        let km = derive_box(&[0x22u8; 32], MASTER_LABEL, &[0x11u8; 32]);
        assert_eq!(km.family(), ProtocolVersion::XSalsa20Poly1305);
        match &km {
            KeyMaterial::Box { nonce } => {
                assert_eq!(*nonce, hex!("a6be74be13e9d10d7e8c7c2abf97a11d34f3d24668fc9219"));
            }
            KeyMaterial::AesGcm { .. } => panic!("wrong family"),
        }
    }

    #[test]
    fn labels_separate_keys() {
        let digest = [7u8; 32];
        let mut a = [0u8; 28];
        let mut b = [0u8; 28];
        derive_key(b"secret", EARLY_LABEL, &digest, &mut a);
        derive_key(b"secret", MASTER_LABEL, &digest, &mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_key_bytes() {
        let km = derive_aes_gcm(&[1u8; 32], MASTER_LABEL, &[2u8; 32]);
        assert_eq!(format!("{km:?}"), "KeyMaterial::AesGcm(..)");
    }
}
