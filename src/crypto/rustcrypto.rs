//! RustCrypto-backed record ciphers and the ticket secretbox.

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes128Gcm, KeyInit};

use crate::crypto::aead::{RecordCipher, TAG_LEN};
use crate::crypto::key_schedule::{AES_NONCE_LEN, BOX_NONCE_LEN, KeyMaterial};
use crate::crypto::xor_nonce;
use crate::error::Error;
use crate::record::{ContentType, ProtocolVersion, Record};

// ---- AES-128-GCM record family ----

/// AES-128-GCM record protection with a per-record XOR nonce.
pub struct AesGcmCipher {
    cipher: Aes128Gcm,
    base_nonce: [u8; AES_NONCE_LEN],
}

impl AesGcmCipher {
    /// Build from AES-GCM key material.
    ///
    /// Box material is rejected with [`Error::VersionMismatch`].
    pub fn new(material: &KeyMaterial) -> Result<Self, Error> {
        match material {
            KeyMaterial::AesGcm { key, base_nonce } => {
                let cipher =
                    Aes128Gcm::new_from_slice(key).map_err(|_| Error::VersionMismatch)?;
                Ok(Self {
                    cipher,
                    base_nonce: *base_nonce,
                })
            }
            KeyMaterial::Box { .. } => Err(Error::VersionMismatch),
        }
    }

    /// Per-record nonce: base nonce with `seq` folded into its last 4 bytes.
    pub fn nonce(&self, seq: u32) -> [u8; AES_NONCE_LEN] {
        let mut nonce = self.base_nonce;
        xor_nonce(&mut nonce, seq);
        nonce
    }
}

/// Additional data bound into every AES-GCM record.
///
/// Layout: `seq (8, BE) | type | version | 0x00 | ciphertext_len (2, BE)`.
/// `ciphertext_len` always includes the tag.
pub fn record_aad(
    seq: u32,
    content_type: ContentType,
    version: ProtocolVersion,
    ciphertext_len: u16,
) -> [u8; 13] {
    let mut aad = [0u8; 13];
    aad[..8].copy_from_slice(&(seq as u64).to_be_bytes());
    aad[8] = content_type as u8;
    aad[9] = version as u8;
    aad[11..].copy_from_slice(&ciphertext_len.to_be_bytes());
    aad
}

impl RecordCipher for AesGcmCipher {
    const VERSION: ProtocolVersion = ProtocolVersion::AesGcm;

    fn seal(&self, record: &mut Record, seq: u32) -> Result<(), Error> {
        let ciphertext_len =
            u16::try_from(record.len() + TAG_LEN).map_err(|_| Error::RecordTooLarge)?;
        let aad = record_aad(seq, record.content_type(), record.version(), ciphertext_len);
        let nonce = self.nonce(seq);

        self.cipher
            .encrypt_in_place(
                aes_gcm::Nonce::from_slice(&nonce),
                &aad,
                record.payload_mut(),
            )
            .map_err(|_| Error::RecordTooLarge)
    }

    fn open(&self, record: &mut Record, seq: u32) -> Result<(), Error> {
        if record.len() < TAG_LEN {
            return Err(Error::AuthenticationFailure);
        }
        // The parsed length already counts the tag.
        let aad = record_aad(
            seq,
            record.content_type(),
            record.version(),
            record.len() as u16,
        );
        let nonce = self.nonce(seq);

        self.cipher
            .decrypt_in_place(
                aes_gcm::Nonce::from_slice(&nonce),
                &aad,
                record.payload_mut(),
            )
            .map_err(|_| Error::AuthenticationFailure)
    }
}

// ---- XSalsa20-Poly1305 box record family ----

/// NaCl box record protection between an X25519 secret and a peer public key.
///
/// The record's type and version overwrite bytes 8 and 9 of the derived
/// nonce, which binds them to the ciphertext without separate AAD.
pub struct BoxCipher {
    salsa_box: crypto_box::SalsaBox,
    nonce: [u8; BOX_NONCE_LEN],
}

impl BoxCipher {
    /// Build from box key material, the peer's public key and our secret key.
    ///
    /// AES-GCM material is rejected with [`Error::VersionMismatch`].
    pub fn new(
        material: &KeyMaterial,
        peer_public: &[u8; 32],
        secret: &[u8; 32],
    ) -> Result<Self, Error> {
        match material {
            KeyMaterial::Box { nonce } => {
                let public = crypto_box::PublicKey::from(*peer_public);
                let secret = crypto_box::SecretKey::from(*secret);
                Ok(Self {
                    salsa_box: crypto_box::SalsaBox::new(&public, &secret),
                    nonce: *nonce,
                })
            }
            KeyMaterial::AesGcm { .. } => Err(Error::VersionMismatch),
        }
    }

    fn record_nonce(&self, record: &Record) -> [u8; BOX_NONCE_LEN] {
        let mut nonce = self.nonce;
        nonce[8] = record.content_type() as u8;
        nonce[9] = record.version() as u8;
        nonce
    }
}

impl RecordCipher for BoxCipher {
    const VERSION: ProtocolVersion = ProtocolVersion::XSalsa20Poly1305;

    fn seal(&self, record: &mut Record, _seq: u32) -> Result<(), Error> {
        use crypto_box::aead::AeadInPlace;

        let nonce = self.record_nonce(record);
        self.salsa_box
            .encrypt_in_place(
                crypto_box::aead::generic_array::GenericArray::from_slice(&nonce),
                b"",
                record.payload_mut(),
            )
            .map_err(|_| Error::RecordTooLarge)
    }

    fn open(&self, record: &mut Record, _seq: u32) -> Result<(), Error> {
        use crypto_box::aead::AeadInPlace;

        if record.len() < TAG_LEN {
            return Err(Error::AuthenticationFailure);
        }
        let nonce = self.record_nonce(record);
        self.salsa_box
            .decrypt_in_place(
                crypto_box::aead::generic_array::GenericArray::from_slice(&nonce),
                b"",
                record.payload_mut(),
            )
            .map_err(|_| Error::AuthenticationFailure)
    }
}

// ---- Ticket secretbox ----

/// Seal `plaintext` with XSalsa20-Poly1305 secretbox. Output is `tag || ciphertext`.
pub fn secretbox_seal(
    secret: &[u8; 32],
    nonce: &[u8; BOX_NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, Error> {
    use crypto_secretbox::aead::generic_array::GenericArray;
    use crypto_secretbox::aead::{Aead, KeyInit as _};

    let cipher = crypto_secretbox::XSalsa20Poly1305::new_from_slice(secret)
        .map_err(|_| Error::TicketDecodeFailure)?;
    cipher
        .encrypt(GenericArray::from_slice(nonce), plaintext)
        .map_err(|_| Error::RecordTooLarge)
}

/// Open a secretbox produced by [`secretbox_seal`].
pub fn secretbox_open(
    secret: &[u8; 32],
    nonce: &[u8; BOX_NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, Error> {
    use crypto_secretbox::aead::generic_array::GenericArray;
    use crypto_secretbox::aead::{Aead, KeyInit as _};

    let cipher = crypto_secretbox::XSalsa20Poly1305::new_from_slice(secret)
        .map_err(|_| Error::TicketDecodeFailure)?;
    cipher
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_schedule::{MASTER_LABEL, derive_aes_gcm, derive_box};
    use hex_literal::hex;

    fn aes_cipher() -> AesGcmCipher {
        let km = derive_aes_gcm(&[0x42u8; 32], MASTER_LABEL, &[0u8; 32]);
        AesGcmCipher::new(&km).unwrap()
    }

    // ---- AES-GCM ----

    #[test]
    fn aad_layout() {
        let aad = record_aad(
            0x0102_0304,
            ContentType::ApplicationData,
            ProtocolVersion::AesGcm,
            0x0120,
        );
        assert_eq!(aad, hex!("0000000001020304 14 01 00 0120"));
    }

    #[test]
    fn aes_nonce_folds_sequence() {
        let km = KeyMaterial::AesGcm {
            key: [0u8; 16],
            base_nonce: [0u8; 12],
        };
        let cipher = AesGcmCipher::new(&km).unwrap();
        assert_eq!(cipher.nonce(0), [0u8; 12]);
        assert_eq!(cipher.nonce(1)[11], 1);
        assert_eq!(cipher.nonce(0x0100)[10], 1);
    }

    #[test]
    fn aes_roundtrip_restores_length() {
        let cipher = aes_cipher();
        let mut record = Record::new(
            ContentType::ApplicationData,
            ProtocolVersion::AesGcm,
            b"hello world".to_vec(),
        )
        .unwrap();

        cipher.seal(&mut record, 3).unwrap();
        assert_eq!(record.len(), 11 + TAG_LEN);
        assert_ne!(record.payload(), b"hello world");

        cipher.open(&mut record, 3).unwrap();
        assert_eq!(record.payload(), b"hello world");
    }

    #[test]
    fn aes_empty_payload_is_not_an_error() {
        let cipher = aes_cipher();
        let mut record =
            Record::new(ContentType::ApplicationData, ProtocolVersion::AesGcm, Vec::new()).unwrap();
        cipher.seal(&mut record, 0).unwrap();
        assert_eq!(record.len(), TAG_LEN);
        cipher.open(&mut record, 0).unwrap();
        assert!(record.payload().is_empty());
    }

    #[test]
    fn aes_wrong_sequence_fails() {
        let cipher = aes_cipher();
        let mut record =
            Record::new(ContentType::ApplicationData, ProtocolVersion::AesGcm, b"x".to_vec())
                .unwrap();
        cipher.seal(&mut record, 1).unwrap();
        assert_eq!(cipher.open(&mut record, 2), Err(Error::AuthenticationFailure));
    }

    #[test]
    fn aes_short_ciphertext_fails() {
        let cipher = aes_cipher();
        let mut record =
            Record::new(ContentType::ApplicationData, ProtocolVersion::AesGcm, vec![0; 5])
                .unwrap();
        assert_eq!(cipher.open(&mut record, 0), Err(Error::AuthenticationFailure));
    }

    #[test]
    fn aes_rejects_box_material() {
        let km = derive_box(&[1u8; 32], MASTER_LABEL, &[0u8; 32]);
        assert!(matches!(AesGcmCipher::new(&km), Err(Error::VersionMismatch)));
    }

    // ---- Box ----

    fn box_pair() -> (BoxCipher, BoxCipher) {
        let a_secret = [0x11u8; 32];
        let b_secret = [0x22u8; 32];
        let a_public = x25519_dalek::PublicKey::from(&x25519_dalek::StaticSecret::from(a_secret));
        let b_public = x25519_dalek::PublicKey::from(&x25519_dalek::StaticSecret::from(b_secret));
        let a = BoxCipher::new(
            &derive_box(&[9u8; 32], MASTER_LABEL, &[0u8; 32]),
            b_public.as_bytes(),
            &a_secret,
        )
        .unwrap();
        let b = BoxCipher::new(
            &derive_box(&[9u8; 32], MASTER_LABEL, &[0u8; 32]),
            a_public.as_bytes(),
            &b_secret,
        )
        .unwrap();
        (a, b)
    }

    #[test]
    fn box_roundtrip_between_peers() {
        let (a, b) = box_pair();
        let mut record = Record::new(
            ContentType::Handshake,
            ProtocolVersion::XSalsa20Poly1305,
            b"ticket bytes".to_vec(),
        )
        .unwrap();
        a.seal(&mut record, 0).unwrap();
        assert_eq!(record.len(), 12 + TAG_LEN);
        b.open(&mut record, 0).unwrap();
        assert_eq!(record.payload(), b"ticket bytes");
    }

    #[test]
    fn box_binds_content_type() {
        let (a, b) = box_pair();
        let mut record = Record::new(
            ContentType::Handshake,
            ProtocolVersion::XSalsa20Poly1305,
            b"data".to_vec(),
        )
        .unwrap();
        a.seal(&mut record, 0).unwrap();
        let mut retyped = Record::new(
            ContentType::ApplicationData,
            ProtocolVersion::XSalsa20Poly1305,
            record.payload().to_vec(),
        )
        .unwrap();
        assert_eq!(b.open(&mut retyped, 0), Err(Error::AuthenticationFailure));
    }

    #[test]
    fn box_tamper_is_surfaced() {
        let (a, b) = box_pair();
        let mut record = Record::new(
            ContentType::Handshake,
            ProtocolVersion::XSalsa20Poly1305,
            b"data".to_vec(),
        )
        .unwrap();
        a.seal(&mut record, 0).unwrap();
        record.payload_mut()[TAG_LEN] ^= 0x01;
        assert_eq!(b.open(&mut record, 0), Err(Error::AuthenticationFailure));
    }

    #[test]
    fn box_rejects_aes_material() {
        let km = derive_aes_gcm(&[1u8; 32], MASTER_LABEL, &[0u8; 32]);
        assert!(matches!(
            BoxCipher::new(&km, &[0u8; 32], &[1u8; 32]),
            Err(Error::VersionMismatch)
        ));
    }

    // ---- Secretbox ----

    #[test]
    fn secretbox_roundtrip_and_tamper() {
        let secret = [0x77u8; 32];
        let nonce = [0x01u8; 24];
        let mut sealed = secretbox_seal(&secret, &nonce, b"resume me").unwrap();
        assert_eq!(sealed.len(), 9 + TAG_LEN);
        assert_eq!(secretbox_open(&secret, &nonce, &sealed).unwrap(), b"resume me");

        sealed[0] ^= 0x80;
        assert_eq!(
            secretbox_open(&secret, &nonce, &sealed),
            Err(Error::AuthenticationFailure)
        );
    }
}
