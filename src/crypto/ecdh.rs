//! Ephemeral Diffie-Hellman key pairs for the two full-handshake suites.
//!
//! - P-256: public keys travel as 65-byte uncompressed SEC1 points, the
//!   shared secret is the 32-byte x-coordinate.
//! - X25519: public keys and shared secrets are 32 raw bytes. The same
//!   secret scalar also keys the NaCl box record family. Low-order peer
//!   keys, which force an all-zero shared secret, are rejected.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroizing;

use crate::crypto::random_array;
use crate::error::Error;

/// Ephemeral key agreement used once per handshake.
pub trait KeyAgreement: Sized {
    /// Generate a fresh key pair from the OS RNG.
    fn generate() -> Self;

    /// Encoded public key as carried in the hello's cipher-key field.
    fn public_key(&self) -> Vec<u8>;

    /// Shared secret with the peer's encoded public key.
    ///
    /// Malformed peer keys fail with [`Error::DataCorrupted`].
    fn agree(&self, peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>, Error>;
}

/// P-256 ephemeral ECDH key pair.
pub struct P256KeyPair {
    secret: p256::ecdh::EphemeralSecret,
}

impl KeyAgreement for P256KeyPair {
    fn generate() -> Self {
        Self {
            secret: p256::ecdh::EphemeralSecret::random(&mut rand::rngs::OsRng),
        }
    }

    fn public_key(&self) -> Vec<u8> {
        self.secret
            .public_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    fn agree(&self, peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>, Error> {
        let peer =
            p256::PublicKey::from_sec1_bytes(peer_public).map_err(|_| Error::DataCorrupted)?;
        let shared = self.secret.diffie_hellman(&peer);
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(shared.raw_secret_bytes());
        Ok(out)
    }
}

/// X25519 key pair, usable both for DH and as a NaCl box identity.
pub struct X25519KeyPair {
    secret: x25519_dalek::StaticSecret,
    public: x25519_dalek::PublicKey,
}

impl X25519KeyPair {
    /// Raw secret scalar, for building a box cipher.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret.to_bytes())
    }
}

impl KeyAgreement for X25519KeyPair {
    fn generate() -> Self {
        let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(random_array());
        let secret = x25519_dalek::StaticSecret::from(*bytes);
        let public = x25519_dalek::PublicKey::from(&secret);
        Self { secret, public }
    }

    fn public_key(&self) -> Vec<u8> {
        self.public.as_bytes().to_vec()
    }

    fn agree(&self, peer_public: &[u8]) -> Result<Zeroizing<[u8; 32]>, Error> {
        let peer: [u8; 32] = peer_public.try_into().map_err(|_| Error::DataCorrupted)?;
        let shared = self
            .secret
            .diffie_hellman(&x25519_dalek::PublicKey::from(peer));
        if !shared.was_contributory() {
            return Err(Error::DataCorrupted);
        }
        Ok(Zeroizing::new(shared.to_bytes()))
    }
}
