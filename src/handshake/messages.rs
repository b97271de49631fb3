//! ALS handshake message encoding and decoding.
//!
//! Hello message format:
//!   HandshakeType (1 byte)
//!   Nonce (32 bytes)
//!   Timestamp (4 bytes, big-endian unix seconds)
//!   CipherSuite (1 byte)
//!   KeyLength (2 bytes, big-endian)
//!   CipherKey (KeyLength bytes): ephemeral public key or session ticket

use crate::crypto::random_array;
use crate::error::Error;
use crate::record::ProtocolVersion;

/// Handshake message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    NewSessionTicket = 4,
}

/// ALS cipher suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CipherSuite {
    /// Ephemeral P-256 ECDH, AES-128-GCM records.
    DheSecp256r1WithAesGcm = 0xc9,
    /// Ephemeral X25519, NaCl box records.
    DheX25519WithXsalsa20Poly1305 = 0xca,
    /// Session-ticket resumption with 0-RTT data, AES-128-GCM records.
    PskWithAesGcm = 0xcb,
    /// Reserved; no handshake implements it.
    PskWithXsalsa20Poly1305 = 0xcc,
}

impl CipherSuite {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0xc9 => Some(Self::DheSecp256r1WithAesGcm),
            0xca => Some(Self::DheX25519WithXsalsa20Poly1305),
            0xcb => Some(Self::PskWithAesGcm),
            0xcc => Some(Self::PskWithXsalsa20Poly1305),
            _ => None,
        }
    }

    /// Record family used for every record of a handshake on this suite.
    pub fn record_version(self) -> ProtocolVersion {
        match self {
            Self::DheSecp256r1WithAesGcm | Self::PskWithAesGcm => ProtocolVersion::AesGcm,
            Self::DheX25519WithXsalsa20Poly1305 | Self::PskWithXsalsa20Poly1305 => {
                ProtocolVersion::XSalsa20Poly1305
            }
        }
    }
}

/// Size of every fixed field: type, nonce, timestamp, suite and key length.
pub const HELLO_FIXED_LEN: usize = 1 + 32 + 4 + 1 + 2;

/// A ClientHello or ServerHello.
///
/// The suite is kept as its raw byte so a server can name an
/// unsupported id in its error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    pub nonce: [u8; 32],
    pub timestamp: u32,
    pub cipher_suite: u8,
    pub cipher_key: Vec<u8>,
}

impl HandshakeMessage {
    /// New hello with a fresh random nonce.
    pub fn new(timestamp: u32, cipher_key: Vec<u8>, suite: CipherSuite) -> Self {
        Self {
            nonce: random_array(),
            timestamp,
            cipher_suite: suite.to_u8(),
            cipher_key,
        }
    }

    /// Decoded suite, if the id is one this crate knows.
    pub fn suite(&self) -> Option<CipherSuite> {
        CipherSuite::from_u8(self.cipher_suite)
    }

    /// Encode as a message of type `msg_type`.
    pub fn encode(&self, msg_type: HandshakeType) -> Result<Vec<u8>, Error> {
        let key_len = u16::try_from(self.cipher_key.len()).map_err(|_| Error::RecordTooLarge)?;

        let mut out = Vec::with_capacity(HELLO_FIXED_LEN + self.cipher_key.len());
        out.push(msg_type as u8);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.push(self.cipher_suite);
        out.extend_from_slice(&key_len.to_be_bytes());
        out.extend_from_slice(&self.cipher_key);
        Ok(out)
    }

    /// Decode a message that must be of type `expected`.
    ///
    /// The buffer must hold exactly one message: short buffers, a type
    /// mismatch, a key length that overruns, and trailing bytes all fail
    /// with [`Error::DataCorrupted`].
    pub fn decode(data: &[u8], expected: HandshakeType) -> Result<Self, Error> {
        if data.len() < HELLO_FIXED_LEN {
            return Err(Error::DataCorrupted);
        }
        if data[0] != expected as u8 {
            return Err(Error::DataCorrupted);
        }

        let mut off = 1;
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&data[off..off + 32]);
        off += 32;

        let timestamp = u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
        off += 4;

        let cipher_suite = data[off];
        off += 1;

        let key_len = u16::from_be_bytes([data[off], data[off + 1]]) as usize;
        off += 2;

        if data.len() - off != key_len {
            return Err(Error::DataCorrupted);
        }

        Ok(Self {
            nonce,
            timestamp,
            cipher_suite,
            cipher_key: data[off..].to_vec(),
        })
    }
}
