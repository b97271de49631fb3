//! ALS handshakes.
//!
//! Two flows share one message format:
//!
//! ```text
//! 1-RTT ECDHE (0xC9 / 0xCA)            0-RTT PSK (0xCB)
//!
//! C -> S  ClientHello(pub)             C -> S  ClientHello(ticket)
//! S -> C  ServerHello(pub)                     ApplicationData   [early key]
//!         NewSessionTicket [master]    S -> C  ServerHello(ticket)
//!                                              ApplicationData   [master key]
//! ```
//!
//! Every record in a direction consumes one sequence number from zero,
//! cleartext hellos included.

pub mod client;
pub mod messages;
pub mod server;
pub mod transcript;

pub use client::{Client, ClientState};
pub use messages::{CipherSuite, HandshakeMessage, HandshakeType};
pub use server::{Server, default_response};
pub use transcript::TranscriptHash;

use crate::crypto::ecdh::{KeyAgreement, P256KeyPair, X25519KeyPair};
use crate::crypto::key_schedule::{MASTER_LABEL, derive_aes_gcm, derive_box};
use crate::crypto::{AesGcmCipher, BoxCipher, RecordCipher};
use crate::error::Error;
use crate::record::{ContentType, Record};

/// A full-handshake suite: an ephemeral key agreement and the record
/// family its master key protects.
pub(crate) trait DheSuite: KeyAgreement {
    type Cipher: RecordCipher;

    const SUITE: CipherSuite;

    /// Build the master record cipher from the shared secret and the
    /// transcript digest through ServerHello.
    fn master_cipher(
        &self,
        shared: &[u8; 32],
        digest: &[u8; 32],
        peer_public: &[u8],
    ) -> Result<Self::Cipher, Error>;
}

impl DheSuite for P256KeyPair {
    type Cipher = AesGcmCipher;

    const SUITE: CipherSuite = CipherSuite::DheSecp256r1WithAesGcm;

    fn master_cipher(
        &self,
        shared: &[u8; 32],
        digest: &[u8; 32],
        _peer_public: &[u8],
    ) -> Result<AesGcmCipher, Error> {
        AesGcmCipher::new(&derive_aes_gcm(shared, MASTER_LABEL, digest))
    }
}

impl DheSuite for X25519KeyPair {
    type Cipher = BoxCipher;

    const SUITE: CipherSuite = CipherSuite::DheX25519WithXsalsa20Poly1305;

    fn master_cipher(
        &self,
        shared: &[u8; 32],
        digest: &[u8; 32],
        peer_public: &[u8],
    ) -> Result<BoxCipher, Error> {
        let peer: [u8; 32] = peer_public.try_into().map_err(|_| Error::DataCorrupted)?;
        BoxCipher::new(
            &derive_box(shared, MASTER_LABEL, digest),
            &peer,
            &self.secret_bytes(),
        )
    }
}

/// Wrap an encoded hello in a cleartext Handshake record of the suite's family.
pub(crate) fn hello_record(
    hello: &HandshakeMessage,
    msg_type: HandshakeType,
    suite: CipherSuite,
) -> Result<Record, Error> {
    Record::new(
        ContentType::Handshake,
        suite.record_version(),
        hello.encode(msg_type)?,
    )
}

/// Check a received hello record and decode the message inside.
///
/// The record must be a Handshake record; a different family than
/// `suite` uses is [`Error::VersionMismatch`].
pub(crate) fn read_hello(
    record: &Record,
    msg_type: HandshakeType,
    suite: CipherSuite,
) -> Result<HandshakeMessage, Error> {
    if record.content_type() != ContentType::Handshake {
        return Err(Error::DataCorrupted);
    }
    if record.version() != suite.record_version() {
        return Err(Error::VersionMismatch);
    }
    let hello = HandshakeMessage::decode(record.payload(), msg_type)?;
    if hello.cipher_suite != suite.to_u8() {
        return Err(Error::UnsupportedCipherSuite(hello.cipher_suite));
    }
    Ok(hello)
}

/// Read one record of the expected content type from `input`.
pub(crate) fn read_record(input: &mut &[u8], expected: ContentType) -> Result<Record, Error> {
    let record = Record::read(input)?;
    if record.content_type() != expected {
        return Err(Error::DataCorrupted);
    }
    Ok(record)
}
