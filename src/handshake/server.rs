//! ALS server.
//!
//! Each request body is handled on its own: read the ClientHello record,
//! dispatch on its cipher suite, and build the whole response body.
//! Nothing survives between calls except the ticket registry.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::crypto::ecdh::{P256KeyPair, X25519KeyPair};
use crate::crypto::key_schedule::{EARLY_LABEL, MASTER_LABEL, derive_aes_gcm, derive_ticket_key};
use crate::crypto::rustcrypto::AesGcmCipher;
use crate::error::Error;
use crate::record::{ContentType, Record, SequenceCounter};
use crate::ticket::TicketEncoder;
use crate::transport::{Clock, SystemClock, UnixTime};

use super::messages::{CipherSuite, HandshakeMessage, HandshakeType};
use super::transcript::TranscriptHash;
use super::{DheSuite, hello_record, read_record};

/// Prefix the default responder puts before the echoed early data.
pub const DEFAULT_RESPONSE_PREFIX: &[u8] = b"hi, this is server response!\n ";

/// Default 0-RTT responder: echo the early data behind a fixed greeting.
pub fn default_response(early_data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(DEFAULT_RESPONSE_PREFIX.len() + early_data.len());
    out.extend_from_slice(DEFAULT_RESPONSE_PREFIX);
    out.extend_from_slice(early_data);
    out
}

/// ALS server. Shares its ticket registry, so clones of the `Arc` can
/// serve concurrent requests.
pub struct Server<C: Clock = SystemClock> {
    tickets: Arc<TicketEncoder>,
    clock: C,
}

impl Server<SystemClock> {
    pub fn new(tickets: Arc<TicketEncoder>) -> Self {
        Self::with_clock(tickets, SystemClock)
    }
}

impl<C: Clock> Server<C> {
    pub fn with_clock(tickets: Arc<TicketEncoder>, clock: C) -> Self {
        Self { tickets, clock }
    }

    pub fn tickets(&self) -> &TicketEncoder {
        &self.tickets
    }

    /// Handle one request body with the default 0-RTT responder.
    pub fn handle(&self, request: &[u8]) -> Result<Vec<u8>, Error> {
        self.handle_with(request, default_response)
    }

    /// Handle one request body, producing the 0-RTT response with `respond`.
    ///
    /// `respond` is only called for resumption requests, after the early
    /// data has been authenticated.
    pub fn handle_with<F>(&self, request: &[u8], respond: F) -> Result<Vec<u8>, Error>
    where
        F: FnOnce(&[u8]) -> Vec<u8>,
    {
        let now = self.clock.now();
        let mut input = request;

        let first = read_record(&mut input, ContentType::Handshake)?;
        let client_hello = HandshakeMessage::decode(first.payload(), HandshakeType::ClientHello)?;
        let suite = client_hello
            .suite()
            .ok_or(Error::UnsupportedCipherSuite(client_hello.cipher_suite))?;
        debug!(suite = ?suite, key_len = client_hello.cipher_key.len(), "client hello");

        let mut transcript = TranscriptHash::new();
        transcript.absorb(&first);
        let exchange = Exchange {
            hello: &first,
            client_hello: &client_hello,
            transcript,
            now,
        };

        let result = match suite {
            CipherSuite::DheSecp256r1WithAesGcm => {
                self.full_handshake::<P256KeyPair>(exchange, input)
            }
            CipherSuite::DheX25519WithXsalsa20Poly1305 => {
                self.full_handshake::<X25519KeyPair>(exchange, input)
            }
            CipherSuite::PskWithAesGcm => self.resume(exchange, &mut input, respond),
            CipherSuite::PskWithXsalsa20Poly1305 => {
                Err(Error::UnsupportedCipherSuite(suite.to_u8()))
            }
        };
        match &result {
            Ok(out) => trace!(suite = ?suite, len = out.len(), "response built"),
            Err(e) => debug!(suite = ?suite, error = %e, "request rejected"),
        }
        result
    }

    fn full_handshake<K: DheSuite>(&self, ex: Exchange<'_>, rest: &[u8]) -> Result<Vec<u8>, Error> {
        let suite = K::SUITE;
        let Exchange {
            hello,
            client_hello,
            mut transcript,
            now,
        } = ex;
        check_family(hello, suite)?;
        if !rest.is_empty() {
            return Err(Error::DataCorrupted);
        }

        let key_pair = K::generate();
        let shared = key_pair.agree(&client_hello.cipher_key)?;
        let mut send_seq = SequenceCounter::new();

        let server_hello = HandshakeMessage::new(now, key_pair.public_key(), suite);
        let server_hello = hello_record(&server_hello, HandshakeType::ServerHello, suite)?;
        transcript.absorb(&server_hello);
        send_seq.next()?;

        let digest = transcript.current_hash();
        let cipher = key_pair.master_cipher(&shared, &digest, &client_hello.cipher_key)?;
        let ticket = self.tickets.issue(derive_ticket_key(&*shared, &digest), now);

        let mut ticket_record = Record::new(
            ContentType::Handshake,
            suite.record_version(),
            ticket.to_client_bytes()?,
        )?;
        ticket_record.seal(&cipher, send_seq.next()?)?;
        debug!(
            suite = ?suite,
            version = ticket.version(),
            expire_ts = ticket.expire_ts(),
            "session ticket issued"
        );

        let mut out = server_hello.marshal();
        ticket_record.write_to(&mut out);
        Ok(out)
    }

    fn resume<F>(&self, ex: Exchange<'_>, input: &mut &[u8], respond: F) -> Result<Vec<u8>, Error>
    where
        F: FnOnce(&[u8]) -> Vec<u8>,
    {
        let suite = CipherSuite::PskWithAesGcm;
        let Exchange {
            hello,
            client_hello,
            mut transcript,
            now,
        } = ex;
        check_family(hello, suite)?;

        let (ticket_key, expire_ts) = self.tickets.decode(&client_hello.cipher_key)?;
        if expire_ts < now {
            return Err(Error::TicketExpired { expire_ts, now });
        }

        let mut recv_seq = SequenceCounter::new();
        let mut send_seq = SequenceCounter::new();
        recv_seq.next()?;

        let early = AesGcmCipher::new(&derive_aes_gcm(
            ticket_key.as_bytes(),
            EARLY_LABEL,
            &transcript.current_hash(),
        ))?;
        let mut early_data = read_record(input, ContentType::ApplicationData)?;
        early_data.open(&early, recv_seq.next()?)?;
        if !input.is_empty() {
            return Err(Error::DataCorrupted);
        }
        trace!(len = early_data.len(), "early data accepted");

        let server_hello =
            HandshakeMessage::new(now, client_hello.cipher_key.clone(), suite);
        let server_hello = hello_record(&server_hello, HandshakeType::ServerHello, suite)?;
        transcript.absorb(&server_hello);
        send_seq.next()?;

        let master = AesGcmCipher::new(&derive_aes_gcm(
            ticket_key.as_bytes(),
            MASTER_LABEL,
            &transcript.current_hash(),
        ))?;
        let mut reply = Record::new(
            ContentType::ApplicationData,
            suite.record_version(),
            respond(early_data.payload()),
        )?;
        reply.seal(&master, send_seq.next()?)?;

        let mut out = server_hello.marshal();
        reply.write_to(&mut out);
        Ok(out)
    }
}

impl<C: Clock> core::fmt::Debug for Server<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Server")
            .field("tickets", &self.tickets)
            .finish_non_exhaustive()
    }
}

/// What every dispatch branch starts from: the ClientHello and the
/// transcript holding it.
struct Exchange<'a> {
    hello: &'a Record,
    client_hello: &'a HandshakeMessage,
    transcript: TranscriptHash,
    now: UnixTime,
}

fn check_family(hello: &Record, suite: CipherSuite) -> Result<(), Error> {
    if hello.version() != suite.record_version() {
        return Err(Error::VersionMismatch);
    }
    Ok(())
}
