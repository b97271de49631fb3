//! ALS client.
//!
//! Full handshake:
//! ```text
//! Init -> SentHello -> ReceivedHello -> KeysDerived -> TicketStored
//! ```
//!
//! 0-RTT request:
//! ```text
//! Init -> SentEarlyData -> ReceivedResponse -> Done
//! ```
//!
//! Any failure drops back to `Init` with no key material kept.

use tracing::{debug, trace, warn};

use crate::crypto::TicketKey;
use crate::crypto::ecdh::{P256KeyPair, X25519KeyPair};
use crate::crypto::key_schedule::{EARLY_LABEL, MASTER_LABEL, derive_aes_gcm, derive_ticket_key};
use crate::crypto::rustcrypto::AesGcmCipher;
use crate::error::Error;
use crate::record::{ContentType, Record, SequenceCounter};
use crate::ticket::ClientTicket;
use crate::transport::{Clock, SystemClock, Transport, UnixTime};

use super::messages::{CipherSuite, HandshakeMessage, HandshakeType};
use super::transcript::TranscriptHash;
use super::{DheSuite, hello_record, read_hello, read_record};

/// Client-side exchange states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Idle, or reset after a failure.
    Init,
    /// ClientHello sent, waiting for ServerHello.
    SentHello,
    /// ServerHello accepted and hashed.
    ReceivedHello,
    /// Master and ticket keys derived.
    KeysDerived,
    /// Session ticket opened and stored.
    TicketStored,
    /// ClientHello and early data sent.
    SentEarlyData,
    /// ServerHello for the resumption accepted.
    ReceivedResponse,
    /// Response data opened.
    Done,
}

/// Resumption material from the last successful full handshake.
struct Session {
    ticket_key: TicketKey,
    ticket: ClientTicket,
}

/// ALS client, generic over its transport and clock.
pub struct Client<T: Transport, C: Clock = SystemClock> {
    transport: T,
    clock: C,
    state: ClientState,
    session: Option<Session>,
}

impl<T: Transport> Client<T, SystemClock> {
    /// Create a client using the system clock.
    pub fn new(transport: T) -> Self {
        Self::with_clock(transport, SystemClock)
    }
}

impl<T: Transport, C: Clock> Client<T, C> {
    pub fn with_clock(transport: T, clock: C) -> Self {
        Self {
            transport,
            clock,
            state: ClientState::Init,
            session: None,
        }
    }

    /// Where the last exchange got to.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Whether a session ticket is stored.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Expiry of the stored ticket, as announced by the server.
    pub fn ticket_expiry(&self) -> Option<UnixTime> {
        self.session.as_ref().map(|s| s.ticket.expire_ts)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Run a 1-RTT ECDHE handshake and store the issued ticket.
    ///
    /// Only the two DH suites are valid here. A failed handshake leaves
    /// any previously stored ticket in place.
    pub fn handshake(&mut self, suite: CipherSuite) -> Result<(), Error> {
        let result = match suite {
            CipherSuite::DheSecp256r1WithAesGcm => self.full_handshake::<P256KeyPair>(),
            CipherSuite::DheX25519WithXsalsa20Poly1305 => self.full_handshake::<X25519KeyPair>(),
            other => Err(Error::UnsupportedCipherSuite(other.to_u8())),
        };
        if let Err(e) = &result {
            debug!(suite = ?suite, error = %e, "handshake failed");
            self.state = ClientState::Init;
        }
        result
    }

    /// Send `data` as 0-RTT early data under the stored ticket and return
    /// the server's response.
    pub fn request(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let result = self.resume(data);
        if let Err(e) = &result {
            debug!(error = %e, "0-RTT request failed");
            self.state = ClientState::Init;
        }
        result
    }

    fn full_handshake<K: DheSuite>(&mut self) -> Result<(), Error> {
        let suite = K::SUITE;
        let key_pair = K::generate();
        let mut transcript = TranscriptHash::new();
        let mut send_seq = SequenceCounter::new();
        let mut recv_seq = SequenceCounter::new();

        let client_hello = HandshakeMessage::new(self.clock.now(), key_pair.public_key(), suite);
        let hello = hello_record(&client_hello, HandshakeType::ClientHello, suite)?;
        transcript.absorb(&hello);
        send_seq.next()?;

        let response = self.round_trip(&hello.marshal(), ClientState::SentHello)?;
        let mut input = response.as_slice();

        let server_hello_record = Record::read(&mut input)?;
        recv_seq.next()?;
        let server_hello = read_hello(&server_hello_record, HandshakeType::ServerHello, suite)?;
        transcript.absorb(&server_hello_record);
        self.state = ClientState::ReceivedHello;

        let shared = key_pair.agree(&server_hello.cipher_key)?;
        let digest = transcript.current_hash();
        let cipher = key_pair.master_cipher(&shared, &digest, &server_hello.cipher_key)?;
        let ticket_key = derive_ticket_key(&*shared, &digest);
        self.state = ClientState::KeysDerived;

        let mut ticket_record = read_record(&mut input, ContentType::Handshake)?;
        ticket_record.open(&cipher, recv_seq.next()?)?;
        if !input.is_empty() {
            return Err(Error::DataCorrupted);
        }
        let ticket = ClientTicket::parse(ticket_record.payload())?;

        debug!(
            suite = ?suite,
            expire_ts = ticket.expire_ts,
            ticket_len = ticket.ticket.len(),
            "session ticket stored"
        );
        self.session = Some(Session { ticket_key, ticket });
        self.state = ClientState::TicketStored;
        Ok(())
    }

    fn resume(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        let suite = CipherSuite::PskWithAesGcm;
        let now = self.clock.now();
        let (ticket_key, ticket) = match &self.session {
            Some(s) => (s.ticket_key.clone(), s.ticket.clone()),
            None => return Err(Error::NoSessionTicket),
        };
        if ticket.is_expired(now) {
            return Err(Error::TicketExpired {
                expire_ts: ticket.expire_ts,
                now,
            });
        }

        let mut transcript = TranscriptHash::new();
        let mut send_seq = SequenceCounter::new();
        let mut recv_seq = SequenceCounter::new();

        let client_hello = HandshakeMessage::new(now, ticket.ticket, suite);
        let hello = hello_record(&client_hello, HandshakeType::ClientHello, suite)?;
        transcript.absorb(&hello);
        send_seq.next()?;

        let early = AesGcmCipher::new(&derive_aes_gcm(
            ticket_key.as_bytes(),
            EARLY_LABEL,
            &transcript.current_hash(),
        ))?;
        let mut early_data = Record::new(
            ContentType::ApplicationData,
            suite.record_version(),
            data.to_vec(),
        )?;
        early_data.seal(&early, send_seq.next()?)?;

        let mut request = hello.marshal();
        early_data.write_to(&mut request);
        trace!(len = request.len(), early_len = data.len(), "sending 0-RTT request");

        let response = self.round_trip(&request, ClientState::SentEarlyData)?;
        let mut input = response.as_slice();

        let server_hello_record = Record::read(&mut input)?;
        recv_seq.next()?;
        read_hello(&server_hello_record, HandshakeType::ServerHello, suite)?;
        transcript.absorb(&server_hello_record);
        self.state = ClientState::ReceivedResponse;

        let master = AesGcmCipher::new(&derive_aes_gcm(
            ticket_key.as_bytes(),
            MASTER_LABEL,
            &transcript.current_hash(),
        ))?;
        let mut reply = read_record(&mut input, ContentType::ApplicationData)?;
        reply.open(&master, recv_seq.next()?)?;
        if !input.is_empty() {
            return Err(Error::DataCorrupted);
        }

        self.state = ClientState::Done;
        Ok(reply.into_payload())
    }

    fn round_trip(&mut self, request: &[u8], sent: ClientState) -> Result<Vec<u8>, Error> {
        self.state = sent;
        self.transport.round_trip(request).map_err(|e| {
            warn!(error = %e, "transport round trip failed");
            Error::Transport
        })
    }
}

impl<T: Transport, C: Clock> core::fmt::Debug for Client<T, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("ticket_expiry", &self.ticket_expiry())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transport that never reaches a server.
    struct Unreachable {
        calls: usize,
    }

    impl Transport for Unreachable {
        type Error = &'static str;

        fn round_trip(&mut self, _request: &[u8]) -> Result<Vec<u8>, Self::Error> {
            self.calls += 1;
            Err("connection refused")
        }
    }

    /// Transport that replays a fixed response.
    struct Canned(Vec<u8>);

    impl Transport for Canned {
        type Error = &'static str;

        fn round_trip(&mut self, _request: &[u8]) -> Result<Vec<u8>, Self::Error> {
            Ok(self.0.clone())
        }
    }

    struct FixedClock(UnixTime);

    impl Clock for FixedClock {
        fn now(&self) -> UnixTime {
            self.0
        }
    }

    fn stored(expire_ts: UnixTime) -> Session {
        Session {
            ticket_key: TicketKey::from_bytes([9; 32]),
            ticket: ClientTicket {
                expire_ts,
                ticket: vec![0xab; 64],
            },
        }
    }

    #[test]
    fn starts_without_session() {
        let client = Client::new(Unreachable { calls: 0 });
        assert_eq!(client.state(), ClientState::Init);
        assert!(!client.has_session());
        assert_eq!(client.ticket_expiry(), None);
    }

    #[test]
    fn request_without_ticket_is_refused() {
        let mut client = Client::new(Unreachable { calls: 0 });
        assert_eq!(client.request(b"ping"), Err(Error::NoSessionTicket));
        assert_eq!(client.transport().calls, 0);
    }

    #[test]
    fn request_with_expired_ticket_is_refused_locally() {
        let mut client = Client::with_clock(Unreachable { calls: 0 }, FixedClock(101));
        client.session = Some(stored(100));
        assert_eq!(
            client.request(b"ping"),
            Err(Error::TicketExpired {
                expire_ts: 100,
                now: 101
            })
        );
        assert_eq!(client.transport().calls, 0);
    }

    #[test]
    fn psk_is_not_a_handshake_suite() {
        let mut client = Client::new(Unreachable { calls: 0 });
        for suite in [CipherSuite::PskWithAesGcm, CipherSuite::PskWithXsalsa20Poly1305] {
            assert_eq!(
                client.handshake(suite),
                Err(Error::UnsupportedCipherSuite(suite.to_u8()))
            );
        }
        assert_eq!(client.transport().calls, 0);
    }

    #[test]
    fn transport_failure_resets_state() {
        let mut client = Client::new(Unreachable { calls: 0 });
        assert_eq!(
            client.handshake(CipherSuite::DheSecp256r1WithAesGcm),
            Err(Error::Transport)
        );
        assert_eq!(client.transport().calls, 1);
        assert_eq!(client.state(), ClientState::Init);
    }

    #[test]
    fn failed_handshake_keeps_previous_ticket() {
        let mut client = Client::with_clock(Unreachable { calls: 0 }, FixedClock(0));
        client.session = Some(stored(500));
        assert!(client.handshake(CipherSuite::DheSecp256r1WithAesGcm).is_err());
        assert_eq!(client.ticket_expiry(), Some(500));
    }

    #[test]
    fn empty_response_is_corrupt() {
        let mut client = Client::new(Canned(Vec::new()));
        assert_eq!(
            client.handshake(CipherSuite::DheX25519WithXsalsa20Poly1305),
            Err(Error::DataCorrupted)
        );
        assert!(!client.has_session());
    }

    #[test]
    fn server_hello_for_other_suite_rejected() {
        let msg = HandshakeMessage::new(0, vec![4; 65], CipherSuite::PskWithAesGcm);
        let rec = hello_record(&msg, HandshakeType::ServerHello, CipherSuite::PskWithAesGcm)
            .unwrap();
        let mut client = Client::new(Canned(rec.marshal()));
        assert_eq!(
            client.handshake(CipherSuite::DheSecp256r1WithAesGcm),
            Err(Error::UnsupportedCipherSuite(0xcb))
        );
        assert_eq!(client.state(), ClientState::Init);
    }

    #[test]
    fn debug_hides_ticket() {
        let mut client = Client::with_clock(Unreachable { calls: 0 }, FixedClock(0));
        client.session = Some(stored(42));
        let out = format!("{client:?}");
        assert!(out.contains("ticket_expiry: Some(42)"));
        assert!(!out.contains("171"));
    }
}
