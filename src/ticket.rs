//! Session tickets for 0-RTT resumption.
//!
//! A ticket is an opaque capsule only the issuing server can open:
//!
//! ```text
//!   nonce (24 bytes: 22 random || version u16 BE)
//!   secretbox(secret[version], nonce, expire_ts u32 BE || ticket_key)
//! ```
//!
//! The server hands the client `expire_ts u32 BE || ticket` so the client
//! knows when to stop offering it. Secrets are looked up by the version in
//! the nonce, which lets a server rotate secrets while older tickets stay
//! decodable.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::crypto::key_schedule::TICKET_KEY_LEN;
use crate::crypto::rustcrypto::{secretbox_open, secretbox_seal};
use crate::crypto::{TicketKey, random_array};
use crate::error::Error;
use crate::transport::UnixTime;

/// 32-byte ticket encryption secret.
pub type TicketSecret = [u8; 32];

/// Ticket nonce length.
pub const TICKET_NONCE_LEN: usize = 24;

/// Random prefix of the ticket nonce; the version fills the rest.
pub const TICKET_RANDOM_LEN: usize = TICKET_NONCE_LEN - 2;

/// Sealed plaintext length: expiry plus ticket key.
const TICKET_PLAINTEXT_LEN: usize = 4 + TICKET_KEY_LEN;

/// Registry of ticket secrets by key-epoch version.
///
/// New tickets always use the highest version. Read-only once built, so
/// one encoder can serve concurrent handshakes behind an `Arc`.
pub struct TicketEncoder {
    version: u16,
    secrets: BTreeMap<u16, TicketSecret>,
    lifetime: u32,
}

impl TicketEncoder {
    /// Build a registry from provisioned secrets.
    ///
    /// `lifetime` is truncated to whole seconds.
    pub fn new(lifetime: Duration, secrets: BTreeMap<u16, TicketSecret>) -> Result<Self, Error> {
        let version = *secrets.keys().next_back().ok_or(Error::EmptyTicketRegistry)?;
        let lifetime = u32::try_from(lifetime.as_secs()).unwrap_or(u32::MAX);
        Ok(Self {
            version,
            secrets,
            lifetime,
        })
    }

    /// Version used for newly issued tickets.
    pub fn current_version(&self) -> u16 {
        self.version
    }

    /// Issue a ticket for `ticket_key`, expiring one lifetime after `now`.
    pub fn issue(&self, ticket_key: TicketKey, now: UnixTime) -> SessionTicket<'_> {
        SessionTicket {
            version: self.version,
            expire_ts: now.saturating_add(self.lifetime),
            ticket_key,
            secret: &self.secrets[&self.version],
        }
    }

    /// Open a sealed ticket and return its key and expiry.
    ///
    /// Expiry is not checked here; that is the caller's decision.
    pub fn decode(&self, data: &[u8]) -> Result<(TicketKey, UnixTime), Error> {
        if data.len() < TICKET_NONCE_LEN {
            return Err(Error::TicketDecodeFailure);
        }
        let mut nonce = [0u8; TICKET_NONCE_LEN];
        nonce.copy_from_slice(&data[..TICKET_NONCE_LEN]);
        let version = u16::from_be_bytes([nonce[TICKET_RANDOM_LEN], nonce[TICKET_RANDOM_LEN + 1]]);

        let secret = self
            .secrets
            .get(&version)
            .ok_or(Error::TicketVersionUnknown(version))?;

        let plaintext = secretbox_open(secret, &nonce, &data[TICKET_NONCE_LEN..])
            .map_err(|_| Error::TicketDecodeFailure)?;
        if plaintext.len() != TICKET_PLAINTEXT_LEN {
            return Err(Error::TicketDecodeFailure);
        }

        let expire_ts = u32::from_be_bytes([plaintext[0], plaintext[1], plaintext[2], plaintext[3]]);
        let mut key = [0u8; TICKET_KEY_LEN];
        key.copy_from_slice(&plaintext[4..]);
        Ok((TicketKey::from_bytes(key), expire_ts))
    }
}

impl core::fmt::Debug for TicketEncoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TicketEncoder")
            .field("version", &self.version)
            .field("versions", &self.secrets.keys().collect::<Vec<_>>())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// A freshly issued ticket, borrowing its encryption secret from the registry.
pub struct SessionTicket<'a> {
    version: u16,
    expire_ts: UnixTime,
    ticket_key: TicketKey,
    secret: &'a TicketSecret,
}

impl SessionTicket<'_> {
    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn expire_ts(&self) -> UnixTime {
        self.expire_ts
    }

    /// Seal into the opaque form the server later decodes.
    pub fn seal(&self) -> Result<Vec<u8>, Error> {
        let mut plaintext = Vec::with_capacity(TICKET_PLAINTEXT_LEN);
        plaintext.extend_from_slice(&self.expire_ts.to_be_bytes());
        plaintext.extend_from_slice(self.ticket_key.as_bytes());

        let mut nonce = [0u8; TICKET_NONCE_LEN];
        nonce[..TICKET_RANDOM_LEN].copy_from_slice(&random_array::<TICKET_RANDOM_LEN>());
        nonce[TICKET_RANDOM_LEN..].copy_from_slice(&self.version.to_be_bytes());

        let sealed = secretbox_seal(self.secret, &nonce, &plaintext);
        zeroize::Zeroize::zeroize(&mut plaintext);
        let sealed = sealed?;

        let mut out = Vec::with_capacity(TICKET_NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Client-visible form: expiry prefix followed by the sealed ticket.
    pub fn to_client_bytes(&self) -> Result<Vec<u8>, Error> {
        let sealed = self.seal()?;
        let mut out = Vec::with_capacity(4 + sealed.len());
        out.extend_from_slice(&self.expire_ts.to_be_bytes());
        out.extend_from_slice(&sealed);
        Ok(out)
    }
}

/// The client's copy of a ticket: when it expires and the opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTicket {
    pub expire_ts: UnixTime,
    pub ticket: Vec<u8>,
}

impl ClientTicket {
    /// Split a NewSessionTicket payload into expiry and opaque ticket.
    pub fn parse(payload: &[u8]) -> Result<Self, Error> {
        if payload.len() < 4 {
            return Err(Error::DataCorrupted);
        }
        Ok(Self {
            expire_ts: u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
            ticket: payload[4..].to_vec(),
        })
    }

    pub fn is_expired(&self, now: UnixTime) -> bool {
        self.expire_ts < now
    }
}
