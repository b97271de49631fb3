/// Top-level crate error.
///
/// Every variant is terminal for the exchange that produced it: the
/// orchestrators surface the first failure and derive nothing past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Malformed or truncated wire data.
    DataCorrupted,
    /// Record's protocol version does not match the cipher family in use.
    VersionMismatch,
    /// Cipher suite id is unknown or not implemented.
    UnsupportedCipherSuite(u8),
    /// AEAD tag or box verification failed.
    AuthenticationFailure,
    /// Ticket carries a key-epoch version absent from the registry.
    TicketVersionUnknown(u16),
    /// Ticket ciphertext failed to open or its plaintext is malformed.
    TicketDecodeFailure,
    /// Ticket expired at `expire_ts`, observed at `now`.
    TicketExpired { expire_ts: u32, now: u32 },
    /// The outer transport failed.
    Transport,
    /// Payload does not fit the 16-bit length field.
    RecordTooLarge,
    /// A sequence counter ran out of values.
    SequenceExhausted,
    /// Resumption was requested before any ticket was stored.
    NoSessionTicket,
    /// A ticket registry needs at least one secret.
    EmptyTicketRegistry,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::DataCorrupted => write!(f, "data corrupted"),
            Error::VersionMismatch => write!(f, "record version mismatch"),
            Error::UnsupportedCipherSuite(id) => {
                write!(f, "cipher suite 0x{id:02x} not supported")
            }
            Error::AuthenticationFailure => write!(f, "authentication failed"),
            Error::TicketVersionUnknown(v) => write!(f, "unknown ticket version {v}"),
            Error::TicketDecodeFailure => write!(f, "ticket decode failed"),
            Error::TicketExpired { expire_ts, now } => {
                write!(f, "session ticket expired at {expire_ts} (now {now})")
            }
            Error::Transport => write!(f, "transport error"),
            Error::RecordTooLarge => write!(f, "record payload too large"),
            Error::SequenceExhausted => write!(f, "sequence number space exhausted"),
            Error::NoSessionTicket => write!(f, "no session ticket stored"),
            Error::EmptyTicketRegistry => write!(f, "ticket secret registry is empty"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_suite_in_hex() {
        let msg = Error::UnsupportedCipherSuite(0xcc).to_string();
        assert_eq!(msg, "cipher suite 0xcc not supported");
    }

    #[test]
    fn expired_display_carries_times() {
        let msg = Error::TicketExpired { expire_ts: 10, now: 20 }.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("20"));
    }
}
