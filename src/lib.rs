#![forbid(unsafe_code)]

pub mod error;
pub use error::Error;

pub mod crypto;
pub mod record;
pub use record::{ContentType, ProtocolVersion, Record, SequenceCounter};

pub mod ticket;
pub use ticket::{ClientTicket, SessionTicket, TicketEncoder, TicketSecret};

pub mod transport;
pub use transport::{Clock, SystemClock, Transport, UnixTime};

pub mod handshake;
pub use handshake::{
    CipherSuite, Client, ClientState, HandshakeMessage, HandshakeType, Server, default_response,
};
