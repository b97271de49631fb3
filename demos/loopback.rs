//! In-process ALS exchange: one full handshake per DH suite, each followed
//! by a 0-RTT request on the issued ticket.
//!
//! Run with `RUST_LOG=milli_als=trace` to see the handshake milestones.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use milli_als::{CipherSuite, Client, Error, Server, TicketEncoder, Transport};

/// Hands each request body straight to a server in the same process.
struct Loopback(Arc<Server>);

impl Transport for Loopback {
    type Error = Error;

    fn round_trip(&mut self, request: &[u8]) -> Result<Vec<u8>, Error> {
        self.0.handle(request)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut secrets = BTreeMap::new();
    secrets.insert(1u16, milli_als::crypto::random_array());
    let tickets = TicketEncoder::new(Duration::from_secs(3600), secrets)?;
    let server = Arc::new(Server::new(Arc::new(tickets)));

    for suite in [
        CipherSuite::DheSecp256r1WithAesGcm,
        CipherSuite::DheX25519WithXsalsa20Poly1305,
    ] {
        let mut client = Client::new(Loopback(server.clone()));
        client.handshake(suite)?;
        tracing::info!(suite = ?suite, expire_ts = ?client.ticket_expiry(), "handshake complete");

        let response = client.request(b"ping")?;
        tracing::info!(
            suite = ?suite,
            response = %String::from_utf8_lossy(&response),
            "0-RTT response"
        );
    }
    Ok(())
}
