#![no_main]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use milli_als::{Server, TicketEncoder};

fuzz_target!(|data: &[u8]| {
    let mut secrets = BTreeMap::new();
    secrets.insert(1u16, [0x11; 32]);
    let Ok(encoder) = TicketEncoder::new(Duration::from_secs(60), secrets) else {
        return;
    };
    // Arbitrary request bodies must be rejected or answered, never panic.
    let _ = Server::new(Arc::new(encoder)).handle(data);
});
