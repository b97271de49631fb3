#![no_main]

use std::collections::BTreeMap;
use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use milli_als::TicketEncoder;

fuzz_target!(|data: &[u8]| {
    let mut secrets = BTreeMap::new();
    secrets.insert(1u16, [0x11; 32]);
    secrets.insert(2u16, [0x22; 32]);
    let Ok(encoder) = TicketEncoder::new(Duration::from_secs(60), secrets) else {
        return;
    };
    let _ = encoder.decode(data);
});
