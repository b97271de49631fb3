#![no_main]

use libfuzzer_sys::fuzz_target;
use milli_als::{HandshakeMessage, HandshakeType};

fuzz_target!(|data: &[u8]| {
    for ty in [HandshakeType::ClientHello, HandshakeType::ServerHello] {
        if let Ok(msg) = HandshakeMessage::decode(data, ty) {
            // Decoding is exact, so re-encoding must give the input back.
            assert_eq!(msg.encode(ty).ok().as_deref(), Some(data));
        }
    }
});
