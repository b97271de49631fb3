#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Read records back to back until the input runs out or fails.
    let mut input = data;
    while !input.is_empty() {
        let before = input.len();
        match milli_als::Record::read(&mut input) {
            Ok(record) => {
                assert_eq!(before - input.len(), record.len() + milli_als::record::RECORD_HEADER_LEN);
                assert_eq!(record.marshal(), data[data.len() - before..data.len() - input.len()]);
            }
            Err(_) => break,
        }
    }
});
