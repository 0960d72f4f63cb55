#![no_main]
use libfuzzer_sys::fuzz_target;

use ikewire_ikev2::{decode, encode};

fuzz_target!(|data: &[u8]| {
    if let Ok(packet) = decode(data) {
        let encoded = encode(&packet).expect("decoded packet re-encodes");
        // reserved bits and the critical flag of known payloads are not kept
        if encoded != data {
            let again = decode(&encoded).expect("re-encoded packet decodes");
            assert_eq!(again, packet);
        }
    }
});
