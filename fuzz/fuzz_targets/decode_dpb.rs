#![no_main]

use fb_protocol::Dpb;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must encode back to the same bytes
    if let Ok(dpb) = Dpb::decode(data) {
        if let Ok(encoded) = dpb.encode() {
            assert_eq!(Dpb::decode(&encoded).ok(), Some(dpb));
        }
    }
});
