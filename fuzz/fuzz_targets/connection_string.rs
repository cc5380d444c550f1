#![no_main]

use fb_client::ConnectionOptions;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz connection string parsing and the DPB it produces
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(options) = ConnectionOptions::from_connection_string(s) {
            let _ = options.to_dpb(Some("SYSDBA"), None).encode();
        }
    }
});
