#![no_main]

use fb_protocol::QueryResponse;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz service query response parsing
    if let Ok(response) = QueryResponse::parse(data) {
        let _ = response.needs_retry();
        let _ = response.output.len();
    }
});
