#![no_main]

use arbitrary::Arbitrary;
use fb_protocol::{Dpb, WritePolicy};
use libfuzzer_sys::fuzz_target;

/// Arbitrary attach options.
#[derive(Debug, Arbitrary)]
struct FuzzDpb {
    user: Option<String>,
    password: Option<String>,
    damaged: Option<bool>,
    forced_writes: Option<bool>,
    charset: Option<String>,
    message_file: Option<String>,
    num_buffers: Option<u8>,
    dba_user: Option<String>,
    role: Option<String>,
}

fuzz_target!(|input: FuzzDpb| {
    let mut dpb = Dpb::new();
    dpb.user = input.user;
    dpb.password = input.password;
    dpb.damaged = input.damaged;
    dpb.write_policy = input
        .forced_writes
        .map(|sync| if sync { WritePolicy::Sync } else { WritePolicy::Async });
    dpb.charset = input.charset;
    dpb.message_file = input.message_file;
    dpb.num_buffers = input.num_buffers;
    dpb.dba_user = input.dba_user;
    dpb.role = input.role;

    // Oversized strings are rejected, everything else is exact
    if let Ok(encoded) = dpb.encode() {
        assert_eq!(encoded.len(), dpb.encoded_len());
        assert_eq!(Dpb::decode(&encoded).ok(), Some(dpb));
    }
});
