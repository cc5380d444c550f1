#![no_main]

use arbitrary::Arbitrary;
use fb_client::status::decode;
use fb_protocol::{StatusArg, StatusVector};
use libfuzzer_sys::fuzz_target;

/// Arbitrary status vector argument.
#[derive(Debug, Arbitrary)]
enum FuzzArg {
    Code(i64),
    Warning(i64),
    String(String),
    Number(i64),
    Interpreted(String),
    SqlState(String),
}

fuzz_target!(|input: (Vec<FuzzArg>, String)| {
    let (args, prefix) = input;
    let status: StatusVector = args
        .into_iter()
        .map(|arg| match arg {
            FuzzArg::Code(c) => StatusArg::Code(c),
            FuzzArg::Warning(c) => StatusArg::Warning(c),
            FuzzArg::String(s) => StatusArg::String(s),
            FuzzArg::Number(n) => StatusArg::Number(n),
            FuzzArg::Interpreted(s) => StatusArg::Interpreted(s),
            FuzzArg::SqlState(s) => StatusArg::SqlState(s),
        })
        .collect();

    // Decoding never fails and always ends with the code lines
    let text = decode(Some(&status), &prefix);
    let expected = format!("Firebird Code = {}\n", status.primary_code());
    assert!(text.ends_with(&expected));
});
