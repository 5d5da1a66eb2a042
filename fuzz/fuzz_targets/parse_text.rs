#![no_main]
use libfuzzer_sys::fuzz_target;
use claimtoken::verify::{decode_token, inspect_token};

fuzz_target!(|text: &str| {
    // Must never panic, regardless of input.
    let _ = inspect_token(text);
    let _ = decode_token(text, b"fuzz-secret");
});
