#![no_main]
use libfuzzer_sys::fuzz_target;
use claimtoken::serialize::deserialize_token;
use claimtoken::verify::verify_token_bytes;

fuzz_target!(|data: &[u8]| {
    // Must never panic, regardless of input.
    let _ = deserialize_token(data);
    let _ = verify_token_bytes(b"fuzz-secret", data);
});
