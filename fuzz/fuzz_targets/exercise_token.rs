#![no_main]
use libfuzzer_sys::fuzz_target;
use claimtoken::serialize::deserialize_token;

/// Exercises all fields of a successfully parsed token.
/// If any accessor panics on valid parsed input, this will catch it.
fuzz_target!(|data: &[u8]| {
    if let Ok(parsed) = deserialize_token(data) {
        let token = &parsed.token;
        let _ = token.expires_at();
        let _ = token.is_valid_at(i64::MIN);
        let _ = token.is_valid_at(i64::MAX);
        for name in token.privileges.keys() {
            let _ = token.privilege_active_at(name, 0);
        }
        let _ = parsed.signed_bytes.len();
        // JSON serialization should not panic
        let _ = serde_json::to_string(token);
    }
});
