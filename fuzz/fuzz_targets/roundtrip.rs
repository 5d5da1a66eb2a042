#![no_main]
use libfuzzer_sys::fuzz_target;
use claimtoken::serialize::{deserialize_token, serialize_unsigned};
use claimtoken::sign::sign_token_at;
use claimtoken::verify::verify_token_bytes;

fuzz_target!(|data: &[u8]| {
    // Anything that parses must re-encode no larger than it arrived, and
    // re-signing it must verify with the same claims.
    if let Ok(parsed) = deserialize_token(data) {
        let (body, total_length) =
            serialize_unsigned(&parsed.token).expect("parsed claims must re-encode");
        assert!(total_length <= parsed.token.total_length);
        if body.len() == parsed.signed_bytes.len() {
            // Same length means no duplicate keys were collapsed.
            let mut sorted = parsed.token.clone();
            let issued_at = sorted.issued_at;
            let bytes = sign_token_at(&mut sorted, b"fuzz-secret", issued_at)
                .expect("parsed claims must sign");
            let again = verify_token_bytes(b"fuzz-secret", &bytes).expect("must verify");
            assert_eq!(again.parameters, parsed.token.parameters);
            assert_eq!(again.privileges, parsed.token.privileges);
        }
    }
});
