//! Token verification: length checks, then HMAC-SHA1 over the signed prefix.

use ring::hmac;

use crate::error::TokenError;
use crate::serialize::deserialize_token;
use crate::text::decode_text;
use crate::types::*;

/// Check `signature` against HMAC-SHA1(`secret`, `signed_bytes`) in constant time.
pub fn verify_signature(
    secret: &[u8],
    signed_bytes: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<(), TokenError> {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret);
    hmac::verify(&key, signed_bytes, signature).map_err(|_| TokenError::SignatureMismatch)
}

/// Parse signed wire bytes and verify them against `secret`.
///
/// Returns the claims only after both length checks and the signature check
/// have passed.
pub fn verify_token_bytes(secret: &[u8], token_bytes: &[u8]) -> Result<Token, TokenError> {
    let parsed = deserialize_token(token_bytes).inspect_err(log_rejection)?;
    verify_signature(secret, parsed.signed_bytes, &parsed.signature)
        .inspect_err(log_rejection)?;

    tracing::debug!(
        app_id = parsed.token.app_id,
        user_id = %parsed.token.user_id,
        total_length = parsed.token.total_length,
        "verified token"
    );
    Ok(parsed.token)
}

/// Decode the text form and verify it against `secret`.
pub fn decode_token(text: &str, secret: &[u8]) -> Result<Token, TokenError> {
    let bytes = decode_text(text).inspect_err(log_rejection)?;
    verify_token_bytes(secret, &bytes)
}

/// Decode the text form without checking the signature.
///
/// The returned claims are untrusted. Length checks still apply.
pub fn inspect_token(text: &str) -> Result<Token, TokenError> {
    let bytes = decode_text(text)?;
    Ok(deserialize_token(&bytes)?.token)
}

fn log_rejection(err: &TokenError) {
    tracing::debug!(kind = err.kind(), error = %err, "rejected token");
}
