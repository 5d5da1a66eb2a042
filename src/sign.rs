//! Token signing: HMAC-SHA1 over the serialized body.

use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::error::TokenError;
use crate::serialize::serialize_unsigned;
use crate::text::encode_text;
use crate::types::*;

/// Compute the 20-byte HMAC-SHA1 of `data` under `key`.
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> Result<[u8; SIGNATURE_LEN], TokenError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key)
        .map_err(|e| TokenError::SigningFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    let mut out = [0u8; SIGNATURE_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Sign a token with `issued_at` set to the given time (ms since epoch).
/// Returns the signed wire bytes and updates `total_length` and `signature`.
///
/// `issued_at` is stamped before serialization, so it stays updated even if
/// encoding then fails on an oversized field.
pub fn sign_token_at(
    token: &mut Token,
    secret: &[u8],
    issued_at: i64,
) -> Result<Vec<u8>, TokenError> {
    token.issued_at = issued_at;

    let (mut bytes, total_length) = serialize_unsigned(token)?;
    let signature = hmac_sha1(secret, &bytes)?;
    bytes.extend_from_slice(&signature);

    token.total_length = total_length;
    token.signature = Some(signature);

    tracing::debug!(
        app_id = token.app_id,
        user_id = %token.user_id,
        total_length,
        "signed token"
    );
    Ok(bytes)
}

/// Sign a token, stamping `issued_at` with the current time.
pub fn sign_token(token: &mut Token, secret: &[u8]) -> Result<Vec<u8>, TokenError> {
    sign_token_at(token, secret, current_millis())
}

/// Sign a token and return its unpadded URL-safe base64 text form.
pub fn encode_token(token: &mut Token, secret: &[u8]) -> Result<String, TokenError> {
    sign_token(token, secret).map(|bytes| encode_text(&bytes))
}

/// Generate a random 32-byte shared secret, rendered as unpadded URL-safe base64.
pub fn generate_secret() -> Zeroizing<String> {
    let mut raw = Zeroizing::new([0u8; 32]);
    rand::rngs::OsRng.fill_bytes(raw.as_mut_slice());
    Zeroizing::new(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw.as_slice()))
}
