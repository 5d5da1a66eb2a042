//! URL-safe text form: base64 with the `=` padding stripped on output and
//! restored on input.

use std::borrow::Cow;

use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

use crate::error::TokenError;

/// URL-safe, padded, and lenient about non-zero trailing bits in the last
/// symbol, matching the encoders already issuing these tokens.
const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

pub fn encode_text(bytes: &[u8]) -> String {
    let mut text = B64.encode(bytes);
    let unpadded = text.trim_end_matches('=').len();
    text.truncate(unpadded);
    text
}

/// Append `=` until the length is a multiple of 4.
pub fn repad(text: &str) -> Cow<'_, str> {
    match text.len() % 4 {
        0 => Cow::Borrowed(text),
        rem => {
            let mut padded = String::with_capacity(text.len() + 4 - rem);
            padded.push_str(text);
            padded.extend(std::iter::repeat('=').take(4 - rem));
            Cow::Owned(padded)
        }
    }
}

pub fn decode_text(text: &str) -> Result<Vec<u8>, TokenError> {
    Ok(B64.decode(repad(text).as_bytes())?)
}
