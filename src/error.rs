use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("text decode failed: {0}")]
    TextDecode(#[from] base64::DecodeError),

    #[error("truncated {field}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("length mismatch: token declares {declared} bytes, got {actual}")]
    LengthMismatch { declared: i64, actual: usize },

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("{field} too long: {len} bytes (max 65535)")]
    FieldTooLong { field: &'static str, len: usize },

    #[error("too many {field}: {count} entries (max 65535)")]
    TooManyEntries { field: &'static str, count: usize },

    #[error("token too large: {0} bytes exceeds i32::MAX")]
    TokenTooLarge(usize),

    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

impl TokenError {
    /// Short, stable name of the error kind, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::TextDecode(_) => "text_decode",
            TokenError::Truncated { .. } => "truncated",
            TokenError::LengthMismatch { .. } => "length_mismatch",
            TokenError::SignatureMismatch => "signature_mismatch",
            TokenError::FieldTooLong { .. } => "field_too_long",
            TokenError::TooManyEntries { .. } => "too_many_entries",
            TokenError::TokenTooLarge(_) => "token_too_large",
            TokenError::InvalidUtf8 { .. } => "invalid_utf8",
            TokenError::SigningFailed(_) => "signing_failed",
        }
    }
}
