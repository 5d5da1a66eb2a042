use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::TokenError;

/// Format version stamped on freshly constructed tokens.
pub const DEFAULT_VERSION: i32 = -10_001_001;

/// Validity window applied when the caller passes a non-positive value (30 days).
pub const DEFAULT_VALID_SECS: i32 = 30 * 24 * 3600;

/// Constant: HMAC-SHA1 signature length.
pub const SIGNATURE_LEN: usize = 20;

/// Constant: byte offset of the `total_length` field.
pub const TOTAL_LENGTH_OFFSET: usize = 4;

/// Constant: largest value a u16 length or count prefix can carry.
pub const MAX_PREFIXED_LEN: usize = u16::MAX as usize;

/// A claim token: identity, attributes and privileges, plus the signature
/// trailer once it has been encoded or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub version: i32,
    /// Length of the signed payload (body + signature). Recomputed on encode.
    pub total_length: i32,
    pub app_id: i32,
    pub user_id: String,
    pub parameters: BTreeMap<String, String>,
    /// Privilege name to expiry, milliseconds since epoch.
    pub privileges: BTreeMap<String, i64>,
    /// Milliseconds since epoch. Restamped on every encode.
    pub issued_at: i64,
    pub valid_secs: i32,
    #[serde(skip)]
    pub signature: Option<[u8; SIGNATURE_LEN]>,
}

impl Token {
    /// Build an unsigned token. `valid_secs <= 0` selects [`DEFAULT_VALID_SECS`].
    pub fn new(app_id: i32, user_id: impl Into<String>, valid_secs: i32) -> Token {
        Token {
            version: DEFAULT_VERSION,
            total_length: 0,
            app_id,
            user_id: user_id.into(),
            parameters: BTreeMap::new(),
            privileges: BTreeMap::new(),
            issued_at: current_millis(),
            valid_secs: if valid_secs <= 0 {
                DEFAULT_VALID_SECS
            } else {
                valid_secs
            },
            signature: None,
        }
    }

    pub fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    pub fn set_valid_secs(&mut self, secs: i32) {
        self.valid_secs = secs;
    }

    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn set_privilege(&mut self, key: impl Into<String>, expires_at: i64) {
        self.privileges.insert(key.into(), expires_at);
    }

    /// End of the validity window in milliseconds since epoch.
    pub fn expires_at(&self) -> i64 {
        self.issued_at
            .saturating_add(i64::from(self.valid_secs).saturating_mul(1000))
    }

    /// True while `now_ms` is strictly before [`Token::expires_at`].
    ///
    /// This is a clock comparison only. It says nothing about the signature.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at()
    }

    /// [`Token::is_valid_at`] against the wall clock. Not cached.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(current_millis())
    }

    /// True if the named privilege is present and has not yet expired at `now_ms`.
    pub fn privilege_active_at(&self, name: &str, now_ms: i64) -> bool {
        self.privileges
            .get(name)
            .is_some_and(|&expires_at| now_ms < expires_at)
    }

    /// Sign with `secret`, stamping `issued_at` with the current time, and
    /// return the text form.
    pub fn encode(&mut self, secret: &[u8]) -> Result<String, TokenError> {
        crate::sign::encode_token(self, secret)
    }

    /// Parse and verify a text token. See [`crate::verify::decode_token`].
    pub fn decode(text: &str, secret: &[u8]) -> Result<Token, TokenError> {
        crate::verify::decode_token(text, secret)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
/// A clock set before the epoch reads as 0.
pub fn current_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
