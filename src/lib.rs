//! Claimtoken: compact HMAC-SHA1 signed claim tokens.
//!
//! A token carries an application id, a user id, string parameters and
//! expiring privileges in a fixed big-endian layout, signed with a shared
//! secret and transported as unpadded URL-safe base64.
//!
//! ```
//! use claimtoken::Token;
//!
//! let mut token = Token::new(12345, "13212", 46);
//! token.set_parameter("pkey1", "pval1");
//! token.set_privilege("pri1", 1);
//! let text = token.encode(b"appkey1234").unwrap();
//!
//! let decoded = Token::decode(&text, b"appkey1234").unwrap();
//! assert_eq!(decoded.user_id, "13212");
//! assert!(decoded.is_valid());
//! ```

pub mod error;
pub mod serialize;
pub mod sign;
pub mod text;
pub mod types;
pub mod verify;
pub mod wire;

pub use error::TokenError;
pub use sign::{encode_token, sign_token, sign_token_at};
pub use types::Token;
pub use verify::{decode_token, inspect_token, verify_token_bytes};
pub use zeroize::Zeroizing;
