//! Binary layout for claim tokens.
//!
//! All integers big-endian. Field order:
//!   i32    version
//!   i32    total_length       body + signature, patched after the body is written
//!   i32    app_id
//!   u16+N  user_id
//!   u16    parameter count, then per entry: u16+N key, u16+N value
//!   u16    privilege count, then per entry: u16+N key, i64 expiry (ms)
//!   i64    issued_at (ms)
//!   i32    valid_secs
//!   [20]   signature          HMAC-SHA1 over every preceding byte

use std::collections::BTreeMap;

use crate::error::TokenError;
use crate::types::*;
use crate::wire;

/// Serialize everything up to the signature, with `total_length` already
/// patched in. Returns the body and the patched length.
pub fn serialize_unsigned(token: &Token) -> Result<(Vec<u8>, i32), TokenError> {
    let mut buf = Vec::with_capacity(64);

    wire::encode_i32(token.version, &mut buf);
    wire::encode_i32(0, &mut buf);
    wire::encode_i32(token.app_id, &mut buf);
    wire::encode_bytes("user_id", token.user_id.as_bytes(), &mut buf)?;

    wire::encode_count("parameters", token.parameters.len(), &mut buf)?;
    for (key, value) in &token.parameters {
        wire::encode_bytes("parameter key", key.as_bytes(), &mut buf)?;
        wire::encode_bytes("parameter value", value.as_bytes(), &mut buf)?;
    }

    wire::encode_count("privileges", token.privileges.len(), &mut buf)?;
    for (key, expires_at) in &token.privileges {
        wire::encode_bytes("privilege key", key.as_bytes(), &mut buf)?;
        wire::encode_i64(*expires_at, &mut buf);
    }

    wire::encode_i64(token.issued_at, &mut buf);
    wire::encode_i32(token.valid_secs, &mut buf);

    let signed_len = buf.len() + SIGNATURE_LEN;
    let total_length =
        i32::try_from(signed_len).map_err(|_| TokenError::TokenTooLarge(signed_len))?;
    wire::patch_i32(&mut buf, TOTAL_LENGTH_OFFSET, total_length)?;

    Ok((buf, total_length))
}

/// A structurally valid token whose signature has not been checked yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    pub token: Token,
    /// The bytes the signature covers.
    pub signed_bytes: &'a [u8],
    pub signature: [u8; SIGNATURE_LEN],
}

/// Parse a signed token. Checks structure and both length invariants but not
/// the signature.
pub fn deserialize_token(data: &[u8]) -> Result<ParsedToken<'_>, TokenError> {
    let mut pos = 0;

    let version = wire::read_i32(data, &mut pos, "version")?;
    let total_length = wire::read_i32(data, &mut pos, "total_length")?;
    if usize::try_from(total_length).ok() != Some(data.len()) {
        return Err(TokenError::LengthMismatch {
            declared: i64::from(total_length),
            actual: data.len(),
        });
    }

    let app_id = wire::read_i32(data, &mut pos, "app_id")?;
    let user_id = wire::read_string(data, &mut pos, "user_id")?;

    let parameter_count = wire::read_u16(data, &mut pos, "parameter count")?;
    let mut parameters = BTreeMap::new();
    for _ in 0..parameter_count {
        let key = wire::read_string(data, &mut pos, "parameter key")?;
        let value = wire::read_string(data, &mut pos, "parameter value")?;
        parameters.insert(key, value);
    }

    let privilege_count = wire::read_u16(data, &mut pos, "privilege count")?;
    let mut privileges = BTreeMap::new();
    for _ in 0..privilege_count {
        let key = wire::read_string(data, &mut pos, "privilege key")?;
        let expires_at = wire::read_i64(data, &mut pos, "privilege expiry")?;
        privileges.insert(key, expires_at);
    }

    let issued_at = wire::read_i64(data, &mut pos, "issued_at")?;
    let valid_secs = wire::read_i32(data, &mut pos, "valid_secs")?;

    let signed_end = pos;
    let signature: [u8; SIGNATURE_LEN] = wire::read_array(data, &mut pos, "signature")?;

    // Declared length matched the input, but the fields ended early.
    if pos != data.len() {
        return Err(TokenError::LengthMismatch {
            declared: i64::from(total_length),
            actual: pos,
        });
    }

    let signed_bytes = data.get(..signed_end).ok_or(TokenError::Truncated {
        field: "signature",
        needed: SIGNATURE_LEN,
        remaining: 0,
    })?;

    Ok(ParsedToken {
        token: Token {
            version,
            total_length,
            app_id,
            user_id,
            parameters,
            privileges,
            issued_at,
            valid_secs,
            signature: Some(signature),
        },
        signed_bytes,
        signature,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn sample() -> Token {
        let mut token = Token::new(12345, "13212", 46);
        token.set_parameter("pkey1", "pval1");
        token.set_parameter("pkey2", "pval2");
        token.set_privilege("pri1", 1);
        token.set_privilege("pri2", 2);
        token.issued_at = 1_700_000_000_000;
        token
    }

    /// Append a dummy signature so the body parses as a full token.
    fn with_dummy_signature(mut body: Vec<u8>) -> Vec<u8> {
        body.extend_from_slice(&[0xAB; SIGNATURE_LEN]);
        body
    }

    #[test]
    fn test_header_layout() {
        let (body, total_length) = serialize_unsigned(&sample()).unwrap();

        assert_eq!(&body[0..4], &DEFAULT_VERSION.to_be_bytes());
        assert_eq!(&body[4..8], &total_length.to_be_bytes());
        assert_eq!(&body[8..12], &12345i32.to_be_bytes());
        assert_eq!(&body[12..14], &[0x00, 0x05]);
        assert_eq!(&body[14..19], b"13212");
        assert_eq!(total_length as usize, body.len() + SIGNATURE_LEN);
    }

    #[test]
    fn test_trailer_layout() {
        let (body, _) = serialize_unsigned(&sample()).unwrap();
        let n = body.len();
        assert_eq!(&body[n - 12..n - 4], &1_700_000_000_000i64.to_be_bytes());
        assert_eq!(&body[n - 4..], &46i32.to_be_bytes());
    }

    #[test]
    fn test_scenario_body_length() {
        // 12 header + 7 user_id + 2 + 2*(7+7) + 2 + 2*(6+8) + 8 + 4
        let (body, total_length) = serialize_unsigned(&sample()).unwrap();
        assert_eq!(body.len(), 91);
        assert_eq!(total_length, 111);
    }

    #[test]
    fn test_deserialize_reconstructs_claims() {
        let token = sample();
        let (body, total_length) = serialize_unsigned(&token).unwrap();
        let signed = with_dummy_signature(body.clone());

        let parsed = deserialize_token(&signed).unwrap();
        assert_eq!(parsed.signed_bytes, body.as_slice());
        assert_eq!(parsed.signature, [0xAB; SIGNATURE_LEN]);
        assert_eq!(parsed.token.total_length, total_length);
        assert_eq!(parsed.token.app_id, token.app_id);
        assert_eq!(parsed.token.user_id, token.user_id);
        assert_eq!(parsed.token.parameters, token.parameters);
        assert_eq!(parsed.token.privileges, token.privileges);
        assert_eq!(parsed.token.issued_at, token.issued_at);
        assert_eq!(parsed.token.valid_secs, token.valid_secs);
    }

    #[test]
    fn test_deserialize_accepts_any_entry_order() {
        // Hand-built body with parameters in descending key order.
        let mut buf = Vec::new();
        wire::encode_i32(7, &mut buf);
        wire::encode_i32(0, &mut buf);
        wire::encode_i32(1, &mut buf);
        wire::encode_bytes("user_id", b"u", &mut buf).unwrap();
        wire::encode_count("parameters", 2, &mut buf).unwrap();
        for (k, v) in [("b", "2"), ("a", "1")] {
            wire::encode_bytes("k", k.as_bytes(), &mut buf).unwrap();
            wire::encode_bytes("v", v.as_bytes(), &mut buf).unwrap();
        }
        wire::encode_count("privileges", 0, &mut buf).unwrap();
        wire::encode_i64(0, &mut buf);
        wire::encode_i32(1, &mut buf);
        let total = (buf.len() + SIGNATURE_LEN) as i32;
        wire::patch_i32(&mut buf, TOTAL_LENGTH_OFFSET, total).unwrap();

        let signed = with_dummy_signature(buf);
        let parsed = deserialize_token(&signed).unwrap();
        assert_eq!(parsed.token.version, 7);
        assert_eq!(parsed.token.parameters["a"], "1");
        assert_eq!(parsed.token.parameters["b"], "2");
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let mut buf = Vec::new();
        wire::encode_i32(0, &mut buf);
        wire::encode_i32(0, &mut buf);
        wire::encode_i32(1, &mut buf);
        wire::encode_bytes("user_id", b"u", &mut buf).unwrap();
        wire::encode_count("parameters", 0, &mut buf).unwrap();
        wire::encode_count("privileges", 2, &mut buf).unwrap();
        for expiry in [10i64, 20] {
            wire::encode_bytes("k", b"p", &mut buf).unwrap();
            wire::encode_i64(expiry, &mut buf);
        }
        wire::encode_i64(0, &mut buf);
        wire::encode_i32(1, &mut buf);
        let total = (buf.len() + SIGNATURE_LEN) as i32;
        wire::patch_i32(&mut buf, TOTAL_LENGTH_OFFSET, total).unwrap();

        let signed = with_dummy_signature(buf);
        let parsed = deserialize_token(&signed).unwrap();
        assert_eq!(parsed.token.privileges.len(), 1);
        assert_eq!(parsed.token.privileges["p"], 20);
    }

    #[test]
    fn test_declared_length_must_match_input() {
        let (body, _) = serialize_unsigned(&sample()).unwrap();
        let mut signed = with_dummy_signature(body);

        signed.push(0);
        assert!(matches!(
            deserialize_token(&signed),
            Err(TokenError::LengthMismatch { declared: 111, actual: 112 })
        ));

        signed.truncate(100);
        assert!(matches!(
            deserialize_token(&signed),
            Err(TokenError::LengthMismatch { declared: 111, actual: 100 })
        ));
    }

    #[test]
    fn test_negative_declared_length() {
        let (mut body, _) = serialize_unsigned(&sample()).unwrap();
        wire::patch_i32(&mut body, TOTAL_LENGTH_OFFSET, -1).unwrap();
        let signed = with_dummy_signature(body);
        assert!(matches!(
            deserialize_token(&signed),
            Err(TokenError::LengthMismatch { declared: -1, .. })
        ));
    }

    #[test]
    fn test_inner_prefix_overrun_is_truncated() {
        let (mut body, _) = serialize_unsigned(&sample()).unwrap();
        // user_id claims 0xFFFF bytes; the declared total still matches the input.
        body[12] = 0xff;
        body[13] = 0xff;
        let signed = with_dummy_signature(body);
        assert!(matches!(
            deserialize_token(&signed),
            Err(TokenError::Truncated { field: "user_id", .. })
        ));
    }

    #[test]
    fn test_fields_ending_early_is_length_mismatch() {
        let (mut body, _) = serialize_unsigned(&sample()).unwrap();
        // Claim one privilege instead of two: parsing stops 14 bytes short.
        let privilege_count_at = 12 + 7 + 2 + 28;
        assert_eq!(&body[privilege_count_at..privilege_count_at + 2], &[0, 2]);
        body[privilege_count_at + 1] = 1;
        let signed = with_dummy_signature(body);
        assert!(matches!(
            deserialize_token(&signed),
            Err(TokenError::LengthMismatch { declared: 111, actual: 97 })
        ));
    }

    #[test]
    fn test_header_only_inputs() {
        assert!(matches!(
            deserialize_token(&[]),
            Err(TokenError::Truncated { field: "version", .. })
        ));
        assert!(matches!(
            deserialize_token(&[0, 0, 0, 1, 0, 0]),
            Err(TokenError::Truncated { field: "total_length", .. })
        ));
        // Declares 8 bytes and has 8, then runs out at app_id.
        assert!(matches!(
            deserialize_token(&[0, 0, 0, 1, 0, 0, 0, 8]),
            Err(TokenError::Truncated { field: "app_id", .. })
        ));
    }

    #[test]
    fn test_user_id_too_long() {
        let token = Token::new(1, "x".repeat(MAX_PREFIXED_LEN + 1), 10);
        assert!(matches!(
            serialize_unsigned(&token),
            Err(TokenError::FieldTooLong { field: "user_id", .. })
        ));
    }

    #[test]
    fn test_parameter_value_too_long() {
        let mut token = Token::new(1, "u", 10);
        token.set_parameter("k", "v".repeat(MAX_PREFIXED_LEN + 1));
        assert!(matches!(
            serialize_unsigned(&token),
            Err(TokenError::FieldTooLong { field: "parameter value", .. })
        ));
    }

    #[test]
    fn test_too_many_privileges() {
        let mut token = Token::new(1, "u", 10);
        for i in 0..=MAX_PREFIXED_LEN {
            token.set_privilege(i.to_string(), 0);
        }
        assert!(matches!(
            serialize_unsigned(&token),
            Err(TokenError::TooManyEntries { field: "privileges", count }) if count == MAX_PREFIXED_LEN + 1
        ));
    }
}
