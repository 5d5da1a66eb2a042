#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

//! Issue a token, verify it, and show what a wrong key or a tampered token
//! looks like to the caller.
//!
//! Usage: cargo run --example basic_usage

use claimtoken::sign::generate_secret;
use claimtoken::types::current_millis;
use claimtoken::{decode_token, inspect_token, Token, TokenError};

fn main() {
    let secret = generate_secret();

    let mut token = Token::new(12345, "user:alice", 3600);
    token.set_parameter("region", "eu-west");
    token.set_privilege("upload", current_millis() + 10 * 60 * 1000);
    token.set_privilege("admin", 0);

    let text = token.encode(secret.as_bytes()).expect("encode");
    println!("token ({} chars): {text}", text.len());
    println!("wire length: {} bytes", token.total_length);

    let decoded = decode_token(&text, secret.as_bytes()).expect("decode");
    let now = current_millis();
    println!("user_id:  {}", decoded.user_id);
    println!("valid:    {}", decoded.is_valid());
    println!("expires:  {}", decoded.expires_at());
    for name in decoded.privileges.keys() {
        println!(
            "privilege {name:<8} active: {}",
            decoded.privilege_active_at(name, now)
        );
    }

    match decode_token(&text, b"not-the-secret") {
        Err(TokenError::SignatureMismatch) => println!("wrong key:  rejected"),
        other => println!("wrong key:  unexpected {other:?}"),
    }

    let mut tampered: Vec<char> = text.chars().collect();
    let i = tampered.len() / 2;
    tampered[i] = if tampered[i] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();
    match decode_token(&tampered, secret.as_bytes()) {
        Err(e) => println!("tampered:   rejected ({})", e.kind()),
        Ok(_) => println!("tampered:   accepted?!"),
    }

    let unverified = inspect_token(&text).expect("inspect");
    println!("inspect (no key): app_id={}", unverified.app_id);
}
