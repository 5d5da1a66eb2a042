use std::io::{self, Read as _};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use claimtoken::sign::{encode_token, generate_secret};
use claimtoken::types::{current_millis, Token, DEFAULT_VERSION};
use claimtoken::verify::{decode_token, inspect_token};
use claimtoken::Zeroizing;

#[derive(Parser)]
#[command(name = "claimtoken", about = "Compact HMAC-signed claim tokens")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SecretArgs {
    /// Shared secret. Prefer the environment variable over the command line.
    #[arg(long, env = "CLAIMTOKEN_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Read the shared secret from a file (trailing newline trimmed).
    #[arg(long, conflicts_with = "secret")]
    secret_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Build and sign a token, printing its text form.
    Encode {
        #[arg(long, allow_hyphen_values = true)]
        app_id: i32,

        #[arg(long)]
        user_id: String,

        /// Validity window (e.g. "46s", "12h", "30d"). Defaults to 30 days.
        #[arg(long)]
        valid: Option<humantime::Duration>,

        /// Parameter as key=value (repeatable).
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Privilege as name=DURATION (expires that long from now) or
        /// name=@MILLIS (absolute expiry). Repeatable.
        #[arg(long = "privilege", value_parser = parse_key_value)]
        privileges: Vec<(String, String)>,

        /// Format version tag.
        #[arg(long, default_value_t = DEFAULT_VERSION, allow_hyphen_values = true)]
        version: i32,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Verify a token and print its claims as JSON.
    /// Reads the token from --token or stdin.
    Decode {
        #[arg(short, long)]
        token: Option<String>,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Print a token's claims WITHOUT checking the signature.
    Inspect {
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Generate a random shared secret.
    GenerateSecret,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Encode {
            app_id,
            user_id,
            valid,
            params,
            privileges,
            version,
            secret,
        } => cmd_encode(app_id, user_id, valid, params, privileges, version, &secret),
        Command::Decode { token, secret } => cmd_decode(token, &secret),
        Command::Inspect { token } => cmd_inspect(token),
        Command::GenerateSecret => {
            println!("{}", *generate_secret());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn cmd_encode(
    app_id: i32,
    user_id: String,
    valid: Option<humantime::Duration>,
    params: Vec<(String, String)>,
    privileges: Vec<(String, String)>,
    version: i32,
    secret: &SecretArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let secret = read_secret(secret)?;

    let valid_secs = match valid {
        Some(d) => i32::try_from(Duration::from(d).as_secs())
            .map_err(|_| format!("validity {d} does not fit in i32 seconds"))?,
        None => 0,
    };

    let mut token = Token::new(app_id, user_id, valid_secs);
    token.set_version(version);
    for (key, value) in params {
        token.set_parameter(key, value);
    }
    let now = current_millis();
    for (name, expiry) in privileges {
        let expires_at = parse_privilege_expiry(&expiry, now)?;
        token.set_privilege(name, expires_at);
    }

    let text = encode_token(&mut token, secret.as_bytes())?;
    println!("{text}");
    Ok(())
}

fn cmd_decode(
    token_arg: Option<String>,
    secret: &SecretArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let secret = read_secret(secret)?;
    let input = read_token_text(token_arg)?;

    let token = decode_token(&input, secret.as_bytes())
        .map_err(|e| format!("{} ({})", e, e.kind()))?;

    let expires_at = token.expires_at();
    let valid_now = token.is_valid();
    let output = serde_json::json!({
        "claims": token,
        "expires_at": expires_at,
        "valid_now": valid_now,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_inspect(token_arg: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let input = read_token_text(token_arg)?;
    let token = inspect_token(&input)?;

    let signature_hex = token.signature.map(hex::encode);
    let total_length = token.total_length;
    let expires_at = token.expires_at();
    let valid_now = token.is_valid();
    let output = serde_json::json!({
        "verified": false,
        "claims": token,
        "signature_hex": signature_hex,
        "total_length": total_length,
        "expires_at": expires_at,
        "valid_now": valid_now,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Resolve the shared secret from --secret / CLAIMTOKEN_SECRET or --secret-file.
fn read_secret(args: &SecretArgs) -> Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.secret_file {
        let raw = Zeroizing::new(std::fs::read_to_string(path)?);
        return Ok(Zeroizing::new(raw.trim_end_matches(['\r', '\n']).to_string()));
    }
    match &args.secret {
        Some(s) => Ok(Zeroizing::new(s.clone())),
        None => Err("no secret: pass --secret, --secret-file, or set CLAIMTOKEN_SECRET".into()),
    }
}

/// Read token text from a CLI argument or stdin.
fn read_token_text(token_arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match token_arg {
        Some(s) => Ok(s.trim().to_string()),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf.trim().to_string())
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

/// `@1700000000000` is an absolute expiry in ms; anything else is a duration from `now`.
fn parse_privilege_expiry(s: &str, now: i64) -> Result<i64, Box<dyn std::error::Error>> {
    if let Some(millis) = s.strip_prefix('@') {
        return Ok(millis.parse::<i64>()?);
    }
    let duration: Duration = s
        .parse::<humantime::Duration>()
        .map_err(|e| format!("invalid privilege expiry '{s}': {e}"))?
        .into();
    let millis = i64::try_from(duration.as_millis()).map_err(|_| "privilege expiry overflow")?;
    now.checked_add(millis)
        .ok_or_else(|| "privilege expiry overflow".into())
}
