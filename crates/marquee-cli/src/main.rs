//! marquee CLI - operator tooling
//!
//! Usage:
//!   marquee keygen
//!   marquee hash-password <plaintext>
//!   marquee issue-token --user-id <id> --email <email> --role <role>
//!   marquee inspect-token <token>
//!
//! Commands that touch tokens or hashes load the same configuration as the
//! server (`MARQUEE_CONFIG` file, then environment).

use anyhow::{anyhow, Context};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use marquee_api::auth::{generate_secret_key, Identity, PasswordHasher, TokenCodec};
use marquee_core::{AppConfig, Role, UserId};

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "marquee operator CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh base64url signing key for JWT_SECRET_KEY
    Keygen,
    /// Hash a password with the configured Argon2 parameters
    HashPassword {
        /// Password to hash
        plaintext: String,
    },
    /// Issue a bearer token without a login
    IssueToken {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        email: String,
        /// READER or EDITOR
        #[arg(long, default_value = "READER")]
        role: String,
    },
    /// Verify a token and print its claims
    InspectToken {
        token: String,
    },
}

fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().context("Failed to load configuration")
}

fn token_codec() -> anyhow::Result<TokenCodec> {
    let config = load_config()?;
    TokenCodec::new(&config.jwt).context("JWT_SECRET_KEY is missing or invalid")
}

fn format_timestamp(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// Accepts `EDITOR`, `editor` or `ROLE_EDITOR`
fn parse_role(role: &str) -> anyhow::Result<Role> {
    Role::parse(role).ok_or_else(|| anyhow!("Unknown role: {role}"))
}

fn issue_token(
    codec: &TokenCodec,
    user_id: UserId,
    email: &str,
    role: &str,
) -> anyhow::Result<String> {
    let role = parse_role(role)?;
    let token = codec.issue(&Identity::new(user_id, email, role))?;
    tracing::info!(user_id, role = %role, "Issued token");
    Ok(token)
}

/// Verify a token and render its claims for the terminal
fn inspect_token(codec: &TokenCodec, token: &str) -> anyhow::Result<String> {
    let claims = codec.decode(token).map_err(|e| anyhow!("Token rejected: {e}"))?;
    let identity = claims.to_identity()?;

    let roles = identity
        .granted_roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "{}\nissued:  {}\nexpires: {}\nroles:   {}",
        serde_json::to_string_pretty(&claims)?,
        format_timestamp(claims.iat),
        format_timestamp(claims.exp),
        roles
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen => {
            println!("{}", generate_secret_key());
        }
        Commands::HashPassword { plaintext } => {
            let config = load_config()?;
            let hasher = PasswordHasher::new(&config.password)?;
            println!("{}", hasher.hash(&plaintext)?);
        }
        Commands::IssueToken {
            user_id,
            email,
            role,
        } => {
            let codec = token_codec()?;
            println!("{}", issue_token(&codec, user_id, &email, &role)?);
        }
        Commands::InspectToken { token } => {
            let codec = token_codec()?;
            println!("{}", inspect_token(&codec, &token)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::TokenSettings;

    fn codec(key: u8) -> TokenCodec {
        TokenCodec::from_secret(&[key; 32], TokenSettings::default())
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("editor").unwrap(), Role::Editor);
        assert_eq!(parse_role("ROLE_EDITOR").unwrap(), Role::Editor);
        assert_eq!(parse_role("READER").unwrap(), Role::Reader);

        let err = parse_role("admin").unwrap_err();
        assert_eq!(err.to_string(), "Unknown role: admin");
    }

    #[test]
    fn test_issued_token_inspects_with_expanded_roles() {
        let codec = codec(9);
        let token = issue_token(&codec, 7, "ops@example.com", "editor").unwrap();

        let identity = codec.verify(&token).unwrap();
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.email, "ops@example.com");
        assert!(identity.has_role(Role::Editor));

        let report = inspect_token(&codec, &token).unwrap();
        assert!(report.contains("\"sub\": \"7\""));
        assert!(report.contains("\"iss\": \"self\""));
        assert!(report.contains("roles:   READER, EDITOR"));
    }

    #[test]
    fn test_issue_rejects_unknown_role() {
        assert!(issue_token(&codec(9), 1, "ops@example.com", "owner").is_err());
    }

    #[test]
    fn test_inspect_rejects_bad_tokens() {
        let token = issue_token(&codec(9), 1, "ops@example.com", "READER").unwrap();

        let err = inspect_token(&codec(10), &token).unwrap_err();
        assert!(err.to_string().starts_with("Token rejected"));
        assert!(inspect_token(&codec(9), "not-a-token").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
    }
}
