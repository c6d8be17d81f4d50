use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::JwtVerifier;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id to put in the token subject (random when omitted)")]
    pub user: Option<Uuid>,

    #[arg(long, default_value_t = 24, help = "Lifetime in hours")]
    pub hours: i64,
}

fn token_lifetime(hours: i64) -> anyhow::Result<chrono::Duration> {
    if hours <= 0 {
        anyhow::bail!("--hours must be positive, got {}", hours);
    }
    chrono::Duration::try_hours(hours).ok_or_else(|| anyhow::anyhow!("--hours {} is out of range", hours))
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let verifier = JwtVerifier::from_config(&crate::config::config().security)?;
    let user_id = args.user.unwrap_or_else(Uuid::new_v4);
    let ttl = token_lifetime(args.hours)?;
    let token = verifier.issue(user_id, ttl)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Issued session token",
            Some(json!({ "user_id": user_id, "token": token, "expires_in_hours": args.hours })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
