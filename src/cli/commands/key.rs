use clap::Subcommand;
use serde_json::json;

use crate::cipher::CredentialCipher;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum KeyCommands {
    #[command(about = "Generate a random base64 encryption key")]
    Generate,
}

pub fn handle(cmd: KeyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        KeyCommands::Generate => {
            let key = CredentialCipher::generate_key();
            match output_format {
                OutputFormat::Json => output_success(&output_format, "Generated encryption key", Some(json!({ "key": key }))),
                OutputFormat::Text => {
                    println!("DATAPORT_ENCRYPTION_KEY={}", key);
                    Ok(())
                }
            }
        }
    }
}
