use clap::Args;
use serde_json::json;

use crate::cli::utils::{output_success, parse_fields, resolve_cipher};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct EncryptArgs {
    #[arg(short, long = "field", value_name = "NAME=VALUE", help = "Credential field (repeatable)")]
    pub fields: Vec<String>,

    #[arg(long, help = "Key material (defaults to DATAPORT_ENCRYPTION_KEY)")]
    pub key: Option<String>,
}

#[derive(Args)]
pub struct DecryptArgs {
    #[arg(help = "Envelope JSON as stored in the connections table")]
    pub envelope: String,

    #[arg(long, help = "Key material (defaults to DATAPORT_ENCRYPTION_KEY)")]
    pub key: Option<String>,
}

pub fn encrypt(args: EncryptArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let cipher = resolve_cipher(args.key.as_deref())?;
    let bundle = parse_fields(&args.fields)?;
    let envelope = cipher.encrypt(&bundle)?.to_json()?;

    match output_format {
        OutputFormat::Json => output_success(&output_format, "Encrypted credentials", Some(json!({ "envelope": envelope }))),
        OutputFormat::Text => {
            println!("{}", envelope);
            Ok(())
        }
    }
}

pub fn decrypt(args: DecryptArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let cipher = resolve_cipher(args.key.as_deref())?;
    let bundle = cipher.decrypt_str(&args.envelope)?;

    match output_format {
        OutputFormat::Json => output_success(&output_format, "Decrypted credentials", Some(json!({ "credentials": bundle }))),
        OutputFormat::Text => {
            for name in bundle.field_names() {
                println!("{}={}", name, bundle.get(name).unwrap_or_default());
            }
            Ok(())
        }
    }
}
