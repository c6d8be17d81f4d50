use serde_json::{json, Value};

use crate::cipher::{CipherError, CredentialBundle, CredentialCipher};
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Parses repeated `name=value` arguments into a bundle
pub fn parse_fields(fields: &[String]) -> anyhow::Result<CredentialBundle> {
    fields
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
            _ => Err(anyhow::anyhow!("Expected name=value, got '{}'", pair)),
        })
        .collect()
}

/// Cipher from `--key` when given, otherwise from DATAPORT_ENCRYPTION_KEY
pub fn resolve_cipher(key: Option<&str>) -> Result<CredentialCipher, CipherError> {
    match key {
        Some(material) => CredentialCipher::from_key_material(material),
        None => CredentialCipher::from_config(&crate::config::config().security),
    }
}
