use serde_json::json;

use crate::cli::OutputFormat;
use crate::types::SourceType;

pub fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let sources: Vec<_> = SourceType::ALL
                .iter()
                .map(|s| {
                    json!({
                        "type": s.as_str(),
                        "name": s.display_name(),
                        "description": s.description(),
                        "required_fields": s.required_fields(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "sources": sources }))?);
        }
        OutputFormat::Text => {
            for source in SourceType::ALL {
                println!("{:<14} {}", source.as_str(), source.display_name());
                println!("{:<14} {}", "", source.description());
                println!("{:<14} requires: {}", "", source.required_fields().join(", "));
            }
        }
    }
    Ok(())
}
