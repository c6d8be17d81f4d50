pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dataport")]
#[command(about = "Dataport CLI - credential envelopes, connection probes and dev tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Encryption key management")]
    Key {
        #[command(subcommand)]
        cmd: commands::key::KeyCommands,
    },

    #[command(about = "Encrypt a credential bundle into a storable envelope")]
    Encrypt(commands::envelope::EncryptArgs),

    #[command(about = "Decrypt a stored envelope back into its credential bundle")]
    Decrypt(commands::envelope::DecryptArgs),

    #[command(about = "Probe a data source with the given credentials")]
    Test(commands::test::TestArgs),

    #[command(about = "List supported data sources and their required fields")]
    Sources,

    #[command(about = "Issue a session token for local development")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Key { cmd } => commands::key::handle(cmd, output_format),
        Commands::Encrypt(args) => commands::envelope::encrypt(args, output_format),
        Commands::Decrypt(args) => commands::envelope::decrypt(args, output_format),
        Commands::Test(args) => commands::test::handle(args, output_format).await,
        Commands::Sources => commands::sources::handle(output_format),
        Commands::Token(args) => commands::token::handle(args, output_format),
    }
}
