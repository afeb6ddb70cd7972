//! chatlift CLI - extract chat transcripts from saved chat pages.
//!
//! Usage: chatlift [OPTIONS] <COMMAND>
//!
//! Reads a saved page (file or stdin), recovers the conversation, and
//! prints it as JSON or posts it to the configured memory API.

use chatlift::{extract_conversation, settings, ExtractionOutcome, MemoryClient};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "chatlift")]
#[command(version, about = "Recover AI chat transcripts from saved chat web pages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a conversation and print it as JSON
    Extract {
        /// Saved page HTML (reads stdin when omitted)
        file: Option<PathBuf>,
        /// URL the page was captured from (platform detection)
        #[arg(long)]
        url: String,
        /// On failure, print the diagnostic snapshot to stderr
        #[arg(long)]
        diagnostics: bool,
    },
    /// Extract a conversation and save it to the memory API
    Save {
        /// Saved page HTML (reads stdin when omitted)
        file: Option<PathBuf>,
        /// URL the page was captured from (platform detection)
        #[arg(long)]
        url: String,
        /// Override the configured memory API base URL
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Configuration settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current settings
    Show,
    /// Set the memory API base URL
    SetApiUrl { url: String },
    /// Discard the stored user id (a fresh one is generated on next save)
    ResetUserId,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_dir = dirs::config_dir()
        .map(|p| p.join("chatlift"))
        .unwrap_or_else(|| PathBuf::from(".chatlift"));
    settings::init(config_dir);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Extract { file, url, diagnostics } => {
            cmd_extract(file, &url, cli.pretty, diagnostics)
        }
        Commands::Save { file, url, api_url } => cmd_save(file, &url, api_url),
        Commands::Config { cmd } => cmd_config(cmd, cli.pretty),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            generate(shell, &mut command, "chatlift", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_extract(
    file: Option<PathBuf>,
    url: &str,
    pretty: bool,
    with_diagnostics: bool,
) -> Result<(), String> {
    let html = read_input(file)?;

    match extract_conversation(&html, url) {
        ExtractionOutcome::Success { record, partial } => {
            if partial {
                eprintln!("Warning: extraction looks partial — the page holds much more text than the recovered transcript");
            }
            println!("{}", to_json(&record, pretty)?);
            Ok(())
        }
        ExtractionOutcome::Failure { error, diagnostics } => {
            if with_diagnostics {
                eprintln!("{}", to_json(&diagnostics, pretty)?);
            }
            Err(error.to_string())
        }
    }
}

fn cmd_save(file: Option<PathBuf>, url: &str, api_url: Option<String>) -> Result<(), String> {
    let html = read_input(file)?;

    let record = match extract_conversation(&html, url) {
        ExtractionOutcome::Success { record, partial } => {
            if partial {
                eprintln!("Warning: extraction looks partial — saving what was recovered");
            }
            record
        }
        ExtractionOutcome::Failure { error, .. } => return Err(error.to_string()),
    };

    let base_url = api_url.unwrap_or_else(|| settings::get().api_url);
    let user_id = settings::ensure_user_id()?;

    let client = MemoryClient::new(&base_url);
    client.save_conversation(&user_id, &record)?;

    println!(
        "Saved {} messages from {} to {}",
        record.messages.len(),
        record.platform,
        base_url
    );
    Ok(())
}

fn cmd_config(cmd: ConfigCommands, pretty: bool) -> Result<(), String> {
    match cmd {
        ConfigCommands::Show => {
            let settings = settings::get();
            println!("{}", to_json(&settings, pretty)?);
            Ok(())
        }
        ConfigCommands::SetApiUrl { url } => {
            settings::update(|s| s.api_url = url.clone())?;
            println!("API URL set to {}", url);
            Ok(())
        }
        ConfigCommands::ResetUserId => {
            settings::update(|s| s.user_id = None)?;
            println!("Stored user id cleared");
            Ok(())
        }
    }
}

/// Read the page HTML from a file, or stdin when no file was given.
fn read_input(file: Option<PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e)),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(buffer)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, String> {
    if pretty {
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())
    } else {
        serde_json::to_string(value).map_err(|e| e.to_string())
    }
}
