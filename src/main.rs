// Reply Assistant - Main Entry Point
//
// Command-line host for the reply core:
// - Reply generation (argument or stdin)
// - Consent and credential management
// - Tone listing, usage stats and connectivity check
// - JSON message handling for extension bridges
//
// State lives in a JSON store file; the request ledger is written back after
// every generation so rate limits hold across invocations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reply_assistant::clock::SystemClock;
use reply_assistant::config::Config;
use reply_assistant::gateway::CompletionGateway;
use reply_assistant::logging::LogLevel;
use reply_assistant::service::{EmailReplyService, Request, ReplyOutcome};
use reply_assistant::storage::FileStore;
use reply_assistant::{metrics, Failure, Tone};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Reply Assistant: AI-drafted email replies with consent and rate limits
#[derive(Parser, Debug)]
#[command(name = "reply-assistant")]
#[command(version)]
#[command(about = "Draft email replies with a completion API", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a reply to an email
    Generate {
        /// Reply tone (professional, friendly, formal, casual)
        #[arg(long, default_value = "professional")]
        tone: String,

        /// Email text; read from stdin when omitted
        text: Option<String>,
    },
    /// Manage consent to send email text to the provider
    Consent {
        #[command(subcommand)]
        action: ConsentAction,
    },
    /// Manage the provider API key
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },
    /// List the tones offered in the configured tone mode
    Tones,
    /// Show rate-limit usage
    Usage,
    /// Check the API key against the provider
    TestConnection,
    /// Read one JSON request from stdin and write the JSON response
    Handle,
}

#[derive(Subcommand, Debug)]
enum ConsentAction {
    /// Grant consent
    Grant,
    /// Revoke consent and delete the stored API key
    Revoke,
    /// Show consent status
    Status,
}

#[derive(Subcommand, Debug)]
enum CredentialAction {
    /// Store an API key
    Set {
        /// The API key
        key: String,
    },
    /// Delete the stored API key
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let mut logging = config.logging.clone();
    if args.verbose {
        logging.level = LogLevel::Debug;
    }
    logging.init()?;
    metrics::init().context("Failed to register metrics")?;

    let store = Arc::new(FileStore::new(&config.storage.path));
    let backend = Arc::new(CompletionGateway::new(config.api.clone()));
    let service = EmailReplyService::new(
        config.service_config(),
        store,
        Arc::new(SystemClock),
        backend,
    );
    service.load_ledger().await?;

    match args.command {
        Commands::Generate { tone, text } => {
            let input = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let result = match tone.parse::<Tone>() {
                Ok(tone) => service.generate(&input, tone).await,
                Err(err) => Err(err),
            };
            service.save_ledger().await?;

            match result {
                Ok(reply) => {
                    println!("{}", reply);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    eprintln!("{}", serde_json::to_string(&ReplyOutcome::failure(&err))?);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Consent { action } => {
            match action {
                ConsentAction::Grant => {
                    let info = service.grant_consent().await?;
                    print_json(&info)?;
                }
                ConsentAction::Revoke => {
                    service.revoke_consent().await?;
                    println!("Consent revoked; stored API key deleted");
                }
                ConsentAction::Status => print_json(&service.consent_info().await?)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Credential { action } => {
            match action {
                CredentialAction::Set { key } => {
                    service.save_credential(&key).await?;
                    println!("API key saved");
                }
                CredentialAction::Clear => {
                    service.clear_credential().await?;
                    println!("API key cleared");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tones => {
            for tone in service.reply_config().tone_mode.tones() {
                println!("{}", tone);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Usage => {
            print_json(&service.usage_stats().await)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::TestConnection => match service.test_connection().await {
            Ok(models) => {
                println!("Connection OK: {} models available", models);
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => {
                eprintln!("{}", serde_json::to_string(&Failure::from(err))?);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Handle => {
            let raw = read_stdin()?;
            let request: Request =
                serde_json::from_str(&raw).context("Failed to parse request JSON from stdin")?;
            let response = service.handle(request).await;
            service.save_ledger().await?;
            print_json(&response)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    Ok(input)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
