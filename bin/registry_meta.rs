//! `registry-meta` is the primary CLI binary.

use clap::Parser;
use colored::Colorize;
use registry_meta::handlers;
use registry_meta::{Cli, Command, EngineConfig, RegistryError, RegistryResult};
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

async fn run() -> RegistryResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Canonicalize { file } => handlers::canonicalize_file(&file).await,

        Command::Validate {
            file,
            owner,
            offline,
            strict,
            json,
        } => {
            let config = EngineConfig::load(cli.config.as_deref())?;
            handlers::validate_file(&config, &file, owner, offline, strict, json).await
        }

        Command::Migrate {
            store,
            dry_run,
            atomic,
            chunk_size,
            resume_from,
            json,
        } => {
            let config = EngineConfig::load(cli.config.as_deref())?;
            handlers::migrate_store(
                &config,
                &store,
                dry_run,
                atomic,
                chunk_size,
                resume_from,
                json,
            )
            .await
        }

        Command::Schema => handlers::print_schema().await,
    }
}

/// Print an error with appropriate formatting based on error type.
fn print_error(e: &RegistryError) {
    println!();
    match e {
        RegistryError::Config(msg) => {
            println!("  {} Invalid configuration", "error".bright_red().bold());
            println!();
            println!("    {}", msg);
            println!();
            println!(
                "    {}: Check {} and {} variables",
                "hint".bright_blue().bold(),
                "registry.toml".bright_white(),
                "MCP_REGISTRY_*".bright_white()
            );
        }
        RegistryError::MalformedRecord { id, reason } => {
            println!(
                "  {} Malformed record '{}'",
                "error".bright_red().bold(),
                id.bright_white()
            );
            println!();
            println!("    {}", reason);
            println!();
            println!(
                "    {}: Nothing was written. Fix the record or use chunked mode",
                "hint".bright_blue().bold()
            );
        }
        RegistryError::Cancelled => {
            println!("  {} Operation cancelled", "✗".bright_red());
        }
        _ => {
            let msg = e.to_string();
            if let Some((prefix, rest)) = msg.split_once(": ")
                && prefix.len() < 30
                && prefix.ends_with("error")
            {
                println!(
                    "  {} {}",
                    format!("error[{}]", prefix.to_lowercase().replace(" error", ""))
                        .bright_red()
                        .bold(),
                    rest.dimmed()
                );
            } else {
                println!("  {} {}", "error".bright_red().bold(), msg);
            }
        }
    }
    println!();
}

/// Initialize tracing. Only enables logging when RUST_LOG is set.
fn init_tracing() {
    let rust_log_set = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.is_empty())
        .is_some();

    if !rust_log_set {
        return;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("hyper=warn".parse().expect("valid directive"))
        .add_directive("reqwest=warn".parse().expect("valid directive"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}
