//! CLI command definitions.

use crate::examples;
use crate::styles::styles;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const CANONICALIZE_EXAMPLES: &str = examples![
    "registry-meta canonicalize server.json          " # "Print the canonical document",
];

const VALIDATE_EXAMPLES: &str = examples![
    "registry-meta validate server.json              " # "Schema rules and registry checks",
    "registry-meta validate server.json --offline    " # "Skip network lookups",
    "registry-meta validate server.json --owner io.github.acme/server" # "Check a different owner",
    "registry-meta validate server.json --strict     " # "Treat warnings as errors",
    "registry-meta validate server.json --json       " # "JSON output for CI/CD",
];

const MIGRATE_EXAMPLES: &str = examples![
    "registry-meta migrate --store records.json --dry-run" # "Show what would change",
    "registry-meta migrate --store records.json       " # "Rewrite in chunks",
    "registry-meta migrate --store records.json --atomic" # "One transaction for everything",
    "registry-meta migrate --store records.json --resume-from 0042" # "Continue after a record id",
];

const CLI_EXAMPLES: &str = examples![
    "registry-meta canonicalize server.json          " # "Rewrite legacy package fields",
    "registry-meta validate server.json              " # "Validate a server document",
    "registry-meta migrate --store records.json      " # "Migrate a stored corpus",
    "registry-meta schema                            " # "Print the bundled JSON schema",
];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// registry-meta - MCP registry package metadata tooling.
#[derive(Debug, Parser)]
#[command(name = "registry-meta", author, version, styles = styles())]
#[command(
    about = "Canonicalize, validate and migrate MCP registry package metadata",
    after_help = CLI_EXAMPLES
)]
pub struct Cli {
    /// Configuration file (defaults to ./registry.toml, then ~/.mcp-registry/registry.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a server document with its packages in canonical form.
    #[command(after_help = CANONICALIZE_EXAMPLES)]
    Canonicalize {
        /// Path to a server.json document.
        file: PathBuf,
    },

    /// Validate a server document.
    #[command(after_help = VALIDATE_EXAMPLES)]
    Validate {
        /// Path to a server.json document.
        file: PathBuf,

        /// Expected owner of every package (defaults to the server name).
        #[arg(long)]
        owner: Option<String>,

        /// Only run the local field and URL rules.
        #[arg(long)]
        offline: bool,

        /// Treat warnings as errors.
        #[arg(long)]
        strict: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite stored package metadata into canonical form.
    #[command(after_help = MIGRATE_EXAMPLES)]
    Migrate {
        /// JSON record file to migrate.
        #[arg(long)]
        store: PathBuf,

        /// Compute diffs without writing.
        #[arg(long)]
        dry_run: bool,

        /// Use a single transaction for the whole corpus.
        #[arg(long, conflicts_with_all = ["chunk_size", "resume_from"])]
        atomic: bool,

        /// Records per chunk (defaults to migration.chunk_size).
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Only migrate records with ids after this one.
        #[arg(long)]
        resume_from: Option<String>,

        /// Output the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the bundled server document JSON schema.
    Schema,
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_migrate() {
        let cli = Cli::parse_from([
            "registry-meta",
            "--config",
            "custom.toml",
            "migrate",
            "--store",
            "records.json",
            "--dry-run",
            "--chunk-size",
            "50",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Command::Migrate {
                store,
                dry_run,
                atomic,
                chunk_size,
                resume_from,
                json,
            } => {
                assert_eq!(store, PathBuf::from("records.json"));
                assert!(dry_run);
                assert!(!atomic);
                assert_eq!(chunk_size, Some(50));
                assert!(resume_from.is_none());
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_atomic_conflicts_with_chunking() {
        let err = Cli::try_parse_from([
            "registry-meta",
            "migrate",
            "--store",
            "r.json",
            "--atomic",
            "--chunk-size",
            "10",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
