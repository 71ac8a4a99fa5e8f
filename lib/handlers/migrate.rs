//! Migrate command handler.

use crate::config::EngineConfig;
use crate::error::RegistryResult;
use crate::migrate::{Migration, MigrationMode, MigrationReport, MigrationStrategy};
use crate::store::FileStore;
use colored::Colorize;
use serde_json::Value;
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Migrate a JSON record file.
pub async fn migrate_store(
    config: &EngineConfig,
    store_path: &Path,
    dry_run: bool,
    atomic: bool,
    chunk_size: Option<usize>,
    resume_from: Option<String>,
    json_output: bool,
) -> RegistryResult<()> {
    let store = FileStore::open(store_path)?;

    let mode = if dry_run {
        MigrationMode::DryRun
    } else {
        MigrationMode::Live
    };
    let strategy = if atomic {
        MigrationStrategy::Atomic
    } else {
        MigrationStrategy::Chunked {
            size: chunk_size.unwrap_or(config.migration.chunk_size),
        }
    };

    let mut migration = Migration::new(mode, strategy);
    if let Some(cursor) = resume_from {
        migration = migration.with_resume_from(cursor);
    }

    let report = migration.run(&store).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output_full(&report, store_path);
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Output the report in full format.
fn output_full(report: &MigrationReport, store_path: &Path) {
    println!(
        "  Migrating {} ({}, {})\n",
        store_path.display().to_string().bold(),
        report.mode.to_string().bright_cyan(),
        report.strategy
    );

    for diff in &report.diffs {
        println!("  {} {}", "~".bright_yellow(), diff.record_id.bold());
        for pkg in &diff.packages {
            for change in &pkg.changes {
                let location = format!("packages[{}].{}", pkg.index, change.field);
                match (&change.before, &change.after) {
                    (Some(before), Some(after)) => println!(
                        "      {} {} → {}",
                        location.dimmed(),
                        render(before).bright_red(),
                        render(after).bright_green()
                    ),
                    (Some(before), None) => println!(
                        "      {} {} {}",
                        "-".bright_red(),
                        location.dimmed(),
                        render(before).bright_red()
                    ),
                    (None, Some(after)) => println!(
                        "      {} {} {}",
                        "+".bright_green(),
                        location.dimmed(),
                        render(after).bright_green()
                    ),
                    (None, None) => {}
                }
            }
        }
        println!();
    }

    for failure in &report.failures {
        println!(
            "  {} chunk {} ({}..={})",
            "error".bright_red().bold(),
            failure.chunk,
            failure.first_id,
            failure.last_id
        );
        println!("      {} {}", "└─".dimmed(), failure.error.dimmed());
        println!();
    }

    println!(
        "  {} scanned, {} changed, {} written",
        report.records_scanned, report.records_changed, report.records_written
    );
    println!(
        "  legacy records: {} → {}",
        report.legacy_records_before, report.legacy_records_after
    );
    for (registry_type, counts) in &report.registry_types {
        println!(
            "    {:<8} {} packages, legacy {} → {}",
            registry_type, counts.packages, counts.legacy_before, counts.legacy_after
        );
    }

    if report.is_success() {
        let verdict = match report.mode {
            MigrationMode::DryRun => "dry run complete",
            MigrationMode::Live => "migration complete",
        };
        println!("\n  {} {}", "✓".bright_green(), verdict);
    } else {
        println!(
            "\n  {} {} failed chunk(s)",
            "✗".bright_red(),
            report.failures.len()
        );
        if let Some(hint) = failure_hint(report) {
            println!("    {}: {}", "hint".bright_blue().bold(), hint);
        }
    }
}

/// What is left to do after chunk failures.
fn failure_hint(report: &MigrationReport) -> Option<String> {
    if report.failures.is_empty() {
        return None;
    }
    let committed = match report.mode {
        MigrationMode::DryRun => "nothing was written",
        MigrationMode::Live => "every other chunk was committed",
    };
    let ranges = report
        .failures
        .iter()
        .map(|f| format!("{}..={}", f.first_id, f.last_id))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "only chunks {} failed and {}; fix those records and rerun",
        ranges, committed
    ))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
