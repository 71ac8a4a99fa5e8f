//! Validate command handler.

use crate::config::EngineConfig;
use crate::context::ValidationContext;
use crate::error::{RegistryError, RegistryResult};
use crate::model::{Package, ServerRecord};
use crate::registries::{PackageValidators, ValidationOutcome};
use crate::validate::{RecordOptions, ValidationResult, validate_server_json};
use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Result of the registry check of one package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageCheck {
    pub index: usize,
    pub registry_type: String,
    pub identifier: String,
    /// `verified`, `skipped` or `failed`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PackageCheck {
    pub fn new(index: usize, pkg: &Package, result: &RegistryResult<ValidationOutcome>) -> Self {
        let (status, detail) = match result {
            Ok(ValidationOutcome::Verified) => ("verified", None),
            Ok(ValidationOutcome::Skipped { reason }) => ("skipped", Some(reason.clone())),
            Err(e) => ("failed", Some(e.to_string())),
        };
        Self {
            index,
            registry_type: pkg.registry_type.as_str().to_string(),
            identifier: pkg.identifier.clone(),
            status,
            detail,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == "failed"
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Validate a server document file.
pub async fn validate_file(
    config: &EngineConfig,
    path: &Path,
    owner: Option<String>,
    offline: bool,
    strict: bool,
    json_output: bool,
) -> RegistryResult<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let options = RecordOptions {
        strict_url_variables: config.transport.strict_url_variables,
    };
    let result = validate_server_json(&content, options);

    let checks = if offline || !result.is_valid() {
        Vec::new()
    } else {
        let record: ServerRecord = serde_json::from_str(&content)?;
        let owner = owner.unwrap_or_else(|| record.name.clone());
        check_registries(config, &record, &owner).await?
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    if json_output {
        output_json(&result, &checks)?;
    } else {
        output_full(&result, &checks, strict, &file_name, offline);
    }

    check_exit_status(&result, &checks, strict);
    Ok(())
}

/// Run the registry validators over every package of a record.
///
/// Ctrl-C cancels the in-flight lookups.
async fn check_registries(
    config: &EngineConfig,
    record: &ServerRecord,
    owner: &str,
) -> RegistryResult<Vec<PackageCheck>> {
    if record.packages().is_empty() {
        return Ok(Vec::new());
    }

    let validators = PackageValidators::from_config(config)?;
    let ctx = ValidationContext::new().with_timeout(config.fetch_timeout());

    let token = ctx.token().clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    tracing::debug!(
        "checking {} packages of {} against their registries",
        record.packages().len(),
        owner
    );
    let results = validators
        .validate_packages(&ctx, record.packages(), owner)
        .await;
    watcher.abort();

    if results
        .iter()
        .any(|r| matches!(r, Err(RegistryError::Cancelled)))
    {
        return Err(RegistryError::Cancelled);
    }

    Ok(record
        .packages()
        .iter()
        .zip(&results)
        .enumerate()
        .map(|(i, (pkg, result))| PackageCheck::new(i, pkg, result))
        .collect())
}

/// Output validation result as JSON.
fn output_json(result: &ValidationResult, checks: &[PackageCheck]) -> RegistryResult<()> {
    let output = serde_json::json!({
        "valid": result.is_valid() && !checks.iter().any(PackageCheck::is_failed),
        "strict_valid": result.is_strict_valid() && !checks.iter().any(PackageCheck::is_failed),
        "errors": result.errors,
        "warnings": result.warnings,
        "packages": checks,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Output validation result in full format.
fn output_full(
    result: &ValidationResult,
    checks: &[PackageCheck],
    strict: bool,
    file_name: &str,
    offline: bool,
) {
    let mode = if offline {
        "offline".bright_yellow()
    } else {
        "registry checks".bright_green()
    };
    println!("  Validating {} ({})\n", file_name.bold(), mode);

    let issues = result
        .errors
        .iter()
        .map(|e| (true, e))
        .chain(result.warnings.iter().map(|w| (strict, w)));

    for (is_error, issue) in issues {
        let label = if is_error {
            format!("error[{}]", issue.code).bright_red().bold()
        } else {
            format!("warning[{}]", issue.code).bright_yellow().bold()
        };
        println!("  {}: → {}", label, issue.location.bold());

        if let Some(help) = &issue.help {
            println!("      {} {}", "├─".dimmed(), issue.details.dimmed());
            println!(
                "      {} {}: {}",
                "└─".dimmed(),
                "help".bright_green().dimmed(),
                help.dimmed()
            );
        } else {
            println!("      {} {}", "└─".dimmed(), issue.details.dimmed());
        }
        println!();
    }

    for check in checks {
        let location = format!("packages[{}]", check.index);
        let marker = match check.status {
            "verified" => "✓".bright_green(),
            "skipped" => "-".bright_yellow(),
            _ => "✗".bright_red(),
        };
        println!(
            "  {} {} {} {}",
            marker,
            location.bold(),
            check.registry_type.dimmed(),
            check.identifier
        );
        if let Some(detail) = &check.detail {
            println!("      {} {}", "└─".dimmed(), detail.dimmed());
        }
    }
    if !checks.is_empty() {
        println!();
    }

    let failed = checks.iter().filter(|c| c.is_failed()).count();
    let errors = result.errors.len() + failed;
    let warnings = result.warnings.len();

    if strict && errors + warnings > 0 {
        println!(
            "  {} {} (strict mode)",
            "✗".bright_red(),
            plural(errors + warnings, "error")
        );
    } else if errors > 0 {
        let summary = if warnings > 0 {
            format!("{}, {}", plural(errors, "error"), plural(warnings, "warning"))
        } else {
            plural(errors, "error")
        };
        println!("  {} {}", "✗".bright_red(), summary);
    } else if warnings > 0 {
        println!(
            "  {} valid ({})",
            "✓".bright_green(),
            plural(warnings, "warning")
        );
    } else {
        println!("  {} valid", "✓".bright_green());
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Exit with status 1 when the document did not pass.
fn check_exit_status(result: &ValidationResult, checks: &[PackageCheck], strict: bool) {
    let passed = if strict {
        result.is_strict_valid()
    } else {
        result.is_valid()
    };
    if !passed || checks.iter().any(PackageCheck::is_failed) {
        std::process::exit(1);
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
