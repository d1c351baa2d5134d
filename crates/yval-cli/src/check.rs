//! # Check Subcommand
//!
//! Validates YAML documents against a schema and prints diagnostics.
//!
//! ```bash
//! yval check --schema service.schema.yaml deploy/*.yaml
//! yval check --schema service.schema.yaml web.yaml --format json --deny-warnings
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use yval_core::parse_document;
use yval_schema::{compile_schema, ObjRule};

use crate::config::{Config, OutputFormat};
use crate::report::{exit_code, render_json, render_text, DocumentReport};

/// Arguments for the check subcommand.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Schema file. Overrides `schema` from the config file.
    #[arg(long, short)]
    pub schema: Option<PathBuf>,

    /// Documents to validate. Overrides `documents` from the config file.
    pub documents: Vec<PathBuf>,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Exit with status 1 when only warnings were found.
    #[arg(long)]
    pub deny_warnings: bool,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, config: &Config) -> Result<u8> {
    let schema_path = args
        .schema
        .as_ref()
        .or(config.schema.as_ref())
        .context("no schema given: pass --schema or set `schema` in the config file")?;
    let documents = if args.documents.is_empty() {
        &config.documents
    } else {
        &args.documents
    };
    if documents.is_empty() {
        bail!("no documents given: pass paths or set `documents` in the config file");
    }
    let format = args.format.unwrap_or(config.format);
    let deny_warnings = args.deny_warnings || config.deny_warnings;

    let rule = load_schema(schema_path)?;
    let reports = check_documents(&rule, documents);

    let output = match format {
        OutputFormat::Text => render_text(&reports),
        OutputFormat::Json => render_json(&reports)?,
    };
    print!("{output}");

    Ok(exit_code(&reports, deny_warnings))
}

/// Read and compile a schema file.
pub fn load_schema(path: &Path) -> Result<ObjRule> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read schema: {}", path.display()))?;
    let rule = compile_schema(&bytes)
        .with_context(|| format!("failed to compile schema: {}", path.display()))?;
    tracing::info!(schema = %path.display(), rules = rule.len(), "schema loaded");
    Ok(rule)
}

/// Validate each document, recording load failures in its report.
pub fn check_documents(rule: &ObjRule, documents: &[PathBuf]) -> Vec<DocumentReport> {
    documents
        .iter()
        .map(|path| match check_document(rule, path) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(document = %path.display(), "{e:#}");
                DocumentReport::failed(path.clone(), format!("{e:#}"))
            }
        })
        .collect()
}

fn check_document(rule: &ObjRule, path: &Path) -> Result<DocumentReport> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read document: {}", path.display()))?;
    let field = parse_document(&bytes).context("failed to parse document")?;
    let violations = rule.validate(&field);
    tracing::info!(
        document = %path.display(),
        violations = violations.len(),
        "document checked"
    );
    Ok(DocumentReport::checked(path.to_path_buf(), violations))
}
