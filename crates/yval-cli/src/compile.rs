//! # Compile Subcommand
//!
//! Compiles a schema without validating anything and prints its rule tree.
//! Useful for checking a schema while writing it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::check::load_schema;
use crate::config::Config;

/// Arguments for the compile subcommand.
#[derive(Args, Debug, Default)]
pub struct CompileArgs {
    /// Schema file. Overrides `schema` from the config file.
    #[arg(long, short)]
    pub schema: Option<PathBuf>,
}

/// Execute the compile subcommand.
pub fn run_compile(args: &CompileArgs, config: &Config) -> Result<u8> {
    let path = args
        .schema
        .as_ref()
        .or(config.schema.as_ref())
        .context("no schema given: pass --schema or set `schema` in the config file")?;
    let rule = load_schema(path)?;
    print!("{}", rule.outline());
    Ok(0)
}
