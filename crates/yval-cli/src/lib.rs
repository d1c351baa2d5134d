//! # yval-cli — YAML Schema Validation from the Command Line
//!
//! ## Subcommands
//!
//! - `check` — validate documents against a schema and print diagnostics
//! - `compile` — compile a schema and print its rule tree
//!
//! ## Exit Status
//!
//! | Code | Meaning                                                        |
//! |------|----------------------------------------------------------------|
//! | 0    | no error diagnostics                                           |
//! | 1    | error diagnostics, or warnings with `--deny-warnings`          |
//! | 2    | unreadable schema, document or configuration                   |
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to `yval-core` and `yval-schema`; no
//!   validation logic lives here.

pub mod check;
pub mod compile;
pub mod config;
pub mod report;
