//! # CLI Module
//!
//! Command-line interface of the `apidocgen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate OpenAPI documents from XML documentation and type metadata:
//!
//! ```bash
//! apidocgen generate \
//!     --annotation-xml Contoso.Pets.xml \
//!     --type-metadata Contoso.Pets.types.yml \
//!     --output openapi
//! ```
//!
//! Options:
//! - `--annotation-xml <FILE>...` - XML documentation files (required)
//! - `--type-metadata <FILE>...` - type metadata files, YAML or JSON
//! - `--output <DIR>` - output directory (required)
//! - `--document-version <VERSION>` - `info.version` (default: `V1`)
//! - `--camel-case` - camelCase property names
//! - `--format yaml|json` - output format (default: `yaml`)
//! - `--grouping single|group|path-version` - document split (default: `single`)
//! - `--title <TITLE>` - document title (default: first assembly name)
//! - `--write-policy strict|per-document` - output policy (default: `strict`)
//!
//! With the default `strict` policy any error-level diagnostic prints every
//! error and writes nothing. `per-document` writes every document that passed
//! validation.
//!
//! ### `check`
//!
//! Check a generated document:
//!
//! ```bash
//! apidocgen check --spec openapi/Contoso.Pets.yml --fail-on-error
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use apidocgen::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands, FormatArg, GroupingArg, WritePolicyArg};
