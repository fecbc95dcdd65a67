//! # Configuration Module
//!
//! Two layers of configuration drive a generation run:
//!
//! - [`GenerationOptions`]: what to generate. Built from CLI flags (or by a
//!   library caller) and passed to [`crate::generator::generate`].
//! - [`RuntimeConfig`]: how to run. Loaded from environment variables at
//!   startup.
//!
//! ## Environment Variables
//!
//! ### `APIDOCGEN_PARALLEL`
//!
//! Enables rayon parallelism for source parsing and type resolution.
//! Accepts `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`.
//!
//! Default: `true`
//!
//! Setting it to `false` runs every stage on the calling thread, which makes
//! logs easier to follow when debugging a single input.
//!
//! ## Usage
//!
//! ```rust
//! use apidocgen::config::{GenerationOptions, RuntimeConfig};
//!
//! let runtime = RuntimeConfig::from_env();
//! let options = GenerationOptions {
//!     parallel: runtime.parallel,
//!     ..GenerationOptions::default()
//! };
//! assert_eq!(options.document_version, "V1");
//! ```

use crate::document::Grouping;
use crate::schema::PropertyNaming;
use std::env;

/// Default `info.version` of generated documents
pub const DEFAULT_DOCUMENT_VERSION: &str = "V1";

/// Options of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// `info.version` of every document (default: `V1`)
    pub document_version: String,
    pub grouping: Grouping,
    pub naming: PropertyNaming,
    /// Document title; defaults to the first assembly name, else `API`
    pub title: Option<String>,
    /// Parse and resolve inputs on the rayon pool
    pub parallel: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            document_version: DEFAULT_DOCUMENT_VERSION.to_string(),
            grouping: Grouping::Single,
            naming: PropertyNaming::Preserve,
            title: None,
            parallel: true,
        }
    }
}

/// Process-level configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Use rayon parallelism (default: true)
    pub parallel: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig { parallel: true }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let parallel = match env::var("APIDOCGEN_PARALLEL") {
            Ok(val) => parse_flag(&val).unwrap_or(true),
            Err(_) => true,
        };
        RuntimeConfig { parallel }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
