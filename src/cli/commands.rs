use crate::config::{GenerationOptions, RuntimeConfig, DEFAULT_DOCUMENT_VERSION};
use crate::diagnostics::print_diagnostics;
use crate::document::Grouping;
use crate::generator::{generate_from_paths, InputPaths};
use crate::linter::{fail_if_errors, lint_spec, print_lint_issues};
use crate::openapi::OutputFormat;
use crate::output::{write_documents, WritePolicy};
use crate::schema::PropertyNaming;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line interface for apidocgen
///
/// Generates OpenAPI documents from XML documentation comments and type
/// metadata, and checks generated documents.
#[derive(Parser, Debug)]
#[command(name = "apidocgen")]
#[command(about = "Annotation-driven OpenAPI document generator", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate OpenAPI documents from documentation and type metadata
    Generate {
        /// XML documentation files (repeat or comma-separate)
        #[arg(short, long = "annotation-xml", required = true, num_args = 1.., value_delimiter = ',')]
        annotation_xml: Vec<PathBuf>,

        /// Type metadata files, YAML or JSON (repeat or comma-separate)
        #[arg(short, long = "type-metadata", num_args = 1.., value_delimiter = ',')]
        type_metadata: Vec<PathBuf>,

        /// Output directory for the generated documents
        #[arg(short, long)]
        output: PathBuf,

        /// Value of info.version in every document
        #[arg(long, default_value = DEFAULT_DOCUMENT_VERSION)]
        document_version: String,

        /// Convert property names to camelCase
        #[arg(long, default_value_t = false)]
        camel_case: bool,

        /// Serialization format of the documents
        #[arg(short, long, value_enum, default_value_t = FormatArg::Yaml)]
        format: FormatArg,

        /// How operations are split into documents
        #[arg(long, value_enum, default_value_t = GroupingArg::Single)]
        grouping: GroupingArg,

        /// Document title (default: the first assembly name)
        #[arg(long)]
        title: Option<String>,

        /// Whether errors withhold all output or only invalid documents
        #[arg(long, value_enum, default_value_t = WritePolicyArg::Strict)]
        write_policy: WritePolicyArg,
    },
    /// Check a generated OpenAPI document
    ///
    /// Reports dangling schema references and missing or duplicate
    /// operationIds.
    Check {
        /// Path to the OpenAPI document (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Exit with error code if any errors are found
        #[arg(long, default_value_t = false)]
        fail_on_error: bool,

        /// Show only errors
        #[arg(long, default_value_t = false)]
        errors_only: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupingArg {
    /// One document
    Single,
    /// One document per `<group>` tag
    Group,
    /// One document per `v<N>` path segment
    PathVersion,
}

impl From<GroupingArg> for Grouping {
    fn from(arg: GroupingArg) -> Self {
        match arg {
            GroupingArg::Single => Grouping::Single,
            GroupingArg::Group => Grouping::Group,
            GroupingArg::PathVersion => Grouping::PathVersion,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WritePolicyArg {
    /// Write nothing when any error was reported
    Strict,
    /// Write every document that passed validation
    PerDocument,
}

impl From<WritePolicyArg> for WritePolicy {
    fn from(arg: WritePolicyArg) -> Self {
        match arg {
            WritePolicyArg::Strict => WritePolicy::Strict,
            WritePolicyArg::PerDocument => WritePolicy::PerDocument,
        }
    }
}

/// Execute a parsed command line
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            annotation_xml,
            type_metadata,
            output,
            document_version,
            camel_case,
            format,
            grouping,
            title,
            write_policy,
        } => {
            let runtime = RuntimeConfig::from_env();
            let options = GenerationOptions {
                document_version,
                grouping: grouping.into(),
                naming: if camel_case {
                    PropertyNaming::CamelCase
                } else {
                    PropertyNaming::Preserve
                },
                title,
                parallel: runtime.parallel,
            };
            let inputs = InputPaths {
                annotations: annotation_xml,
                metadata: type_metadata,
            };

            let result = generate_from_paths(&inputs, &options)?;
            print_diagnostics(&result.diagnostics);

            let policy = WritePolicy::from(write_policy);
            let report = write_documents(&result, &output, format.into(), policy)?;
            for path in &report.written {
                println!("📄 {}", path.display());
            }
            if policy == WritePolicy::Strict && result.has_errors() {
                anyhow::bail!(
                    "generation reported {} error(s); no document was written",
                    result.errors().count()
                );
            }
            if report.written.is_empty() {
                anyhow::bail!("no valid document to write");
            }
            Ok(())
        }
        Commands::Check {
            spec,
            fail_on_error,
            errors_only,
        } => {
            let issues = lint_spec(&spec)?;
            print_lint_issues(&issues, errors_only);
            if fail_on_error {
                fail_if_errors(&issues)?;
            }
            Ok(())
        }
    }
}
