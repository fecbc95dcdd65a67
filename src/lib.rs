//! # apidocgen
//!
//! **apidocgen** generates [OpenAPI 3.1.0](https://spec.openapis.org/oas/v3.1.0)
//! documents from structured source-level documentation: XML documentation
//! comments (method, parameter and type comments) bound to type metadata
//! that describes the shape of the documented types.
//!
//! ## Architecture
//!
//! The library is organized into stages, leaves first:
//!
//! - **[`annotations`]** - parses XML documentation into [`AnnotationRecord`]s keyed by
//!   [`MemberIdentifier`]
//! - **[`metadata`]** / **[`reflect`]** - loads type metadata and resolves type expressions into
//!   [`TypeShape`]s, keeping recursive types finite with back-references
//! - **[`schema`]** - canonicalizes shapes into named, de-duplicated component schemas
//! - **[`operation`]** - builds one [`Operation`] per documented route
//! - **[`document`]** - groups operations into [`Document`]s and validates their references
//! - **[`diagnostics`]** - the shared log every stage reports problems to
//!
//! [`generator::generate`] runs the whole pipeline; [`openapi`] renders and
//! serializes documents; [`output`] applies the caller's write policy.
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(apidocgen)
//!     participant Gen as generator::generate
//!     participant Ann as annotations
//!     participant Ref as reflect
//!     participant Sch as schema
//!     participant Op as operation
//!     participant Doc as document
//!
//!     CLI->>Gen: sources + GenerationOptions
//!     par
//!         Gen->>Ann: AnnotationStore::load
//!     and
//!         Gen->>Ref: TypeCatalog::load
//!     end
//!     Gen->>Op: RouteMetadata + OperationTypes per member
//!     Op->>Ref: resolve parameter / response types
//!     Gen->>Sch: canonicalize(all shapes)
//!     Gen->>Op: OperationBuilder::build
//!     Gen->>Doc: DocumentAssembler::assemble
//!     Doc-->>CLI: documents + diagnostics
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use apidocgen::annotations::AnnotationSource;
//! use apidocgen::config::GenerationOptions;
//! use apidocgen::generator::generate;
//! use apidocgen::metadata::MetadataSource;
//! use apidocgen::openapi::OpenApi;
//!
//! let xml = r#"<doc>
//!   <assembly><name>Contoso.Pets</name></assembly>
//!   <members>
//!     <member name="M:Contoso.Pets.PetsController.GetPet(System.Int64)">
//!       <summary>Gets a pet.</summary>
//!       <url>/pets/{id}</url>
//!       <verb>GET</verb>
//!       <param name="id">Pet id</param>
//!       <response code="200"><see cref="T:Contoso.Pets.Pet"/>The pet</response>
//!     </member>
//!   </members>
//! </doc>"#;
//! let types = r#"
//! types:
//!   - kind: object
//!     name: Contoso.Pets.Pet
//!     fields:
//!       - { name: Id, type: System.Int64, required: true }
//! "#;
//!
//! let result = generate(
//!     &[AnnotationSource::new("Contoso.Pets.xml", xml)],
//!     &[MetadataSource::new("types.yml", types)],
//!     &GenerationOptions::default(),
//! );
//! assert!(!result.has_errors());
//! let yaml = OpenApi::from_document(&result.documents["default"]).to_yaml()?;
//! assert!(yaml.contains("#/components/schemas/Pet"));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Diagnostics
//!
//! Bad input never aborts a run. Malformed entries, unresolvable types,
//! naming collisions and dangling references are recorded as
//! [`diagnostics::Diagnostic`]s and the run returns whatever could be
//! assembled. Whether errors suppress output is the caller's decision (see
//! [`output::WritePolicy`]).
//!
//! ## Logging
//!
//! Every stage logs through `tracing`; the binary installs a subscriber with
//! [`logging::init_logging`].

pub mod annotations;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod generator;
pub mod ids;
pub mod linter;
pub mod logging;
pub mod metadata;
pub mod openapi;
pub mod operation;
pub mod output;
pub mod reflect;
pub mod schema;

pub use annotations::{AnnotationRecord, AnnotationStore};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use document::{Document, Grouping};
pub use generator::{generate, GenerationResult};
pub use ids::MemberIdentifier;
pub use operation::Operation;
pub use reflect::TypeShape;
pub use schema::{SchemaIndex, SchemaNode};
