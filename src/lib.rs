//! # apidex
//!
//! **Polyglot API-surface extraction** - one compact, language-neutral
//! index of a package's public API, for AI assistants and coverage tools
//! that must reason about an SDK without ingesting its sources.
//!
//! Five languages are understood - C#, Python, TypeScript, Go, Java - each
//! through its own extraction pipeline feeding a shared capability model:
//!
//! - **Extraction** - [`extract`] invokes per-language analyzers (embedded
//!   scripts under a runtime, native binaries, or a container image; C# is
//!   parsed in-process) and converts their JSON into the [`model`] trees.
//! - **Classification** - [`stdlib`] keeps standard-library and builtin
//!   names out of the reported dependencies.
//! - **Cross-references** - [`xref`] builds the type-uses-type graph by
//!   tokenizing signatures ([`tokenizer`]), never by substring matching.
//! - **Stubs** - [`format`] renders language-flavored stubs under a
//!   character budget, clients first.
//! - **Coverage** - [`usage`] matches user call sites against the model
//!   with layered receiver-inference strategies.
//! - **Diagnostics** - [`diagnostics`] flags documentation, entry-point,
//!   and deprecation issues.
//! - **Caching** - [`cache`] memoizes extraction against a directory
//!   fingerprint ([`fingerprint`]); [`availability`] memoizes tool probes.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use apidex::extract::{Extractor, PythonExtractor};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), apidex::ExtractError> {
//! let extractor = PythonExtractor::new();
//! let result = extractor
//!     .extract(std::path::Path::new("./my-sdk"), &CancellationToken::new())
//!     .await?;
//! if let Some(index) = &result.index {
//!     println!("{}", apidex::format::python::format(index, Some(20_000)));
//! }
//! # Ok(())
//! # }
//! ```

pub mod availability;
pub mod cache;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod format;
pub mod model;
pub mod sandbox;
pub mod stdlib;
pub mod tokenizer;
pub mod tools;
pub mod usage;
pub mod version;
pub mod xref;

pub use availability::{Availability, ExtractorConfig};
pub use cache::ExtractionCache;
pub use error::ExtractError;
pub use extract::{
    DotNetExtractor, Extractor, ExtractorResult, GoExtractor, JavaExtractor, PythonExtractor,
    TypeScriptExtractor,
};
pub use model::{Diagnostic, DiagnosticLevel, IndexBase, Language, NamedType};
pub use usage::UsageIndex;
