//! `resfilter_core` is the engine behind [resfilter](https://github.com/resfilter/resfilter). It copies resource files into an output directory and, for resources with filtering enabled, replaces delimited placeholders such as `${name}` or `@name@` with values from layered property files.
//!
//! ## Processing Pipeline
//!
//! ```text
//! resfilter.toml
//!   → Config (output directory, encoding, delimiters, filters, resources)
//!   → Property loading (filter files layered last-wins, then system properties, then environment)
//!   → Resource expansion (directories walked with include/exclude globs)
//!   → Engine (per file: skip if up to date, copy verbatim, or decode → interpolate → encode)
//!   → BatchResult (results, per-file failures, warnings)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `resfilter.toml` and the [`FilterConfig`] run options.
//! - [`project`]: Loads a project's config and properties into a [`FilterContext`].
//!
//! ## Key Types
//!
//! - [`PropertySource`]: Ordered key/value properties, each remembering the layer it came from.
//! - [`DelimiterSet`]: The ordered set of placeholder delimiter pairs.
//! - [`Interpolator`]: Resolves placeholders in text.
//! - [`ResourceDescriptor`]: A file or directory tree to copy, with its filtering flag.
//! - [`BatchResult`]: Result of filtering a list of resources.
//! - [`Report`]: A rendered diagnostic report (resolved properties or filtered filter files).
//!
//! ## Placeholders
//!
//! By default both `${key}` and `@key@` are recognised. Unknown keys are left in place, and an escape token (for example `\`) placed before a begin token keeps it literal:
//!
//! ```text
//! greeting=Hello ${name}      → greeting=Hello Acme
//! literal=\${name}            → literal=${name}
//! missing=${nope}             → missing=${nope}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resfilter_core::PropertySource;
//! use resfilter_core::project::load_context;
//! use std::path::Path;
//!
//! let ctx = load_context(Path::new("."), PropertySource::new()).unwrap();
//! let batch = ctx.filter_all().unwrap();
//!
//! for failure in &batch.failures {
//!     eprintln!("{}: {}", failure.source.display(), failure.error);
//! }
//! ```

pub use config::*;
pub use delimiters::*;
pub use encoding::*;
pub use engine::*;
pub use error::*;
pub use interpolate::*;
pub use project::*;
pub use properties::*;
pub use report::*;
pub use resource::*;

pub mod config;
mod delimiters;
mod encoding;
mod engine;
#[allow(unused_assignments)]
mod error;
mod interpolate;
pub mod project;
mod properties;
mod report;
mod resource;
