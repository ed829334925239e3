//! `yinc_core` is the engine behind the `yinc` preprocessor. It expands `!include` and `!replace` directives written inside YAML-style documents, pulling in other documents with the indentation of the directive line. The document is never parsed as YAML: every line is either copied through with its stream's indentation or recognised as a directive and replaced by the expansion of its target.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Root spec (file, `-`, URL, `$(shell …)`, `$(json …)`)
//!   → Source resolver (opens a line reader and the directory for relative specs)
//!   → Directive matcher (literal line or INDENT LABEL? TAG SPEC)
//!   → Glob expansion (one child stream per matched file, in sorted order)
//!   → Cycle guard (rejects a spec already open in the include chain)
//!   → Child stream (recursively processed into the same sink)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `yinc.toml` discovery and the resolved [`ExpandOptions`].
//! - [`source`]: Spec classification, source opening, JSON conversion and the [`DirectoryGuard`].
//!
//! ## Key Types
//!
//! - [`Expander`]: Built once per run. Expands root documents into a writer.
//! - [`Stream`]: One document being expanded, with its indentation and parent chain.
//! - [`DirectiveMatcher`]: Compiled line pattern for the configured tags.
//! - [`SourceKind`]: What a spec refers to.
//! - [`YincError`]: Every failure is fatal and surfaces as one of its variants.
//!
//! ## Directives
//!
//! ```yaml
//! data: !include child.yaml     # label line, content nested one indent level
//! items:
//!   - !include item-*.yaml      # content continues on the dash's row
//! !replace defaults.yaml        # content spliced in place
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use yinc_core::ExpandOptions;
//! use yinc_core::Expander;
//!
//! let expander = Expander::new(ExpandOptions::default()).unwrap();
//! let mut stdout = std::io::stdout().lock();
//! expander.expand_all(&["config.yaml"], &mut stdout).unwrap();
//! ```

pub use config::*;
pub use directive::*;
pub use error::*;
pub use source::*;
pub use stream::*;

pub mod config;
mod directive;
#[allow(unused_assignments)]
mod error;
pub mod source;
mod stream;
