//! Java-to-Go translation core.
//!
//! The pipeline has two stages:
//!
//! 1. **Lowering** ([`lower`]): walk the Java syntax tree produced by
//!    tree-sitter and build a parallel Go-shaped program model
//!    ([`model::Program`]), resolving names through [`scope::Scope`] and
//!    classifying types through [`typedata::TypeData`].
//! 2. **Rewriting** ([`rewrite`]): run an ordered list of rules over the
//!    model, post-order, replacing Java library idioms with Go ones
//!    (`System.out.println` → `fmt.Println`, `list.add` → `append`, …).
//!
//! The model then emits a `j2go_goast::File`, which the goast printer
//! serializes. Constructs with no Go mapping surface in the output as
//! `<<unimp_...>>` placeholders rather than being silently dropped.

pub mod config;
pub mod lower;
pub mod methodmap;
pub mod model;
pub mod modifiers;
pub mod name;
pub mod rewrite;
pub mod scope;
pub mod typedata;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort translation of the current compilation unit.
///
/// Lowering shortfalls are *not* errors: they become diagnostics plus
/// placeholder nodes, and translation continues.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("IO error at {path}: {error}")]
    Io {
        error: std::io::Error,
        path: PathBuf,
    },

    #[error("Parse error in {file} at {line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    /// The engine detected an impossible state; the file is skipped.
    #[error("{0}")]
    Invariant(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl TranslateError {
    pub fn io(error: std::io::Error, path: impl Into<PathBuf>) -> Self {
        TranslateError::Io {
            error,
            path: path.into(),
        }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        TranslateError::Invariant(msg.into())
    }
}

/// Result alias for translation operations.
pub type Result<T> = std::result::Result<T, TranslateError>;

pub use config::Config;
pub use lower::Translator;
pub use model::Program;
pub use rewrite::{standard_rules, RewriteCtx, RewriteRule};
