//! Error handling module for compline.
//!
//! Errors are split by who can cause them:
//! - Grammar authors: [`CompileError`] for malformed tokens
//! - Spec file and configuration authors: [`SpecError`], [`ConfigError`]
//!
//! The person pressing TAB never sees an error. Interpretation anomalies and
//! resolver failures are absorbed by the engine and produce fewer (or no)
//! suggestions instead.
//!
//! # Example
//!
//! ```rust
//! use compline::error::{CompileErrorKind, ComplineError};
//! use compline::grammar::compile;
//!
//! let err = compile(&["(mode-i"]).unwrap_err();
//! assert_eq!(err.kind, CompileErrorKind::UnterminatedGroup);
//! let wrapped: ComplineError = err.into();
//! assert!(wrapped.to_string().contains("exclusion-group"));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{
    CompileError, CompileErrorKind, ComplineError, ConfigError, Result, SpecError,
};
