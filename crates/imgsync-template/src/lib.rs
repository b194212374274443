//! # imgsync-template
//!
//! Substitution of `$name`, `${name}`, `$(name)` and `$[name]` references
//! in credential strings.
//!
//! Handles:
//! - **Lexer**: Tokenizes a template into variable references with exact
//!   character spans, optionally validating bracket symmetry.
//! - **Inject**: Replaces references with values from an injected lookup,
//!   leaving unknown references verbatim.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod inject;
pub mod lexer;

pub use inject::{inject, lowercase_env};
pub use lexer::{Lexer, Token, tokenize};
