//! # imgsync-common
//!
//! Shared error definitions, configuration models, and constants
//! used across the entire imgsync workspace.
//!
//! This crate is the leaf of the dependency graph and depends on no other
//! internal crate.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
