//! # imgsync-skopeo
//!
//! Implements the imgsync collaborator traits on top of the `skopeo`
//! binary.
//!
//! Handles:
//! - **Exec**: Running `skopeo` and capturing its output.
//! - **Client**: `list-tags`, `copy`, `login` and `--version`.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod client;
pub mod exec;

pub use client::Skopeo;
