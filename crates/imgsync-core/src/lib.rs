//! # imgsync-core
//!
//! Resolution engine that turns a declarative images file into the exact
//! list of (source, destination) copies to perform.
//!
//! Handles:
//! - **Reference**: Classification of `NAME[:TAG[,TAG]|:/REGEX/|@DIGEST]` keys.
//! - **Resolver**: Tag listing and filtering (exact, digest, regex, semver).
//! - **Pair**: Cross product of source images and destinations.
//! - **Version**: Lenient tag coercion and npm-style range matching.
//! - **Config**: Images and auth file models.
//! - **Plan**: Concurrent resolution of every configured key.
//! - **Executor**: Sequential copy of resolved pairs with a skip-error policy.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod config;
pub mod executor;
pub mod pair;
pub mod plan;
pub mod reference;
pub mod resolver;
pub mod version;

pub use pair::{SyncPair, cartesian};
pub use reference::{SyncDescriptor, classify};
pub use resolver::{TagList, TagLister, resolve};
