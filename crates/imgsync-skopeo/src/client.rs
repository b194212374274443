//! `skopeo` subcommands used by imgsync.
//!
//! See `skopeo-list-tags(1)`, `skopeo-copy(1)` and `skopeo-login(1)`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use imgsync_common::constants::{DOCKER_TRANSPORT, SKOPEO_BIN};
use imgsync_common::error::{ImgsyncError, Result};
use imgsync_core::config::Credentials;
use imgsync_core::executor::{CopyOutput, ImageCopier};
use imgsync_core::{SyncPair, TagList, TagLister};

use crate::exec::{self, ExecOutput};

/// Handle on a `skopeo` binary.
#[derive(Debug, Clone)]
pub struct Skopeo {
    bin: PathBuf,
    copy_all_platforms: bool,
}

impl Skopeo {
    /// Uses the binary at `bin` as is.
    #[must_use]
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            copy_all_platforms: true,
        }
    }

    /// Resolves `bin` (a path or a name) against `PATH`, defaulting to
    /// `skopeo`.
    ///
    /// # Errors
    ///
    /// Returns [`ImgsyncError::Config`] if no such executable exists.
    pub fn locate(bin: Option<&Path>) -> Result<Self> {
        let wanted = bin.unwrap_or_else(|| Path::new(SKOPEO_BIN));
        let resolved = which::which(wanted).map_err(|e| ImgsyncError::Config {
            message: format!("cannot find {}: {e}", wanted.display()),
        })?;
        tracing::debug!(path = %resolved.display(), "using skopeo");
        Ok(Self::new(resolved))
    }

    /// Whether `copy` passes `--all` to keep every platform of a manifest
    /// list.
    #[must_use]
    pub const fn with_all_platforms(mut self, enabled: bool) -> Self {
        self.copy_all_platforms = enabled;
        self
    }

    /// Path of the binary.
    #[must_use]
    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Returns the `skopeo --version` line.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be run or exits non-zero.
    pub async fn version(&self) -> Result<String> {
        let output = exec::run(&self.bin, &["--version".to_string()], None).await?;
        if !output.success() {
            return Err(ImgsyncError::Config {
                message: format!("{} --version failed: {}", self.bin.display(), output.diagnostic()),
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Logs in to `registry`; the password is passed on stdin.
    ///
    /// # Errors
    ///
    /// Returns [`ImgsyncError::LoginFailed`] if skopeo rejects the
    /// credentials, or an I/O error if it cannot be run.
    pub async fn login(&self, registry: &str, credentials: &Credentials) -> Result<()> {
        let output = exec::run(
            &self.bin,
            &login_args(registry, &credentials.username),
            Some(&credentials.password),
        )
        .await?;
        if !output.success() {
            return Err(ImgsyncError::LoginFailed {
                registry: registry.to_string(),
                diagnostic: output.diagnostic(),
            });
        }
        tracing::debug!(registry, "skopeo login exited cleanly");
        Ok(())
    }
}

#[async_trait]
impl TagLister for Skopeo {
    async fn list_tags(&self, image: &str) -> Result<TagList> {
        let output = exec::run(&self.bin, &list_tags_args(image), None).await?;
        parse_list_tags(image, &output)
    }
}

#[async_trait]
impl ImageCopier for Skopeo {
    async fn copy(&self, pair: &SyncPair) -> Result<CopyOutput> {
        let args = copy_args(pair, self.copy_all_platforms);
        let output = exec::run(&self.bin, &args, None).await?;
        Ok(CopyOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
        })
    }
}

fn list_tags_args(image: &str) -> Vec<String> {
    vec!["list-tags".into(), format!("{DOCKER_TRANSPORT}{image}")]
}

fn copy_args(pair: &SyncPair, all_platforms: bool) -> Vec<String> {
    let mut args = vec!["copy".to_string()];
    if all_platforms {
        args.push("--all".into());
    }
    args.push(pair.source.clone());
    args.push(pair.destination.clone());
    args
}

fn login_args(registry: &str, username: &str) -> Vec<String> {
    vec![
        "login".into(),
        "--username".into(),
        username.into(),
        "--password-stdin".into(),
        registry.into(),
    ]
}

/// Interprets `skopeo list-tags` output.
fn parse_list_tags(image: &str, output: &ExecOutput) -> Result<TagList> {
    if !output.success() {
        return Err(ImgsyncError::TagListingFailed {
            image: image.to_string(),
            diagnostic: output.diagnostic(),
        });
    }
    serde_json::from_str(&output.stdout).map_err(|e| ImgsyncError::TagListingFailed {
        image: image.to_string(),
        diagnostic: format!("unexpected list-tags output: {e}"),
    })
}
