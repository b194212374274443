//! `imgsync sync` — Log in, resolve the images file, and copy every pair.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use imgsync_common::config::RunConfig;
use imgsync_core::config::load_images;
use imgsync_core::executor::copy_all;
use imgsync_core::plan::plan_all;
use imgsync_skopeo::Skopeo;

use super::ResolveArgs;

/// Arguments for the `sync` command.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Images file and resolution options.
    #[command(flatten)]
    pub resolve: ResolveArgs,

    /// Auth file mapping registries to credentials; login is skipped if absent.
    #[arg(long, env = "INPUT_AUTH_FILE")]
    pub auth_file: Option<PathBuf>,

    /// Keep going after a key fails to resolve or a copy fails.
    #[arg(long, env = "INPUT_SKIP_ERROR")]
    pub skip_error: bool,

    /// Copy only the platform skopeo picks instead of the whole manifest list.
    #[arg(long)]
    pub single_platform: bool,
}

impl SyncArgs {
    fn run_config(&self, skopeo: Option<PathBuf>) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            skopeo_bin: skopeo.unwrap_or(defaults.skopeo_bin),
            skip_error: self.skip_error,
            concurrency: self.resolve.concurrency,
            copy_all_platforms: !self.single_platform,
        }
    }
}

/// Executes the `sync` command.
///
/// # Errors
///
/// Returns an error if skopeo is missing, the images file is invalid, or,
/// without `--skip-error`, a key fails to resolve or a copy fails.
pub async fn execute(args: SyncArgs, skopeo: Option<PathBuf>) -> anyhow::Result<()> {
    let started = Instant::now();
    let config = args.run_config(skopeo);
    tracing::debug!(?config, "sync configuration");

    let skopeo = Skopeo::locate(Some(config.skopeo_bin.as_path()))?
        .with_all_platforms(config.copy_all_platforms);
    match skopeo.version().await {
        Ok(version) => tracing::info!(%version, path = %skopeo.bin().display(), "found skopeo"),
        Err(e) => tracing::warn!(error = %e, "could not determine skopeo version"),
    }

    if let Some(ref auth_file) = args.auth_file {
        super::login::login_all(&skopeo, auth_file).await?;
    }

    let entries = load_images(&args.resolve.images_file)?;
    tracing::info!(
        file = %args.resolve.images_file.display(),
        keys = entries.len(),
        "loaded images file"
    );

    let plan = plan_all(
        &entries,
        Arc::new(skopeo.clone()),
        config.effective_concurrency(),
    )
    .await;
    let pairs = plan.into_pairs(config.skip_error)?;

    let report = copy_all(&pairs, &skopeo, config.skip_error).await?;
    crate::output::print_report(&report, started.elapsed());
    Ok(())
}
