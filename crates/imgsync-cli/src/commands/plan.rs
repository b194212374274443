//! `imgsync plan` — Resolve the images file and print the pairs without copying.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use imgsync_core::config::load_images;
use imgsync_core::plan::plan_all;
use imgsync_skopeo::Skopeo;

use super::ResolveArgs;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Images file and resolution options.
    #[command(flatten)]
    pub resolve: ResolveArgs,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `plan` command.
///
/// Every key is resolved and printed; the command fails afterwards if any
/// key could not be resolved.
///
/// # Errors
///
/// Returns an error if skopeo is missing, the images file is invalid, or a
/// key fails to resolve.
pub async fn execute(args: PlanArgs, skopeo: Option<PathBuf>) -> anyhow::Result<()> {
    let skopeo = Skopeo::locate(skopeo.as_deref())?;
    let entries = load_images(&args.resolve.images_file)?;
    let plan = plan_all(&entries, Arc::new(skopeo), args.resolve.concurrency).await;

    if args.json {
        crate::output::print_plan_json(&plan)?;
    } else {
        crate::output::print_plan(&args.resolve.images_file, &plan);
    }

    let failed = plan.failed_keys();
    if failed > 0 {
        anyhow::bail!("{failed} key(s) could not be resolved");
    }
    Ok(())
}
