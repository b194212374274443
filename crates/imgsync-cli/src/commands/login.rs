//! `imgsync login` — Log in to every registry of the auth file.

use std::path::{Path, PathBuf};

use clap::Args;
use imgsync_common::constants;
use imgsync_core::config::load_auth;
use imgsync_skopeo::Skopeo;
use imgsync_template::lowercase_env;

/// Arguments for the `login` command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Auth file mapping registries to credentials.
    #[arg(long, env = "INPUT_AUTH_FILE", default_value = constants::DEFAULT_AUTH_FILE)]
    pub auth_file: PathBuf,
}

/// Executes the `login` command.
///
/// # Errors
///
/// Returns an error if skopeo is missing or the auth file is invalid.
pub async fn execute(args: LoginArgs, skopeo: Option<PathBuf>) -> anyhow::Result<()> {
    let skopeo = Skopeo::locate(skopeo.as_deref())?;
    login_all(&skopeo, &args.auth_file).await
}

/// Logs in to each registry of `auth_file`, in file order.
///
/// Credential templates are filled from the process environment. A
/// rejected login is logged and does not stop the others.
///
/// # Errors
///
/// Returns an error only if the auth file cannot be read or parsed.
pub async fn login_all(skopeo: &Skopeo, auth_file: &Path) -> anyhow::Result<()> {
    let entries = load_auth(auth_file)?;
    let env = lowercase_env(std::env::vars());

    for entry in entries {
        let credentials = entry.credentials.inject(|key| env.get(key).cloned());
        crate::output::mask_secret(&credentials.username);
        crate::output::mask_secret(&credentials.password);

        match skopeo.login(&entry.registry, &credentials).await {
            Ok(()) => tracing::info!(registry = %entry.registry, "login succeeded"),
            Err(e) => tracing::warn!(registry = %entry.registry, error = %e, "login failed"),
        }
    }
    Ok(())
}
