//! System-wide constants and default paths.

/// Transport prefix the copy tool expects on registry references.
pub const DOCKER_TRANSPORT: &str = "docker://";

/// Name of the copy tool binary looked up on `PATH`.
pub const SKOPEO_BIN: &str = "skopeo";

/// Default images file name.
pub const DEFAULT_IMAGES_FILE: &str = "images.yml";

/// Default auth file name.
pub const DEFAULT_AUTH_FILE: &str = "auth.yml";

/// Default number of source keys resolved concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Sigil introducing a variable reference in credential templates.
pub const TEMPLATE_SIGIL: char = '$';

/// Application name used in CLI output.
pub const APP_NAME: &str = "imgsync";
