//! Run configuration shared by the planner, executor, and CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Root configuration for one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Path or name of the `skopeo` binary.
    pub skopeo_bin: PathBuf,
    /// Keep copying after a failed pair instead of aborting.
    pub skip_error: bool,
    /// Number of source keys resolved concurrently.
    pub concurrency: usize,
    /// Copy every platform of a multi-arch manifest list (`--all`).
    pub copy_all_platforms: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            skopeo_bin: PathBuf::from(constants::SKOPEO_BIN),
            skip_error: false,
            concurrency: constants::DEFAULT_CONCURRENCY,
            copy_all_platforms: true,
        }
    }
}

impl RunConfig {
    /// Concurrency clamped to at least one worker.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
