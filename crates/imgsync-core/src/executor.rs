//! Sequential copy of resolved pairs.

use std::fmt;

use async_trait::async_trait;
use imgsync_common::error::{ImgsyncError, Result};

use crate::pair::SyncPair;

/// Output of one copy invocation.
#[derive(Debug, Clone, Default)]
pub struct CopyOutput {
    /// Standard output of the copy tool.
    pub stdout: String,
    /// Standard error of the copy tool.
    pub stderr: String,
    /// Exit code returned by the copy tool.
    pub exit_code: i32,
}

impl CopyOutput {
    /// Whether the copy tool exited successfully.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Capability to copy one image from source to destination.
#[async_trait]
pub trait ImageCopier: Send + Sync {
    /// Copies `pair.source` to `pair.destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy tool could not be run at all; a tool
    /// that ran and failed is reported through [`CopyOutput::exit_code`].
    async fn copy(&self, pair: &SyncPair) -> Result<CopyOutput>;
}

/// Result of copying one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyStatus {
    /// The copy tool exited successfully.
    Succeeded,
    /// The copy failed; carries the tool's diagnostic output.
    Failed {
        /// Standard error of the copy tool, or the spawn error.
        diagnostic: String,
    },
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// Outcome of one pair.
#[derive(Debug, Clone)]
pub struct PairOutcome {
    /// The pair that was copied.
    pub pair: SyncPair,
    /// How the copy went.
    pub status: CopyStatus,
}

/// Outcome of a whole copy run.
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// Outcomes in execution order.
    pub outcomes: Vec<PairOutcome>,
}

impl CopyReport {
    /// Number of pairs copied successfully.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == CopyStatus::Succeeded)
            .count()
    }

    /// Outcomes of failed pairs.
    pub fn failures(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, CopyStatus::Failed { .. }))
    }

    /// Whether every pair was copied.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Copies every pair in order.
///
/// Without `skip_error` the first failed pair aborts the run; with it,
/// failures are recorded and the run continues.
///
/// # Errors
///
/// Returns [`ImgsyncError::CopyFailed`] for the first failure when
/// `skip_error` is false.
pub async fn copy_all<C>(pairs: &[SyncPair], copier: &C, skip_error: bool) -> Result<CopyReport>
where
    C: ImageCopier + ?Sized,
{
    let total = pairs.len();
    let mut report = CopyReport::default();

    for (index, pair) in pairs.iter().enumerate() {
        let status = match copier.copy(pair).await {
            Ok(output) if output.success() => CopyStatus::Succeeded,
            Ok(output) => CopyStatus::Failed {
                diagnostic: output.stderr.trim_end().to_string(),
            },
            Err(e) => CopyStatus::Failed {
                diagnostic: e.to_string(),
            },
        };
        tracing::info!(
            "process [{}/{total}]: {} ({status})",
            index + 1,
            pair.summary()
        );

        if let CopyStatus::Failed { diagnostic } = &status {
            if !skip_error {
                return Err(ImgsyncError::CopyFailed {
                    source_image: pair.source.clone(),
                    destination: pair.destination.clone(),
                    diagnostic: diagnostic.clone(),
                });
            }
            tracing::warn!(source = %pair.source, destination = %pair.destination, diagnostic = %diagnostic, "copy failed, continuing");
        }

        report.outcomes.push(PairOutcome {
            pair: pair.clone(),
            status,
        });
    }

    Ok(report)
}
