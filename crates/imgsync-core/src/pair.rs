//! Copy pairs and their cross-product generation.

use std::fmt;

use imgsync_common::constants::DOCKER_TRANSPORT;
use serde::Serialize;

/// One concrete copy: a source image reference and its destination.
///
/// Both references carry the transport prefix the copy tool expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPair {
    /// Normalized source reference (`docker://nginx:1.25`).
    pub source: String,
    /// Normalized destination reference.
    pub destination: String,
    #[serde(skip)]
    original_source: String,
    #[serde(skip)]
    original_destination: String,
}

impl SyncPair {
    /// Builds a pair from unprefixed references.
    #[must_use]
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        let original_source = source.into();
        let original_destination = destination.into();
        Self {
            source: format!("{DOCKER_TRANSPORT}{original_source}"),
            destination: format!("{DOCKER_TRANSPORT}{original_destination}"),
            original_source,
            original_destination,
        }
    }

    /// Source reference as configured, without transport.
    #[must_use]
    pub fn original_source(&self) -> &str {
        &self.original_source
    }

    /// Destination reference as configured, without transport.
    #[must_use]
    pub fn original_destination(&self) -> &str {
        &self.original_destination
    }

    /// Short human-readable line: the source and the destination host.
    #[must_use]
    pub fn summary(&self) -> String {
        let host = self
            .original_destination
            .split('/')
            .next()
            .unwrap_or_default();
        format!("sync {} to {host}", self.original_source)
    }
}

impl fmt::Display for SyncPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Crosses every source with every destination, source-major.
///
/// Produces `sources.len() * destinations.len()` pairs: all destinations
/// of `sources[0]`, then all destinations of `sources[1]`, and so on.
#[must_use]
pub fn cartesian<S, D>(sources: &[S], destinations: &[D]) -> Vec<SyncPair>
where
    S: AsRef<str>,
    D: AsRef<str>,
{
    sources
        .iter()
        .flat_map(|source| {
            destinations
                .iter()
                .map(move |dest| SyncPair::new(source.as_ref(), dest.as_ref()))
        })
        .collect()
}
