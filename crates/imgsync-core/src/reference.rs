//! Source reference classification.
//!
//! A configured source key follows `NAME[:TAG|@DIGEST]` with two
//! extensions: a comma-separated tag list (`nginx:1.25,1.26`) and a
//! slash-delimited pattern (`nginx:/^1\.2[0-9]$/`).

use std::fmt;

/// How the tags of one source repository are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDescriptor {
    /// Every tag the registry reports.
    All {
        /// Bare repository name.
        image: String,
    },
    /// An explicit list of tags, in declaration order.
    Tag {
        /// Bare repository name.
        image: String,
        /// Declared tags; duplicates are kept.
        tags: Vec<String>,
    },
    /// One immutable content digest.
    Digest {
        /// Bare repository name.
        image: String,
        /// Digest such as `sha256:...`.
        digest: String,
    },
    /// Tags matching a regular expression.
    Regex {
        /// Bare repository name.
        image: String,
        /// Pattern, used unanchored.
        pattern: String,
    },
    /// Tags satisfying a semantic-version range.
    Semver {
        /// Bare repository name.
        image: String,
        /// Range expression such as `>=1.25.0 <2`.
        range: String,
    },
}

impl SyncDescriptor {
    /// Bare repository name this descriptor selects tags from.
    #[must_use]
    pub fn image(&self) -> &str {
        match self {
            Self::All { image }
            | Self::Tag { image, .. }
            | Self::Digest { image, .. }
            | Self::Regex { image, .. }
            | Self::Semver { image, .. } => image,
        }
    }

    /// Whether resolution has to query the registry's tag list.
    #[must_use]
    pub const fn needs_tag_list(&self) -> bool {
        matches!(
            self,
            Self::All { .. } | Self::Regex { .. } | Self::Semver { .. }
        )
    }
}

impl fmt::Display for SyncDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All { image } => write!(f, "{image} (all tags)"),
            Self::Tag { image, tags } => write!(f, "{image}:{}", tags.join(",")),
            Self::Digest { image, digest } => write!(f, "{image}@{digest}"),
            Self::Regex { image, pattern } => write!(f, "{image} (tags matching /{pattern}/)"),
            Self::Semver { image, range } => write!(f, "{image} (versions {range})"),
        }
    }
}

/// Classifies a source reference.
///
/// Rules, in priority order:
/// 1. `image@digest` pins a digest (split on the first `@`).
/// 2. `image` without `:` selects every tag.
/// 3. `image:/pattern/` selects tags matching `pattern`.
/// 4. `image:a,b` selects the listed tags.
///
/// Never fails; an empty image name is left for configuration validation.
#[must_use]
pub fn classify(reference: &str) -> SyncDescriptor {
    if let Some((image, digest)) = reference.split_once('@') {
        return SyncDescriptor::Digest {
            image: image.to_string(),
            digest: digest.to_string(),
        };
    }

    let Some((image, rest)) = reference.split_once(':') else {
        return SyncDescriptor::All {
            image: reference.to_string(),
        };
    };
    let image = image.to_string();

    if rest.is_empty() {
        return SyncDescriptor::All { image };
    }

    if rest.len() >= 2 && rest.starts_with('/') && rest.ends_with('/') {
        return SyncDescriptor::Regex {
            image,
            pattern: rest[1..rest.len() - 1].to_string(),
        };
    }

    SyncDescriptor::Tag {
        image,
        tags: rest.split(',').map(str::to_string).collect(),
    }
}
