//! Resolution of a sync descriptor into concrete copy pairs.
//!
//! Only [`SyncDescriptor::All`], [`SyncDescriptor::Regex`] and
//! [`SyncDescriptor::Semver`] need the registry's tag list; the listing is
//! delegated to a [`TagLister`] so the engine never touches the network.

use async_trait::async_trait;
use imgsync_common::error::{ImgsyncError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pair::{SyncPair, cartesian};
use crate::reference::SyncDescriptor;
use crate::version::VersionRange;

/// Tags reported by a registry for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagList {
    /// Repository the tags belong to.
    #[serde(rename = "Repository")]
    pub repository: String,
    /// Tags in registry order, assumed deduplicated.
    #[serde(rename = "Tags")]
    pub tags: Vec<String>,
}

/// Capability to list the tags of a repository.
#[async_trait]
pub trait TagLister: Send + Sync {
    /// Lists the tags of `image` (a bare repository name).
    ///
    /// # Errors
    ///
    /// Returns an error carrying the registry or tool diagnostic.
    async fn list_tags(&self, image: &str) -> Result<TagList>;
}

/// Resolves `descriptor` against `destinations`.
///
/// Pairs keep the listing (or declaration) order of tags, with
/// destinations as the inner loop. An empty tag list yields no pairs.
///
/// # Errors
///
/// Returns [`ImgsyncError::TagListingFailed`] if the listing fails, and
/// [`ImgsyncError::InvalidPattern`] / [`ImgsyncError::InvalidRange`] if the
/// filter does not compile. No partial result is returned.
pub async fn resolve<L>(
    descriptor: &SyncDescriptor,
    destinations: &[String],
    lister: &L,
) -> Result<Vec<SyncPair>>
where
    L: TagLister + ?Sized,
{
    let sources = source_images(descriptor, lister).await?;
    tracing::debug!(
        image = descriptor.image(),
        sources = sources.len(),
        destinations = destinations.len(),
        "resolved source images"
    );
    Ok(cartesian(&sources, destinations))
}

/// Expands `descriptor` into the fully qualified source images to copy.
///
/// # Errors
///
/// Same as [`resolve`].
pub async fn source_images<L>(descriptor: &SyncDescriptor, lister: &L) -> Result<Vec<String>>
where
    L: TagLister + ?Sized,
{
    match descriptor {
        SyncDescriptor::Tag { image, tags } => {
            Ok(tags.iter().map(|tag| format!("{image}:{tag}")).collect())
        }
        SyncDescriptor::Digest { image, digest } => Ok(vec![format!("{image}@{digest}")]),
        SyncDescriptor::All { image } => {
            let listed = list(lister, image).await?;
            Ok(tagged(image, listed.tags.iter()))
        }
        SyncDescriptor::Regex { image, pattern } => {
            let regex = Regex::new(pattern).map_err(|e| ImgsyncError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            let listed = list(lister, image).await?;
            Ok(tagged(
                image,
                listed.tags.iter().filter(|tag| regex.is_match(tag)),
            ))
        }
        SyncDescriptor::Semver { image, range } => {
            let range = VersionRange::parse(range)?;
            let listed = list(lister, image).await?;
            let matched = tagged(
                image,
                listed.tags.iter().filter(|tag| range.matches_tag(tag)),
            );
            tracing::debug!(
                image,
                range = range.as_str(),
                matched = matched.len(),
                "filtered tags by version range"
            );
            Ok(matched)
        }
    }
}

async fn list<L>(lister: &L, image: &str) -> Result<TagList>
where
    L: TagLister + ?Sized,
{
    let listed = lister.list_tags(image).await.map_err(|e| match e {
        ImgsyncError::TagListingFailed { .. } => e,
        other => ImgsyncError::TagListingFailed {
            image: image.to_string(),
            diagnostic: other.to_string(),
        },
    })?;
    tracing::info!(image, tags = listed.tags.len(), "listed tags");
    Ok(listed)
}

fn tagged<'a, I>(image: &str, tags: I) -> Vec<String>
where
    I: Iterator<Item = &'a String>,
{
    tags.map(|tag| format!("{image}:{tag}")).collect()
}
