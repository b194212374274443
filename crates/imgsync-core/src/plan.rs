//! Resolution of a whole images file.
//!
//! Keys are independent, so they are resolved concurrently (bounded by a
//! semaphore) and reported back in declaration order.

use std::sync::Arc;

use imgsync_common::error::{ImgsyncError, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::SyncEntry;
use crate::pair::SyncPair;
use crate::reference::SyncDescriptor;
use crate::resolver::{TagLister, resolve};

/// Resolution outcome of one images file entry.
#[derive(Debug)]
pub struct KeyPlan {
    /// Key as written in the images file.
    pub key: String,
    /// Descriptor the key resolved through.
    pub descriptor: SyncDescriptor,
    /// Pairs to copy, or why the key could not be resolved.
    pub result: Result<Vec<SyncPair>>,
}

/// Resolution outcome of every entry, in declaration order.
#[derive(Debug, Default)]
pub struct Plan {
    /// One plan per entry.
    pub keys: Vec<KeyPlan>,
}

impl Plan {
    /// Number of keys that failed to resolve.
    #[must_use]
    pub fn failed_keys(&self) -> usize {
        self.keys.iter().filter(|k| k.result.is_err()).count()
    }

    /// Flattens the plan into the pairs to copy.
    ///
    /// # Errors
    ///
    /// Without `skip_error`, returns the error of the first failing key in
    /// declaration order. With it, failing keys are logged and skipped.
    pub fn into_pairs(self, skip_error: bool) -> Result<Vec<SyncPair>> {
        let mut pairs = Vec::new();
        for key_plan in self.keys {
            match key_plan.result {
                Ok(mut resolved) => pairs.append(&mut resolved),
                Err(e) if skip_error => {
                    tracing::warn!(key = %key_plan.key, error = %e, "skipping unresolved key");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(pairs)
    }
}

/// Resolves one entry; zero pairs means the image was not found.
///
/// # Errors
///
/// Returns [`ImgsyncError::ImageNotFound`] if nothing matched, or any
/// error from [`resolve`].
pub async fn plan_entry<L>(entry: &SyncEntry, lister: &L) -> Result<Vec<SyncPair>>
where
    L: TagLister + ?Sized,
{
    let descriptor = entry.descriptor();
    tracing::info!(
        key = %entry.key,
        descriptor = %descriptor,
        lists_tags = descriptor.needs_tag_list(),
        "resolving"
    );
    let pairs = resolve(&descriptor, &entry.destinations, lister).await?;
    if pairs.is_empty() {
        return Err(ImgsyncError::ImageNotFound {
            image: entry.key.clone(),
        });
    }
    Ok(pairs)
}

/// Resolves every entry with at most `concurrency` listings in flight.
///
/// Never fails as a whole: each key carries its own result.
pub async fn plan_all(
    entries: &[SyncEntry],
    lister: Arc<dyn TagLister>,
    concurrency: usize,
) -> Plan {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, entry) in entries.iter().cloned().enumerate() {
        let lister = Arc::clone(&lister);
        let permits = Arc::clone(&permits);
        let _ = tasks.spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(_permit) => plan_entry(&entry, lister.as_ref()).await,
                Err(e) => Err(ImgsyncError::Task {
                    message: e.to_string(),
                }),
            };
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<Vec<SyncPair>>>> =
        std::iter::repeat_with(|| None).take(entries.len()).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => tracing::error!(error = %e, "resolution task failed"),
        }
    }

    let keys = entries
        .iter()
        .zip(results)
        .map(|(entry, result)| KeyPlan {
            key: entry.key.clone(),
            descriptor: entry.descriptor(),
            result: result.unwrap_or_else(|| {
                Err(ImgsyncError::Task {
                    message: format!("resolution of {} did not complete", entry.key),
                })
            }),
        })
        .collect();
    Plan { keys }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::config::parse_images;
    use crate::resolver::TagList;

    struct Registry {
        repos: HashMap<&'static str, Vec<&'static str>>,
    }

    #[async_trait]
    impl TagLister for Registry {
        async fn list_tags(&self, image: &str) -> Result<TagList> {
            // later keys answer first, order must still follow the file
            let delay = 10_u64.saturating_sub(image.len() as u64);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.repos
                .get(image)
                .map(|tags| TagList {
                    repository: image.to_string(),
                    tags: tags.iter().map(|t| (*t).to_string()).collect(),
                })
                .ok_or_else(|| ImgsyncError::TagListingFailed {
                    image: image.to_string(),
                    diagnostic: "name unknown".into(),
                })
        }
    }

    fn registry() -> Arc<dyn TagLister> {
        let mut repos = HashMap::new();
        let _ = repos.insert("a", vec!["1", "2"]);
        let _ = repos.insert("bbbb", vec!["x"]);
        let _ = repos.insert("empty", vec![]);
        Arc::new(Registry { repos })
    }

    #[tokio::test]
    async fn plan_all_reports_in_declaration_order() {
        let entries = parse_images("a: m/a\nbbbb: m/b\nc:9: m/c\n").expect("should parse");
        let plan = plan_all(&entries, registry(), 3).await;
        let keys: Vec<&str> = plan.keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "bbbb", "c:9"]);

        let pairs = plan.into_pairs(false).expect("should flatten");
        let sources: Vec<&str> = pairs.iter().map(SyncPair::original_source).collect();
        assert_eq!(sources, vec!["a:1", "a:2", "bbbb:x", "c:9"]);
    }

    #[tokio::test]
    async fn plan_all_empty_listing_is_image_not_found() {
        let entries = parse_images("empty: m/e\n").expect("should parse");
        let plan = plan_all(&entries, registry(), 1).await;
        assert!(matches!(
            plan.keys[0].result,
            Err(ImgsyncError::ImageNotFound { ref image }) if image == "empty"
        ));
    }

    #[tokio::test]
    async fn plan_all_failure_does_not_affect_other_keys() {
        let entries = parse_images("missing: m/x\na: m/a\n").expect("should parse");
        let plan = plan_all(&entries, registry(), 2).await;
        assert_eq!(plan.failed_keys(), 1);
        assert!(plan.keys[1].result.is_ok());
    }

    #[tokio::test]
    async fn into_pairs_aborts_on_first_failure_without_skip() {
        let entries = parse_images("a: m/a\nmissing: m/x\nempty: m/e\n").expect("should parse");
        let plan = plan_all(&entries, registry(), 4).await;
        let err = plan.into_pairs(false).expect_err("should fail");
        assert!(matches!(err, ImgsyncError::TagListingFailed { ref image, .. } if image == "missing"));
    }

    #[tokio::test]
    async fn into_pairs_skips_failures_with_skip() {
        let entries = parse_images("missing: m/x\na: m/a\n").expect("should parse");
        let plan = plan_all(&entries, registry(), 0).await;
        let pairs = plan.into_pairs(true).expect("should flatten");
        assert_eq!(pairs.len(), 2);
    }

    #[tokio::test]
    async fn plan_all_with_no_entries_is_empty() {
        let plan = plan_all(&[], registry(), 4).await;
        assert!(plan.keys.is_empty());
    }
}
