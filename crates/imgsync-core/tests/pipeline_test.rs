//! End-to-end tests for the resolution pipeline.
//!
//! These tests drive the full flow with in-memory collaborators:
//! 1. Parse an images file
//! 2. Classify keys and apply structured overrides
//! 3. Resolve tags through a fake registry
//! 4. Cross with destinations
//! 5. Copy through a recording copier

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use imgsync_common::error::{ImgsyncError, Result};
use imgsync_core::config::parse_images;
use imgsync_core::executor::{CopyOutput, ImageCopier, copy_all};
use imgsync_core::plan::plan_all;
use imgsync_core::{SyncPair, TagList, TagLister};

struct FakeRegistry {
    repos: HashMap<String, Vec<String>>,
}

impl FakeRegistry {
    fn with(repos: &[(&str, &[&str])]) -> Arc<Self> {
        Arc::new(Self {
            repos: repos
                .iter()
                .map(|(name, tags)| {
                    (
                        (*name).to_string(),
                        tags.iter().map(|t| (*t).to_string()).collect(),
                    )
                })
                .collect(),
        })
    }
}

#[async_trait]
impl TagLister for FakeRegistry {
    async fn list_tags(&self, image: &str) -> Result<TagList> {
        let tags = self
            .repos
            .get(image)
            .cloned()
            .ok_or_else(|| ImgsyncError::TagListingFailed {
                image: image.to_string(),
                diagnostic: format!("reading manifest in {image}: name unknown"),
            })?;
        Ok(TagList {
            repository: image.to_string(),
            tags,
        })
    }
}

#[derive(Default)]
struct RecordingCopier {
    copies: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ImageCopier for RecordingCopier {
    async fn copy(&self, pair: &SyncPair) -> Result<CopyOutput> {
        self.copies
            .lock()
            .expect("poisoned")
            .push((pair.source.clone(), pair.destination.clone()));
        Ok(CopyOutput::default())
    }
}

const IMAGES: &str = r"
nginx:1.25,1.26:
  - mirror-a.example.com/nginx
  - mirror-b.example.com/nginx
library/postgres:
  semver: '>=15 <17'
  dest: mirror-a.example.com/postgres
quay.io/coreos/kube-rbac-proxy:/^v0\.1[0-9]/: mirror-a.example.com/kube-rbac-proxy
alpine@sha256:0123: mirror-a.example.com/alpine
busybox: mirror-a.example.com/busybox
";

fn registry() -> Arc<FakeRegistry> {
    FakeRegistry::with(&[
        (
            "library/postgres",
            &["14.9", "15", "15.4-alpine", "16.1", "17.0", "latest"][..],
        ),
        (
            "quay.io/coreos/kube-rbac-proxy",
            &["v0.4.1", "v0.13.0", "v0.15.0", "latest"][..],
        ),
        ("busybox", &["1.36", "musl"][..]),
    ])
}

#[tokio::test]
async fn pipeline_resolves_every_descriptor_kind() {
    let entries = parse_images(IMAGES).expect("should parse");
    let plan = plan_all(&entries, registry(), 2).await;
    let pairs = plan.into_pairs(false).expect("should resolve");

    let flat: Vec<(&str, &str)> = pairs
        .iter()
        .map(|p| (p.original_source(), p.original_destination()))
        .collect();
    assert_eq!(
        flat,
        vec![
            ("nginx:1.25", "mirror-a.example.com/nginx"),
            ("nginx:1.25", "mirror-b.example.com/nginx"),
            ("nginx:1.26", "mirror-a.example.com/nginx"),
            ("nginx:1.26", "mirror-b.example.com/nginx"),
            ("library/postgres:15", "mirror-a.example.com/postgres"),
            ("library/postgres:15.4-alpine", "mirror-a.example.com/postgres"),
            ("library/postgres:16.1", "mirror-a.example.com/postgres"),
            (
                "quay.io/coreos/kube-rbac-proxy:v0.13.0",
                "mirror-a.example.com/kube-rbac-proxy"
            ),
            (
                "quay.io/coreos/kube-rbac-proxy:v0.15.0",
                "mirror-a.example.com/kube-rbac-proxy"
            ),
            ("alpine@sha256:0123", "mirror-a.example.com/alpine"),
            ("busybox:1.36", "mirror-a.example.com/busybox"),
            ("busybox:musl", "mirror-a.example.com/busybox"),
        ]
    );
}

#[tokio::test]
async fn pipeline_copies_with_transport_prefix() {
    let entries = parse_images("busybox: mirror-a.example.com/busybox\n").expect("should parse");
    let pairs = plan_all(&entries, registry(), 1)
        .await
        .into_pairs(false)
        .expect("should resolve");

    let copier = RecordingCopier::default();
    let report = copy_all(&pairs, &copier, false).await.expect("should copy");
    assert_eq!(report.succeeded(), 2);

    let copies = copier.copies.lock().expect("poisoned").clone();
    assert_eq!(
        copies[0],
        (
            "docker://busybox:1.36".to_string(),
            "docker://mirror-a.example.com/busybox".to_string()
        )
    );
}

#[tokio::test]
async fn pipeline_unknown_repository_surfaces_listing_diagnostic() {
    let entries = parse_images("ghost: mirror-a.example.com/ghost\n").expect("should parse");
    let err = plan_all(&entries, registry(), 1)
        .await
        .into_pairs(false)
        .expect_err("should fail");
    match err {
        ImgsyncError::TagListingFailed { diagnostic, .. } => {
            assert!(diagnostic.contains("name unknown"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn pipeline_filter_matching_nothing_is_image_not_found() {
    let entries = parse_images("busybox:\n  regex: '^9'\n  dest: m/busybox\n").expect("should parse");
    let err = plan_all(&entries, registry(), 1)
        .await
        .into_pairs(false)
        .expect_err("should fail");
    assert!(matches!(err, ImgsyncError::ImageNotFound { ref image } if image == "busybox"));
}
