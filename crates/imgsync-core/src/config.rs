//! Images and auth file models.
//!
//! The images file maps a source key to its destinations:
//!
//! ```yaml
//! nginx: registry.example.com/mirror/nginx
//! nginx:1.25,1.26:
//!   - registry-a.example.com/nginx
//!   - registry-b.example.com/nginx
//! quay.io/coreos/kube-rbac-proxy:/^v0\.1[0-9]/: registry.example.com/kube-rbac-proxy
//! library/postgres:
//!   semver: ">=15 <17"
//!   dest: registry.example.com/postgres
//! library/redis:
//!   regex: "^7\\."
//!   dest: [registry.example.com/redis]
//! ```
//!
//! The auth file maps a registry host to credential templates:
//!
//! ```yaml
//! ghcr.io:
//!   username: ${GITHUB_ACTOR}
//!   password: ${GITHUB_TOKEN}
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use imgsync_common::error::{ImgsyncError, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::reference::{SyncDescriptor, classify};

/// One destination or several.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Destinations {
    One(String),
    Many(Vec<String>),
}

impl From<Destinations> for Vec<String> {
    fn from(value: Destinations) -> Self {
        match value {
            Destinations::One(dest) => vec![dest],
            Destinations::Many(dests) => dests,
        }
    }
}

/// A range written as a string or as a bare YAML number (`semver: 1.25`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RangeValue {
    Text(String),
    Number(serde_yaml::Number),
}

impl From<RangeValue> for String {
    fn from(value: RangeValue) -> Self {
        match value {
            RangeValue::Text(text) => text,
            RangeValue::Number(number) => number.to_string(),
        }
    }
}

/// Raw value of an images file entry. `semver` wins over `regex`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EntryValue {
    Destinations(Destinations),
    Semver { semver: RangeValue, dest: Destinations },
    Regex { regex: String, dest: Destinations },
}

/// Tag filter given explicitly instead of encoded in the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// npm-style version range.
    Semver(String),
    /// Unanchored regular expression.
    Regex(String),
}

/// One validated images file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    /// Key as written in the file.
    pub key: String,
    /// Structured filter; when set the key is a bare repository name.
    pub filter: Option<TagFilter>,
    /// Destination repositories, at least one.
    pub destinations: Vec<String>,
}

impl SyncEntry {
    /// Descriptor for this entry: the structured filter if present,
    /// otherwise the classified key.
    #[must_use]
    pub fn descriptor(&self) -> SyncDescriptor {
        match &self.filter {
            Some(TagFilter::Semver(range)) => SyncDescriptor::Semver {
                image: self.key.clone(),
                range: range.clone(),
            },
            Some(TagFilter::Regex(pattern)) => SyncDescriptor::Regex {
                image: self.key.clone(),
                pattern: pattern.clone(),
            },
            None => classify(&self.key),
        }
    }

    fn from_raw(key: String, value: EntryValue) -> Result<Self> {
        let (filter, destinations): (_, Vec<String>) = match value {
            EntryValue::Destinations(dest) => (None, dest.into()),
            EntryValue::Semver { semver, dest } => {
                (Some(TagFilter::Semver(semver.into())), dest.into())
            }
            EntryValue::Regex { regex, dest } => (Some(TagFilter::Regex(regex)), dest.into()),
        };

        if key.is_empty() || key.starts_with([':', '@']) {
            return Err(ImgsyncError::Config {
                message: format!("{key:?}: source image name is empty"),
            });
        }
        if destinations.is_empty() || destinations.iter().any(String::is_empty) {
            return Err(ImgsyncError::Config {
                message: format!("{key}: at least one non-empty destination is required"),
            });
        }

        Ok(Self {
            key,
            filter,
            destinations,
        })
    }
}

/// Registry credentials, possibly holding `$VAR` references.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// User name or template.
    pub username: String,
    /// Password or template.
    pub password: String,
}

impl Credentials {
    /// Substitutes variable references in both fields from `lookup`.
    #[must_use]
    pub fn inject<F>(&self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            username: imgsync_template::inject(&self.username, &lookup),
            password: imgsync_template::inject(&self.password, &lookup),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One auth file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEntry {
    /// Registry host, e.g. `ghcr.io`.
    pub registry: String,
    /// Credentials for that registry.
    pub credentials: Credentials,
}

/// Reads and validates an images file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a YAML mapping, or an
/// entry has an unsupported shape.
pub fn load_images(path: &Path) -> Result<Vec<SyncEntry>> {
    let content = read(path)?;
    parse_images_from(&content, path)
}

/// Parses images file content.
///
/// # Errors
///
/// Same as [`load_images`].
pub fn parse_images(content: &str) -> Result<Vec<SyncEntry>> {
    parse_images_from(content, Path::new("<inline>"))
}

fn parse_images_from(content: &str, origin: &Path) -> Result<Vec<SyncEntry>> {
    entries(content, origin)?
        .into_iter()
        .map(|(key, value)| {
            let raw: EntryValue = serde_yaml::from_value(value).map_err(|e| ImgsyncError::Config {
                message: format!("{key}: expected a destination, a list of destinations, or a semver/regex mapping ({e})"),
            })?;
            SyncEntry::from_raw(key, raw)
        })
        .collect()
}

/// Reads an auth file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or an entry lacks
/// `username` / `password`.
pub fn load_auth(path: &Path) -> Result<Vec<AuthEntry>> {
    let content = read(path)?;
    parse_auth_from(&content, path)
}

/// Parses auth file content.
///
/// # Errors
///
/// Same as [`load_auth`].
pub fn parse_auth(content: &str) -> Result<Vec<AuthEntry>> {
    parse_auth_from(content, Path::new("<inline>"))
}

fn parse_auth_from(content: &str, origin: &Path) -> Result<Vec<AuthEntry>> {
    entries(content, origin)?
        .into_iter()
        .map(|(registry, value)| {
            let credentials: Credentials =
                serde_yaml::from_value(value).map_err(|e| ImgsyncError::Config {
                    message: format!("{registry}: {e}"),
                })?;
            Ok(AuthEntry {
                registry,
                credentials,
            })
        })
        .collect()
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ImgsyncError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Top-level mapping entries in document order. An empty document is empty.
fn entries(content: &str, origin: &Path) -> Result<Vec<(String, Value)>> {
    let yaml_error = |message: String| ImgsyncError::Yaml {
        path: PathBuf::from(origin),
        message,
    };

    let document: Value = serde_yaml::from_str(content).map_err(|e| yaml_error(e.to_string()))?;
    let mapping = match document {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(yaml_error("top level must be a mapping".into())),
    };

    mapping
        .into_iter()
        .map(|(key, value)| match key {
            Value::String(key) => Ok((key, value)),
            other => Err(yaml_error(format!("keys must be strings, found {other:?}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGES: &str = r"
quay.io/coreos/kube-rbac-proxy: quay.io/ruohe/kube-rbac-proxy
quay.io/coreos/kube-rbac-proxy:v1.0: quay.io/ruohe/kube-rbac-proxy
quay.io/coreos/kube-rbac-proxy:v1.0,v2.0: quay.io/ruohe/kube-rbac-proxy
quay.io/coreos/kube-rbac-proxy@sha256:14b267eb38aa85fd12d0e168fffa2d8a6187ac53a14a0212b0d4fce8d729598c: quay.io/ruohe/kube-rbac-proxy
quay.io/coreos/kube-rbac-proxy:v1.1:
  - quay.io/ruohe/kube-rbac-proxy1
  - quay.io/ruohe/kube-rbac-proxy2
quay.io/coreos/kube-rbac-proxy:/a+/: quay.io/ruohe/kube-rbac-proxy
library/nginx:
  semver: '>=1.25.0'
  dest: registry.example.com/nginx
library/redis:
  regex: '^7\.'
  dest:
    - a.example.com/redis
    - b.example.com/redis
";

    #[test]
    fn parse_images_keeps_document_order() {
        let entries = parse_images(IMAGES).expect("should parse");
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys[0], "quay.io/coreos/kube-rbac-proxy");
        assert_eq!(keys[5], "quay.io/coreos/kube-rbac-proxy:/a+/");
        assert_eq!(keys[7], "library/redis");
        assert_eq!(entries.len(), 8);
    }

    #[test]
    fn parse_images_single_destination_becomes_list() {
        let entries = parse_images(IMAGES).expect("should parse");
        assert_eq!(entries[0].destinations, vec!["quay.io/ruohe/kube-rbac-proxy"]);
        assert_eq!(entries[4].destinations.len(), 2);
    }

    #[test]
    fn parse_images_classifies_keys() {
        let entries = parse_images(IMAGES).expect("should parse");
        assert!(matches!(entries[0].descriptor(), SyncDescriptor::All { .. }));
        assert!(matches!(entries[2].descriptor(), SyncDescriptor::Tag { ref tags, .. } if tags.len() == 2));
        assert!(matches!(entries[3].descriptor(), SyncDescriptor::Digest { .. }));
        assert!(matches!(entries[5].descriptor(), SyncDescriptor::Regex { .. }));
    }

    #[test]
    fn parse_images_structured_semver_overrides_key() {
        let entries = parse_images(IMAGES).expect("should parse");
        assert_eq!(
            entries[6].descriptor(),
            SyncDescriptor::Semver {
                image: "library/nginx".into(),
                range: ">=1.25.0".into(),
            }
        );
    }

    #[test]
    fn parse_images_structured_regex_overrides_key() {
        let entries = parse_images(IMAGES).expect("should parse");
        assert_eq!(
            entries[7].descriptor(),
            SyncDescriptor::Regex {
                image: "library/redis".into(),
                pattern: "^7\\.".into(),
            }
        );
        assert_eq!(entries[7].destinations.len(), 2);
    }

    #[test]
    fn parse_images_numeric_semver_becomes_string() {
        let entries = parse_images("node:\n  semver: 20\n  dest: m/node\n").expect("should parse");
        assert_eq!(entries[0].filter, Some(TagFilter::Semver("20".into())));
    }

    #[test]
    fn parse_images_semver_wins_over_regex() {
        let entries = parse_images("node:\n  semver: '^20'\n  regex: x\n  dest: m/node\n")
            .expect("should parse");
        assert!(matches!(entries[0].filter, Some(TagFilter::Semver(_))));
    }

    #[test]
    fn parse_images_empty_document_is_empty() {
        assert!(parse_images("").expect("should parse").is_empty());
    }

    #[test]
    fn parse_images_rejects_unsupported_shape() {
        let err = parse_images("nginx:\n  dest: m/nginx\n").expect_err("should fail");
        assert!(matches!(err, ImgsyncError::Config { ref message } if message.starts_with("nginx:")));
    }

    #[test]
    fn parse_images_rejects_empty_image_name() {
        assert!(parse_images("':latest': m/nginx\n").is_err());
        assert!(parse_images("'@sha256:abc': m/nginx\n").is_err());
    }

    #[test]
    fn parse_images_rejects_empty_destination_list() {
        assert!(parse_images("nginx: []\n").is_err());
    }

    #[test]
    fn parse_images_rejects_top_level_list() {
        let err = parse_images("- nginx\n").expect_err("should fail");
        assert!(matches!(err, ImgsyncError::Yaml { .. }));
    }

    #[test]
    fn load_images_reads_file() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join("images.yml");
        std::fs::write(&path, IMAGES).expect("failed to write");
        assert_eq!(load_images(&path).expect("should load").len(), 8);
    }

    #[test]
    fn load_images_missing_file_is_io_error() {
        let err = load_images(Path::new("/nonexistent/images.yml")).expect_err("should fail");
        assert!(matches!(err, ImgsyncError::Io { .. }));
    }

    #[test]
    fn parse_auth_reads_credentials() {
        let auth = parse_auth("ghcr.io:\n  username: ${user}\n  password: $pw\n")
            .expect("should parse");
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0].registry, "ghcr.io");
        assert_eq!(auth[0].credentials.username, "${user}");
    }

    #[test]
    fn parse_auth_requires_password() {
        assert!(parse_auth("ghcr.io:\n  username: u\n").is_err());
    }

    #[test]
    fn credentials_inject_substitutes_both_fields() {
        let creds = Credentials {
            username: "${USER}".into(),
            password: "pre-$token".into(),
        };
        let injected = creds.inject(|k| match k {
            "user" => Some("alice".into()),
            "token" => Some("s3cret".into()),
            _ => None,
        });
        assert_eq!(injected.username, "alice");
        assert_eq!(injected.password, "pre-s3cret");
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "alice".into(),
            password: "s3cret".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }
}
