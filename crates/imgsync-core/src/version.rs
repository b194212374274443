//! Semantic-version matching for registry tags.
//!
//! Registry tags are rarely clean versions (`1.25-alpine3.17`, `v2`,
//! `2024.01`), so tags are coerced before matching: the first run of one to
//! three dot-separated numbers becomes `major.minor.patch`, zero-filled.
//!
//! Ranges use npm syntax (`>=1.2 <2 || ^3`) and are translated into
//! [`semver::VersionReq`] alternatives.

use imgsync_common::error::{ImgsyncError, Result};
use nom::{
    IResult, Parser,
    character::complete::{char, digit1},
    combinator::map_res,
    multi::many_m_n,
    sequence::preceded,
};
use semver::{Prerelease, Version, VersionReq};

fn component(input: &str) -> IResult<&str, u64> {
    map_res(digit1, str::parse::<u64>).parse(input)
}

/// `MAJOR[.MINOR[.PATCH]]` at the start of `input`.
fn numeric_run(input: &str) -> IResult<&str, (u64, Vec<u64>)> {
    (component, many_m_n(0, 2, preceded(char('.'), component))).parse(input)
}

/// Interprets a tag as a version, leniently.
///
/// Tags that already are valid versions (optionally prefixed with `v` or
/// `=`) are kept as is when they carry no pre-release or a release-channel
/// one (`rc.1`, `beta2`). A variant suffix such as `-alpine` or `-slim` is
/// not a pre-release: those tags, and anything else, are coerced from their
/// first numeric run. Returns `None` if the tag holds no number.
#[must_use]
pub fn coerce(tag: &str) -> Option<Version> {
    let trimmed = tag.trim().trim_start_matches(['v', 'V', '=']);
    if let Ok(version) = Version::parse(trimmed) {
        if is_release_channel(&version.pre) {
            return Some(version);
        }
    }

    let mut prev_digit = false;
    for (idx, c) in tag.char_indices() {
        let is_digit = c.is_ascii_digit();
        if is_digit && !prev_digit {
            if let Ok((_, (major, rest))) = numeric_run(&tag[idx..]) {
                let minor = rest.first().copied().unwrap_or(0);
                let patch = rest.get(1).copied().unwrap_or(0);
                return Some(Version::new(major, minor, patch));
            }
        }
        prev_digit = is_digit;
    }
    None
}

/// Pre-release labels treated as release channels rather than image variants.
const RELEASE_CHANNELS: [&str; 10] = [
    "alpha", "a", "beta", "b", "rc", "pre", "preview", "dev", "snapshot", "nightly",
];

/// Whether `pre` is empty or starts with a release-channel label, digits
/// ignored (`rc1`, `beta.2`).
fn is_release_channel(pre: &Prerelease) -> bool {
    if pre.is_empty() {
        return true;
    }
    let label = pre
        .as_str()
        .split('.')
        .next()
        .unwrap_or_default()
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_ascii_lowercase();
    RELEASE_CHANNELS.contains(&label.as_str())
}

/// A parsed range: satisfied when any `||` alternative matches.
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parses an npm-style range expression.
    ///
    /// # Errors
    ///
    /// Returns [`ImgsyncError::InvalidRange`] if any alternative does not
    /// translate into a valid requirement.
    pub fn parse(range: &str) -> Result<Self> {
        let alternatives = range
            .split("||")
            .map(|alternative| {
                let expr = translate(alternative);
                VersionReq::parse(&expr).map_err(|e| ImgsyncError::InvalidRange {
                    range: range.to_string(),
                    message: format!("{expr:?}: {e}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            raw: range.to_string(),
            alternatives,
        })
    }

    /// Range as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `version` satisfies the range.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Coerces `tag` and tests it; tags without a version never match.
    #[must_use]
    pub fn matches_tag(&self, tag: &str) -> bool {
        coerce(tag).is_some_and(|v| self.matches(&v))
    }
}

const fn is_op_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^')
}

/// Rewrites one npm alternative as a comma-separated `VersionReq` string.
fn translate(alternative: &str) -> String {
    let words: Vec<&str> = alternative.split_whitespace().collect();
    if words.is_empty() {
        return "*".to_string();
    }
    if let [low, "-", high] = words.as_slice() {
        return format!(">={}, <={}", strip_v(low), strip_v(high));
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;
    for word in words {
        if word.chars().all(is_op_char) {
            pending_op = Some(word);
            continue;
        }
        let comparator = match pending_op.take() {
            Some(op) => format!("{op}{word}"),
            None => word.to_string(),
        };
        comparators.push(normalize(&comparator));
    }
    // a dangling operator is left in place so parsing reports it
    if let Some(op) = pending_op {
        comparators.push(op.to_string());
    }
    comparators.join(", ")
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix(['v', 'V']).unwrap_or(version)
}

/// npm reads a bare version as "exactly this (partial) version" while
/// `VersionReq` reads it as a caret requirement.
fn normalize(comparator: &str) -> String {
    let split = comparator
        .find(|c: char| !is_op_char(c))
        .unwrap_or(comparator.len());
    let (op, version) = comparator.split_at(split);
    let version = strip_v(version);

    let core = version.split(['-', '+']).next().unwrap_or_default();
    let wildcard = core.split('.').any(|p| matches!(p, "x" | "X" | "*"));
    let numeric = version.starts_with(|c: char| c.is_ascii_digit());

    if op.is_empty() && numeric && !wildcard {
        format!("={version}")
    } else {
        format!("{op}{version}")
    }
}
