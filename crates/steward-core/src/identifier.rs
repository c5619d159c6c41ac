//! Bucket and object URIs of the form `scheme://bucket[/path]`

use crate::{LifecycleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scheme used when none is configured
pub const DEFAULT_SCHEME: &str = "gs";

/// A single bucket, parsed from `scheme://bucket-name`
///
/// Nested paths are rejected: lifecycle policy applies to a whole bucket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketIdentifier {
    scheme: String,
    name: String,
}

impl BucketIdentifier {
    /// Parse and validate a bucket URI
    pub fn parse(value: &str) -> Result<Self> {
        let (scheme, rest) = split_scheme(value)?;
        let name = rest.strip_suffix('/').unwrap_or(rest);

        if name.is_empty() {
            return Err(LifecycleError::invalid_identifier(value, "missing bucket name"));
        }
        if name.contains('/') {
            return Err(LifecycleError::invalid_identifier(
                value,
                "must name exactly one bucket without a nested path",
            ));
        }
        validate_bucket_name(name).map_err(|reason| LifecycleError::invalid_identifier(value, reason))?;

        Ok(Self {
            scheme: scheme.to_string(),
            name: name.to_string(),
        })
    }

    /// Build an identifier from a bare bucket name using the default scheme
    pub fn from_name(name: &str) -> Result<Self> {
        Self::parse(&format!("{}://{}", DEFAULT_SCHEME, name))
    }

    /// Get bucket name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get URI scheme
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl fmt::Display for BucketIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.name)
    }
}

impl FromStr for BucketIdentifier {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BucketIdentifier {
    type Error = LifecycleError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<BucketIdentifier> for String {
    fn from(id: BucketIdentifier) -> Self {
        id.to_string()
    }
}

/// An object (or object prefix) inside a bucket: `scheme://bucket/path/to/object`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectUri {
    bucket: BucketIdentifier,
    path: String,
}

impl ObjectUri {
    /// Parse an object URI; the path may be empty
    pub fn parse(value: &str) -> Result<Self> {
        let (scheme, rest) = split_scheme(value)?;
        let (bucket, path) = match rest.split_once('/') {
            Some((bucket, path)) => (bucket, path),
            None => (rest, ""),
        };

        if path.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(LifecycleError::invalid_identifier(
                value,
                "object path cannot contain relative segments",
            ));
        }

        let bucket = BucketIdentifier::parse(&format!("{}://{}", scheme, bucket))
            .map_err(|e| match e {
                LifecycleError::InvalidIdentifier { reason, .. } => {
                    LifecycleError::invalid_identifier(value, reason)
                }
                other => other,
            })?;

        Ok(Self {
            bucket,
            path: path.to_string(),
        })
    }

    /// Get the bucket part
    pub fn bucket(&self) -> &BucketIdentifier {
        &self.bucket
    }

    /// Get the object path (no leading slash)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append a relative object name to this prefix
    pub fn join(&self, name: &str) -> Self {
        let name = name.trim_start_matches('/');
        let path = if self.path.is_empty() {
            name.to_string()
        } else if self.path.ends_with('/') {
            format!("{}{}", self.path, name)
        } else {
            format!("{}/{}", self.path, name)
        };
        Self {
            bucket: self.bucket.clone(),
            path,
        }
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

impl FromStr for ObjectUri {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn split_scheme(value: &str) -> Result<(&str, &str)> {
    let (scheme, rest) = value
        .split_once("://")
        .ok_or_else(|| LifecycleError::invalid_identifier(value, "expected scheme://bucket"))?;

    let valid_scheme = !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_lowercase())
        && scheme
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return Err(LifecycleError::invalid_identifier(value, "invalid URI scheme"));
    }

    Ok((scheme, rest))
}

/// Validate bucket name according to storage naming rules
pub fn validate_bucket_name(name: &str) -> std::result::Result<(), String> {
    if name.len() < 3 || name.len() > 63 {
        return Err("bucket name must be between 3 and 63 characters".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    {
        return Err(
            "bucket name can only contain lowercase letters, numbers, hyphens, underscores, and periods"
                .to_string(),
        );
    }

    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if !name.starts_with(alnum) || !name.ends_with(alnum) {
        return Err("bucket name must start and end with a letter or number".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("gs://ci-artifacts", "gs", "ci-artifacts")]
    #[case("gs://ci-artifacts/", "gs", "ci-artifacts")]
    #[case("s3://build_cache.v2", "s3", "build_cache.v2")]
    fn test_parse_bucket(#[case] input: &str, #[case] scheme: &str, #[case] name: &str) {
        let id = BucketIdentifier::parse(input).unwrap();
        assert_eq!(id.scheme(), scheme);
        assert_eq!(id.name(), name);
    }

    #[rstest]
    #[case("ci-artifacts")]
    #[case("gs://")]
    #[case("gs://bucket/sub/path")]
    #[case("gs://bucket/sub")]
    #[case("gs://ab")]
    #[case("gs://-bucket")]
    #[case("gs://Bucket")]
    #[case("GS://bucket")]
    #[case("://bucket")]
    fn test_reject_bucket(#[case] input: &str) {
        let err = BucketIdentifier::parse(input).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_display_round_trips() {
        let id: BucketIdentifier = "gs://ci-artifacts/".parse().unwrap();
        assert_eq!(id.to_string(), "gs://ci-artifacts");
        assert_eq!(BucketIdentifier::from_name("ci-artifacts").unwrap(), id);
    }

    #[test]
    fn test_object_uri() {
        let uri = ObjectUri::parse("gs://ci-artifacts/builds/42/app.tar").unwrap();
        assert_eq!(uri.bucket().name(), "ci-artifacts");
        assert_eq!(uri.path(), "builds/42/app.tar");

        let root = ObjectUri::parse("gs://ci-artifacts").unwrap();
        assert_eq!(root.path(), "");
        assert_eq!(root.join("a/b.txt").path(), "a/b.txt");

        let prefix = ObjectUri::parse("gs://ci-artifacts/builds/").unwrap();
        assert_eq!(prefix.join("/a.txt").path(), "builds/a.txt");
        assert_eq!(ObjectUri::parse("gs://ci-artifacts/builds").unwrap().join("a.txt").path(), "builds/a.txt");

        assert!(ObjectUri::parse("gs://ci-artifacts/../etc").is_err());
        assert!(ObjectUri::parse("gs://A/x").is_err());
    }

    proptest! {
        #[test]
        fn prop_nested_paths_always_rejected(
            bucket in "[a-z0-9][a-z0-9-]{1,30}[a-z0-9]",
            first in "[a-z0-9]{1,10}",
            rest in proptest::collection::vec("[a-z0-9]{1,10}", 0..4),
        ) {
            let mut uri = format!("gs://{}/{}", bucket, first);
            for segment in rest {
                uri.push('/');
                uri.push_str(&segment);
            }
            prop_assert!(BucketIdentifier::parse(&uri).is_err());
        }

        #[test]
        fn prop_valid_names_accepted(bucket in "[a-z0-9][a-z0-9-]{1,30}[a-z0-9]") {
            let id = BucketIdentifier::parse(&format!("gs://{}", bucket)).unwrap();
            prop_assert_eq!(id.name(), bucket.as_str());
        }
    }
}
