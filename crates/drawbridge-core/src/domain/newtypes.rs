//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the identifiers that cross module boundaries.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// TargetName
// ============================================================================

/// User-chosen name of a configured remote endpoint
///
/// Target names key the persisted target list, the secret-store entries,
/// and the connection cache, so they must be non-empty and must not
/// contain the `/` used to compose secret-store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetName(String);

impl TargetName {
    /// Create a new TargetName
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTargetName` if the name is empty or
    /// contains `/`
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidTargetName(
                "Target name cannot be empty".to_string(),
            ));
        }
        if name.contains('/') {
            return Err(DomainError::InvalidTargetName(format!(
                "Target name cannot contain '/': {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TargetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TargetName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TargetName> for String {
    fn from(name: TargetName) -> Self {
        name.0
    }
}

// ============================================================================
// BucketName
// ============================================================================

/// Name of a bucket within a target
///
/// Restricted to the portable S3 subset: lowercase letters, digits,
/// hyphens and dots, at most 63 characters, starting and ending
/// alphanumeric. No minimum length beyond non-empty; compatible stores
/// accept short names like `b1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BucketName(String);

impl BucketName {
    /// Create a new BucketName
    ///
    /// # Errors
    /// Returns `DomainError::InvalidBucketName` if the name violates the
    /// portable S3 naming rules
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.is_empty() || name.len() > 63 {
            return Err(DomainError::InvalidBucketName(format!(
                "Bucket name must be 1-63 characters: {name}"
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        {
            return Err(DomainError::InvalidBucketName(format!(
                "Bucket name contains invalid characters: {name}"
            )));
        }
        let first = name.chars().next().unwrap_or('-');
        let last = name.chars().last().unwrap_or('-');
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return Err(DomainError::InvalidBucketName(format!(
                "Bucket name must start and end with a letter or digit: {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BucketName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BucketName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BucketName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BucketName> for String {
    fn from(name: BucketName) -> Self {
        name.0
    }
}

// ============================================================================
// ObjectKey
// ============================================================================

/// Flat object-store key derived from a logical tree path
///
/// The single source of truth for object identity: two nodes denote the
/// same stored object iff their derived keys are equal. Directory keys end
/// in `/`; file keys never do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey
    ///
    /// # Errors
    /// Returns `DomainError::InvalidObjectKey` if the key is empty, starts
    /// with `/`, contains empty segments, or contains `..`
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.is_empty() {
            return Err(DomainError::InvalidObjectKey(
                "Object key cannot be empty".to_string(),
            ));
        }
        if key.starts_with('/') {
            return Err(DomainError::InvalidObjectKey(format!(
                "Object key cannot start with '/': {key}"
            )));
        }
        if key.contains("//") {
            return Err(DomainError::InvalidObjectKey(format!(
                "Object key contains empty segment: {key}"
            )));
        }
        if key.split('/').any(|segment| segment == "..") {
            return Err(DomainError::InvalidObjectKey(format!(
                "Object key contains traversal: {key}"
            )));
        }
        Ok(Self(key))
    }

    /// Builds a key from segments already validated as node names
    ///
    /// Used by key derivation, where every segment has passed node-name
    /// validation and the construction checks cannot fail.
    pub(crate) fn from_validated(key: String) -> Self {
        Self(key)
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key denotes a directory placeholder
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}

// ============================================================================
// Tests
// ============================================================================
