//! Object store port (driven/secondary port)
//!
//! Interface for the remote S3-compatible store. The production adapter
//! wraps the AWS SDK; tests use in-memory implementations.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification; the
//!   services convert them to `EngineError::Remote` with the operation name.
//! - `ObjectPage`/`ObjectEntry` are port-level DTOs, not domain entities;
//!   the namespace service maps them to `LogicalNode` values.
//! - Listing is paginated: callers loop on `next_continuation` until the
//!   store reports no further page.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::credentials::TargetCredentials;
use crate::domain::newtypes::{BucketName, ObjectKey};

/// One content entry from an object listing
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    /// Full object key as stored
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Store-native last-modified time (upload time, not local edit time)
    pub modified: Option<DateTime<Utc>>,
}

/// One page of an object listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Content entries under the requested prefix
    pub entries: Vec<ObjectEntry>,
    /// Common prefixes (directory-like groupings) when a delimiter was given
    pub common_prefixes: Vec<String>,
    /// Token for the next page (None on the last page)
    pub next_continuation: Option<String>,
}

/// User-defined metadata attached to an object at upload time
pub type ObjectMetadata = HashMap<String, String>;

/// Port trait for S3-compatible store operations
///
/// One implementation instance corresponds to one connected target;
/// connections are never shared across targets.
#[async_trait::async_trait]
pub trait IObjectStore: Send + Sync {
    /// Lists all bucket names (single unpaginated call)
    async fn list_buckets(&self) -> anyhow::Result<Vec<String>>;

    /// Creates a bucket
    async fn create_bucket(&self, bucket: &BucketName) -> anyhow::Result<()>;

    /// Deletes an empty bucket
    ///
    /// The store forbids deleting non-empty buckets; callers purge first.
    async fn delete_bucket(&self, bucket: &BucketName) -> anyhow::Result<()>;

    /// Lists one page of objects under a prefix
    ///
    /// # Arguments
    /// * `prefix` - key prefix to scope the listing ("" for the root)
    /// * `delimiter` - hierarchy delimiter (`Some("/")` for tree listings,
    ///   `None` for flat enumeration)
    /// * `continuation` - token from the previous page, if any
    async fn list_objects(
        &self,
        bucket: &BucketName,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<String>,
    ) -> anyhow::Result<ObjectPage>;

    /// Fetches an object's content and user metadata
    async fn get_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> anyhow::Result<(Vec<u8>, ObjectMetadata)>;

    /// Fetches an object's user metadata without its content
    ///
    /// Returns `None` if the object does not exist.
    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> anyhow::Result<Option<ObjectMetadata>>;

    /// Uploads an object with the given user metadata
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> anyhow::Result<()>;

    /// Deletes a single object
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<()>;
}

/// Port trait for building store connections from credentials
///
/// The registry calls this lazily, once per target, and caches the result
/// until the target's credentials are edited.
pub trait IStoreConnector: Send + Sync {
    /// Builds a connection for the given credentials
    fn connect(&self, credentials: &TargetCredentials) -> anyhow::Result<Arc<dyn IObjectStore>>;
}
