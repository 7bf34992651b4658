//! AWS SDK adapters for the object-store ports
//!
//! [`S3ObjectStore`] wraps an `aws_sdk_s3::Client` behind the
//! `IObjectStore` port; [`S3Connector`] builds such clients from target
//! credentials. Clients always use path-style addressing so
//! S3-compatible stores (MinIO, Garage, Ceph RGW) resolve buckets
//! without wildcard DNS.

use std::sync::Arc;

use anyhow::{Context, Result};
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use drawbridge_core::domain::credentials::TargetCredentials;
use drawbridge_core::domain::newtypes::{BucketName, ObjectKey};
use drawbridge_core::ports::object_store::{
    IObjectStore, IStoreConnector, ObjectEntry, ObjectMetadata, ObjectPage,
};

/// Credentials provider name reported to the SDK
const PROVIDER_NAME: &str = "drawbridge";

/// Page size for object listings
const LIST_PAGE_SIZE: i32 = 1000;

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    dt.to_millis()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

/// `IObjectStore` implementation over an S3-compatible endpoint
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Wraps an already-configured SDK client
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl IObjectStore for S3ObjectStore {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .context("Failed to list buckets")?;
        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    async fn create_bucket(&self, bucket: &BucketName) -> Result<()> {
        self.client
            .create_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to create bucket {bucket}"))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> Result<()> {
        self.client
            .delete_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to delete bucket {bucket}"))?;
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &BucketName,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<String>,
    ) -> Result<ObjectPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(bucket.as_str())
            .max_keys(LIST_PAGE_SIZE)
            .prefix(prefix);

        if let Some(delimiter) = delimiter {
            request = request.delimiter(delimiter);
        }
        if let Some(token) = continuation {
            request = request.continuation_token(token);
        }

        let output = request
            .send()
            .await
            .with_context(|| format!("Failed to list objects in {bucket}"))?;

        let entries = output
            .contents()
            .iter()
            .filter_map(|item| {
                item.key().map(|key| ObjectEntry {
                    key: key.to_string(),
                    size: item.size().unwrap_or(0).max(0) as u64,
                    modified: item.last_modified().and_then(to_chrono),
                })
            })
            .collect();

        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let next_continuation = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            common_prefixes,
            next_continuation,
        })
    }

    async fn get_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> Result<(Vec<u8>, ObjectMetadata)> {
        let output = self
            .client
            .get_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to get object {key}"))?;

        let metadata = output.metadata().cloned().unwrap_or_default();
        let data = output
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read body of {key}"))?
            .into_bytes()
            .to_vec();

        debug!(key = %key, bytes = data.len(), "Fetched object");
        Ok((data, metadata))
    }

    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> Result<Option<ObjectMetadata>> {
        match self
            .client
            .head_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
        {
            Ok(output) => Ok(Some(output.metadata().cloned().unwrap_or_default())),
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    Ok(None)
                } else {
                    Err(anyhow::Error::new(err)
                        .context(format!("Failed to head object {key}")))
                }
            }
        }
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> Result<()> {
        let bytes = data.len();
        self.client
            .put_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .body(ByteStream::from(data))
            .set_metadata((!metadata.is_empty()).then_some(metadata))
            .send()
            .await
            .with_context(|| format!("Failed to put object {key}"))?;

        debug!(key = %key, bytes, "Uploaded object");
        Ok(())
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to delete object {key}"))?;
        Ok(())
    }
}

/// Builds path-style S3 clients from target credentials
pub struct S3Connector {
    region: String,
}

impl S3Connector {
    /// Creates a connector; `region` is used for all targets (compatible
    /// stores generally ignore it but the SDK requires one)
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

impl IStoreConnector for S3Connector {
    fn connect(&self, credentials: &TargetCredentials) -> Result<Arc<dyn IObjectStore>> {
        if !credentials.is_complete() {
            anyhow::bail!("Credentials are incomplete");
        }

        let provider = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            PROVIDER_NAME,
        );

        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version_latest()
            .region(Region::new(self.region.clone()))
            .endpoint_url(credentials.host.clone())
            .credentials_provider(provider)
            .force_path_style(true)
            .build();

        Ok(Arc::new(S3ObjectStore::new(Client::from_conf(config))))
    }
}
