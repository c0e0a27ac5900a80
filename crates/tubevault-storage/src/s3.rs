//! S3 backend.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream as S3Body;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use tubevault_models::StorageKey;

use crate::error::{StorageError, StorageResult};
use crate::store::{ByteStream, ObjectStore};

/// Smallest part S3 accepts for every part but the last.
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Default multipart part size.
pub const DEFAULT_PART_SIZE: usize = 8 * 1024 * 1024;

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub bucket_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible providers (path-style addressing)
    pub endpoint_url: Option<String>,
    /// Multipart part size in bytes
    pub part_size: usize,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let part_size = match std::env::var("S3_PART_SIZE_MB") {
            Ok(raw) => {
                let mb: usize = raw.trim().parse().map_err(|_| {
                    StorageError::config_error(format!("S3_PART_SIZE_MB is not a number: {raw}"))
                })?;
                mb * 1024 * 1024
            }
            Err(_) => DEFAULT_PART_SIZE,
        };

        Ok(Self {
            region: required_env("AWS_REGION")?,
            bucket_name: required_env("S3_BUCKET_NAME")?,
            access_key_id: required_env("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required_env("AWS_SECRET_ACCESS_KEY")?,
            endpoint_url: std::env::var("S3_ENDPOINT_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            part_size: part_size.max(MIN_PART_SIZE),
        })
    }
}

fn required_env(name: &str) -> StorageResult<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StorageError::config_error(format!("{name} not set")))
}

/// Public URI of an object.
///
/// Virtual-hosted style for AWS; `<endpoint>/<bucket>/<key>` for custom
/// endpoints.
pub(crate) fn object_url(bucket: &str, region: &str, endpoint: Option<&str>, key: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
    }
}

/// S3 object store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
    part_size: usize,
}

impl S3Store {
    /// Create a new S3 store from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "tubevault",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        Ok(Self {
            client,
            bucket: config.bucket_name,
            region: config.region,
            endpoint_url: config.endpoint_url,
            part_size: config.part_size.max(MIN_PART_SIZE),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = S3Config::from_env()?;
        Self::new(config).await
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_single(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(S3Body::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, bucket = %self.bucket, key = %key, "S3 put failed");
                StorageError::upload_failed(e.to_string())
            })?;
        Ok(())
    }

    async fn start_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> StorageResult<MultipartUpload> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, bucket = %self.bucket, key = %key, "Failed to create multipart upload");
                StorageError::upload_failed(e.to_string())
            })?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| StorageError::upload_failed("No upload ID returned from S3"))?
            .to_string();

        debug!(key = %key, upload_id = %upload_id, "Started multipart upload");

        Ok(MultipartUpload {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: key.to_string(),
            upload_id,
            parts: Vec::new(),
            armed: true,
        })
    }
}

/// An open multipart upload.
///
/// Aborted when dropped before [`complete`](Self::complete) or
/// [`abort`](Self::abort) ran, so a cancelled upload never leaves orphaned
/// parts behind.
struct MultipartUpload {
    client: Client,
    bucket: String,
    key: String,
    upload_id: String,
    parts: Vec<CompletedPart>,
    armed: bool,
}

impl MultipartUpload {
    async fn upload_part(&mut self, data: Bytes) -> StorageResult<()> {
        let part_number = self.parts.len() as i32 + 1;
        let size = data.len();

        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .part_number(part_number)
            .body(S3Body::from(data))
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %self.key,
                    part_number,
                    "Failed to upload part"
                );
                StorageError::upload_failed(e.to_string())
            })?;

        let etag = output
            .e_tag()
            .ok_or_else(|| {
                StorageError::upload_failed(format!("No ETag returned for part {part_number}"))
            })?
            .to_string();

        debug!(key = %self.key, part_number, size, "Uploaded part");

        self.parts.push(
            CompletedPart::builder()
                .part_number(part_number)
                .e_tag(etag)
                .build(),
        );
        Ok(())
    }

    async fn complete(mut self) -> StorageResult<usize> {
        let parts = std::mem::take(&mut self.parts);
        let count = parts.len();
        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        let result = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .multipart_upload(completed)
            .send()
            .await;

        match result {
            Ok(_) => {
                self.armed = false;
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, bucket = %self.bucket, key = %self.key, "Failed to complete multipart upload");
                self.abort().await;
                Err(StorageError::upload_failed(e.to_string()))
            }
        }
    }

    async fn abort(mut self) {
        self.armed = false;
        let result = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .send()
            .await;

        match result {
            Ok(_) => debug!(key = %self.key, upload_id = %self.upload_id, "Aborted multipart upload"),
            Err(e) => warn!(error = %e, key = %self.key, upload_id = %self.upload_id, "Failed to abort multipart upload"),
        }
    }
}

impl Drop for MultipartUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(key = %self.key, upload_id = %self.upload_id, "No runtime to abort dropped multipart upload");
            return;
        };

        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key = self.key.clone();
        let upload_id = self.upload_id.clone();

        handle.spawn(async move {
            if let Err(e) = client
                .abort_multipart_upload()
                .bucket(&bucket)
                .key(&key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                warn!(error = %e, key = %key, upload_id = %upload_id, "Failed to abort dropped multipart upload");
            } else {
                debug!(key = %key, upload_id = %upload_id, "Aborted dropped multipart upload");
            }
        });
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn exists(&self, key: &StorageKey) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => Ok(false),
                    _ => Err(StorageError::AwsSdk(e.to_string())),
                },
                _ => Err(StorageError::AwsSdk(e.to_string())),
            },
        }
    }

    async fn put_stream(
        &self,
        key: &StorageKey,
        mut body: ByteStream,
        content_type: &str,
    ) -> StorageResult<String> {
        let start = std::time::Instant::now();
        let key_str = key.as_str();
        let mut buffer = BytesMut::new();
        let mut upload: Option<MultipartUpload> = None;
        let mut total: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    if let Some(upload) = upload.take() {
                        upload.abort().await;
                    }
                    return Err(StorageError::stream_failed(e.to_string()));
                }
            };

            total += chunk.len() as u64;
            buffer.extend_from_slice(&chunk);

            while buffer.len() >= self.part_size {
                let part = buffer.split_to(self.part_size).freeze();
                if upload.is_none() {
                    upload = Some(self.start_multipart(key_str, content_type).await?);
                }
                if let Some(active) = upload.as_mut() {
                    if let Err(e) = active.upload_part(part).await {
                        if let Some(upload) = upload.take() {
                            upload.abort().await;
                        }
                        return Err(e);
                    }
                }
            }
        }

        match upload {
            None => {
                self.put_single(key_str, buffer.freeze(), content_type).await?;
                info!(
                    bucket = %self.bucket,
                    key = %key_str,
                    size_bytes = total,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "S3 upload successful"
                );
            }
            Some(mut active) => {
                if !buffer.is_empty() {
                    if let Err(e) = active.upload_part(buffer.freeze()).await {
                        active.abort().await;
                        return Err(e);
                    }
                }
                let parts = active.complete().await?;
                info!(
                    bucket = %self.bucket,
                    key = %key_str,
                    size_bytes = total,
                    parts,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "S3 multipart stream upload successful"
                );
            }
        }

        Ok(self.location(key))
    }

    async fn get(&self, key: &StorageKey) -> StorageResult<Bytes> {
        debug!(key = %key, "Downloading");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    GetObjectError::NoSuchKey(_) => StorageError::not_found(key.as_str()),
                    _ => StorageError::DownloadFailed(e.to_string()),
                },
                _ => StorageError::DownloadFailed(e.to_string()),
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes();

        Ok(bytes)
    }

    fn location(&self, key: &StorageKey) -> String {
        object_url(
            &self.bucket,
            &self.region,
            self.endpoint_url.as_deref(),
            key.as_str(),
        )
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("S3 connectivity check failed: {}", e)))?;
        Ok(())
    }
}
