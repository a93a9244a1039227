use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::store::BlobStore;
use crate::config::StorageConfig;
use crate::{Error, Result};

/// Blob store on an S3-compatible bucket
///
/// Works against AWS S3, MinIO, and Google Cloud Storage through its
/// S3 interoperability endpoint (`https://storage.googleapis.com` with HMAC
/// keys).
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "textportal-config",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        tracing::info!(bucket = %config.bucket, endpoint = ?config.endpoint, "Storage client initialized");

        Self::from_client(Client::from_conf(builder.build()), config.bucket.clone())
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn to_utc(timestamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait::async_trait]
impl BlobStore for S3Store {
    async fn last_modified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output
                .last_modified()
                .and_then(to_utc)
                .map(Some)
                .ok_or_else(|| {
                    Error::Storage(format!("s3://{}/{} has no Last-Modified", self.bucket, key))
                }),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    Ok(None)
                } else {
                    Err(Error::Storage(format!(
                        "Failed to get metadata for s3://{}/{}: {}",
                        self.bucket,
                        key,
                        DisplayErrorContext(&err)
                    )))
                }
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    return Ok(None);
                }
                return Err(Error::Storage(format!(
                    "Failed to download s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&err)
                )));
            }
        };

        let data = output.body.collect().await.map_err(|e| {
            Error::Storage(format!(
                "Failed to read s3://{}/{} body: {}",
                self.bucket, key, e
            ))
        })?;

        Ok(Some(data.into_bytes()))
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| {
                Error::Storage(format!(
                    "Failed to upload s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&err)
                ))
            })?;

        tracing::debug!(bucket = %self.bucket, key, size, "Uploaded artifact");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_utc() {
        let smithy = SmithyDateTime::from_secs(1_714_564_800);
        assert_eq!(
            to_utc(&smithy),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_describe() {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let store = S3Store::from_client(Client::from_conf(config), "portal-cache");
        assert_eq!(store.describe(), "s3://portal-cache");
    }
}
