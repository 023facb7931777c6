use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::{debug, info};

use crate::config::S3Settings;
use crate::store::backend::StorageBackend;
use crate::store::id::ArtifactId;

const KEY_PREFIX: &str = "resumes/";

/// Artifacts as objects in an S3-compatible bucket (MinIO locally).
#[derive(Clone)]
pub struct S3Backend {
    client: S3Client,
    bucket: String,
}

impl S3Backend {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Builds a client with static credentials against the configured endpoint.
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "resume-api-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        // MinIO serves buckets by path, not by virtual host.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!("S3 artifact backend: bucket={}", settings.bucket);
        Self::new(S3Client::from_conf(s3_config), settings.bucket.clone())
    }

    fn key_for(id: &ArtifactId) -> String {
        format!("{KEY_PREFIX}{id}.pdf")
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn write(&self, id: &ArtifactId, bytes: Bytes) -> Result<()> {
        let key = Self::key_for(id);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;
        debug!("Uploaded artifact to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn read(&self, id: &ArtifactId) -> Result<Option<Bytes>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(Self::key_for(id))
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => return Err(anyhow!("S3 download failed: {e}")),
        };
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 body read failed: {e}"))?;
        Ok(Some(data.into_bytes()))
    }

    async fn remove(&self, id: &ArtifactId) -> Result<()> {
        // DeleteObject succeeds for absent keys.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(Self::key_for(id))
            .send()
            .await
            .map_err(|e| anyhow!("S3 delete failed: {e}"))?;
        Ok(())
    }
}
