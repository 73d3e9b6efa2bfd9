//! Binary artifact storage: S3 with presigned URLs, or a local directory
//! whose objects are served back through HMAC-signed links.

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use chrono::Utc;
use mytone_core::utils::signature::{
    generate_download_signature, verify_download_signature, SignatureError,
};
use secrecy::{ExposeSecret, Secret};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

use crate::config::{StorageBackend, StorageConfig};
use crate::services::error::ServiceError;

pub const APK_KEY: &str = "mytone-app-release.apk";
pub const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";
pub const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(3600);

#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    /// Store `data` under `key`, replacing any previous object.
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), ServiceError>;

    async fn exists(&self, key: &str) -> Result<bool, ServiceError>;

    /// Time-limited download link for `key`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, ServiceError>;

    /// Serve an object for a link produced by `signed_url`. Only backends whose
    /// links point back at this process implement it.
    async fn open_signed(
        &self,
        _key: &str,
        _expires: i64,
        _signature: &str,
    ) -> Result<Bytes, ServiceError> {
        Err(ServiceError::NotFound("Download not served here".to_string()))
    }
}

pub async fn from_config(
    config: &StorageConfig,
    signing_secret: &Secret<String>,
) -> Result<Arc<dyn ArtifactStorage>, ServiceError> {
    match config.backend {
        StorageBackend::S3 => {
            let bucket = config.bucket.clone().ok_or_else(|| {
                ServiceError::Storage("AWS_S3_BUCKET_NAME is not set".to_string())
            })?;
            let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.region.clone()))
                .load()
                .await;
            tracing::info!(bucket = %bucket, region = %config.region, "Using S3 artifact storage");
            Ok(Arc::new(S3Storage::new(S3Client::new(&sdk_config), bucket)))
        }
        StorageBackend::Local => {
            tracing::info!(path = %config.local_path, "Using local artifact storage");
            let storage = LocalStorage::new(
                &config.local_path,
                &config.public_base_url,
                signing_secret.clone(),
            )
            .await?;
            Ok(Arc::new(storage))
        }
    }
}

pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ArtifactStorage for S3Storage {
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), ServiceError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| ServiceError::Storage(format!("S3 upload failed: {}", e)))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().map(|se| se.is_not_found()).unwrap_or(false) => {
                Ok(false)
            }
            Err(e) => Err(ServiceError::Storage(format!("S3 head failed: {}", e))),
        }
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, ServiceError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| ServiceError::Storage(format!("Invalid presign duration: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| ServiceError::Storage(format!("S3 presign failed: {}", e)))?;

        Ok(request.uri().to_string())
    }
}

pub struct LocalStorage {
    base_path: PathBuf,
    public_base_url: String,
    secret: Secret<String>,
}

impl LocalStorage {
    pub async fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: &str,
        secret: Secret<String>,
    ) -> Result<Self, ServiceError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .await
                .map_err(|e| ServiceError::Storage(format!("Cannot create storage dir: {}", e)))?;
        }
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            secret,
        })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Signed link for `key` that stops working after `expires` (Unix seconds).
    pub fn link(&self, key: &str, expires: i64) -> Result<String, ServiceError> {
        let signature = generate_download_signature(self.secret.expose_secret(), key, expires)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;
        Ok(format!(
            "{}/apk/download?expires={}&signature={}",
            self.public_base_url, expires, signature
        ))
    }
}

#[async_trait]
impl ArtifactStorage for LocalStorage {
    async fn put(&self, key: &str, _content_type: &str, data: Bytes) -> Result<(), ServiceError> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        fs::write(path, &data)
            .await
            .map_err(|e| ServiceError::Storage(format!("Local write failed: {}", e)))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        fs::try_exists(self.path(key))
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, ServiceError> {
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        self.link(key, expires)
    }

    async fn open_signed(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> Result<Bytes, ServiceError> {
        verify_download_signature(
            self.secret.expose_secret(),
            key,
            expires,
            signature,
            Utc::now().timestamp(),
        )
        .map_err(|e| match e {
            SignatureError::Expired | SignatureError::Mismatch => ServiceError::InvalidSignature,
            SignatureError::InvalidKey(msg) => ServiceError::Internal(anyhow::anyhow!(msg)),
        })?;

        match fs::read(self.path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServiceError::NotFound("APK not available".to_string()))
            }
            Err(e) => Err(ServiceError::Storage(format!("Local read failed: {}", e))),
        }
    }
}
