use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};

use crate::core::config::Settings;

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl StorageService {
    /// Returns None when S3 credentials are absent; uploads then answer 503.
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().access_key.is_empty() || settings.s3().secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "aula-attachments",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Some(Self {
            client,
            endpoint: settings.s3().endpoint.trim_end_matches('/').to_string(),
            bucket: settings.s3().bucket.clone(),
        }))
    }

    /// Uploads under a content-addressed key and returns the object URL.
    pub(crate) async fn upload_attachment(
        &self,
        prefix: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<String> {
        let hash_hex = hex::encode(Sha256::digest(&bytes));
        let key = format!("{prefix}/{hash_hex}-{filename}");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        Ok(format!("{}/{}/{}", self.endpoint, self.bucket, key))
    }
}
