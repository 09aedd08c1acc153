//! src/storage/s3.rs
use crate::configuration::S3Settings;
use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::Config;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::Region;
use secrecy::ExposeSecret;

#[derive(Debug)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Storage {
    /// Creates the bucket when it doesn't exist yet; a bucket we already own
    /// is reused.
    #[tracing::instrument(name = "Create S3Storage handle", skip_all, fields(bucket = %settings.bucket))]
    pub async fn new(settings: &S3Settings) -> Result<Self, anyhow::Error> {
        let creds = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.expose_secret(),
            None,
            None,
            "trackstats",
        );

        let config = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(creds)
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint_url.clone())
            .force_path_style(true)
            .build();

        let client = aws_sdk_s3::Client::from_conf(config);
        let create_result = client.create_bucket().bucket(&settings.bucket).send().await;

        if let Err(err) = create_result {
            let owned = err
                .as_service_error()
                .is_some_and(|e| e.is_bucket_already_owned_by_you());
            if !owned {
                return Err(anyhow::anyhow!(
                    "Failed to create bucket {}: {}",
                    settings.bucket,
                    err
                ));
            }
        }
        tracing::debug!("Acquired handle to bucket: {}", settings.bucket);

        Ok(Self {
            client,
            bucket: settings.bucket.clone(),
            key: settings.key.clone(),
        })
    }

    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    #[tracing::instrument(name = "Put", skip(self, data), fields(bucket = %self.bucket))]
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<(), anyhow::Error> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .context(format!("Failed to put object {key}"))?;
        Ok(())
    }

    /// S3 puts are atomic per object, so a reader never sees half a report.
    pub async fn persist(&self, json: &str) -> Result<String, anyhow::Error> {
        self.put(&self.key, json.as_bytes()).await?;
        Ok(self.location())
    }
}
