//! Main client implementation

use crate::{
    error::{from_status, from_transport},
    types::ObjectInfo,
    ClientError, Config, Result,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use steward_core::{BucketSnapshot, ObjectStore, ObjectUri, StoreError, StoreResult};
use tracing::{debug, instrument};

enum RequestBody {
    Json(Vec<u8>),
    Media { data: Bytes, content_type: String },
}

/// Storage API client
#[derive(Clone)]
pub struct StorageClient {
    config: Config,
    http: Client,
}

impl StorageClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        url::Url::parse(&config.endpoint)
            .map_err(|e| ClientError::Config(format!("invalid endpoint {:?}: {}", config.endpoint, e)))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            config
                .user_agent
                .parse()
                .map_err(|_| ClientError::Config(format!("invalid user agent {:?}", config.user_agent)))?,
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { config, http })
    }

    /// Create with endpoint URL
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Self::new(Config::new(endpoint))
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Bucket Operations ====================

    /// Read bucket metadata
    #[instrument(skip(self))]
    pub async fn get_bucket(&self, bucket: &str) -> StoreResult<BucketSnapshot> {
        let response = self.request(Method::GET, &bucket_path(bucket), &[], None).await?;
        decode_json(response).await
    }

    /// Create a bucket in the configured project
    #[instrument(skip(self, desired), fields(bucket = %desired.name))]
    pub async fn insert_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        let project = self.config.project.as_deref().ok_or_else(|| {
            StoreError::InvalidRequest("a project is required to create buckets".to_string())
        })?;
        let body = encode_json(desired)?;
        let response = self
            .request(Method::POST, "/storage/v1/b", &[("project", project)], Some(body))
            .await?;
        decode_json(response).await
    }

    /// Replace bucket metadata
    #[instrument(skip(self, desired), fields(bucket = %desired.name))]
    pub async fn update_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        let body = encode_json(desired)?;
        let response = self
            .request(Method::PUT, &bucket_path(&desired.name), &[], Some(body))
            .await?;
        decode_json(response).await
    }

    /// Delete an empty bucket
    #[instrument(skip(self))]
    pub async fn delete_bucket(&self, bucket: &str) -> StoreResult<()> {
        self.request(Method::DELETE, &bucket_path(bucket), &[], None).await?;
        Ok(())
    }

    // ==================== Object Operations ====================

    /// Upload an object in a single request
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload_object(
        &self,
        uri: &ObjectUri,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<ObjectInfo> {
        if uri.path().is_empty() || uri.path().ends_with('/') {
            return Err(StoreError::InvalidRequest(format!("{} does not name an object", uri)));
        }

        let path = format!("/upload/storage/v1/b/{}/o", urlencoding::encode(uri.bucket().name()));
        let body = RequestBody::Media {
            data,
            content_type: content_type.to_string(),
        };
        let response = self
            .request(
                Method::POST,
                &path,
                &[("uploadType", "media"), ("name", uri.path())],
                Some(body),
            )
            .await?;
        decode_json(response).await
    }

    /// Download an object's content
    #[instrument(skip(self))]
    pub async fn download_object(&self, uri: &ObjectUri) -> StoreResult<Bytes> {
        let path = format!(
            "{}/o/{}",
            bucket_path(uri.bucket().name()),
            urlencoding::encode(uri.path())
        );
        let response = self.request(Method::GET, &path, &[("alt", "media")], None).await?;
        response.bytes().await.map_err(from_transport)
    }

    // ==================== Helper Methods ====================

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<RequestBody>,
    ) -> StoreResult<Response> {
        let url = format!("{}{}", self.config.base_url(), path);

        let mut req = self.http.request(method.clone(), &url);

        if !query.is_empty() {
            req = req.query(query);
        }

        if let Some(token) = &self.config.access_token {
            req = req.bearer_auth(token);
        }

        match body {
            Some(RequestBody::Json(data)) => {
                req = req.header(header::CONTENT_TYPE, "application/json").body(data);
            }
            Some(RequestBody::Media { data, content_type }) => {
                req = req.header(header::CONTENT_TYPE, content_type).body(data);
            }
            None => {}
        }

        debug!("Sending {} request to {}", method, url);
        let response = req.send().await.map_err(from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(from_status(status.as_u16(), &text));
        }

        Ok(response)
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn get_bucket(&self, name: &str) -> StoreResult<BucketSnapshot> {
        StorageClient::get_bucket(self, name).await
    }

    async fn insert_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        StorageClient::insert_bucket(self, desired).await
    }

    async fn update_bucket(&self, desired: &BucketSnapshot) -> StoreResult<BucketSnapshot> {
        StorageClient::update_bucket(self, desired).await
    }

    async fn delete_bucket(&self, name: &str) -> StoreResult<()> {
        StorageClient::delete_bucket(self, name).await
    }
}

fn bucket_path(bucket: &str) -> String {
    format!("/storage/v1/b/{}", urlencoding::encode(bucket))
}

fn encode_json(snapshot: &BucketSnapshot) -> StoreResult<RequestBody> {
    serde_json::to_vec(snapshot)
        .map(RequestBody::Json)
        .map_err(|e| StoreError::InvalidRequest(format!("cannot encode bucket metadata: {}", e)))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    let text = response.text().await.map_err(from_transport)?;
    serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
}
