//! Firebase Storage over its REST API
//!
//! Upload: POST /b/{bucket}/o?uploadType=media&name={path} with the raw bytes.
//! The response carries `downloadTokens`; the first token is used to build the
//! public download URL.

use reqwest::{Client as HttpClient, Url};
use serde::Deserialize;

use super::{BlobStore, BlobUpload};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct FirebaseStorage {
    http_client: HttpClient,
    api_url: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(api_url: String, bucket: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            bucket,
        }
    }

    /// Object URL with the path encoded as a single segment
    fn object_url(&self, path: &str) -> AppResult<Url> {
        let mut url = Url::parse(&format!("{}/b/{}/o", self.api_url, self.bucket))
            .map_err(|e| AppError::Storage(format!("Invalid storage URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Storage("Storage URL cannot be a base".to_string()))?
            .push(path);
        Ok(url)
    }

    fn download_url(&self, response: &UploadResponse) -> AppResult<String> {
        let mut url = self.object_url(&response.name)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(token) = response
                .download_tokens
                .as_deref()
                .and_then(|tokens| tokens.split(',').next())
                .filter(|t| !t.is_empty())
            {
                query.append_pair("token", token);
            }
        }
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(&self, upload: BlobUpload) -> AppResult<String> {
        let url = format!("{}/b/{}/o", self.api_url, self.bucket);
        let size = upload.bytes.len();

        let mut request = self
            .http_client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", upload.path.as_str())])
            .header(reqwest::header::CONTENT_TYPE, upload.content_type.as_str())
            .body(upload.bytes);

        if let Some(token) = &upload.auth_token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Firebase {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!(
                "Upload of {} returned status {}: {}",
                upload.path, status, body
            )));
        }

        let uploaded: UploadResponse = response.json().await?;
        let download_url = self.download_url(&uploaded)?;

        tracing::info!(
            path = %uploaded.name,
            bytes = size,
            provider = "firebase_storage",
            "Object uploaded"
        );

        Ok(download_url)
    }

    fn name(&self) -> &'static str {
        "firebase_storage"
    }
}
