use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image uploads are not configured")]
    Disabled,
    #[error("image host request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image host returned a malformed response")]
    MalformedResponse,
}

/// Client for the external image host. Portraits are relayed there and
/// only the resulting public URL is stored locally.
pub struct ImageHost {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl ImageHost {
    /// Returns `None` when the host is not configured; uploads are then
    /// answered with [`UploadError::Disabled`] at the route level.
    pub fn from_config(url: Option<String>, api_key: Option<String>) -> Option<Self> {
        match (url, api_key) {
            (Some(url), Some(api_key)) => Some(Self {
                client: reqwest::Client::new(),
                url,
                api_key,
            }),
            _ => None,
        }
    }

    /// Uploads raw image bytes, base64-encoded as the host expects, and
    /// returns the public URL it assigned.
    pub async fn upload(&self, bytes: &[u8]) -> Result<String, UploadError> {
        let encoded = STANDARD.encode(bytes);

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[("image", encoded.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        let url = body["data"]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or(UploadError::MalformedResponse)?;

        info!(%url, "image uploaded");
        Ok(url)
    }
}
