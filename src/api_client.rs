// Remote inventory API client. A thin fetch wrapper: endpoint path in, parsed
// JSON out, uniform error otherwise. No retries, no caching at this layer.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api-ta-pbb-5o1x.vercel.app/api";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {path} returned status {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("response from {path} did not match the expected shape: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    // True when the remote answered and said the resource does not exist,
    // as opposed to the request never getting through.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FetchError::Status { status, .. } if *status == reqwest::StatusCode::NOT_FOUND
        )
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

// Dyn-safe seam over the remote API so the catalog can run against a mock.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError>;
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url,
        }
    }

    // Typed convenience over get_json.
    pub async fn request<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let value = self.get_json(path).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Decode {
            path: path.to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl InventoryApi for ApiClient {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                path: path.to_owned(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_owned(),
                status,
            });
        }

        response.json().await.map_err(|e| FetchError::Transport {
            path: path.to_owned(),
            source: e,
        })
    }
}
