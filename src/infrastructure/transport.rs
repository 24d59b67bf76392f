// Transport adapters - polling feed and wire payload decoding
use crate::domain::reading::RawMessage;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Pull-based source of sensor readings, used by the polling fallback.
#[async_trait]
pub trait SensorFeed: Send + Sync {
    async fn fetch(&self) -> Result<RawMessage, TransportError>;
}

/// Polls the backend's sensor-data endpoint over HTTP.
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl SensorFeed for HttpFeed {
    async fn fetch(&self) -> Result<RawMessage, TransportError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }
        Ok(response.json::<RawMessage>().await?)
    }
}

/// Decode one streaming frame. Malformed frames are dropped by the caller;
/// they never affect connection state.
pub fn decode_message(text: &str) -> Result<RawMessage, serde_json::Error> {
    serde_json::from_str(text)
}

/// The snapshot request sent as soon as the streaming transport opens.
pub fn request_data_frame() -> String {
    serde_json::json!({ "type": "request_data" }).to_string()
}
