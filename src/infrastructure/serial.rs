// Serial configuration client - reads and applies the backend serial link
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_timeout")]
    pub timeout: f64,
}

fn default_baud() -> u32 {
    9600
}

fn default_timeout() -> f64 {
    2.0
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud: default_baud(),
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SerialError {
    /// The backend rejected the change; the message is surfaced to the
    /// operator verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("serial config request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ApplyRequest<'a> {
    port: &'a str,
    baud: u32,
    timeout: f64,
    enabled: bool,
}

/// HTTP client for the backend's serial-config endpoint. Independent of the
/// sensor transports; a failure here never touches connection state.
pub struct SerialConfigClient {
    client: reqwest::Client,
    url: String,
}

impl SerialConfigClient {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// Read the current configuration, with client-side defaults for any
    /// field the backend omits.
    pub async fn fetch(&self) -> Result<SerialConfig, SerialError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(SerialError::Rejected(format!("HTTP {}", response.status())));
        }
        Ok(response.json::<SerialConfig>().await?)
    }

    /// Apply a new configuration. The success response is an opaque
    /// acknowledgement and is discarded; a failure body is the error.
    pub async fn apply(&self, cfg: &SerialConfig) -> Result<(), SerialError> {
        let body = ApplyRequest {
            port: &cfg.port,
            baud: cfg.baud,
            timeout: cfg.timeout,
            enabled: true,
        };
        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SerialError::Rejected(if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_defaults_for_absent_fields() {
        let cfg: SerialConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.port, "");
        assert_eq!(cfg.baud, 9600);
        assert_eq!(cfg.timeout, 2.0);

        let cfg: SerialConfig =
            serde_json::from_str(r#"{"port": "/dev/ttyUSB0", "baud": 115200}"#).unwrap();
        assert_eq!(cfg.port, "/dev/ttyUSB0");
        assert_eq!(cfg.baud, 115200);
        assert_eq!(cfg.timeout, 2.0);
    }

    #[test]
    fn test_apply_request_always_enables() {
        let body = ApplyRequest {
            port: "COM3",
            baud: 9600,
            timeout: 2.0,
            enabled: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"port": "COM3", "baud": 9600, "timeout": 2.0, "enabled": true})
        );
    }
}
