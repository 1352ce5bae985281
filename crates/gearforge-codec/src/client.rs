//! Codec service client.
//!
//! Wraps the external serial codec over HTTP. Every call tries the primary
//! endpoint with a short timeout, then transparently falls back to the
//! public endpoint on any failure; an error surfaces only when both fail.
//! No state is retained between calls and nothing is retried beyond the
//! single documented substitution.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// The public fallback codec endpoint.
pub const PUBLIC_ENDPOINT: &str = "https://borderlands4-deserializer.nicnl.com/api/v1";

/// Kept short so fallback is not itself slow.
const PRIMARY_TIMEOUT: Duration = Duration::from_secs(3);
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Codec failure after both endpoints were exhausted, or a payload the
/// service rejected.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// A decoded serial: the component string plus the service's side-channel
/// metadata blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub component_string: String,
    pub additional_data: String,
}

/// One HTTP exchange with a codec endpoint. Abstracted so tests can inject
/// endpoint failures without a live network.
#[async_trait]
pub trait CodecTransport: Send + Sync {
    async fn post(&self, url: &str, payload: &Value, timeout: Duration) -> Result<Value, String>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[async_trait]
impl CodecTransport for HttpTransport {
    async fn post(&self, url: &str, payload: &Value, timeout: Duration) -> Result<Value, String> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let response = response.error_for_status().map_err(|e| e.to_string())?;
        response.json::<Value>().await.map_err(|e| e.to_string())
    }
}

/// Client over a primary and a fallback codec endpoint implementing the
/// identical contract.
#[derive(Debug, Clone)]
pub struct CodecClient<T = HttpTransport> {
    primary: String,
    fallback: String,
    transport: T,
}

impl CodecClient<HttpTransport> {
    /// Client with a self-hosted primary and the public fallback.
    pub fn new(primary: impl Into<String>) -> Self {
        CodecClient::with_transport(primary, PUBLIC_ENDPOINT, HttpTransport::default())
    }

    /// Client using only the public endpoint.
    pub fn public() -> Self {
        CodecClient::new(PUBLIC_ENDPOINT)
    }
}

impl<T: CodecTransport> CodecClient<T> {
    pub fn with_transport(
        primary: impl Into<String>,
        fallback: impl Into<String>,
        transport: T,
    ) -> Self {
        CodecClient {
            primary: primary.into(),
            fallback: fallback.into(),
            transport,
        }
    }

    /// Decodes an opaque serial into its component string.
    pub async fn decode(&self, serial: &str) -> Result<Decoded, CodecError> {
        let payload = json!({ "serial_b85": serial.trim() });
        let response = self
            .call("deserialize", &payload)
            .await
            .map_err(CodecError::Decode)?;
        let component_string = response
            .get("deserialized")
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::Decode("response missing `deserialized`".to_string()))?
            .to_string();
        let additional_data = response
            .get("additional_data")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Decoded {
            component_string,
            additional_data,
        })
    }

    /// Re-encodes a component string into a serial.
    pub async fn encode(&self, component_string: &str) -> Result<String, CodecError> {
        let payload = json!({ "deserialized": component_string.trim() });
        let response = self
            .call("reserialize", &payload)
            .await
            .map_err(CodecError::Encode)?;
        response
            .get("serial_b85")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CodecError::Encode("response missing `serial_b85`".to_string()))
    }

    async fn call(&self, path: &str, payload: &Value) -> Result<Value, String> {
        let primary_url = endpoint_url(&self.primary, path);
        match self
            .transport
            .post(&primary_url, payload, PRIMARY_TIMEOUT)
            .await
        {
            Ok(value) => {
                debug!(url = %primary_url, "codec call served by primary");
                Ok(value)
            }
            Err(primary_err) => {
                warn!(url = %primary_url, error = %primary_err,
                    "primary codec endpoint failed, trying fallback");
                let fallback_url = endpoint_url(&self.fallback, path);
                self.transport
                    .post(&fallback_url, payload, FALLBACK_TIMEOUT)
                    .await
                    .map_err(|fallback_err| {
                        format!("primary: {primary_err}; fallback: {fallback_err}")
                    })
            }
        }
    }
}

fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{path}", base.trim_end_matches('/'))
}

/// Pulls the item display name out of the codec's `additional_data` blob:
/// the text between the first pair of double quotes.
pub fn item_name(additional_data: &str) -> Option<String> {
    let mut fields = additional_data.split('"');
    fields.next()?;
    fields.next().map(str::to_string)
}
