use std::{sync::Arc, time::Duration};

use log::*;
use msp_common::Secret;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client,
    Method,
};
use serde_json::Value;

use crate::{
    config::{ApiMode, MspConfig},
    transport::{HttpMethod, MspTransport, TransportFactory},
    MspApiError,
};

/// [`MspTransport`] over HTTPS, bound to one environment (base URL and API key).
#[derive(Clone)]
pub struct HttpTransport {
    mode: ApiMode,
    base_url: String,
    client: Arc<Client>,
}

impl HttpTransport {
    /// Builds a transport for `mode`. A blank API key is a configuration error and no client is created.
    pub fn new(mode: ApiMode, api_key: &Secret<String>, timeout: Duration) -> Result<Self, MspApiError> {
        if api_key.is_blank() {
            return Err(MspApiError::ConfigurationError(format!("No API key has been configured for {mode} mode")));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let mut key = HeaderValue::from_str(api_key.reveal().trim())
            .map_err(|e| MspApiError::ConfigurationError(e.to_string()))?;
        key.set_sensitive(true);
        headers.insert("api_key", key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MspApiError::ConfigurationError(e.to_string()))?;
        let base_url = mode.base_url().to_string();
        Ok(Self { mode, base_url, client: Arc::new(client) })
    }

    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl MspTransport for HttpTransport {
    async fn send(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>, MspApiError> {
        let url = self.url(path);
        trace!("💳️ {method} {url} ({} mode)", self.mode);
        let mut req = match method {
            HttpMethod::Get => self.client.request(Method::GET, url),
            HttpMethod::Post => self.client.request(Method::POST, url).header(CONTENT_TYPE, "application/json"),
            HttpMethod::Patch => self.client.request(Method::PATCH, url).header(CONTENT_TYPE, "application/json"),
        };
        if let Some(body) = body {
            req = req.body(body);
        }
        let response = req.send().await.map_err(|e| {
            warn!("💳️ {method} {path} failed. {e}");
            MspApiError::transport(e.status().map(|s| s.as_u16()), e.to_string())
        })?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| MspApiError::transport(Some(status.as_u16()), e.to_string()))?;
        if status.is_success() {
            trace!("💳️ {method} {path} returned {status}");
            return Ok(bytes.to_vec());
        }
        if carries_envelope(&bytes) {
            debug!("💳️ {method} {path} returned {status} with an error envelope");
            Ok(bytes.to_vec())
        } else {
            warn!("💳️ {method} {path} returned {status}");
            Err(MspApiError::transport(Some(status.as_u16()), String::from_utf8_lossy(&bytes)))
        }
    }
}

/// True when the body is a MultiSafepay response envelope, i.e. a JSON object with a `success` field.
fn carries_envelope(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body).map(|v| v.get("success").is_some()).unwrap_or(false)
}

/// Builds one [`HttpTransport`] per mode up front, so the API key and base URL of each environment stay separate.
#[derive(Clone)]
pub struct HttpTransportFactory {
    live: Result<HttpTransport, MspApiError>,
    test: Result<HttpTransport, MspApiError>,
}

impl HttpTransportFactory {
    pub fn new(config: &MspConfig) -> Self {
        let live = HttpTransport::new(ApiMode::Live, config.api_key(ApiMode::Live), config.timeout);
        let test = HttpTransport::new(ApiMode::Test, config.api_key(ApiMode::Test), config.timeout);
        if let Err(e) = &live {
            info!("💳️ Live transport unavailable. {e}");
        }
        if let Err(e) = &test {
            info!("💳️ Test transport unavailable. {e}");
        }
        Self { live, test }
    }
}

impl TransportFactory for HttpTransportFactory {
    type Transport = HttpTransport;

    fn transport(&self, mode: ApiMode) -> Result<Self::Transport, MspApiError> {
        match mode {
            ApiMode::Live => self.live.clone(),
            ApiMode::Test => self.test.clone(),
        }
    }
}
