use std::{fmt::Display, sync::Arc};

use crate::{config::ApiMode, MspApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// The raw request/response function that every MultiSafepay call goes through.
///
/// `path` is relative to the environment's base URL. Implementations return the raw body for successful responses
/// and for error responses that carry a MultiSafepay envelope. Network and HTTP-level failures are reported as
/// [`MspApiError::TransportError`].
#[allow(async_fn_in_trait)]
pub trait MspTransport {
    async fn send(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>, MspApiError>;
}

impl<T: MspTransport> MspTransport for Arc<T> {
    async fn send(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>, MspApiError> {
        self.as_ref().send(method, path, body).await
    }
}

/// Hands out a transport for a given mode. Each mode has its own key and base URL, so a transport for one mode is
/// never used for a request in the other.
pub trait TransportFactory: Clone {
    type Transport: MspTransport;

    fn transport(&self, mode: ApiMode) -> Result<Self::Transport, MspApiError>;
}
