//! # MultiSafepay tools
//!
//! A small, typed client for the MultiSafepay JSON API.
//!
//! * [`MspTransport`] is the raw request/response seam. [`HttpTransport`] implements it with `reqwest`.
//! * [`MultiSafepayApi`] decodes the MultiSafepay response envelope and exposes the order, refund, issuer and gateway
//!   endpoints.
//! * [`MspConfig`] carries the API keys and account type, loaded from the environment.
mod api;
mod config;
mod error;
mod helpers;
mod http;
mod transport;

pub mod data_objects;

pub use api::{MultiSafepayApi, ResponseEnvelope};
pub use config::{ApiMode, GatewayMode, MspConfig, DEFAULT_SECONDS_ACTIVE, DEFAULT_TIMEOUT, LIVE_BASE_URL, TEST_BASE_URL};
pub use error::MspApiError;
pub use http::{HttpTransport, HttpTransportFactory};
pub use transport::{HttpMethod, MspTransport, TransportFactory};
