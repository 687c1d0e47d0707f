//! A MultiSafepay stand-in that answers from a table of canned responses and remembers every request.
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use log::*;
use multisafepay_tools::{ApiMode, HttpMethod, MspApiError, MspTransport, TransportFactory};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub mode: ApiMode,
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct CannedState {
    responses: HashMap<String, Result<Vec<u8>, MspApiError>>,
    requests: Vec<RecordedRequest>,
    disabled_modes: HashSet<ApiMode>,
    delay: Option<Duration>,
}

/// Clones share their responses and request log, so a test can keep one handle while the engine uses another.
#[derive(Clone, Default)]
pub struct CannedTransport {
    mode: ApiMode,
    state: Arc<Mutex<CannedState>>,
}

fn key(method: HttpMethod, path: &str) -> String {
    format!("{method} {}", path.trim_start_matches('/'))
}

impl CannedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut CannedState) -> R) -> R {
        let mut state = self.state.lock().expect("Canned transport lock poisoned");
        f(&mut state)
    }

    /// Answers `method path` with a successful envelope around `data`.
    pub fn respond(&self, method: HttpMethod, path: &str, data: Value) -> &Self {
        self.respond_raw(method, path, json!({ "success": true, "data": data }))
    }

    /// Answers `method path` with `body` exactly as given.
    pub fn respond_raw(&self, method: HttpMethod, path: &str, body: Value) -> &Self {
        let bytes = body.to_string().into_bytes();
        self.with_state(|s| s.responses.insert(key(method, path), Ok(bytes)));
        self
    }

    pub fn fail(&self, method: HttpMethod, path: &str, error: MspApiError) -> &Self {
        self.with_state(|s| s.responses.insert(key(method, path), Err(error)));
        self
    }

    /// Transports for `mode` cannot be created, as if no API key had been configured.
    pub fn disable_mode(&self, mode: ApiMode) -> &Self {
        self.with_state(|s| s.disabled_modes.insert(mode));
        self
    }

    /// Every request waits this long before it is answered.
    pub fn set_delay(&self, delay: Duration) -> &Self {
        self.with_state(|s| s.delay = Some(delay));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.with_state(|s| s.requests.clone())
    }

    pub fn request_count(&self, method: HttpMethod, path: &str) -> usize {
        let path = path.trim_start_matches('/');
        self.with_state(|s| s.requests.iter().filter(|r| r.method == method && r.path == path).count())
    }

    /// Serves `GET orders/{order_id}` with the given status. MultiSafepay's transaction id is reported as
    /// `msp-{order_id}`. A `payment_type` of `None` leaves out the payment details.
    pub fn order_status(&self, order_id: &str, status: &str, amount: i64, payment_type: Option<&str>) -> &Self {
        let mut data = json!({
            "transaction_id": format!("msp-{order_id}"),
            "order_id": order_id,
            "status": status,
            "amount": amount,
            "currency": "EUR",
        });
        if let Some(payment_type) = payment_type {
            data["payment_details"] = json!({ "type": payment_type, "external_transaction_id": "ext-0001" });
        }
        self.respond(HttpMethod::Get, &format!("orders/{order_id}"), data)
    }
}

impl MspTransport for CannedTransport {
    async fn send(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>, MspApiError> {
        let path = path.trim_start_matches('/').to_string();
        let body = body.and_then(|b| serde_json::from_slice::<Value>(&b).ok());
        let request = RecordedRequest { mode: self.mode, method, path: path.clone(), body };
        let delay = self.with_state(|s| {
            s.requests.push(request);
            s.delay
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        trace!("🚀️ Canned response for {method} {path}");
        self.with_state(|s| s.responses.get(&key(method, &path)).cloned())
            .unwrap_or_else(|| Err(MspApiError::transport(Some(404), format!("No canned response for {method} {path}"))))
    }
}

impl TransportFactory for CannedTransport {
    type Transport = CannedTransport;

    fn transport(&self, mode: ApiMode) -> Result<Self::Transport, MspApiError> {
        if self.with_state(|s| s.disabled_modes.contains(&mode)) {
            return Err(MspApiError::ConfigurationError(format!("No API key has been configured for {mode} mode")));
        }
        Ok(Self { mode, state: Arc::clone(&self.state) })
    }
}
