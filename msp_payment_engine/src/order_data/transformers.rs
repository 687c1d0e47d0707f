use std::{fmt::Debug, sync::Arc};

use multisafepay_tools::data_objects::{GatewayInfo, PspOrderPayload};

use crate::order_data::PaymentRequest;

/// A function that may alter an order payload after it has been built and before it is sent.
pub type PayloadTransformer = Arc<dyn Fn(&mut PspOrderPayload, &PaymentRequest, &GatewayInfo) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TransformerKey {
    Gateway(String),
    Any,
}

/// An ordered list of [`PayloadTransformer`]s.
///
/// Transformers registered for the payload's gateway code (matched case-insensitively) run first, in registration
/// order. Wildcard transformers run after them, also in registration order.
#[derive(Clone, Default)]
pub struct PayloadTransformers {
    transformers: Vec<(TransformerKey, PayloadTransformer)>,
}

impl Debug for PayloadTransformers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self.transformers.iter().map(|(k, _)| k).collect::<Vec<_>>();
        f.debug_struct("PayloadTransformers").field("keys", &keys).finish()
    }
}

impl PayloadTransformers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, gateway_code: &str, f: F) -> &mut Self
    where F: Fn(&mut PspOrderPayload, &PaymentRequest, &GatewayInfo) + Send + Sync + 'static {
        self.transformers.push((TransformerKey::Gateway(gateway_code.to_ascii_lowercase()), Arc::new(f)));
        self
    }

    pub fn register_for_all<F>(&mut self, f: F) -> &mut Self
    where F: Fn(&mut PspOrderPayload, &PaymentRequest, &GatewayInfo) + Send + Sync + 'static {
        self.transformers.push((TransformerKey::Any, Arc::new(f)));
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    pub fn apply(&self, payload: &mut PspOrderPayload, payment: &PaymentRequest, gateway_info: &GatewayInfo) {
        let gateway = TransformerKey::Gateway(payload.gateway.to_ascii_lowercase());
        let specific = self.transformers.iter().filter(|(k, _)| *k == gateway);
        let wildcard = self.transformers.iter().filter(|(k, _)| *k == TransformerKey::Any);
        for (_, transformer) in specific.chain(wildcard) {
            transformer(payload, payment, gateway_info);
        }
    }
}
