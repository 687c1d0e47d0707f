use std::{fmt::Debug, sync::Arc};

use log::*;
use multisafepay_tools::{ApiMode, MspApiError, MspConfig, MultiSafepayApi, TransportFactory};

use crate::{db_types::Order, gateways::GatewayCatalog};

/// Hands out MultiSafepay clients in the right mode for an order.
///
/// The mode is resolved per order from the gateway's own mode, falling back to the configured account type. Each
/// mode gets its own transport, so keys and base URLs are never mixed.
#[derive(Clone)]
pub struct PspClients<F> {
    factory: F,
    config: MspConfig,
    catalog: Arc<GatewayCatalog>,
}

impl<F> Debug for PspClients<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PspClients ({} account, {} gateways)", self.config.account_type, self.catalog.len())
    }
}

impl<F> PspClients<F> {
    pub fn new(factory: F, config: MspConfig, catalog: Arc<GatewayCatalog>) -> Self {
        Self { factory, config, catalog }
    }

    pub fn config(&self) -> &MspConfig {
        &self.config
    }

    pub fn catalog(&self) -> &GatewayCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<GatewayCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn mode_for(&self, order: &Order) -> ApiMode {
        self.config.resolve_mode(order.gateway_mode)
    }
}

impl<F: TransportFactory> PspClients<F> {
    pub fn api(&self, mode: ApiMode) -> Result<MultiSafepayApi<F::Transport>, MspApiError> {
        let transport = self.factory.transport(mode)?;
        Ok(MultiSafepayApi::new(transport))
    }

    pub fn api_for(&self, order: &Order) -> Result<MultiSafepayApi<F::Transport>, MspApiError> {
        let mode = self.mode_for(order);
        trace!("💳️ Using {mode} mode for order {} ({})", order.id, order.gateway_mode);
        self.api(mode)
    }
}
