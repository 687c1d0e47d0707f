use std::fmt::Debug;

use cucumber::World;
use log::*;
use msp_payment_engine::{
    events::EventProducers,
    test_utils::canned_transport::CannedTransport,
    PaymentGatewayDatabase,
    RefundApi,
    SqliteDatabase,
};
use tokio::time::sleep;

use crate::support::{Reconciliation, TestSystem};

#[derive(Default, Debug, World)]
pub struct MspWorld {
    pub system: Option<PaymentSystem>,
    pub last_outcome: Option<String>,
    pub last_error: Option<String>,
}

/// A fresh database and canned payment provider, with one reconciliation API shared by every step so that all
/// notifications in a scenario go through the same order locks.
pub struct PaymentSystem {
    pub system: TestSystem,
    pub reconciliation: Reconciliation,
    pub refunds: RefundApi<SqliteDatabase, CannedTransport>,
}

impl Debug for PaymentSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentSystem({})", self.system.db.url())
    }
}

impl MspWorld {
    pub fn system(&self) -> &PaymentSystem {
        self.system.as_ref().expect("Payment system not initialised")
    }
}

impl PaymentSystem {
    pub async fn new() -> Self {
        let system = TestSystem::new().await;
        debug!("🚀️ Created database: {}", system.db.url());
        sleep(std::time::Duration::from_millis(50)).await;
        let reconciliation = system.reconciliation_api(EventProducers::default());
        let refunds = system.refund_api(EventProducers::default());
        Self { system, reconciliation, refunds }
    }
}
