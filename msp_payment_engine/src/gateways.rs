//! The catalog of MultiSafepay payment gateways.
//!
//! Every gateway the store can offer is a [`GatewayId`]. The catalog maps each one to the code MultiSafepay expects in
//! the `gateway` field of an order, the order type to use and whether the gateway needs a shopping cart. Gateways with
//! restrictions on currency or order total carry a [`GatewayPolicy`].
//!
//! [`GatewayCatalog::new`] checks that every `GatewayId` has exactly one descriptor. Call it once at startup and share
//! the result.
use std::{collections::HashMap, fmt::Display, str::FromStr};

use log::*;
use multisafepay_tools::data_objects::OrderType;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

pub const EUR: &str = "EUR";

macro_rules! gateway_ids {
    ($($variant:ident => $plugin_id:literal),+ $(,)?) => {
        /// The payment gateways this adapter knows about, by store plugin id.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum GatewayId {
            $($variant),+
        }

        impl GatewayId {
            pub const ALL: &'static [GatewayId] = &[$(GatewayId::$variant),+];

            /// The plugin id the store uses for this gateway, e.g. `msp_ideal`
            pub fn plugin_id(&self) -> &'static str {
                match self {
                    $(GatewayId::$variant => $plugin_id),+
                }
            }
        }

        impl FromStr for GatewayId {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($plugin_id => Ok(GatewayId::$variant),)+
                    _ => Err(CatalogError::UnknownGateway(s.to_string())),
                }
            }
        }
    };
}

gateway_ids! {
    DirectBankTransfer => "msp_directbanktransfer",
    Belfius => "msp_belfius",
    ApplePay => "msp_applepay",
    MisterCash => "msp_mistercash",
    Amex => "msp_amex",
    DirectDebit => "msp_dirdeb",
    Dotpay => "msp_dotpay",
    Eps => "msp_eps",
    Ferbuy => "msp_ferbuy",
    Giropay => "msp_giropay",
    IdealQr => "msp_idealqr",
    Visa => "msp_visa",
    Maestro => "msp_maestro",
    Mastercard => "msp_mastercard",
    Paysafecard => "msp_paysafecard",
    DirectBank => "msp_directbank",
    Trustpay => "msp_trustpay",
    Wallet => "msp_wallet",
    Afterpay => "msp_afterpay",
    Klarna => "msp_klarna",
    PayAfterDelivery => "msp_payafterdelivery",
    Santander => "msp_santander",
    Ideal => "msp_ideal",
    Kbc => "msp_kbc",
    Trustly => "msp_trustly",
    Paypal => "msp_paypal",
    Alipay => "msp_alipay",
    BankTransfer => "msp_banktrans",
    EInvoice => "msp_einvoice",
    IngHome => "msp_inghome",
    BabyGiftcard => "msp_babygiftcard",
    BeautyAndWellness => "msp_beautyandwellness",
    Boekenbon => "msp_boekenbon",
    Erotiekbon => "msp_erotiekbon",
    FashionCheque => "msp_fashioncheque",
    FashionGiftcard => "msp_fashiongiftcard",
    Fietsenbon => "msp_fietsenbon",
    Gezondheidsbon => "msp_gezondheidsbon",
    Givacard => "msp_givacard",
    Goodcard => "msp_goodcard",
    NationaleTuinbon => "msp_nationaletuinbon",
    NationaleVerwenCadeaubon => "msp_nationaleverwencadeaubon",
    ParfumCadeaukaart => "msp_parfumcadeaukaart",
    PodiumCadeaukaart => "msp_podiumcadeaukaart",
    SportEnFit => "msp_sportenfit",
    VvvCadeaukaart => "msp_vvvcadeaukaart",
    WellnessGiftcard => "msp_wellnessgiftcard",
    Wijncadeau => "msp_wijncadeau",
    Winkelcheque => "msp_winkelcheque",
    YourGift => "msp_yourgift",
}

impl Display for GatewayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.plugin_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{0} is not a MultiSafepay gateway")]
    UnknownGateway(String),
    #[error("The gateway catalog has no entry for {0}")]
    MissingDescriptor(GatewayId),
    #[error("The gateway catalog has more than one entry for {0}")]
    DuplicateDescriptor(GatewayId),
}

//--------------------------------------    GatewayPolicy     ---------------------------------------------------------

/// Restrictions on when a gateway may be offered.
///
/// Order-total limits are expressed in the given currency, and an order in any other currency does not qualify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GatewayPolicy {
    #[default]
    None,
    CurrencyRestricted(&'static str),
    MinimumOrderTotal { amount: Decimal, currency: &'static str },
    MaximumOrderTotal { amount: Decimal, currency: &'static str },
    /// Every policy in the list must pass
    Composite(&'static [GatewayPolicy]),
}

impl GatewayPolicy {
    /// Checks an order total against the policy. The error describes why the gateway is unavailable.
    pub fn check(&self, total: Decimal, currency: &str) -> Result<(), String> {
        let currency_matches = |required: &str| required.eq_ignore_ascii_case(currency);
        match *self {
            GatewayPolicy::None => Ok(()),
            GatewayPolicy::CurrencyRestricted(required) if currency_matches(required) => Ok(()),
            GatewayPolicy::CurrencyRestricted(required) => Err(format!("Only available for {required} orders")),
            GatewayPolicy::MinimumOrderTotal { amount, currency: required } => {
                if !currency_matches(required) {
                    Err(format!("Only available for {required} orders"))
                } else if total < amount {
                    Err(format!("Only available for orders of at least {amount} {required}"))
                } else {
                    Ok(())
                }
            },
            GatewayPolicy::MaximumOrderTotal { amount, currency: required } => {
                if !currency_matches(required) {
                    Err(format!("Only available for {required} orders"))
                } else if total > amount {
                    Err(format!("Only available for orders of at most {amount} {required}"))
                } else {
                    Ok(())
                }
            },
            GatewayPolicy::Composite(policies) => policies.iter().try_for_each(|p| p.check(total, currency)),
        }
    }
}

const PAY_AFTER_DELIVERY_POLICY: &[GatewayPolicy] = &[
    GatewayPolicy::CurrencyRestricted(EUR),
    GatewayPolicy::MaximumOrderTotal { amount: Decimal::from_parts(300, 0, 0, false, 0), currency: EUR },
];

//--------------------------------------   GatewayDescriptor  ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GatewayDescriptor {
    pub id: GatewayId,
    /// The MultiSafepay gateway code, e.g. `IDEAL`
    pub code: &'static str,
    pub order_type: OrderType,
    pub shopping_cart: bool,
    pub policy: GatewayPolicy,
}

impl GatewayDescriptor {
    fn redirect(id: GatewayId, code: &'static str) -> Self {
        Self { id, code, order_type: OrderType::Redirect, shopping_cart: false, policy: GatewayPolicy::None }
    }

    fn direct(id: GatewayId, code: &'static str) -> Self {
        Self { id, code, order_type: OrderType::Direct, shopping_cart: false, policy: GatewayPolicy::None }
    }

    fn with_cart(mut self) -> Self {
        self.shopping_cart = true;
        self
    }

    fn with_policy(mut self, policy: GatewayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_available_for(&self, total: Decimal, currency: &str) -> bool {
        self.policy.check(total, currency).is_ok()
    }
}

fn standard_descriptors() -> Vec<GatewayDescriptor> {
    use GatewayDescriptor as D;
    use GatewayId::*;
    vec![
        D::redirect(DirectBankTransfer, "DBRTP"),
        D::redirect(Belfius, "BELFIUS"),
        D::redirect(ApplePay, "APPLEPAY"),
        D::redirect(MisterCash, "MISTERCASH"),
        D::redirect(Amex, "AMEX"),
        D::redirect(DirectDebit, "DIRDEB"),
        D::redirect(Dotpay, "DOTPAY"),
        D::redirect(Eps, "EPS"),
        D::redirect(Ferbuy, "FERBUY"),
        D::redirect(Giropay, "GIROPAY"),
        D::redirect(IdealQr, "IDEALQR"),
        D::redirect(Visa, "VISA"),
        D::redirect(Maestro, "MAESTRO"),
        D::redirect(Mastercard, "MASTERCARD"),
        D::redirect(Paysafecard, "PSAFECARD"),
        D::redirect(DirectBank, "DIRECTBANK"),
        D::redirect(Trustpay, "TRUSTPAY"),
        // Lets the customer pick a method on the payment page
        D::redirect(Wallet, ""),
        D::redirect(Afterpay, "AFTERPAY").with_cart(),
        D::redirect(Klarna, "KLARNA").with_cart(),
        D::redirect(PayAfterDelivery, "PAYAFTER")
            .with_cart()
            .with_policy(GatewayPolicy::Composite(PAY_AFTER_DELIVERY_POLICY)),
        D::redirect(Santander, "SANTANDER")
            .with_policy(GatewayPolicy::MinimumOrderTotal { amount: Decimal::from(250), currency: EUR }),
        D::direct(Ideal, "IDEAL").with_policy(GatewayPolicy::CurrencyRestricted(EUR)),
        D::direct(Kbc, "KBC"),
        D::direct(Trustly, "TRUSTLY"),
        D::direct(Paypal, "PAYPAL"),
        D::direct(Alipay, "ALIPAY"),
        D::direct(BankTransfer, "BANKTRANS"),
        D::direct(EInvoice, "EINVOICE").with_cart(),
        D::direct(IngHome, "INGHOME"),
        D::redirect(BabyGiftcard, "BABYGIFTCARD"),
        D::redirect(BeautyAndWellness, "BEAUTYANDWELLNESS"),
        D::redirect(Boekenbon, "BOEKENBON"),
        D::redirect(Erotiekbon, "EROTIEKBON"),
        D::redirect(FashionCheque, "FASHIONCHEQUE"),
        D::redirect(FashionGiftcard, "FASHIONGIFTCARD"),
        D::redirect(Fietsenbon, "FIETSENBON"),
        D::redirect(Gezondheidsbon, "GEZONDHEIDSBON"),
        D::redirect(Givacard, "GIVACARD"),
        D::redirect(Goodcard, "GOODCARD"),
        D::redirect(NationaleTuinbon, "NATIONALETUINBON"),
        D::redirect(NationaleVerwenCadeaubon, "NATIONALEVERWENCADEAUBON"),
        D::redirect(ParfumCadeaukaart, "PARFUMCADEAUKAART"),
        D::redirect(PodiumCadeaukaart, "PODIUM"),
        D::redirect(SportEnFit, "SPORTENFIT"),
        D::redirect(VvvCadeaukaart, "VVVGIFTCRD"),
        D::redirect(WellnessGiftcard, "WELLNESSGIFTCARD"),
        D::redirect(Wijncadeau, "WIJNCADEAU"),
        D::redirect(Winkelcheque, "WINKELCHEQUE"),
        D::redirect(YourGift, "YOURGIFT"),
    ]
}

//--------------------------------------    GatewayCatalog    ---------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GatewayCatalog {
    descriptors: HashMap<GatewayId, GatewayDescriptor>,
}

impl GatewayCatalog {
    /// Builds the standard catalog and verifies that it covers every [`GatewayId`] exactly once.
    pub fn new() -> Result<Self, CatalogError> {
        Self::from_descriptors(standard_descriptors())
    }

    pub fn from_descriptors(list: Vec<GatewayDescriptor>) -> Result<Self, CatalogError> {
        let mut descriptors = HashMap::with_capacity(list.len());
        for descriptor in list {
            if descriptors.insert(descriptor.id, descriptor).is_some() {
                return Err(CatalogError::DuplicateDescriptor(descriptor.id));
            }
        }
        if let Some(missing) = GatewayId::ALL.iter().find(|id| !descriptors.contains_key(id)) {
            return Err(CatalogError::MissingDescriptor(*missing));
        }
        debug!("🛒️ Gateway catalog loaded with {} gateways", descriptors.len());
        Ok(Self { descriptors })
    }

    pub fn descriptor(&self, id: GatewayId) -> Option<&GatewayDescriptor> {
        self.descriptors.get(&id)
    }

    /// Looks a gateway up by its store plugin id. Returns `None` for gateways that do not belong to MultiSafepay.
    pub fn lookup(&self, plugin_id: &str) -> Option<&GatewayDescriptor> {
        GatewayId::from_str(plugin_id).ok().and_then(|id| self.descriptor(id))
    }

    pub fn is_msp_gateway(&self, plugin_id: &str) -> bool {
        self.lookup(plugin_id).is_some()
    }

    /// The gateways that may be offered for an order with the given total, in catalog order.
    pub fn available_for(&self, total: Decimal, currency: &str) -> Vec<GatewayDescriptor> {
        GatewayId::ALL
            .iter()
            .filter_map(|id| self.descriptor(*id))
            .filter(|d| d.is_available_for(total, currency))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_catalog_is_complete() {
        let catalog = GatewayCatalog::new().expect("Standard catalog is incomplete");
        assert_eq!(catalog.len(), 50);
        assert_eq!(GatewayId::ALL.len(), 50);
        for id in GatewayId::ALL {
            assert_eq!(GatewayId::from_str(id.plugin_id()).unwrap(), *id);
        }
    }

    #[test]
    fn incomplete_catalogs_are_rejected() {
        let mut list = standard_descriptors();
        let removed = list.remove(3);
        assert_eq!(GatewayCatalog::from_descriptors(list.clone()).unwrap_err(), CatalogError::MissingDescriptor(removed.id));
        list.push(removed);
        list.push(removed);
        assert_eq!(GatewayCatalog::from_descriptors(list).unwrap_err(), CatalogError::DuplicateDescriptor(removed.id));
    }

    #[test]
    fn lookup_by_plugin_id() {
        let catalog = GatewayCatalog::new().unwrap();
        let ideal = catalog.lookup("msp_ideal").unwrap();
        assert_eq!(ideal.code, "IDEAL");
        assert_eq!(ideal.order_type, OrderType::Direct);
        assert!(!ideal.shopping_cart);
        let klarna = catalog.lookup("msp_klarna").unwrap();
        assert!(klarna.shopping_cart);
        assert_eq!(klarna.order_type, OrderType::Redirect);
        assert_eq!(catalog.lookup("msp_banktrans").unwrap().id, GatewayId::BankTransfer);
        assert!(catalog.is_msp_gateway("msp_yourgift"));
        assert!(!catalog.is_msp_gateway("manual"));
        assert!(!catalog.is_msp_gateway("MSP_IDEAL"));
    }

    #[test]
    fn availability_policies() {
        let catalog = GatewayCatalog::new().unwrap();
        let ideal = catalog.descriptor(GatewayId::Ideal).unwrap();
        assert!(ideal.is_available_for(Decimal::from(10), "EUR"));
        assert!(!ideal.is_available_for(Decimal::from(10), "USD"));

        let pad = catalog.descriptor(GatewayId::PayAfterDelivery).unwrap();
        assert!(pad.is_available_for(Decimal::from(300), "EUR"));
        assert!(!pad.is_available_for(Decimal::new(30001, 2), "EUR"));
        assert!(!pad.is_available_for(Decimal::from(100), "GBP"));
        let reason = pad.policy.check(Decimal::from(400), "EUR").unwrap_err();
        assert_eq!(reason, "Only available for orders of at most 300 EUR");

        let santander = catalog.descriptor(GatewayId::Santander).unwrap();
        assert!(santander.is_available_for(Decimal::from(250), "EUR"));
        let reason = santander.policy.check(Decimal::from(249), "EUR").unwrap_err();
        assert_eq!(reason, "Only available for orders of at least 250 EUR");

        let usd = catalog.available_for(Decimal::from(500), "USD");
        assert_eq!(usd.len(), 47);
        assert!(usd.iter().all(|d| d.policy == GatewayPolicy::None));
    }
}
