use std::{fmt::Display, str::FromStr, time::Duration};

use log::*;
use msp_common::Secret;
use serde::{Deserialize, Serialize};

pub const LIVE_BASE_URL: &str = "https://api.multisafepay.com/v1/json/";
pub const TEST_BASE_URL: &str = "https://testapi.multisafepay.com/v1/json/";
/// Upper bound on every call to the PSP. A call that takes longer fails with a transport error.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Thirty days, MultiSafepay's own default lifetime for a payment link.
pub const DEFAULT_SECONDS_ACTIVE: u64 = 2_592_000;

//--------------------------------------     ApiMode       ---------------------------------------------------------
/// Selects which MultiSafepay environment (and therefore which API key and base URL) a request goes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Test,
    Live,
}

impl ApiMode {
    pub fn base_url(&self) -> &'static str {
        match self {
            ApiMode::Test => TEST_BASE_URL,
            ApiMode::Live => LIVE_BASE_URL,
        }
    }
}

impl Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiMode::Test => write!(f, "test"),
            ApiMode::Live => write!(f, "live"),
        }
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "live" => Ok(Self::Live),
            s => Err(format!("Invalid API mode: {s}")),
        }
    }
}

//--------------------------------------   GatewayMode     ---------------------------------------------------------
/// The mode configured on an individual payment gateway. `NotApplicable` defers to the account type in [`MspConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayMode {
    #[serde(rename = "test")]
    Test,
    #[serde(rename = "live")]
    Live,
    #[default]
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl Display for GatewayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayMode::Test => write!(f, "test"),
            GatewayMode::Live => write!(f, "live"),
            GatewayMode::NotApplicable => write!(f, "n/a"),
        }
    }
}

impl FromStr for GatewayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "live" => Ok(Self::Live),
            "n/a" | "" => Ok(Self::NotApplicable),
            s => Err(format!("Invalid gateway mode: {s}")),
        }
    }
}

impl From<String> for GatewayMode {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|e| {
            error!("🪛️ {e}. Falling back to the account type.");
            GatewayMode::NotApplicable
        })
    }
}

//--------------------------------------    MspConfig      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct MspConfig {
    /// The account type used when a gateway does not specify its own mode.
    pub account_type: ApiMode,
    pub live_api_key: Secret<String>,
    pub test_api_key: Secret<String>,
    /// Lifetime of the hosted payment page, in seconds.
    pub seconds_active: u64,
    pub timeout: Duration,
}

impl Default for MspConfig {
    fn default() -> Self {
        Self {
            account_type: ApiMode::Test,
            live_api_key: Secret::default(),
            test_api_key: Secret::default(),
            seconds_active: DEFAULT_SECONDS_ACTIVE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl MspConfig {
    pub fn new_from_env_or_default() -> Self {
        let account_type = std::env::var("MSP_ACCOUNT_TYPE")
            .ok()
            .and_then(|s| {
                s.parse::<ApiMode>()
                    .map_err(|e| error!("🪛️ {e}. MSP_ACCOUNT_TYPE must be 'test' or 'live'. Using 'test'."))
                    .ok()
            })
            .unwrap_or_else(|| {
                warn!("🪛️ MSP_ACCOUNT_TYPE not set, using the test environment");
                ApiMode::Test
            });
        let live_api_key = Secret::new(std::env::var("MSP_LIVE_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MSP_LIVE_API_KEY not set. Live payments will fail until it is configured.");
            String::default()
        }));
        let test_api_key = Secret::new(std::env::var("MSP_TEST_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MSP_TEST_API_KEY not set. Test payments will fail until it is configured.");
            String::default()
        }));
        let seconds_active = std::env::var("MSP_SECONDS_ACTIVE")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for MSP_SECONDS_ACTIVE. {e}. Using the default instead.")
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_SECONDS_ACTIVE);
        Self { account_type, live_api_key, test_api_key, seconds_active, timeout: DEFAULT_TIMEOUT }
    }

    pub fn api_key(&self, mode: ApiMode) -> &Secret<String> {
        match mode {
            ApiMode::Test => &self.test_api_key,
            ApiMode::Live => &self.live_api_key,
        }
    }

    /// Resolves the effective API mode for a gateway. Gateways without an explicit mode use the account type.
    pub fn resolve_mode(&self, gateway_mode: GatewayMode) -> ApiMode {
        match gateway_mode {
            GatewayMode::Test => ApiMode::Test,
            GatewayMode::Live => ApiMode::Live,
            GatewayMode::NotApplicable => self.account_type,
        }
    }
}
