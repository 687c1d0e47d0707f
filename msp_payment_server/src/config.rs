use std::{env, time::Duration};

use log::*;
use msp_common::{parse_boolean_flag, Secret};
use msp_payment_engine::order_data::{CheckoutContext, RequestContext};
use multisafepay_tools::{ApiMode, MspConfig};

const DEFAULT_MSP_HOST: &str = "127.0.0.1";
const DEFAULT_MSP_PORT: u16 = 8360;
const DEFAULT_LOCALE: &str = "en";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// The shop language. The customer locale sent to MultiSafepay is derived from it.
    pub locale: String,
    /// The public base url of this server, without a trailing slash.
    pub site_url: String,
    /// Requests to the `/api` scope must carry this token in the `msp_admin_token` header. No check is made if it is
    /// not set.
    pub admin_token: Option<Secret<String>>,
    pub msp: MspConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MSP_HOST.to_string(),
            port: DEFAULT_MSP_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            locale: DEFAULT_LOCALE.to_string(),
            site_url: format!("http://{DEFAULT_MSP_HOST}:{DEFAULT_MSP_PORT}"),
            admin_token: None,
            msp: MspConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, site_url: format!("http://{host}:{port}"), ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MSP_HOST").ok().unwrap_or_else(|| DEFAULT_MSP_HOST.into());
        let port = env::var("MSP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MSP_PORT. {e} Using the default, {DEFAULT_MSP_PORT}, instead."
                    );
                    DEFAULT_MSP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MSP_PORT);
        let database_url = env::var("MSP_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MSP_DATABASE_URL is not set. Please set it to the URL for the payment database.");
            String::default()
        });
        let use_x_forwarded_for = parse_flag("MSP_USE_X_FORWARDED_FOR");
        let use_forwarded = parse_flag("MSP_USE_FORWARDED");
        let locale = env::var("MSP_LOCALE").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            info!("🪛️ MSP_LOCALE is not set. Using '{DEFAULT_LOCALE}'.");
            DEFAULT_LOCALE.to_string()
        });
        let site_url = env::var("MSP_SITE_URL").map(|s| s.trim_end_matches('/').to_string()).unwrap_or_else(|_| {
            let url = format!("http://{host}:{port}");
            warn!(
                "🪛️ MSP_SITE_URL is not set. MultiSafepay will be told to call back on {url}, which is probably not \
                 reachable from the internet."
            );
            url
        });
        let admin_token = env::var("MSP_ADMIN_TOKEN").ok().filter(|s| !s.is_empty()).map(Secret::new);
        if admin_token.is_none() {
            warn!("🚨️ MSP_ADMIN_TOKEN is not set. The /api routes are open to anyone who can reach the server.");
        }
        let mut msp = MspConfig::new_from_env_or_default();
        if let Some(timeout) = configure_timeout() {
            msp.timeout = timeout;
        }
        Self { host, port, database_url, use_x_forwarded_for, use_forwarded, locale, site_url, admin_token, msp }
    }

    pub fn notification_url(&self) -> String {
        format!("{}/notify", self.site_url)
    }
}

fn parse_flag(name: &str) -> bool {
    parse_boolean_flag(env::var(name).ok(), false)
}

fn configure_timeout() -> Option<Duration> {
    env::var("MSP_TIMEOUT")
        .map_err(|_| trace!("🪛️ MSP_TIMEOUT is not set. Using the default timeout."))
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for MSP_TIMEOUT. {e}"))
        })
        .ok()
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// The part of the server configuration that request handlers need. Secrets are left out.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub locale: String,
    pub site_url: String,
    /// The MultiSafepay environment used for lookups that are not tied to an order
    pub account_type: ApiMode,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            locale: config.locale.clone(),
            site_url: config.site_url.clone(),
            account_type: config.msp.account_type,
        }
    }

    /// The callback urls for a checkout of `order_id`. Shops may override where the customer returns to.
    pub fn checkout_context(
        &self,
        order_id: i64,
        request: RequestContext,
        return_url: Option<String>,
        cancel_url: Option<String>,
    ) -> CheckoutContext {
        CheckoutContext {
            notification_url: format!("{}/notify", self.site_url),
            redirect_url: return_url.unwrap_or_else(|| format!("{}/checkout/{order_id}/complete", self.site_url)),
            cancel_url: cancel_url.unwrap_or_else(|| format!("{}/checkout/{order_id}/cancel", self.site_url)),
            request,
        }
    }
}
