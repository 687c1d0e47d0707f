use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::{debug, trace};
use msp_payment_engine::order_data::RequestContext;
use regex::Regex;

use crate::config::ServerOptions;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The first address in the `X-Forwarded-For` header, iif `use_x_forwarded_for` is set.
/// 2. The `for=` entry of the `Forwarded` header, iif `use_forwarded` is set.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("💻️ Checking X-Forwarded-For header");
        result = forwarded_for_header(req)
            .and_then(|s| s.split(',').next().map(|ip| ip.trim().to_string()))
            .and_then(|s| IpAddr::from_str(&s).ok());
        if let Some(ip) = result {
            debug!("💻️ Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("💻️ Checking Forwarded header");
        let re = Regex::new(r#"for="?(?P<ip>[^;,"]+)"#).ok();
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| re.as_ref().and_then(|re| re.captures(v)))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str())
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("💻️ Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("💻️ Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

fn forwarded_for_header(req: &HttpRequest) -> Option<String> {
    req.headers().get("X-Forwarded-For").and_then(|v| v.to_str().ok()).map(String::from)
}

/// The customer-facing details of the request that MultiSafepay wants with a new order.
pub fn request_context(req: &HttpRequest, options: &ServerOptions, language: Option<&str>) -> RequestContext {
    let mut context = RequestContext::new(language.unwrap_or(&options.locale));
    if let Some(ip) = get_remote_ip(req, options.use_x_forwarded_for, options.use_forwarded) {
        context = context.with_client_ip(ip.to_string());
    }
    if let Some(header) = forwarded_for_header(req) {
        context = context.with_forwarded_for(header);
    }
    context
}
