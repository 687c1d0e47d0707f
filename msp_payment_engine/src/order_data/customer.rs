use std::net::IpAddr;

use multisafepay_tools::data_objects::CustomerBlock;

use crate::{
    db_types::{AddressProfile, Order},
    helpers::parse_street_address,
};

/// What we know about the customer's HTTP request at checkout time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub client_ip: Option<String>,
    /// The raw `X-Forwarded-For` header, if any
    pub forwarded_for: Option<String>,
    /// The shop language, e.g. `nl` or `en-gb`
    pub language: String,
}

impl RequestContext {
    pub fn new<S: Into<String>>(language: S) -> Self {
        Self { language: language.into(), ..Default::default() }
    }

    pub fn with_client_ip<S: Into<String>>(mut self, ip: S) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    pub fn with_forwarded_for<S: Into<String>>(mut self, header: S) -> Self {
        self.forwarded_for = Some(header.into());
        self
    }
}

/// Converts a language code into the `xx_XX` locale MultiSafepay expects. `nl` becomes `nl_NL` and `en-gb` becomes
/// `en_GB`.
pub fn locale_for(language: &str) -> String {
    let language = language.trim();
    match language.split_once(|c: char| c == '-' || c == '_') {
        Some((lang, region)) => format!("{}_{}", lang.to_ascii_lowercase(), region.to_ascii_uppercase()),
        None => format!("{}_{}", language.to_ascii_lowercase(), language.to_ascii_uppercase()),
    }
}

/// The first address in an `X-Forwarded-For` header, if it is a valid IP address.
pub fn forwarded_ip(header: Option<&str>) -> Option<String> {
    let first = header?.split(',').next()?.trim();
    first.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

/// Builds a customer block from the order's billing profile, or from the first shipment's profile when
/// `use_shipping_profile` is set. Only the billing block carries the locale and IP addresses.
pub fn resolve_customer(order: &Order, use_shipping_profile: bool, request: &RequestContext) -> CustomerBlock {
    let profile = if use_shipping_profile {
        order.shipments.first().map(|s| &s.shipping_profile)
    } else {
        order.billing_profile.as_ref()
    };
    let mut customer = profile.map(address_block).unwrap_or_default();
    customer.email = order.email.clone();
    if !use_shipping_profile {
        customer.locale = Some(locale_for(&request.language));
        customer.ip_address = request.client_ip.clone();
        customer.forwarded_ip = forwarded_ip(request.forwarded_for.as_deref());
    }
    customer
}

fn address_block(profile: &AddressProfile) -> CustomerBlock {
    let (street, house_number) = parse_street_address(&profile.address_line1);
    let non_empty = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
    CustomerBlock {
        first_name: non_empty(&profile.given_name),
        last_name: non_empty(&profile.family_name),
        address1: non_empty(&street),
        address2: profile.address_line2.as_deref().and_then(non_empty),
        house_number: non_empty(&house_number),
        zip_code: non_empty(profile.postal_code.trim()),
        city: non_empty(&profile.locality),
        state: profile.administrative_area.as_deref().and_then(non_empty),
        country: non_empty(&profile.country_code),
        ..Default::default()
    }
}
