//! # MultiSafepay payment server
//!
//! The HTTP face of the MultiSafepay payment engine. It is responsible for:
//! * Receiving payment notifications from MultiSafepay and reconciling them into local payments and orders.
//! * Starting checkouts, refunds and fulfillments on behalf of the shop.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/notify`: The MultiSafepay notification callback. Accepts `GET` and `POST` with a `transactionid` query
//!   parameter.
//! * `/issuers/ideal` and `/gateways`: Lookups that the checkout form needs.
//! * `/api/...`: Checkout, refund and fulfillment routes for the shop. These require the admin token when one is
//!   configured.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod events;
pub mod helpers;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
