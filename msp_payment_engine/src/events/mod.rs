//! Notifications for things that happen to orders and payments.
//!
//! Hooks are registered on [`EventHooks`] before the engine starts. Each hook gets its own channel and runs on the
//! tokio runtime, so a slow hook never holds up a notification from the payment provider.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
