use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderActivityEvent,
    OrderTransitionedEvent,
    PaymentUpdatedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The publishing side of every registered hook. Cheap to clone and shared by all engine APIs.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_activity_producer: Vec<EventProducer<OrderActivityEvent>>,
    pub payment_updated_producer: Vec<EventProducer<PaymentUpdatedEvent>>,
    pub order_transitioned_producer: Vec<EventProducer<OrderTransitionedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_activity(&self, event: OrderActivityEvent) {
        for producer in &self.order_activity_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_payment_updated(&self, event: PaymentUpdatedEvent) {
        for producer in &self.payment_updated_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_transitioned(&self, event: OrderTransitionedEvent) {
        for producer in &self.order_transitioned_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_activity: Option<EventHandler<OrderActivityEvent>>,
    pub on_payment_updated: Option<EventHandler<PaymentUpdatedEvent>>,
    pub on_order_transitioned: Option<EventHandler<OrderTransitionedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_activity = hooks.on_order_activity.map(|f| EventHandler::new("OrderActivity", buffer_size, f));
        let on_payment_updated = hooks.on_payment_updated.map(|f| EventHandler::new("PaymentUpdated", buffer_size, f));
        let on_order_transitioned =
            hooks.on_order_transitioned.map(|f| EventHandler::new("OrderTransitioned", buffer_size, f));
        Self { on_order_activity, on_payment_updated, on_order_transitioned }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_activity {
            result.order_activity_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_updated {
            result.payment_updated_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_transitioned {
            result.order_transitioned_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_activity {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_updated {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_transitioned {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_activity: Option<Handler<OrderActivityEvent>>,
    pub on_payment_updated: Option<Handler<PaymentUpdatedEvent>>,
    pub on_order_transitioned: Option<Handler<OrderTransitionedEvent>>,
}

impl EventHooks {
    pub fn on_order_activity<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderActivityEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_activity = Some(Arc::new(f));
        self
    }

    pub fn on_payment_updated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentUpdatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_payment_updated = Some(Arc::new(f));
        self
    }

    pub fn on_order_transitioned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderTransitionedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_transitioned = Some(Arc::new(f));
        self
    }
}
