use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Receives events of type `E` from any number of [`EventProducer`]s and runs `handler` on each of them.
///
/// The handler task ends once every producer has been dropped and all spawned handler calls have finished.
pub struct EventHandler<E: Send + 'static> {
    name: &'static str,
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + 'static> EventHandler<E> {
    pub fn new(name: &'static str, buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { name, receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { name: self.name, sender: self.sender.clone() }
    }

    pub async fn start_handler(self) {
        let Self { name, mut receiver, sender, handler } = self;
        // Only producers keep the channel open from here on
        drop(sender);
        debug!("📬️ {name} handler started");
        let mut running = JoinSet::new();
        while let Some(event) = receiver.recv().await {
            let handler = Arc::clone(&handler);
            running.spawn(async move { handler(event).await });
            // Reap whatever has finished so the set does not grow without bound
            while let Some(result) = running.try_join_next() {
                if let Err(e) = result {
                    error!("📬️ {name} hook failed. {e}");
                }
            }
        }
        trace!("📬️ {name} channel closed. Waiting for {} hook(s) to finish", running.len());
        while let Some(result) = running.join_next().await {
            if let Err(e) = result {
                error!("📬️ {name} hook failed. {e}");
            }
        }
        debug!("📬️ {name} handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send> {
    name: &'static str,
    sender: mpsc::Sender<E>,
}

impl<E: Send> EventProducer<E> {
    pub async fn publish_event(&self, event: E) {
        if self.sender.send(event).await.is_err() {
            warn!("📬️ The {} handler has stopped. Event dropped.", self.name);
        }
    }
}
