//! Event Bus Module
//!
//! This module provides the event bus at the center of Switchboard. The
//! `EventBus` routes inbound messages (from connectors to the agent loop) and
//! outbound messages (from the agent loop back to connectors).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Connector  │────>│  EventBus   │────>│  AgentLoop  │
//! │ (any chat)  │     │  (inbound)  │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            ▲                   │
//!                            │ outbound          │
//! ┌─────────────┐     ┌─────────────┐            │
//! │ Subscribers │<────│  dispatch   │<───────────┘
//! │ (per conn.) │     │   loop      │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! Both queues are bounded and FIFO. A full queue suspends async producers
//! (`publish_*`) and fails non-blocking producers (`try_publish_*`) with a
//! busy signal; this is the load-shedding point for the whole system.
//!
//! Outbound delivery additionally fans out to subscribers keyed by connector
//! id, in subscription order. Precondition: subscriber registration happens
//! during startup wiring, before `run_dispatch` is started; the table is not
//! designed for mutation concurrent with dispatch.

pub mod event;

pub use event::{InboundMessage, MediaKind, MediaRef, OutboundMessage};

use crate::error::{Result, SwitchboardError};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tracing::{error, info, warn};

/// Default capacity for the inbound and outbound queues.
const DEFAULT_CAPACITY: usize = 100;

/// An outbound delivery callback registered by a connector.
///
/// The callback receives each outbound message addressed to its connector id.
/// Failures are logged and skipped; they never block delivery to other
/// subscribers.
pub type OutboundSubscriber =
    Arc<dyn Fn(OutboundMessage) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// The central event bus routing messages between connectors and the agent
/// loop.
///
/// The `EventBus` maintains two bounded MPSC queues (inbound, outbound) and a
/// subscription table for outbound fan-out. It carries no business logic.
pub struct EventBus {
    /// Sender for inbound messages
    inbound_tx: mpsc::Sender<InboundMessage>,
    /// Receiver for inbound messages (wrapped for shared access)
    inbound_rx: Arc<Mutex<mpsc::Receiver<InboundMessage>>>,
    /// Sender for outbound messages
    outbound_tx: mpsc::Sender<OutboundMessage>,
    /// Receiver for outbound messages (wrapped for shared access)
    outbound_rx: Arc<Mutex<mpsc::Receiver<OutboundMessage>>>,
    /// Outbound subscribers keyed by connector id, in subscription order
    subscribers: Arc<RwLock<HashMap<String, Vec<OutboundSubscriber>>>>,
    /// Configured queue capacity, kept for introspection
    capacity: usize,
}

impl EventBus {
    /// Creates a new `EventBus` with the default queue capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a new `EventBus` with a custom queue capacity.
    ///
    /// # Example
    /// ```
    /// use switchboard::bus::EventBus;
    ///
    /// let bus = EventBus::with_capacity(500);
    /// assert_eq!(bus.capacity(), 500);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity.max(1));

        Self {
            inbound_tx,
            inbound_rx: Arc::new(Mutex::new(inbound_rx)),
            outbound_tx,
            outbound_rx: Arc::new(Mutex::new(outbound_rx)),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// The configured capacity of each queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publishes an inbound message to the bus, suspending while the queue
    /// is at capacity.
    ///
    /// # Errors
    /// Returns `SwitchboardError::BusClosed` if the receiver has been dropped.
    pub async fn publish_inbound(&self, msg: InboundMessage) -> Result<()> {
        self.inbound_tx
            .send(msg)
            .await
            .map_err(|_| SwitchboardError::BusClosed)
    }

    /// Consumes the next inbound message, suspending until one is available.
    ///
    /// Returns `None` only when the channel is closed (all senders dropped);
    /// there is no sentinel for "currently empty".
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }

    /// Publishes an outbound message to the bus, suspending while the queue
    /// is at capacity.
    ///
    /// # Errors
    /// Returns `SwitchboardError::BusClosed` if the receiver has been dropped.
    pub async fn publish_outbound(&self, msg: OutboundMessage) -> Result<()> {
        self.outbound_tx
            .send(msg)
            .await
            .map_err(|_| SwitchboardError::BusClosed)
    }

    /// Consumes the next outbound message, suspending until one is available.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        self.outbound_rx.lock().await.recv().await
    }

    /// Tries to publish an inbound message without suspending.
    ///
    /// For producers that cannot suspend (FFI shims, sync callbacks). A full
    /// queue is surfaced as `SwitchboardError::Busy`, never silently dropped.
    pub fn try_publish_inbound(&self, msg: InboundMessage) -> Result<()> {
        self.inbound_tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                SwitchboardError::Busy("inbound queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => SwitchboardError::BusClosed,
        })
    }

    /// Tries to publish an outbound message without suspending.
    pub fn try_publish_outbound(&self, msg: OutboundMessage) -> Result<()> {
        self.outbound_tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                SwitchboardError::Busy("outbound queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => SwitchboardError::BusClosed,
        })
    }

    /// Returns a clone of the inbound sender for connectors that publish
    /// from their own tasks.
    pub fn inbound_sender(&self) -> mpsc::Sender<InboundMessage> {
        self.inbound_tx.clone()
    }

    /// Returns a clone of the outbound sender.
    pub fn outbound_sender(&self) -> mpsc::Sender<OutboundMessage> {
        self.outbound_tx.clone()
    }

    /// Registers an outbound subscriber for a connector id.
    ///
    /// Subscribers for the same connector are invoked in registration order.
    /// Registration is part of startup wiring; it must complete before
    /// `run_dispatch` starts consuming.
    pub async fn subscribe_outbound(&self, connector_id: &str, subscriber: OutboundSubscriber) {
        let mut subs = self.subscribers.write().await;
        subs.entry(connector_id.to_string())
            .or_default()
            .push(subscriber);
        info!(connector = connector_id, "Registered outbound subscriber");
    }

    /// Number of subscribers registered for a connector id.
    pub async fn subscriber_count(&self, connector_id: &str) -> usize {
        let subs = self.subscribers.read().await;
        subs.get(connector_id).map(|v| v.len()).unwrap_or(0)
    }

    /// Runs the outbound dispatch loop until the shutdown signal fires or
    /// the outbound channel closes.
    ///
    /// Each message fans out to the subscribers registered for its connector
    /// id, in subscription order. A failing subscriber is logged and skipped;
    /// it does not block delivery to the remaining subscribers. No retry
    /// logic lives here.
    pub async fn run_dispatch(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Outbound dispatcher started");
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Outbound dispatcher received shutdown signal");
                        break;
                    }
                }
                msg = self.consume_outbound() => {
                    match msg {
                        Some(msg) => self.dispatch_one(msg).await,
                        None => {
                            info!("Outbound channel closed");
                            break;
                        }
                    }
                }
            }
        }
        info!("Outbound dispatcher stopped");
    }

    /// Fans a single outbound message out to its connector's subscribers.
    async fn dispatch_one(&self, msg: OutboundMessage) {
        let subs = self.subscribers.read().await;
        match subs.get(&msg.connector) {
            Some(list) if !list.is_empty() => {
                for (idx, subscriber) in list.iter().enumerate() {
                    if let Err(e) = subscriber(msg.clone()).await {
                        error!(
                            connector = %msg.connector,
                            subscriber = idx,
                            error = %e,
                            "Outbound subscriber failed, skipping"
                        );
                    }
                }
            }
            _ => {
                warn!(connector = %msg.connector, "No subscribers for outbound message");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    /// Clones the bus, sharing the same underlying queues and subscriber
    /// table.
    fn clone(&self) -> Self {
        Self {
            inbound_tx: self.inbound_tx.clone(),
            inbound_rx: Arc::clone(&self.inbound_rx),
            outbound_tx: self.outbound_tx.clone(),
            outbound_rx: Arc::clone(&self.outbound_rx),
            subscribers: Arc::clone(&self.subscribers),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_bus_inbound_flow() {
        let bus = EventBus::new();
        let msg = InboundMessage::new("telegram", "user123", "chat456", "Hello");

        bus.publish_inbound(msg.clone()).await.unwrap();
        let received = bus.consume_inbound().await.unwrap();

        assert_eq!(received.content, "Hello");
        assert_eq!(received.connector, "telegram");
        assert_eq!(received.session_key, "telegram:chat456");
    }

    #[tokio::test]
    async fn test_bus_outbound_flow() {
        let bus = EventBus::new();
        let msg = OutboundMessage::new("telegram", "chat456", "Response");

        bus.publish_outbound(msg).await.unwrap();
        let received = bus.consume_outbound().await.unwrap();

        assert_eq!(received.content, "Response");
        assert_eq!(received.conversation_id, "chat456");
    }

    #[tokio::test]
    async fn test_bus_fifo_ordering() {
        let bus = EventBus::new();

        for i in 0..5 {
            let msg = InboundMessage::new("telegram", "user", "chat", &format!("Message {}", i));
            bus.publish_inbound(msg).await.unwrap();
        }

        for i in 0..5 {
            let received = bus.consume_inbound().await.unwrap();
            assert_eq!(received.content, format!("Message {}", i));
        }
    }

    #[tokio::test]
    async fn test_try_publish_inbound_busy() {
        let bus = EventBus::with_capacity(2);

        bus.try_publish_inbound(InboundMessage::new("t", "u", "c", "1"))
            .unwrap();
        bus.try_publish_inbound(InboundMessage::new("t", "u", "c", "2"))
            .unwrap();

        let result = bus.try_publish_inbound(InboundMessage::new("t", "u", "c", "3"));
        assert!(matches!(result, Err(SwitchboardError::Busy(_))));
    }

    #[tokio::test]
    async fn test_try_publish_outbound_busy() {
        let bus = EventBus::with_capacity(2);

        bus.try_publish_outbound(OutboundMessage::new("t", "c", "1"))
            .unwrap();
        bus.try_publish_outbound(OutboundMessage::new("t", "c", "2"))
            .unwrap();

        let result = bus.try_publish_outbound(OutboundMessage::new("t", "c", "3"));
        assert!(matches!(result, Err(SwitchboardError::Busy(_))));
    }

    #[tokio::test]
    async fn test_queue_never_exceeds_capacity() {
        let bus = EventBus::with_capacity(3);

        // Fill to capacity without a consumer.
        for i in 0..3 {
            bus.try_publish_inbound(InboundMessage::new("t", "u", "c", &i.to_string()))
                .unwrap();
        }
        assert!(bus
            .try_publish_inbound(InboundMessage::new("t", "u", "c", "overflow"))
            .is_err());

        // Draining one slot readmits exactly one message.
        bus.consume_inbound().await.unwrap();
        assert!(bus
            .try_publish_inbound(InboundMessage::new("t", "u", "c", "3"))
            .is_ok());
    }

    #[tokio::test]
    async fn test_publish_suspends_on_full_queue() {
        let bus = Arc::new(EventBus::with_capacity(1));
        bus.publish_inbound(InboundMessage::new("t", "u", "c", "first"))
            .await
            .unwrap();

        let bus_clone = Arc::clone(&bus);
        let publisher = tokio::spawn(async move {
            bus_clone
                .publish_inbound(InboundMessage::new("t", "u", "c", "second"))
                .await
        });

        // The publisher should still be suspended on the full queue.
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        assert!(!publisher.is_finished());

        // Draining unblocks it.
        bus.consume_inbound().await.unwrap();
        publisher.await.unwrap().unwrap();
        assert_eq!(bus.consume_inbound().await.unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_bus_sender_clones() {
        let bus = EventBus::new();
        let sender1 = bus.inbound_sender();
        let sender2 = bus.inbound_sender();

        sender1
            .send(InboundMessage::new("telegram", "user1", "chat1", "From sender 1"))
            .await
            .unwrap();
        sender2
            .send(InboundMessage::new("discord", "user2", "chat2", "From sender 2"))
            .await
            .unwrap();

        assert_eq!(bus.consume_inbound().await.unwrap().content, "From sender 1");
        assert_eq!(bus.consume_inbound().await.unwrap().content, "From sender 2");
    }

    #[tokio::test]
    async fn test_bus_concurrent_access() {
        let bus = Arc::new(EventBus::new());
        let bus_clone = Arc::clone(&bus);

        let producer = tokio::spawn(async move {
            for i in 0..10 {
                let msg = InboundMessage::new("test", "user", "chat", &format!("Msg {}", i));
                bus_clone.publish_inbound(msg).await.unwrap();
            }
        });

        let bus_clone2 = Arc::clone(&bus);
        let consumer = tokio::spawn(async move {
            let mut count = 0;
            while count < 10 {
                if bus_clone2.consume_inbound().await.is_some() {
                    count += 1;
                }
            }
            count
        });

        producer.await.unwrap();
        assert_eq!(consumer.await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_subscribe_and_dispatch() {
        let bus = Arc::new(EventBus::new());
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let delivered_clone = Arc::clone(&delivered);
        let subscriber: OutboundSubscriber = Arc::new(move |msg: OutboundMessage| {
            let delivered = Arc::clone(&delivered_clone);
            async move {
                delivered.lock().await.push(msg.content);
                Ok(())
            }
            .boxed()
        });
        bus.subscribe_outbound("telegram", subscriber).await;
        assert_eq!(bus.subscriber_count("telegram").await, 1);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let bus_clone = Arc::clone(&bus);
        let dispatcher = tokio::spawn(async move { bus_clone.run_dispatch(shutdown_rx).await });

        bus.publish_outbound(OutboundMessage::new("telegram", "chat1", "hello"))
            .await
            .unwrap();
        bus.publish_outbound(OutboundMessage::new("telegram", "chat1", "world"))
            .await
            .unwrap();

        // Give the dispatcher a moment to drain.
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        dispatcher.await.unwrap();

        let seen = delivered.lock().await;
        assert_eq!(*seen, vec!["hello".to_string(), "world".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_others() {
        let bus = Arc::new(EventBus::new());
        let successes = Arc::new(AtomicUsize::new(0));

        let failing: OutboundSubscriber = Arc::new(|_msg: OutboundMessage| {
            async { Err(SwitchboardError::Busy("connector offline".into())) }.boxed()
        });
        let successes_clone = Arc::clone(&successes);
        let counting: OutboundSubscriber = Arc::new(move |_msg: OutboundMessage| {
            let successes = Arc::clone(&successes_clone);
            async move {
                successes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            .boxed()
        });

        bus.subscribe_outbound("slack", failing).await;
        bus.subscribe_outbound("slack", counting).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let bus_clone = Arc::clone(&bus);
        let dispatcher = tokio::spawn(async move { bus_clone.run_dispatch(shutdown_rx).await });

        bus.publish_outbound(OutboundMessage::new("slack", "c1", "msg"))
            .await
            .unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        dispatcher.await.unwrap();

        assert_eq!(successes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_connector_is_skipped() {
        let bus = Arc::new(EventBus::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let bus_clone = Arc::clone(&bus);
        let dispatcher = tokio::spawn(async move { bus_clone.run_dispatch(shutdown_rx).await });

        // No subscribers at all; the message is logged and dropped, the
        // dispatcher keeps running.
        bus.publish_outbound(OutboundMessage::new("nowhere", "c1", "msg"))
            .await
            .unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        assert!(!dispatcher.is_finished());

        shutdown_tx.send(true).unwrap();
        dispatcher.await.unwrap();
    }

    #[tokio::test]
    async fn test_bus_clone_shares_queues() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.publish_inbound(InboundMessage::new("t", "u", "c", "shared"))
            .await
            .unwrap();
        assert_eq!(bus2.consume_inbound().await.unwrap().content, "shared");
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let bus = EventBus::with_capacity(0);
        assert_eq!(bus.capacity(), 1);
    }
}
