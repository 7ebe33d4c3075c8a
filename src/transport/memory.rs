//! In-process transport.
//!
//! Messages injected through a [`MemoryBus`] are delivered to the paired
//! [`MemoryTransport`]; everything the transport publishes is recorded on the
//! bus. An optional responder plays the part of the remote device.

use super::{Inbound, Outbound, Publish, Receive, Transport, TransportError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

type Responder = Box<dyn FnMut(&Outbound) -> Vec<Inbound> + Send>;

#[derive(Default)]
struct BusState {
    published: Vec<Outbound>,
    subscriptions: Vec<String>,
    fail_publishes: bool,
    disconnected: bool,
    responder: Option<Responder>,
}

#[derive(Clone)]
struct SharedState(Arc<Mutex<BusState>>);

impl SharedState {
    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Test-side handle onto a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryBus {
    state: SharedState,
    tx: mpsc::UnboundedSender<Inbound>,
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBus").finish_non_exhaustive()
    }
}

impl MemoryBus {
    /// Delivers a message to the transport.
    #[instrument(skip(self, payload))]
    pub fn deliver(&self, topic: &str, payload: impl Into<Vec<u8>>) {
        // The receiver lives as long as the transport; a send after it is
        // dropped has nobody to reach.
        let _ = self.tx.send(Inbound::new(topic.to_string(), payload.into()));
    }

    /// Everything published so far, in order.
    pub fn published(&self) -> Vec<Outbound> {
        self.state.lock().published.clone()
    }

    /// Messages published on `topic`.
    pub fn published_on(&self, topic: &str) -> Vec<Outbound> {
        self.published()
            .into_iter()
            .filter(|m| m.topic() == topic)
            .collect()
    }

    /// Topics subscribed so far.
    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().subscriptions.clone()
    }

    /// Makes every later publish fail with a timeout.
    pub fn fail_publishes(&self, fail: bool) {
        self.state.lock().fail_publishes = fail;
    }

    /// Whether the transport has been disconnected.
    pub fn is_disconnected(&self) -> bool {
        self.state.lock().disconnected
    }

    /// Installs a responder called for every successful publish; the
    /// messages it returns are delivered back to the transport.
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&Outbound) -> Vec<Inbound> + Send + 'static,
    {
        self.state.lock().responder = Some(Box::new(responder));
    }
}

struct MemoryPublisher {
    state: SharedState,
    tx: mpsc::UnboundedSender<Inbound>,
}

#[async_trait::async_trait]
impl Publish for MemoryPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let replies = {
            let mut state = self.state.lock();
            if state.disconnected {
                return Err(TransportError::Closed);
            }
            if state.fail_publishes {
                return Err(TransportError::PublishTimeout {
                    topic: topic.to_string(),
                    waited: Duration::ZERO,
                });
            }
            let outbound = Outbound::new(topic.to_string(), payload);
            debug!(topic, "Recorded publish");
            let replies = match state.responder.as_mut() {
                Some(responder) => responder(&outbound),
                None => Vec::new(),
            };
            state.published.push(outbound);
            replies
        };
        for reply in replies {
            let _ = self.tx.send(reply);
        }
        Ok(())
    }
}

struct MemoryReceiver {
    state: SharedState,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

#[async_trait::async_trait]
impl Receive for MemoryReceiver {
    async fn receive_next(&mut self, timeout: Duration) -> Result<Option<Inbound>, TransportError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let message = match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Err(TransportError::Closed),
                Ok(Some(message)) => message,
            };
            let subscribed = self
                .state
                .lock()
                .subscriptions
                .iter()
                .any(|t| t == message.topic());
            if subscribed {
                return Ok(Some(message));
            }
            debug!(topic = %message.topic(), "Dropping message on unsubscribed topic");
        }
    }
}

/// Transport that never leaves the process.
pub struct MemoryTransport {
    state: SharedState,
    publisher: MemoryPublisher,
    receiver: MemoryReceiver,
}

impl MemoryTransport {
    /// Creates a connected transport and the bus handle that drives it.
    pub fn new() -> (Self, MemoryBus) {
        let state = SharedState(Arc::new(Mutex::new(BusState::default())));
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            state: state.clone(),
            publisher: MemoryPublisher {
                state: state.clone(),
                tx: tx.clone(),
            },
            receiver: MemoryReceiver {
                state: state.clone(),
                rx,
            },
        };
        (transport, MemoryBus { state, tx })
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.state.lock().subscriptions.push(topic.to_string());
        Ok(())
    }

    fn split(&mut self) -> (&dyn Publish, &mut dyn Receive) {
        (&self.publisher, &mut self.receiver)
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.state.lock().disconnected = true;
        Ok(())
    }
}
