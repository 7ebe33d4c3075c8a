//! Publish/subscribe transport consumed by the coordinator.
//!
//! The coordinator only ever sees these traits. [`MqttTransport`] talks to a
//! real broker; [`MemoryTransport`] keeps everything in process.

mod memory;
mod mqtt;

pub use memory::{MemoryBus, MemoryTransport};
pub use mqtt::{MqttSettings, MqttTransport};

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use std::time::Duration;

/// A message delivered by the bus.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Inbound {
    /// Topic it arrived on.
    topic: String,
    /// Raw payload bytes.
    payload: Vec<u8>,
}

/// A message ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Outbound {
    /// Destination topic.
    topic: String,
    /// Raw payload bytes.
    payload: Vec<u8>,
}

/// Transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TransportError {
    /// Broker did not acknowledge a publish in time.
    #[display("No acknowledgement for publish on {} within {:?}", topic, waited)]
    PublishTimeout {
        /// Topic of the unacknowledged publish.
        topic: String,
        /// How long we waited.
        waited: Duration,
    },
    /// Could not connect to the broker.
    #[display("Failed to connect to {}: {}", broker, reason)]
    ConnectionFailure {
        /// Broker address.
        broker: String,
        /// Underlying failure.
        reason: String,
    },
    /// Connection is gone and no more messages will arrive.
    #[display("Transport closed")]
    Closed,
    /// Client rejected a request.
    #[display("Client error: {}", reason)]
    Client {
        /// Underlying failure.
        reason: String,
    },
}

/// Sending half of a transport.
#[async_trait::async_trait]
pub trait Publish: Send + Sync {
    /// Publishes `payload` on `topic` and waits for the delivery acknowledgement.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Receiving half of a transport.
#[async_trait::async_trait]
pub trait Receive: Send {
    /// Waits up to `timeout` for the next message. `Ok(None)` on timeout.
    async fn receive_next(&mut self, timeout: Duration) -> Result<Option<Inbound>, TransportError>;
}

/// A connected publish/subscribe session.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Subscribes to `topic`.
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Borrows the sending and receiving halves at once, so a listener can
    /// drain messages while a decision loop publishes.
    fn split(&mut self) -> (&dyn Publish, &mut dyn Receive);

    /// Closes the connection.
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Publishes through the sending half.
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let (publisher, _) = self.split();
        publisher.publish(topic, payload).await
    }

    /// Publishes a prepared message.
    async fn send(&mut self, outbound: Outbound) -> Result<(), TransportError> {
        let Outbound { topic, payload } = outbound;
        self.publish(&topic, payload).await
    }

    /// Receives through the receiving half.
    async fn receive_next(&mut self, timeout: Duration) -> Result<Option<Inbound>, TransportError> {
        let (_, receiver) = self.split();
        receiver.receive_next(timeout).await
    }
}
