//! MQTT transport backed by `rumqttc`.

use super::{Inbound, Publish, Receive, Transport, TransportError};
use derive_getters::Getters;
use derive_new::new;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

const REQUEST_CAPACITY: usize = 16;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// Broker connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct MqttSettings {
    /// Broker host name or address.
    host: String,
    /// Broker port.
    port: u16,
    /// MQTT client identifier.
    client_id: String,
    /// Keep-alive interval (at least five seconds).
    keep_alive: Duration,
    /// How long to wait for CONNACK.
    connect_timeout: Duration,
    /// How long a publish waits for PUBACK.
    publish_timeout: Duration,
}

impl MqttSettings {
    /// `host:port` for log and error messages.
    pub fn broker(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Topics subscribed on this connection, replayed after a clean reconnect.
#[derive(Debug, Clone, Default)]
struct Subscriptions(Arc<std::sync::Mutex<Vec<String>>>);

impl Subscriptions {
    fn add(&self, topic: &str) {
        let mut topics = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }

    fn topics(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Packet-id events reported by the event loop to the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublishEvent {
    /// A QoS 1 PUBLISH left with this packet id.
    Sent(u16),
    /// The broker acknowledged this packet id.
    Acked(u16),
}

/// Matches PUBACKs to the one publish in flight.
///
/// Acks for other packet ids belong to publishes that already gave up
/// waiting and are skipped.
#[derive(Debug, Default)]
struct AckTracker {
    expected: Option<u16>,
}

impl AckTracker {
    /// Feeds one event. Returns true once our publish is acknowledged.
    fn observe(&mut self, event: PublishEvent) -> bool {
        match (event, self.expected) {
            (PublishEvent::Sent(pkid), None) => {
                self.expected = Some(pkid);
                false
            }
            (PublishEvent::Acked(pkid), Some(expected)) if pkid == expected => true,
            (event, _) => {
                trace!(?event, "Skipping packet id of an earlier publish");
                false
            }
        }
    }
}

struct MqttPublisher {
    client: AsyncClient,
    events: Mutex<mpsc::UnboundedReceiver<PublishEvent>>,
    timeout: Duration,
}

#[async_trait::async_trait]
impl Publish for MqttPublisher {
    #[instrument(skip(self, payload), fields(len = payload.len()))]
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let mut events = self.events.lock().await;
        // Events left over from publishes that already timed out.
        while events.try_recv().is_ok() {}

        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| TransportError::Client {
                reason: e.to_string(),
            })?;

        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut tracker = AckTracker::default();
        loop {
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Some(event)) => {
                    if tracker.observe(event) {
                        debug!(pkid = ?tracker.expected, "Publish acknowledged");
                        return Ok(());
                    }
                }
                Ok(None) => return Err(TransportError::Closed),
                Err(_) => {
                    return Err(TransportError::PublishTimeout {
                        topic: topic.to_string(),
                        waited: self.timeout,
                    });
                }
            }
        }
    }
}

struct MqttReceiver {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

#[async_trait::async_trait]
impl Receive for MqttReceiver {
    async fn receive_next(&mut self, timeout: Duration) -> Result<Option<Inbound>, TransportError> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Err(_) => Ok(None),
            Ok(None) => Err(TransportError::Closed),
            Ok(Some(message)) => Ok(Some(message)),
        }
    }
}

/// Connected MQTT session.
///
/// A background task polls the `rumqttc` event loop, forwarding inbound
/// publishes to the receiver and packet ids to the publisher. Subscriptions
/// are replayed whenever the broker reconnects without the old session.
pub struct MqttTransport {
    publisher: MqttPublisher,
    receiver: MqttReceiver,
    subscriptions: Subscriptions,
    event_loop: JoinHandle<()>,
    broker: String,
}

impl MqttTransport {
    /// Connects to the broker, waiting for CONNACK.
    #[instrument(skip(settings), fields(broker = %settings.broker(), client_id = %settings.client_id()))]
    pub async fn connect(settings: MqttSettings) -> Result<Self, TransportError> {
        let broker = settings.broker();
        info!("Connecting to MQTT broker");

        let mut options = MqttOptions::new(
            settings.client_id().clone(),
            settings.host().clone(),
            *settings.port(),
        );
        options.set_keep_alive(*settings.keep_alive());
        options.set_clean_session(true);

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let subscriptions = Subscriptions::default();

        let task = tokio::spawn(drive_event_loop(
            event_loop,
            Driver {
                client: client.clone(),
                subscriptions: subscriptions.clone(),
                inbound: inbound_tx,
                events: event_tx,
            },
            ready_tx,
        ));

        let failure = |reason: String| TransportError::ConnectionFailure {
            broker: broker.clone(),
            reason,
        };
        let outcome = match tokio::time::timeout(*settings.connect_timeout(), ready_rx).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(reason))) => Err(failure(reason)),
            Ok(Err(_)) => Err(failure("event loop stopped before connecting".to_string())),
            Err(_) => Err(failure(format!(
                "no CONNACK within {:?}",
                settings.connect_timeout()
            ))),
        };
        if let Err(e) = outcome {
            task.abort();
            warn!(error = %e, "Connection failed");
            return Err(e);
        }

        info!("Connected to MQTT broker");
        Ok(Self {
            publisher: MqttPublisher {
                client,
                events: Mutex::new(event_rx),
                timeout: *settings.publish_timeout(),
            },
            receiver: MqttReceiver { rx: inbound_rx },
            subscriptions,
            event_loop: task,
            broker,
        })
    }
}

#[async_trait::async_trait]
impl Transport for MqttTransport {
    #[instrument(skip(self), fields(broker = %self.broker))]
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.publisher
            .client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::Client {
                reason: e.to_string(),
            })?;
        self.subscriptions.add(topic);
        info!("Subscribed");
        Ok(())
    }

    fn split(&mut self) -> (&dyn Publish, &mut dyn Receive) {
        (&self.publisher, &mut self.receiver)
    }

    #[instrument(skip(self), fields(broker = %self.broker))]
    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let requested = self
            .publisher
            .client
            .disconnect()
            .await
            .map_err(|e| TransportError::Client {
                reason: e.to_string(),
            });
        if tokio::time::timeout(DISCONNECT_GRACE, &mut self.event_loop)
            .await
            .is_err()
        {
            debug!("Event loop still running after disconnect, aborting it");
            self.event_loop.abort();
        }
        requested
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

/// What the event loop task needs besides the loop itself.
struct Driver {
    client: AsyncClient,
    subscriptions: Subscriptions,
    inbound: mpsc::UnboundedSender<Inbound>,
    events: mpsc::UnboundedSender<PublishEvent>,
}

impl Driver {
    /// Re-issues every subscription after the broker dropped our session.
    fn resubscribe(&self) {
        for topic in self.subscriptions.topics() {
            // The request queue is drained by this same task, so never wait on it.
            match self.client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
                Ok(()) => info!(topic = %topic, "Resubscribed after reconnect"),
                Err(e) => warn!(topic = %topic, error = %e, "Resubscribe failed"),
            }
        }
    }
}

/// Polls the event loop until the connection is closed or nobody listens.
///
/// Before the first CONNACK any error is reported through `ready` and ends
/// the task. Afterwards errors are logged and polling resumes, which makes
/// `rumqttc` reconnect; a CONNACK without a stored session triggers a
/// resubscribe.
async fn drive_event_loop(
    mut event_loop: EventLoop,
    driver: Driver,
    ready: oneshot::Sender<Result<(), String>>,
) {
    let mut ready = Some(ready);
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!(code = ?ack.code, session_present = ack.session_present, "CONNACK received");
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Ok(()));
                } else if !ack.session_present {
                    driver.resubscribe();
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!(
                    topic = %publish.topic,
                    payload = %String::from_utf8_lossy(&publish.payload),
                    "Message arrived"
                );
                let message = Inbound::new(publish.topic.clone(), publish.payload.to_vec());
                if driver.inbound.send(message).is_err() {
                    debug!("Receiver dropped, stopping event loop");
                    return;
                }
            }
            Ok(Event::Outgoing(Outgoing::Publish(pkid))) => {
                trace!(pkid, "PUBLISH sent");
                let _ = driver.events.send(PublishEvent::Sent(pkid));
            }
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                trace!(pkid = ack.pkid, "PUBACK received");
                let _ = driver.events.send(PublishEvent::Acked(ack.pkid));
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("Disconnect sent, stopping event loop");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Err(e.to_string()));
                    return;
                }
                warn!(error = %e, "MQTT connection error, reconnecting");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
