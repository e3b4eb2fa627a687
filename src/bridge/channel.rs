//! Asynchronous request/reply channel between two isolated contexts.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::bridge::error::BridgeError;
use crate::bridge::message::{BridgeMessage, Envelope};

pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(120);

/// Requests waiting for their reply, by correlation id.
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// Two connected endpoints: `(page, panel)`.
///
/// Must be called inside a tokio runtime; each endpoint runs a receive task.
pub fn channel() -> (Endpoint, Endpoint) {
    channel_with_timeout(DEFAULT_REPLY_TIMEOUT)
}

pub fn channel_with_timeout(reply_timeout: Duration) -> (Endpoint, Endpoint) {
    let (to_page, page_raw) = mpsc::unbounded_channel();
    let (to_panel, panel_raw) = mpsc::unbounded_channel();
    (
        Endpoint::new("page", to_panel, page_raw, reply_timeout),
        Endpoint::new("panel", to_page, panel_raw, reply_timeout),
    )
}

/// A message delivered to this context. Requests carry a [`Responder`].
#[derive(Debug)]
pub struct Incoming {
    pub message: BridgeMessage,
    pub responder: Option<Responder>,
}

/// Single-use handle for answering one request.
#[derive(Debug)]
pub struct Responder {
    reply_to: u64,
    sender: Sender,
}

impl Responder {
    pub fn reply<T: Serialize>(self, payload: &T) -> Result<(), BridgeError> {
        self.sender.send_envelope(&Envelope::reply(self.reply_to, payload)?)
    }
}

/// Sending half of an endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Sender {
    context: &'static str,
    outbound: mpsc::UnboundedSender<String>,
    pending: Pending,
    next_id: Arc<AtomicU64>,
    reply_timeout: Duration,
}

impl Sender {
    fn send_envelope(&self, envelope: &Envelope) -> Result<(), BridgeError> {
        let wire = serde_json::to_string(envelope)?;
        trace!(context = self.context, %wire, "bridge send");
        self.outbound
            .send(wire)
            .map_err(|_| BridgeError::Disconnected)
    }

    /// Fire-and-forget.
    pub fn notify(&self, message: &BridgeMessage) -> Result<(), BridgeError> {
        self.send_envelope(&Envelope::message(None, message)?)
    }

    /// Send a request and wait for exactly one reply.
    pub async fn request<R: DeserializeOwned>(&self, message: &BridgeMessage) -> Result<R, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let envelope = Envelope::message(Some(id), message)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if let Err(e) = self.send_envelope(&envelope) {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(payload)) => Ok(serde_json::from_value(payload)?),
            Ok(Err(_)) => Err(BridgeError::Disconnected),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(BridgeError::Timeout {
                    action: message.action(),
                    timeout: self.reply_timeout,
                })
            }
        }
    }
}

/// One side of the bridge. Dropping it tears the context down: the peer's
/// pending requests fail with [`BridgeError::Disconnected`].
#[derive(Debug)]
pub struct Endpoint {
    sender: Sender,
    inbox: mpsc::UnboundedReceiver<Incoming>,
    recv_task: JoinHandle<()>,
}

impl Endpoint {
    fn new(
        context: &'static str,
        outbound: mpsc::UnboundedSender<String>,
        raw: mpsc::UnboundedReceiver<String>,
        reply_timeout: Duration,
    ) -> Self {
        let sender = Sender {
            context,
            outbound,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            reply_timeout,
        };
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let recv_task = tokio::spawn(receive_loop(raw, inbox_tx, sender.clone()));

        Self {
            sender,
            inbox,
            recv_task,
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender.clone()
    }

    pub fn notify(&self, message: &BridgeMessage) -> Result<(), BridgeError> {
        self.sender.notify(message)
    }

    pub async fn request<R: DeserializeOwned>(&self, message: &BridgeMessage) -> Result<R, BridgeError> {
        self.sender.request(message).await
    }

    /// Next message for this context; `None` once the peer is gone.
    pub async fn recv(&mut self) -> Option<Incoming> {
        self.inbox.recv().await
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// Routes replies to their waiting request and everything else to the inbox.
async fn receive_loop(
    mut raw: mpsc::UnboundedReceiver<String>,
    inbox: mpsc::UnboundedSender<Incoming>,
    sender: Sender,
) {
    while let Some(wire) = raw.recv().await {
        trace!(context = sender.context, %wire, "bridge recv");
        let envelope: Envelope = match serde_json::from_str(&wire) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(context = sender.context, error = %e, "dropping malformed bridge message");
                continue;
            }
        };

        if let Some(reply_to) = envelope.reply_to {
            let waiting = sender.pending.lock().await.remove(&reply_to);
            match waiting {
                Some(tx) => {
                    let _ = tx.send(envelope.data.unwrap_or(Value::Null));
                }
                None => debug!(context = sender.context, reply_to, "reply for unknown or expired request dropped"),
            }
            continue;
        }

        let id = envelope.id;
        let message = match envelope.into_message() {
            Ok(message) => message,
            Err(e) => {
                warn!(context = sender.context, error = %e, "dropping unknown bridge action");
                continue;
            }
        };
        let responder = id.map(|reply_to| Responder {
            reply_to,
            sender: sender.clone(),
        });

        if inbox.send(Incoming { message, responder }).is_err() {
            break;
        }
    }

    // Peer gone: wake every waiting request with a closed channel.
    sender.pending.lock().await.clear();
    debug!(context = sender.context, "bridge receive loop stopped");
}
