//! Fan-out of human-readable progress lines to every live observer.
//!
//! A single [`ProgressHub`] actor owns the observer list, so connects,
//! disconnects and publishes are serialised through its mailbox and never
//! race on a shared container. Publishing is fire-and-forget: there is no
//! replay for late subscribers and no backpressure from slow ones.
use crate::actor::{spawn_actor, Actor, Addr, Context};
use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{trace, warn};

pub enum ProgressMsg {
    Publish(String),
    Subscribe {
        reply: oneshot::Sender<ProgressSubscription>,
    },
    ObserverCount {
        reply: oneshot::Sender<usize>,
    },
}

/// Actor holding one unbounded sender per observer.
#[derive(Default)]
pub struct ProgressHub {
    observers: Vec<mpsc::UnboundedSender<String>>,
}

#[async_trait::async_trait]
impl Actor for ProgressHub {
    type Msg = ProgressMsg;

    async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            ProgressMsg::Publish(line) => {
                // A failed send means the observer hung up; forget it.
                self.observers.retain(|tx| tx.send(line.clone()).is_ok());
                trace!(target: "sitemail.progress", observers = self.observers.len(), %line, "published");
            }
            ProgressMsg::Subscribe { reply } => {
                let (tx, rx) = mpsc::unbounded_channel();
                if reply.send(ProgressSubscription { rx }).is_ok() {
                    self.observers.push(tx);
                }
            }
            ProgressMsg::ObserverCount { reply } => {
                self.observers.retain(|tx| !tx.is_closed());
                let _ = reply.send(self.observers.len());
            }
        }
        Ok(())
    }
}

/// Receiving end for one observer. Dropping it unsubscribes.
pub struct ProgressSubscription {
    rx: mpsc::UnboundedReceiver<String>,
}

impl ProgressSubscription {
    /// Next message, or `None` once the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

/// Cloneable publishing handle onto a [`ProgressHub`].
///
/// ```
/// use sitemail_actors::progress::ProgressBroadcaster;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let progress = ProgressBroadcaster::spawn(16);
///     let mut observer = progress.subscribe().await.unwrap();
///     progress.publish("Scraping: https://a.example (1/1)");
///     assert_eq!(
///         observer.recv().await.as_deref(),
///         Some("Scraping: https://a.example (1/1)")
///     );
/// });
/// ```
#[derive(Clone)]
pub struct ProgressBroadcaster {
    addr: Addr<ProgressHub>,
}

impl ProgressBroadcaster {
    /// Start a hub on the current tokio runtime. The hub stops once every
    /// broadcaster clone has been dropped.
    pub fn spawn(mailbox: usize) -> Self {
        let handle = spawn_actor(ProgressHub::default(), mailbox);
        Self { addr: handle.addr }
    }

    /// Queue `message` for every current observer without waiting.
    pub fn publish(&self, message: impl Into<String>) {
        if let Err(ProgressMsg::Publish(dropped)) = self.addr.try_send(ProgressMsg::Publish(message.into())) {
            warn!(target: "sitemail.progress", message = %dropped, "progress mailbox unavailable; message dropped");
        }
    }

    /// Queue `message`, waiting for mailbox room instead of dropping it.
    /// Used for lines observers must not miss, such as the end of a run.
    pub async fn publish_reliable(&self, message: impl Into<String>) {
        if let Err(ProgressMsg::Publish(dropped)) = self.addr.send(ProgressMsg::Publish(message.into())).await {
            warn!(target: "sitemail.progress", message = %dropped, "progress hub stopped; message dropped");
        }
    }

    /// Register a new observer. Only messages published afterwards are seen.
    pub async fn subscribe(&self) -> Result<ProgressSubscription> {
        let (reply, rx) = oneshot::channel();
        self.addr
            .send(ProgressMsg::Subscribe { reply })
            .await
            .map_err(|_| anyhow!("progress hub stopped"))?;
        rx.await.map_err(|_| anyhow!("progress hub dropped subscription request"))
    }

    /// Number of observers that are still listening.
    pub async fn observer_count(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.addr
            .send(ProgressMsg::ObserverCount { reply })
            .await
            .map_err(|_| anyhow!("progress hub stopped"))?;
        rx.await.map_err(|_| anyhow!("progress hub dropped count request"))
    }
}
