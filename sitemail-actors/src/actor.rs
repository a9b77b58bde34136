use anyhow::Result;
use std::marker::PhantomData;
use tokio::{sync::mpsc, task::JoinHandle};

/// Minimal actor trait. `Self: Sized` avoids object-safety issues when using `Context<Self>`.
#[async_trait::async_trait]
pub trait Actor: Send + Sized + 'static {
    type Msg: Send + 'static;

    /// Handle a single message. Return `Err` to stop the actor.
    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()>;
}

/// Runtime context for an actor instance.
///
/// The context holds no sender of its own, so an actor stops once every
/// external `Addr` is dropped.
pub struct Context<A: Actor> {
    pub stop: bool,
    _actor: PhantomData<fn() -> A>,
}

impl<A: Actor> Context<A> {
    /// Request a graceful stop after processing the current message.
    ///
    /// ```
    /// # use anyhow::Result;
    /// # use async_trait::async_trait;
    /// # use sitemail_actors::actor::{self, Actor, Context};
    /// struct StopAfter(u8);
    ///
    /// #[async_trait]
    /// impl Actor for StopAfter {
    ///     type Msg = ();
    ///     async fn handle(&mut self, _msg: (), ctx: &mut Context<Self>) -> Result<()> {
    ///         self.0 = self.0.saturating_sub(1);
    ///         if self.0 == 0 {
    ///             ctx.stop();
    ///         }
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let rt = tokio::runtime::Runtime::new().unwrap();
    /// rt.block_on(async {
    ///     let actor::ActorHandle { addr, task } = actor::spawn_actor(StopAfter(2), 4);
    ///     addr.send(()).await.unwrap();
    ///     addr.send(()).await.unwrap();
    ///     // Task ends even though `addr` is still alive.
    ///     task.await.unwrap().unwrap();
    /// });
    /// ```
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

/// Address for sending messages to an actor.
pub struct Addr<A: Actor>(mpsc::Sender<A::Msg>);

/// Manual Clone to avoid unnecessary bounds on `A`/`A::Msg`.
impl<A: Actor> Clone for Addr<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Actor> Addr<A> {
    /// Async send; awaits backpressure. Returns the message if the actor is gone.
    pub async fn send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.send(msg).await.map_err(|e| e.0)
    }

    /// Send without waiting. Returns the message if the mailbox is full or closed.
    pub fn try_send(&self, msg: A::Msg) -> std::result::Result<(), A::Msg> {
        self.0.try_send(msg).map_err(|e| e.into_inner())
    }

    /// Bounded mailbox capacity.
    pub fn capacity(&self) -> usize {
        self.0.max_capacity()
    }

    /// Whether the actor task has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Handle to a running actor task.
pub struct ActorHandle<A: Actor> {
    pub addr: Addr<A>,
    pub task: JoinHandle<Result<()>>,
}

/// Spawn an actor with a bounded mailbox.
///
/// Stop conditions:
/// - `handle` returns `Err`
/// - all senders are dropped
/// - `ctx.stop()` is called
///
/// ```
/// # use anyhow::Result;
/// # use async_trait::async_trait;
/// # use sitemail_actors::actor::{self, Actor, Context};
/// struct Tally(u32);
///
/// #[async_trait]
/// impl Actor for Tally {
///     type Msg = u32;
///     async fn handle(&mut self, msg: u32, _ctx: &mut Context<Self>) -> Result<()> {
///         self.0 += msg;
///         Ok(())
///     }
/// }
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let actor::ActorHandle { addr, task } = actor::spawn_actor(Tally(0), 8);
///     assert_eq!(addr.capacity(), 8);
///     addr.send(2).await.unwrap();
///     addr.try_send(3).unwrap();
///     drop(addr);
///     task.await.unwrap().unwrap();
/// });
/// ```
pub fn spawn_actor<A: Actor>(mut actor: A, capacity: usize) -> ActorHandle<A> {
    let (tx, mut rx) = mpsc::channel::<A::Msg>(capacity.max(1));
    let addr = Addr(tx);

    let task = tokio::spawn(async move {
        let mut ctx = Context {
            stop: false,
            _actor: PhantomData,
        };

        while let Some(msg) = rx.recv().await {
            if let Err(e) = actor.handle(msg, &mut ctx).await {
                tracing::error!(target: "sitemail.actors", error = ?e, "actor returned error; stopping");
                return Err(e);
            }
            if ctx.stop {
                break;
            }
        }
        Ok(())
    });

    ActorHandle { addr, task }
}
