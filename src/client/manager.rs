//! Client connection manager.
//!
//! [`ConnectionManager`] owns the single live connection for the
//! current session: it authenticates, joins the personal notification
//! room, pumps frames between the transport and the
//! [`SubscriptionRouter`], and reconnects with capped exponential
//! backoff until told to disconnect.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::{Credential, LiveEvent};
use crate::error::RealtimeError;
use crate::ws::messages::{ClientIntent, FrameType, WireFrame};

use super::backoff::{Backoff, BackoffPolicy};
use super::router::SubscriptionRouter;
use super::state::ConnectionState;
use super::transport::{Transport, TransportLink, WsTransport};

/// Client session configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway WebSocket endpoint.
    pub url: String,
    /// Reconnection backoff parameters.
    pub backoff: BackoffPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3000/ws".to_string(),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// The manager over the production WebSocket transport.
pub type WsConnectionManager = ConnectionManager<WsTransport>;

struct ManagerInner {
    credential: Option<Credential>,
    supervisor: Option<JoinHandle<()>>,
    outbound: Option<mpsc::UnboundedSender<WireFrame>>,
}

/// Owns the single live transport connection for the current session.
///
/// Process-wide singleton per session: construct once at application
/// start and share (together with its [`SubscriptionRouter`]) with
/// every consumer. All methods are synchronous and non-blocking;
/// connection progress is reported through
/// [`ConnectionManager::state_changes`].
pub struct ConnectionManager<T: Transport> {
    transport: Arc<T>,
    config: ClientConfig,
    router: Arc<SubscriptionRouter>,
    state: Arc<watch::Sender<ConnectionState>>,
    /// Session epoch. Bumped by every `connect()` takeover and every
    /// `disconnect()`; a supervisor whose epoch no longer matches must
    /// not dispatch or touch shared state.
    generation: Arc<AtomicU64>,
    inner: Arc<Mutex<ManagerInner>>,
}

/// Everything one supervisor task needs, snapshotted at spawn time.
struct SessionCtx<T: Transport> {
    transport: Arc<T>,
    url: String,
    credential: Credential,
    policy: BackoffPolicy,
    router: Arc<SubscriptionRouter>,
    state: Arc<watch::Sender<ConnectionState>>,
    generation: Arc<AtomicU64>,
    inner: Arc<Mutex<ManagerInner>>,
    session: u64,
}

impl<T: Transport> ConnectionManager<T> {
    /// Creates a manager over `transport`, dispatching inbound events
    /// through `router`.
    #[must_use]
    pub fn new(transport: Arc<T>, config: ClientConfig, router: Arc<SubscriptionRouter>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            config,
            router,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            inner: Arc::new(Mutex::new(ManagerInner {
                credential: None,
                supervisor: None,
                outbound: None,
            })),
        }
    }

    /// Starts (or keeps) the session for `credential`.
    ///
    /// Idempotent: calling while a session with an equal credential is
    /// already running is a no-op. A different credential replaces the
    /// running session. Returns immediately; connection progress is
    /// reported via [`ConnectionManager::state_changes`]. Must be
    /// called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidCredential`] if the credential
    /// is invalid; no network activity happens in that case.
    pub fn connect(&self, credential: Credential) -> Result<(), RealtimeError> {
        credential.validate()?;
        let mut inner = self.lock();

        let supervisor_alive = inner
            .supervisor
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        if supervisor_alive && inner.credential.as_ref() == Some(&credential) {
            return Ok(());
        }

        // Supersede any previous session (credential switch, or a
        // supervisor that is no longer running).
        let session = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        if let Some(handle) = inner.supervisor.take() {
            handle.abort();
        }
        inner.outbound = None;
        inner.credential = Some(credential.clone());

        let ctx = SessionCtx {
            transport: Arc::clone(&self.transport),
            url: self.config.url.clone(),
            credential,
            policy: self.config.backoff,
            router: Arc::clone(&self.router),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            inner: Arc::clone(&self.inner),
            session,
        };
        inner.supervisor = Some(tokio::spawn(run_session(ctx)));
        Ok(())
    }

    /// Tears the session down: cancels any pending reconnection,
    /// closes the transport, and releases the credential. Safe to call
    /// when already disconnected.
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = inner.supervisor.take() {
            handle.abort();
            tracing::info!("realtime session closed");
        }
        inner.outbound = None;
        inner.credential = None;
        set_state(&self.state, ConnectionState::Disconnected);
    }

    /// Returns the current connection state. Never blocks.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns a receiver observing every state transition.
    ///
    /// This is how consumers learn about transport failures; errors
    /// are never thrown at unrelated callers.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Returns the router this manager dispatches into.
    #[must_use]
    pub fn router(&self) -> &Arc<SubscriptionRouter> {
        &self.router
    }

    /// Queues `intent` for transmission on the live connection.
    ///
    /// Fire-and-forget: delivery confirmation, if any, arrives as a
    /// later inbound event. Nothing is buffered across disconnection —
    /// the caller decides whether to retry or drop.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::NotConnected`] while the connection is
    /// not in the [`ConnectionState::Connected`] state.
    pub fn send(&self, intent: ClientIntent) -> Result<(), RealtimeError> {
        let inner = self.lock();
        if *self.state.borrow() != ConnectionState::Connected {
            return Err(RealtimeError::NotConnected);
        }
        let Some(outbound) = inner.outbound.as_ref() else {
            return Err(RealtimeError::NotConnected);
        };
        outbound
            .send(WireFrame::intent(&intent))
            .map_err(|_| RealtimeError::NotConnected)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManagerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("url", &self.config.url)
            .finish()
    }
}

impl<T: Transport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().supervisor.take() {
            handle.abort();
        }
    }
}

/// Supervisor: one run per session epoch, reconnecting until
/// superseded.
async fn run_session<T: Transport>(ctx: SessionCtx<T>) {
    let mut backoff = Backoff::new(ctx.policy);
    loop {
        if !ctx.is_current() {
            return;
        }
        set_state(&ctx.state, ConnectionState::Connecting);

        match ctx.transport.connect(&ctx.url, &ctx.credential).await {
            Ok(mut link) => {
                if !ctx.is_current() {
                    link.close().await;
                    return;
                }
                let join = ClientIntent::JoinUser {
                    user_id: ctx.credential.user_id(),
                };
                if let Err(error) = link.send(WireFrame::intent(&join)).await {
                    tracing::warn!(%error, "join-user failed after connect");
                } else {
                    backoff.reset();
                    let (tx, rx) = mpsc::unbounded_channel();
                    ctx.set_outbound(Some(tx));
                    set_state(&ctx.state, ConnectionState::Connected);
                    tracing::info!(user_id = %ctx.credential.user_id(), "realtime connected");

                    pump(&mut link, rx, &ctx).await;
                    ctx.set_outbound(None);
                }
                link.close().await;
            }
            Err(error) => {
                tracing::warn!(%error, "realtime connect failed");
            }
        }

        set_state(&ctx.state, ConnectionState::Disconnected);
        if !ctx.is_current() {
            return;
        }
        let delay = backoff.next_delay();
        tracing::debug!(?delay, "scheduling reconnect");
        tokio::time::sleep(delay).await;
    }
}

/// One step of the frame pump: either a queued outbound frame or an
/// inbound transport frame.
enum PumpStep {
    Outbound(Option<WireFrame>),
    Inbound(Option<Result<WireFrame, RealtimeError>>),
}

/// Frame pump: multiplexes queued outbound intents and inbound frames
/// over one live link until the link drops.
async fn pump<T: Transport>(
    link: &mut T::Link,
    mut outbound: mpsc::UnboundedReceiver<WireFrame>,
    ctx: &SessionCtx<T>,
) {
    loop {
        let step = tokio::select! {
            frame = outbound.recv() => PumpStep::Outbound(frame),
            inbound = link.next() => PumpStep::Inbound(inbound),
        };
        match step {
            PumpStep::Outbound(Some(frame)) => {
                if let Err(error) = link.send(frame).await {
                    tracing::warn!(%error, "outbound send failed");
                    break;
                }
            }
            PumpStep::Outbound(None) => break,
            PumpStep::Inbound(Some(Ok(frame))) => handle_inbound(frame, ctx),
            PumpStep::Inbound(Some(Err(error))) => {
                tracing::warn!(%error, "transport error");
                break;
            }
            PumpStep::Inbound(None) => {
                tracing::debug!("transport closed by peer");
                break;
            }
        }
    }
}

fn handle_inbound<T: Transport>(frame: WireFrame, ctx: &SessionCtx<T>) {
    // A frame buffered across disconnect() must never reach
    // subscribers: re-check the session epoch at dispatch time.
    if !ctx.is_current() {
        return;
    }
    match frame.frame_type {
        FrameType::Event => match serde_json::from_value::<LiveEvent>(frame.payload) {
            Ok(event) => {
                ctx.router.dispatch(&event);
            }
            Err(error) => {
                tracing::trace!(%error, "ignoring unrecognized event payload");
            }
        },
        FrameType::Error => {
            tracing::warn!(payload = %frame.payload, "server rejected a frame");
        }
        FrameType::Ack | FrameType::Intent => {
            tracing::trace!(frame_type = ?frame.frame_type, "ignoring non-event frame");
        }
    }
}

impl<T: Transport> SessionCtx<T> {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.session
    }

    fn set_outbound(&self, value: Option<mpsc::UnboundedSender<WireFrame>>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_current() {
            inner.outbound = value;
        }
    }
}

fn set_state(state: &watch::Sender<ConnectionState>, next: ConnectionState) {
    state.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}
