use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::Stream;

use crate::errors::AppError;
use crate::mcp::rpc::RequestEnvelope;
use crate::mcp::Dispatcher;

/// Slow stream consumers see at most this many buffered push messages
/// before senders start to wait.
const PUSH_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Initializing,
            1 => Self::Active,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamTakeError {
    #[error("session is closed")]
    Closed,
    #[error("a stream is already open for this session")]
    AlreadyOpen,
}

/// Per-client session state. Owned exclusively by its registry entry;
/// request handlers hold only an `Arc` while servicing one exchange.
pub struct SessionRecord {
    id: String,
    state: AtomicU8,
    dispatcher: Dispatcher,
    // Exchanges on one session never interleave; distinct sessions are
    // fully independent.
    exchange_lock: Mutex<()>,
    // One-shot teardown flag. Every close path checks-and-sets this before
    // acting, so removal happens exactly once no matter how many paths fire.
    closed: AtomicBool,
    stream_active: AtomicBool,
    push_tx: Mutex<Option<mpsc::Sender<Value>>>,
    push_rx: Mutex<Option<mpsc::Receiver<Value>>>,
    created_at: DateTime<Utc>,
    last_active_at: AtomicI64,
}

impl SessionRecord {
    pub fn new(id: String, dispatcher: Dispatcher) -> Arc<Self> {
        let (push_tx, push_rx) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
        let created_at = Utc::now();
        Arc::new(Self {
            id,
            state: AtomicU8::new(SessionState::Initializing as u8),
            dispatcher,
            exchange_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            stream_active: AtomicBool::new(false),
            push_tx: Mutex::new(Some(push_tx)),
            push_rx: Mutex::new(Some(push_rx)),
            created_at,
            last_active_at: AtomicI64::new(created_at.timestamp_millis()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_active_at.load(Ordering::SeqCst))
            .unwrap_or(self.created_at)
    }

    pub fn activate(&self) {
        self.state
            .store(SessionState::Active as u8, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Runs one exchange against this session's dispatcher while holding the
    /// exchange lock: a second concurrent exchange for the same identifier
    /// queues behind the first instead of interleaving.
    pub async fn dispatch(&self, envelope: RequestEnvelope) -> Value {
        let _exchange = self.exchange_lock.lock().await;
        self.last_active_at
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
        self.dispatcher.dispatch(envelope).await
    }

    /// First teardown path to call this wins; every later caller gets
    /// `false` and must not act again.
    pub fn begin_close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.state
            .store(SessionState::Closing as u8, Ordering::SeqCst);
        true
    }

    /// Drops the push sender so any open stream terminates.
    pub async fn finish_close(&self) {
        self.push_tx.lock().await.take();
        self.state
            .store(SessionState::Closed as u8, Ordering::SeqCst);
    }

    /// Queues a message for the session's push stream.
    pub async fn push(&self, message: Value) -> Result<(), AppError> {
        let sender = { self.push_tx.lock().await.clone() };
        let Some(sender) = sender else {
            return Err(AppError::internal("session push channel is closed"));
        };
        sender
            .send(message)
            .await
            .map_err(|_| AppError::internal("push stream receiver dropped"))
    }

    /// Claims the session's push stream. At most one stream may be open at
    /// a time; after a disconnect the channel is re-armed so a client can
    /// reconnect (messages pushed while nobody listened are dropped).
    pub async fn take_stream(self: &Arc<Self>) -> Result<StreamLease, StreamTakeError> {
        if self.is_closed() {
            return Err(StreamTakeError::Closed);
        }
        if self.stream_active.swap(true, Ordering::SeqCst) {
            return Err(StreamTakeError::AlreadyOpen);
        }

        let mut rx_slot = self.push_rx.lock().await;
        let rx = match rx_slot.take() {
            Some(rx) => rx,
            None => {
                let (tx, rx) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
                let mut tx_slot = self.push_tx.lock().await;
                if tx_slot.is_none() {
                    // Closed while we were re-arming.
                    self.stream_active.store(false, Ordering::SeqCst);
                    return Err(StreamTakeError::Closed);
                }
                *tx_slot = Some(tx);
                rx
            }
        };

        Ok(StreamLease {
            session: Arc::clone(self),
            rx,
        })
    }
}

/// Live handle on a session's push stream. Dropping it (peer disconnect or
/// normal end) releases the stream slot without destroying the session.
pub struct StreamLease {
    session: Arc<SessionRecord>,
    rx: mpsc::Receiver<Value>,
}

impl std::fmt::Debug for StreamLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLease").finish_non_exhaustive()
    }
}

impl Stream for StreamLease {
    type Item = Value;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Value>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        self.session.stream_active.store(false, Ordering::SeqCst);
    }
}
