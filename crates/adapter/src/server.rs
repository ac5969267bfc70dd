//! WebSocket listener and per-connection relay.
//!
//! Each connection runs [`handle_connection`]: inbound frames are decoded and
//! pushed to the display; every applied board owes the peer exactly one
//! reply, which is sent once the input queue yields a command.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;

use crate::input::InputQueue;
use crate::protocol::{encode_reply, parse_inbound, InboundMessage};
use crate::types::{ConnectionStatus, DisplayUpdate, DEFAULT_PORT};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Append every inbound/outbound frame to this file.
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("TETRIS_DISPLAY_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = env::var("TETRIS_DISPLAY_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let log_path = env::var("TETRIS_DISPLAY_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            log_path,
        }
    }

    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One frame for the wire log.
#[derive(Debug, Clone)]
pub enum WireRecord {
    Inbound { conn: usize, text: String },
    Outbound { conn: usize, text: String },
}

impl WireRecord {
    fn line(&self) -> String {
        let (conn, dir, text) = match self {
            WireRecord::Inbound { conn, text } => (conn, "<", text),
            WireRecord::Outbound { conn, text } => (conn, ">", text),
        };
        // Glyph boards span several lines; keep one record per line.
        format!("{conn} {dir} {}\n", text.replace('\n', "\\n"))
    }
}

/// Spawn the wire log writer. Returns `None` when logging is off.
pub fn spawn_wire_log(path: Option<String>) -> Option<mpsc::UnboundedSender<WireRecord>> {
    let path = path?;
    let (tx, mut rx) = mpsc::unbounded_channel::<WireRecord>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;
        use tokio::io::AsyncWriteExt;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                log::warn!("wire log {path} unavailable: {e}");
                return;
            }
        };

        while let Some(rec) = rx.recv().await {
            if file.write_all(rec.line().as_bytes()).await.is_err() {
                break;
            }
        }
        let _ = file.flush().await;
    });
    Some(tx)
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,
    #[error("websocket transport failed: {0}")]
    Transport(#[from] tungstenite::Error),
}

impl ConnectionError {
    /// Errors that only mean the peer went away.
    fn from_transport(err: tungstenite::Error) -> Self {
        use tungstenite::Error as E;
        match err {
            E::ConnectionClosed | E::AlreadyClosed | E::Protocol(_) => ConnectionError::Closed,
            E::Io(ref io)
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe
                        | std::io::ErrorKind::UnexpectedEof
                ) =>
            {
                ConnectionError::Closed
            }
            other => ConnectionError::Transport(other),
        }
    }
}

/// What a finished connection did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub boards: usize,
    pub replies: usize,
    pub malformed: usize,
    /// Boards still waiting for a reply when the connection ended.
    pub owed: usize,
}

/// Everything a connection task needs from the server.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub id: usize,
    pub peer: String,
    pub queue: Arc<InputQueue>,
    pub display_tx: mpsc::UnboundedSender<DisplayUpdate>,
    /// Connections currently open; the first one resets the session.
    pub active: Arc<AtomicUsize>,
    pub wire_log: Option<mpsc::UnboundedSender<WireRecord>>,
}

impl ConnectionContext {
    pub fn new(
        id: usize,
        peer: impl Into<String>,
        queue: Arc<InputQueue>,
        display_tx: mpsc::UnboundedSender<DisplayUpdate>,
    ) -> Self {
        Self {
            id,
            peer: peer.into(),
            queue,
            display_tx,
            active: Arc::new(AtomicUsize::new(0)),
            wire_log: None,
        }
    }

    fn log_wire(&self, rec: impl FnOnce(usize) -> WireRecord) {
        if let Some(tx) = self.wire_log.as_ref() {
            let _ = tx.send(rec(self.id));
        }
    }

    fn show(&self, update: DisplayUpdate) {
        // The render side may already be gone during shutdown.
        let _ = self.display_tx.send(update);
    }

    /// Decode a frame and push it to the display. Returns true for boards.
    fn apply_frame(&self, text: &str, stats: &mut SessionStats) -> bool {
        self.log_wire(|conn| WireRecord::Inbound {
            conn,
            text: text.to_string(),
        });
        match parse_inbound(text) {
            Ok(InboundMessage::Board(board)) => {
                self.show(DisplayUpdate::Board(board));
                stats.boards += 1;
                true
            }
            Ok(InboundMessage::Queue(text)) => {
                self.show(DisplayUpdate::QueueText(text));
                false
            }
            Ok(InboundMessage::Hold(text)) => {
                self.show(DisplayUpdate::HoldText(text));
                false
            }
            Err(e) => {
                log::warn!("connection {}: dropping frame: {}", self.id, e);
                stats.malformed += 1;
                false
            }
        }
    }
}

/// Start the WebSocket server
pub async fn run_server(
    config: ServerConfig,
    queue: Arc<InputQueue>,
    display_tx: mpsc::UnboundedSender<DisplayUpdate>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log = spawn_wire_log(config.log_path.clone());

    let listener = TcpListener::bind(config.bind_target()).await?;
    let bound = listener.local_addr()?;
    log::info!("display listening on ws://{}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let active = Arc::new(AtomicUsize::new(0));
    let mut next_id = 0usize;

    loop {
        let (socket, addr) = listener.accept().await?;
        next_id += 1;

        let ctx = ConnectionContext {
            id: next_id,
            peer: addr.to_string(),
            queue: Arc::clone(&queue),
            display_tx: display_tx.clone(),
            active: Arc::clone(&active),
            wire_log: wire_log.clone(),
        };

        tokio::spawn(async move {
            let id = ctx.id;
            let ws = match tokio_tungstenite::accept_async(socket).await {
                Ok(ws) => ws,
                Err(e) => {
                    log::warn!("connection {} from {}: handshake failed: {}", id, addr, e);
                    return;
                }
            };
            log::info!("connection {} from {}", id, addr);
            match handle_connection(ws, ctx).await {
                Ok(stats) => log::info!(
                    "connection {} closed ({} boards, {} replies, {} malformed)",
                    id,
                    stats.boards,
                    stats.replies,
                    stats.malformed
                ),
                Err(e) => log::warn!("connection {} failed: {}", id, e),
            }
        });
    }
}

/// Relay one established connection until it closes.
///
/// A normal close (including a peer that simply disappears) is `Ok`. A
/// pending dequeue is dropped on close without losing its command.
pub async fn handle_connection<S>(
    ws: WebSocketStream<S>,
    ctx: ConnectionContext,
) -> Result<SessionStats, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if ctx.active.fetch_add(1, Ordering::SeqCst) == 0 {
        let dropped = ctx.queue.clear();
        if dropped > 0 {
            log::debug!("connection {}: new session, dropped {} stale commands", ctx.id, dropped);
        }
    }
    ctx.show(DisplayUpdate::Status(ConnectionStatus::Connected {
        peer: ctx.peer.clone(),
    }));

    let result = relay(ws, &ctx).await;

    if ctx.active.fetch_sub(1, Ordering::SeqCst) == 1 {
        ctx.show(DisplayUpdate::Status(ConnectionStatus::Disconnected));
    }
    result
}

async fn relay<S>(ws: WebSocketStream<S>, ctx: &ConnectionContext) -> Result<SessionStats, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();
    let mut stats = SessionStats::default();

    let end = loop {
        let frame = if stats.owed == 0 {
            stream.next().await
        } else {
            // Keep reading while waiting for input so a close is seen at once.
            tokio::select! {
                biased;
                frame = stream.next() => frame,
                cmd = ctx.queue.dequeue() => {
                    let text = encode_reply(cmd);
                    if let Err(e) = sink.send(Message::Text(text.clone())).await {
                        ctx.queue.requeue_front(cmd);
                        break ConnectionError::from_transport(e);
                    }
                    log::debug!("connection {}: sent {}", ctx.id, cmd);
                    ctx.log_wire(|conn| WireRecord::Outbound { conn, text });
                    stats.owed -= 1;
                    stats.replies += 1;
                    continue;
                }
            }
        };

        let msg = match frame {
            None => break ConnectionError::Closed,
            Some(Err(e)) => break ConnectionError::from_transport(e),
            Some(Ok(msg)) => msg,
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    log::warn!("connection {}: dropping non UTF-8 binary frame", ctx.id);
                    stats.malformed += 1;
                    continue;
                }
            },
            Message::Close(_) => break ConnectionError::Closed,
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        };

        if ctx.apply_frame(&text, &mut stats) {
            stats.owed += 1;
        }
    };

    match end {
        ConnectionError::Closed => Ok(stats),
        err => Err(err),
    }
}
