//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The listener serves two kinds of traffic on one port: WebSocket
//! upgrades (the game channel) and plain HTTP GETs (diagnostics).
//! [`WebSocketTransport::accept_routed`] peeks at the request head to
//! tell them apart and returns an [`Accepted`] either way.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use futures_util::stream::{SplitSink, SplitStream};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Result of accepting one TCP connection on the shared listener.
pub enum Accepted {
    /// A WebSocket upgrade — the game channel.
    Socket(WebSocketConnection),
    /// A plain HTTP request; the caller decides what to answer.
    Http(PlainHttpRequest),
}

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    ///
    /// Needed when binding to port 0 (tests) to learn the real port.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts the next connection, routing it as either a WebSocket
    /// upgrade or a plain HTTP request.
    ///
    /// Routing peeks at the first segment of the request without
    /// consuming it; real clients send the whole header block in one
    /// segment, so a single peek is enough to spot the `Upgrade:
    /// websocket` header.
    pub async fn accept_routed(&mut self) -> Result<Accepted, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let mut buf = [0u8; 1024];
        let n = stream
            .peek(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        let head = String::from_utf8_lossy(&buf[..n]).to_ascii_lowercase();

        if !head.contains("upgrade:") || !head.contains("websocket") {
            let (method, path) = parse_request_line(&buf[..n]);
            tracing::debug!(%addr, method, path, "plain HTTP request");
            return Ok(Accepted::Http(PlainHttpRequest { method, path, stream }));
        }

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        use futures_util::StreamExt;
        let (sink, stream) = ws.split();
        Ok(Accepted::Socket(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }))
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Accepts the next WebSocket connection, answering any interleaved
    /// plain-HTTP request with 404.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        loop {
            match self.accept_routed().await? {
                Accepted::Socket(conn) => return Ok(conn),
                Accepted::Http(req) => {
                    let _ = req.respond(404, "text/plain", b"not found").await;
                }
            }
        }
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Extracts (method, path) from an HTTP request head, best effort.
fn parse_request_line(head: &[u8]) -> (String, String) {
    let text = String::from_utf8_lossy(head);
    let mut parts = text.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("/").to_string();
    (method, path)
}

// ---------------------------------------------------------------------------
// PlainHttpRequest
// ---------------------------------------------------------------------------

/// A non-upgrade HTTP request accepted on the game port.
///
/// The request bytes are still unread on the stream (routing only
/// peeked); [`respond`](Self::respond) drains them before writing the
/// response so the close is clean.
pub struct PlainHttpRequest {
    method: String,
    path: String,
    stream: TcpStream,
}

impl PlainHttpRequest {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Writes a minimal HTTP/1.1 response and closes the connection.
    pub async fn respond(
        mut self,
        status: u16,
        content_type: &str,
        body: &[u8],
    ) -> Result<(), TransportError> {
        let mut scratch = [0u8; 1024];
        let _ = self.stream.read(&mut scratch).await;

        let reason = match status {
            200 => "OK",
            404 => "Not Found",
            _ => "",
        };
        let header = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        self.stream
            .write_all(header.as_bytes())
            .await
            .map_err(TransportError::SendFailed)?;
        self.stream
            .write_all(body)
            .await
            .map_err(TransportError::SendFailed)?;
        self.stream
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WebSocketConnection
// ---------------------------------------------------------------------------

/// A single WebSocket connection.
///
/// The socket is split so the send and receive halves lock
/// independently: a per-peer writer task drains outbound frames while
/// the handler sits in `recv`, without either starving the other.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.stream.lock().await.next().await;
            match msg {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        self.sink
            .lock()
            .await
            .send(Message::Close(None))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
