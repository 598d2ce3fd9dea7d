use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use crate::core::types::StreamEvent;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn, Instrument};
use url::Url;

/// Frame read from a connection, or the error that ended it
pub type FrameResult = Result<Vec<u8>, ExchangeError>;

/// Upper bound on the close handshake once a stream has ended
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// An open stream connection - pure transport layer
#[async_trait]
pub trait FrameConnection: Send {
    /// Receive the next data frame.
    ///
    /// Returns `None` on a clean end of stream. An `Err` is permanent: the
    /// caller stops reading after it.
    async fn next_frame(&mut self) -> Option<FrameResult>;

    async fn close(&mut self) -> Result<(), ExchangeError>;
}

/// Opens stream connections
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(
        &self,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<Box<dyn FrameConnection>, ExchangeError>;
}

/// Receives every frame of a stream in read order
#[async_trait]
pub trait FramePublisher: Send {
    /// Decode and forward `frame`. `Break` ends the stream.
    async fn publish(&mut self, frame: FrameResult) -> ControlFlow<()>;
}

/// Publishes decoded frames on a bounded channel.
///
/// Owns the only sender, so the channel closes when the publisher is dropped.
pub struct ChannelPublisher<C: WsCodec> {
    codec: C,
    sender: mpsc::Sender<StreamEvent<C::Message>>,
}

impl<C: WsCodec> ChannelPublisher<C> {
    pub fn new(codec: C, sender: mpsc::Sender<StreamEvent<C::Message>>) -> Self {
        Self { codec, sender }
    }
}

#[async_trait]
impl<C: WsCodec> FramePublisher for ChannelPublisher<C> {
    async fn publish(&mut self, frame: FrameResult) -> ControlFlow<()> {
        match frame.and_then(|bytes| self.codec.decode_frame(&bytes)) {
            Ok(message) => {
                if self.sender.send(StreamEvent::Event(message)).await.is_err() {
                    debug!("Stream receiver dropped");
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            }
            Err(e) => {
                // terminal, nothing is published after it
                let _ = self.sender.send(StreamEvent::Error(e)).await;
                ControlFlow::Break(())
            }
        }
    }
}

/// Runs `on_close` exactly once, whichever way the pump exits
struct CloseGuard<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for CloseGuard<F> {
    fn drop(&mut self) {
        if let Some(on_close) = self.0.take() {
            on_close();
        }
    }
}

/// Drive one stream until it ends.
///
/// Dials `url`, then moves frames from a spawned reader task to `publisher`
/// through a relay of capacity one. The stream ends on cancellation of
/// `cancel`, on the first read or decode error (published as the terminal
/// item), on a clean end of stream, or when the publisher breaks.
///
/// As soon as the pump stops, the publisher is dropped and `on_close` runs,
/// so consumers never wait on the socket. The connection is closed after
/// the reader has returned it, bounded by [`CLOSE_TIMEOUT`].
pub async fn run_stream<P, F>(
    dialer: Arc<dyn Dialer>,
    url: Url,
    headers: HeaderMap,
    cancel: CancellationToken,
    publisher: P,
    on_close: F,
) where
    P: FramePublisher,
    F: FnOnce() + Send,
{
    let guard = CloseGuard(Some(on_close));
    let mut publisher = publisher;
    let token = cancel.child_token();

    let dialed = tokio::select! {
        biased;
        () = token.cancelled() => {
            debug!("Stream cancelled while dialing");
            return;
        }
        dialed = dialer.dial(&url, &headers) => dialed,
    };

    let conn = match dialed {
        Ok(conn) => conn,
        Err(e) => {
            warn!("Failed to open stream: {}", e);
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                _ = publisher.publish(Err(e)) => {}
            }
            return;
        }
    };
    debug!("Stream connected");

    let (relay_tx, mut relay_rx) = mpsc::channel(1);
    let reader = tokio::spawn(read_frames(conn, relay_tx, token.clone()).in_current_span());

    loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = relay_rx.recv() => next,
        };
        let Some(frame) = next else {
            debug!("Stream ended by remote");
            break;
        };

        let flow = tokio::select! {
            biased;
            () = token.cancelled() => break,
            flow = publisher.publish(frame) => flow,
        };
        if flow.is_break() {
            break;
        }
    }

    token.cancel();
    drop(relay_rx);
    drop(publisher);
    drop(guard);

    match reader.await {
        Ok(mut conn) => match tokio::time::timeout(CLOSE_TIMEOUT, conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to close stream connection: {}", e),
            Err(_) => warn!("Timed out closing stream connection"),
        },
        Err(e) => warn!("Stream reader task failed: {}", e),
    }
    debug!("Stream closed");
}

async fn read_frames(
    mut conn: Box<dyn FrameConnection>,
    relay: mpsc::Sender<FrameResult>,
    token: CancellationToken,
) -> Box<dyn FrameConnection> {
    loop {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = conn.next_frame() => next,
        };
        let Some(frame) = next else {
            break;
        };
        let is_error = frame.is_err();

        if token.is_cancelled() {
            break;
        }
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            sent = relay.send(frame) => {
                if sent.is_err() {
                    break;
                }
            }
        }

        if is_error {
            break;
        }
    }
    conn
}

/// Opens typed streams relative to one base URL
#[derive(Clone)]
pub struct StreamClient {
    base_url: Url,
    exchange_name: String,
    user_agent: String,
    dialer: Arc<dyn Dialer>,
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("base_url", &self.base_url.as_str())
            .field("exchange_name", &self.exchange_name)
            .finish_non_exhaustive()
    }
}

impl StreamClient {
    pub fn new(
        base_url: &str,
        exchange_name: String,
        dialer: Arc<dyn Dialer>,
    ) -> Result<Self, ExchangeError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ExchangeError::RequestConstruction(format!(
                "Invalid stream URL '{}': {}",
                base_url, e
            ))
        })?;
        Ok(Self {
            base_url,
            exchange_name,
            user_agent: crate::core::config::DEFAULT_USER_AGENT.to_string(),
            dialer,
        })
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Open the stream at `path` and return its event channel.
    ///
    /// The pump runs on a spawned task until the stream ends; the channel
    /// closes when it does. Must be called inside a tokio runtime.
    #[instrument(skip(self, cancel, codec), fields(exchange = %self.exchange_name))]
    pub fn open<C: WsCodec>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        codec: C,
    ) -> Result<mpsc::Receiver<StreamEvent<C::Message>>, ExchangeError> {
        let url = self.base_url.join(path).map_err(|e| {
            ExchangeError::RequestConstruction(format!("Invalid stream path '{}': {}", path, e))
        })?;

        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&self.user_agent).map_err(|e| {
            ExchangeError::RequestConstruction(format!("Invalid header value: {}", e))
        })?;
        headers.insert(USER_AGENT, user_agent);

        let (sender, receiver) = mpsc::channel(1);
        let publisher = ChannelPublisher::new(codec, sender);
        let stream_path = path.to_string();

        tokio::spawn(
            run_stream(
                self.dialer.clone(),
                url,
                headers,
                cancel.clone(),
                publisher,
                move || debug!(path = %stream_path, "Stream channel closed"),
            )
            .in_current_span(),
        );

        Ok(receiver)
    }
}

/// `Dialer` backed by tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteDialer;

#[async_trait]
impl Dialer for TungsteniteDialer {
    async fn dial(
        &self,
        url: &Url,
        headers: &HeaderMap,
    ) -> Result<Box<dyn FrameConnection>, ExchangeError> {
        let mut request = url.as_str().into_client_request().map_err(|e| {
            ExchangeError::RequestConstruction(format!("Invalid WebSocket request: {}", e))
        })?;
        for (name, value) in headers {
            request.headers_mut().insert(name.clone(), value.clone());
        }

        let (stream, _) = connect_async(request).await.map_err(|e| {
            ExchangeError::NetworkError(format!("WebSocket connection failed: {}", e))
        })?;

        Ok(Box::new(TungsteniteConnection { stream }))
    }
}

pub struct TungsteniteConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameConnection for TungsteniteConnection {
    async fn next_frame(&mut self) -> Option<FrameResult> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.into_bytes())),
                Ok(Message::Binary(data)) => return Some(Ok(data)),
                Ok(Message::Ping(data)) => {
                    // Auto-respond to pings at transport level
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        warn!("Failed to send pong response: {}", e);
                    }
                }
                Ok(Message::Pong(_) | Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Close frame received");
                    return None;
                }
                Err(e) => {
                    return Some(Err(ExchangeError::NetworkError(format!(
                        "WebSocket error: {}",
                        e
                    ))))
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ExchangeError> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(ExchangeError::NetworkError(format!(
                "Failed to close WebSocket: {}",
                e
            ))),
        }
    }
}
