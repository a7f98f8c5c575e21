//! Attendance push channel.
//!
//! The backend pushes `attendance_update` events over a receive-only
//! WebSocket. The traits here hide the transport so the controller can be
//! driven by an in-memory feed in tests.

use std::future::Future;

use futures_util::StreamExt;
use qrschool_config::ApiConfig;
use qrschool_core::SyncError;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument};
use url::Url;

/// Opens connections to the attendance feed.
pub trait AttendanceFeed: Send + Sync + 'static {
    type Connection: FeedConnection;

    fn connect(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Self::Connection, SyncError>> + Send;
}

/// One open feed connection.
pub trait FeedConnection: Send + 'static {
    /// Next text frame. `None` once the server closed the connection.
    fn next_message(&mut self) -> impl Future<Output = Option<Result<String, SyncError>>> + Send;

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone)]
pub struct WsFeed {
    url: Url,
}

impl WsFeed {
    /// # Errors
    ///
    /// [`SyncError::Config`] unless `config.ws_url` is a `ws`/`wss` URL.
    pub fn new(config: &ApiConfig) -> Result<Self, SyncError> {
        let url: Url = config
            .ws_url
            .parse()
            .map_err(|e| SyncError::config(format!("QRSCHOOL_WS_URL {:?}: {e}", config.ws_url)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(SyncError::config(format!(
                "QRSCHOOL_WS_URL must be ws or wss, got {}",
                url.scheme()
            )));
        }
        Ok(Self { url })
    }

    /// Connection URL with the access token appended as `?token=`.
    pub fn connect_url(&self, token: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("token", token);
        url
    }
}

impl AttendanceFeed for WsFeed {
    type Connection = WsConnection;

    #[instrument(skip_all, fields(host = self.url.host_str().unwrap_or_default()))]
    async fn connect(&self, token: &str) -> Result<WsConnection, SyncError> {
        let url = self.connect_url(token);
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| SyncError::network("realtime connect", None, e.to_string()))?;
        info!(status = %response.status(), "Attendance channel open");
        Ok(WsConnection { stream })
    }
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FeedConnection for WsConnection {
    async fn next_message(&mut self) -> Option<Result<String, SyncError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    return Some(
                        String::from_utf8(bytes.to_vec())
                            .map_err(|e| SyncError::validation(format!("binary frame: {e}"))),
                    );
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Server closed attendance channel");
                    return None;
                }
                Ok(_) => continue,
                Err(e) => {
                    return Some(Err(SyncError::network(
                        "realtime receive",
                        None,
                        e.to_string(),
                    )));
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Attendance channel close handshake failed");
        }
    }
}
