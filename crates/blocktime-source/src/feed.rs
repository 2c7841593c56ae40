//! New-block push feeds.
//!
//! [`MempoolFeed`] subscribes to the `blocks` topic over WebSocket.
//! [`ChannelFeed`] lets an embedding application (or a test) announce blocks
//! in-process.

use async_trait::async_trait;
use blocktime_core::error::FeedError;
use blocktime_core::traits::{BlockFeed, FeedReceiver};
use blocktime_core::types::ReferencePoint;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::protocol::{decode_frame, subscribe_frames};

/// Buffered frames between the socket reader and the consumer.
const FEED_CHANNEL_CAPACITY: usize = 64;

/// WebSocket subscription to newly mined blocks.
#[derive(Debug, Clone)]
pub struct MempoolFeed {
    ws_url: String,
}

impl MempoolFeed {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self { ws_url: ws_url.into() }
    }
}

#[async_trait]
impl BlockFeed for MempoolFeed {
    async fn connect(&self) -> Result<FeedReceiver, FeedError> {
        let (ws_stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| FeedError::Connect(e.to_string()))?;
        info!(url = %self.ws_url, "feed: connected");

        let (mut write, mut read) = ws_stream.split();
        for frame in subscribe_frames()? {
            write
                .send(Message::Text(frame.into()))
                .await
                .map_err(|e| FeedError::Send(e.to_string()))?;
        }

        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        let url = self.ws_url.clone();
        tokio::spawn(async move {
            loop {
                let msg = tokio::select! {
                    msg = read.next() => msg,
                    _ = tx.closed() => {
                        debug!(%url, "feed: consumer dropped, closing socket");
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                };
                match msg {
                    Some(Ok(Message::Text(text))) => match decode_frame(text.as_str()) {
                        Ok(points) if points.is_empty() => {}
                        Ok(points) => {
                            if tx.send(points).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "feed: undecodable frame"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(%url, "feed: closed by server");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(%url, error = %e, "feed: socket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        });

        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "mempool-ws"
    }
}

/// In-process feed. Each [`connect`](BlockFeed::connect) replaces the
/// previous subscriber; [`announce`](Self::announce) delivers to the current
/// one.
#[derive(Debug, Default)]
pub struct ChannelFeed {
    sender: Mutex<Option<mpsc::Sender<Vec<ReferencePoint>>>>,
}

impl ChannelFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `points` to the connected subscriber. Returns `false` when no
    /// subscriber is connected or its buffer is full.
    pub fn announce(&self, points: Vec<ReferencePoint>) -> bool {
        let guard = self.sender.lock();
        match guard.as_ref() {
            Some(tx) => tx.try_send(points).is_ok(),
            None => false,
        }
    }

    /// Close the current subscription, as if the server hung up.
    pub fn disconnect(&self) {
        self.sender.lock().take();
    }

    pub fn is_connected(&self) -> bool {
        self.sender.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl BlockFeed for ChannelFeed {
    async fn connect(&self) -> Result<FeedReceiver, FeedError> {
        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        *self.sender.lock() = Some(tx);
        Ok(rx)
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
