//! Live merging of newly announced blocks into the shared index.

use std::sync::Arc;

use blocktime_core::error::FeedError;
use blocktime_core::traits::BlockFeed;
use blocktime_core::SharedHistory;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Lifecycle of a [`LiveUpdateListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Never connected.
    Idle,
    /// Subscribed and merging announcements.
    Listening,
    /// The transport closed. Call `listen` again to resubscribe.
    Disconnected,
    /// Stopped by the caller.
    Stopped,
}

/// Subscribes to a [`BlockFeed`] and merges every announced block into the
/// shared history.
///
/// There is no automatic reconnect: when the transport closes the listener
/// moves to [`ListenerState::Disconnected`] and stays there until
/// [`listen`](Self::listen) is called again.
pub struct LiveUpdateListener {
    history: SharedHistory,
    feed: Arc<dyn BlockFeed>,
    state: Arc<RwLock<ListenerState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LiveUpdateListener {
    pub fn new(history: SharedHistory, feed: Arc<dyn BlockFeed>) -> Self {
        Self {
            history,
            feed,
            state: Arc::new(RwLock::new(ListenerState::Idle)),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ListenerState {
        *self.state.read()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == ListenerState::Listening
    }

    /// Connect the feed and start merging. A no-op while already listening.
    ///
    /// # Errors
    ///
    /// [`FeedError`] if the handshake or subscription fails; the state is
    /// left unchanged.
    pub async fn listen(&self) -> Result<(), FeedError> {
        let mut task = self.task.lock().await;
        if self.is_listening() {
            return Ok(());
        }
        if let Some(old) = task.take() {
            old.abort();
        }

        let mut rx = self.feed.connect().await?;
        *self.state.write() = ListenerState::Listening;
        info!(feed = self.feed.name(), "listener: subscribed to new blocks");

        let history = self.history.clone();
        let state = self.state.clone();
        let feed = self.feed.name();
        *task = Some(tokio::spawn(async move {
            while let Some(points) = rx.recv().await {
                let (added, before, after) = {
                    let mut history = history.write();
                    let before = history.frontier().map(|p| p.height);
                    let added = history.merge(points);
                    (added, before, history.frontier().map(|p| p.height))
                };
                if after > before {
                    info!(height = ?after, added, "listener: frontier advanced");
                } else {
                    debug!(added, "listener: merged announcement");
                }
            }

            let mut state = state.write();
            if *state == ListenerState::Listening {
                *state = ListenerState::Disconnected;
                info!(feed, "listener: feed closed");
            }
        }));
        Ok(())
    }

    /// Stop merging and drop the subscription.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }
        let mut state = self.state.write();
        if *state != ListenerState::Idle {
            *state = ListenerState::Stopped;
            info!("listener: stopped");
        }
    }
}

impl Drop for LiveUpdateListener {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}
