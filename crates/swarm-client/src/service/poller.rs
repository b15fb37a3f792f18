//! # Long-Poller
//!
//! Keeps a fixed number of long-poll connections open against the local
//! user's swarm.
//!
//! ## Session lifecycle
//!
//! ```text
//! get_swarm → shuffle into a session queue
//!           → N workers, each: pop snode → long_poll loop
//!                                 └── on failure: drop snode, pop next
//!           → all workers done → sleep(retry_interval) → repeat
//! ```
//!
//! Workers share one queue, so two connections never hold the same snode.
//! [`LongPoller::stop`] signals every worker and waits for them to exit.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use swarm_telemetry::{log_snode_event, LONG_POLL_CONNECTIONS};

use crate::domain::{Envelope, SnodeTarget, SwarmError};

use super::core::SwarmClient;

/// Receives every non-empty batch of new messages.
pub type MessageHandler = Arc<dyn Fn(Vec<Envelope>) + Send + Sync>;

type SessionQueue = Arc<Mutex<VecDeque<SnodeTarget>>>;

struct Running {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Background long-poll supervisor.
pub struct LongPoller {
    client: Arc<SwarmClient>,
    on_messages: MessageHandler,
    running: Mutex<Option<Running>>,
}

impl LongPoller {
    /// Create a stopped poller.
    pub fn new(client: Arc<SwarmClient>, on_messages: MessageHandler) -> Self {
        Self {
            client,
            on_messages,
            running: Mutex::new(None),
        }
    }

    /// Whether the supervisor is running.
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Start polling. A no-op while already running.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }
        info!(
            connections = self.client.config.long_poll_connection_count,
            "Starting long poller"
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(supervise(
            Arc::clone(&self.client),
            Arc::clone(&self.on_messages),
            shutdown_rx,
        ));
        *running = Some(Running {
            shutdown_tx,
            handle,
        });
    }

    /// Cancel every connection and wait for them to exit.
    ///
    /// No handler call starts after this returns.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        info!("Stopping long poller");
        let _ = running.shutdown_tx.send(true);
        if let Err(err) = running.handle.await {
            if !err.is_cancelled() {
                warn!(error = %err, "Long poller task panicked");
            }
        }
    }
}

impl Drop for LongPoller {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            let _ = running.shutdown_tx.send(true);
            running.handle.abort();
        }
    }
}

/// Run sessions until shutdown.
async fn supervise(
    client: Arc<SwarmClient>,
    on_messages: MessageHandler,
    mut shutdown: watch::Receiver<bool>,
) {
    let user = client.user_public_key.clone();
    loop {
        let swarm = tokio::select! {
            _ = shutdown.changed() => return,
            swarm = client.get_swarm(&user) => swarm,
        };

        match swarm {
            Ok(mut swarm) => {
                swarm.shuffle(&mut OsRng);
                debug!(snodes = swarm.len(), "Opening long poll connections");
                let queue: SessionQueue = Arc::new(Mutex::new(swarm.into()));
                let mut workers = JoinSet::new();
                for _ in 0..client.config.long_poll_connection_count {
                    workers.spawn(run_connection(
                        Arc::clone(&client),
                        Arc::clone(&on_messages),
                        Arc::clone(&queue),
                    ));
                }
                loop {
                    tokio::select! {
                        _ = shutdown.changed() => {
                            workers.shutdown().await;
                            return;
                        }
                        next = workers.join_next() => {
                            if next.is_none() {
                                break;
                            }
                        }
                    }
                }
            }
            Err(err) => warn!(error = %err, "Couldn't resolve own swarm for long polling"),
        }

        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(client.config.long_poll_retry_interval) => {}
        }
    }
}

/// One connection: poll a snode until it fails, then move to the next
/// unused snode. Resolves once the session queue is exhausted.
async fn run_connection(client: Arc<SwarmClient>, on_messages: MessageHandler, queue: SessionQueue) {
    let user = client.user_public_key.clone();
    loop {
        let Some(snode) = next_unused(&client, &queue, &user) else {
            return;
        };
        let err = {
            let _open = OpenConnection::new();
            poll_until_failure(&client, &on_messages, &snode).await
        };
        log_snode_event!(debug, "Long poll connection failed; moving on", snode, error = %err);
        client.directory.drop_if_needed(&snode, &user);
    }
}

/// Tracks open connections in the gauge, including aborted ones.
struct OpenConnection;

impl OpenConnection {
    fn new() -> Self {
        LONG_POLL_CONNECTIONS.inc();
        Self
    }
}

impl Drop for OpenConnection {
    fn drop(&mut self) {
        LONG_POLL_CONNECTIONS.dec();
    }
}

/// Pop the next queued snode that is still in the cached swarm.
fn next_unused(client: &SwarmClient, queue: &SessionQueue, user: &str) -> Option<SnodeTarget> {
    let current = client.directory.swarm_snapshot(user);
    let mut queue = queue.lock();
    std::iter::from_fn(|| queue.pop_front()).find(|snode| current.contains(snode))
}

async fn poll_until_failure(
    client: &SwarmClient,
    on_messages: &MessageHandler,
    snode: &SnodeTarget,
) -> SwarmError {
    loop {
        match client.long_poll(snode).await {
            Ok(envelopes) if envelopes.is_empty() => {}
            Ok(envelopes) => on_messages(envelopes),
            Err(err) => return err,
        }
    }
}
