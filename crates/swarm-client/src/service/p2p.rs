//! # P2P Peer Tracker
//!
//! Tracks contacts' direct addresses and keeps their online status fresh
//! with periodic pings. Every status change cancels the peer's timer and
//! arms a new one, so at most one timer exists per peer.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::{needs_ping, ping_interval, PeerConfig, PeerInfo, PeerStatusEvent};
use crate::ports::PeerPinger;

/// Capacity of the status broadcast channel.
const STATUS_CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct TrackerState {
    peers: HashMap<String, PeerInfo>,
    intervals: HashMap<String, Duration>,
    timers: HashMap<String, JoinHandle<()>>,
}

/// Online/offline tracking for direct peer delivery.
///
/// Must be created inside a tokio runtime; timers are spawned on it.
pub struct PeerTracker {
    our_public_key: String,
    config: PeerConfig,
    pinger: Arc<dyn PeerPinger>,
    state: Mutex<TrackerState>,
    status_tx: broadcast::Sender<PeerStatusEvent>,
    this: Weak<PeerTracker>,
}

impl PeerTracker {
    /// Create a tracker for the local user.
    pub fn new(
        our_public_key: impl Into<String>,
        config: PeerConfig,
        pinger: Arc<dyn PeerPinger>,
    ) -> Arc<Self> {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let our_public_key = our_public_key.into();
        Arc::new_cyclic(|this| Self {
            our_public_key,
            config,
            pinger,
            state: Mutex::new(TrackerState::default()),
            status_tx,
            this: this.clone(),
        })
    }

    /// Known record for a contact.
    pub fn peer(&self, public_key: &str) -> Option<PeerInfo> {
        self.state.lock().peers.get(public_key).cloned()
    }

    /// Whether a contact is currently online.
    pub fn is_online(&self, public_key: &str) -> bool {
        self.peer(public_key).is_some_and(|p| p.is_online)
    }

    /// Subscribe to online/offline transitions.
    pub fn subscribe_status(&self) -> broadcast::Receiver<PeerStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Record fresh address information for a contact.
    ///
    /// New or changed information is only trusted after a successful ping;
    /// the call returns once that ping has resolved.
    pub async fn handle_peer_info(
        &self,
        public_key: &str,
        address: &str,
        port: u16,
        is_direct_message: bool,
    ) {
        let (peer, must_ping) = {
            let mut state = self.state.lock();
            let must_ping = needs_ping(state.peers.get(public_key), address, port, is_direct_message);
            let interval = ping_interval(&self.our_public_key, public_key, &self.config);
            state.intervals.insert(public_key.to_string(), interval);

            let peer = PeerInfo {
                public_key: public_key.to_string(),
                address: address.to_string(),
                port,
                is_online: false,
            };
            state.peers.insert(public_key.to_string(), peer.clone());
            (peer, must_ping)
        };

        if must_ping {
            debug!(peer = %public_key, address, port, "Pinging peer to confirm address");
            let online = self.pinger.ping(&peer).await;
            self.mark(public_key, online);
        } else {
            self.mark(public_key, true);
        }
    }

    /// Set a contact's status and re-arm its keep-alive timer.
    pub fn mark(&self, public_key: &str, is_online: bool) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(peer) = state.peers.get_mut(public_key) else {
            return;
        };

        if let Some(timer) = state.timers.remove(public_key) {
            timer.abort();
        }
        let changed = peer.is_online != is_online;
        peer.is_online = is_online;

        let interval = if is_online {
            state
                .intervals
                .get(public_key)
                .copied()
                .unwrap_or(self.config.long_ping_interval)
        } else {
            self.config.offline_ping_interval
        };
        state
            .timers
            .insert(public_key.to_string(), self.spawn_timer(public_key.to_string(), interval));
        drop(guard);

        if changed {
            info!(peer = %public_key, is_online, "Peer status changed");
        }
        // No subscribers is fine
        let _ = self.status_tx.send(PeerStatusEvent {
            public_key: public_key.to_string(),
            is_online,
        });
    }

    fn spawn_timer(&self, public_key: String, period: Duration) -> JoinHandle<()> {
        let this = self.this.clone();
        // Anchored at re-arm time, not at the task's first poll
        let start = Instant::now() + period;
        tokio::spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(tracker) = this.upgrade() else {
                    return;
                };
                let key = public_key.clone();
                // Detached so that `mark` aborting this timer cannot cancel
                // the ping whose result it is recording
                tokio::spawn(async move {
                    let Some(peer) = tracker.peer(&key) else {
                        return;
                    };
                    let online = tracker.pinger.ping(&peer).await;
                    tracker.mark(&key, online);
                });
            }
        })
    }
}

impl Drop for PeerTracker {
    fn drop(&mut self) {
        for (_, timer) in self.state.get_mut().timers.drain() {
            timer.abort();
        }
    }
}
