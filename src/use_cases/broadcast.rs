// Event/broadcast layer owned by the world task.
//
// One-shot updates go through bounded per-session outboxes via `try_send`, so the tick
// never waits on a connection. A session whose outbox is full is evicted rather than
// silently losing events; dropping its sender closes the connection, which then leaves.
// World snapshots go out on a separate broadcast channel where newer snapshots
// supersede older ones.

use crate::domain::PlayerId;
use crate::use_cases::types::{GameUpdate, Outbox, WorldSnapshot};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc::error::TrySendError};
use tracing::{debug, warn};

pub struct Broadcaster {
    outboxes: BTreeMap<PlayerId, Outbox>,
    world_tx: broadcast::Sender<Arc<WorldSnapshot>>,
}

impl Broadcaster {
    pub fn new(world_tx: broadcast::Sender<Arc<WorldSnapshot>>) -> Self {
        Self {
            outboxes: BTreeMap::new(),
            world_tx,
        }
    }

    pub fn register(&mut self, player_id: PlayerId, outbox: Outbox) {
        if self.outboxes.insert(player_id, outbox).is_some() {
            warn!(player_id, "replaced existing outbox");
        }
    }

    /// Returns `true` if the session was still registered.
    pub fn deregister(&mut self, player_id: PlayerId) -> bool {
        self.outboxes.remove(&player_id).is_some()
    }

    pub fn is_registered(&self, player_id: PlayerId) -> bool {
        self.outboxes.contains_key(&player_id)
    }

    pub fn session_count(&self) -> usize {
        self.outboxes.len()
    }

    /// Sends to a single session.
    pub fn unicast(&mut self, player_id: PlayerId, update: GameUpdate) {
        let update = Arc::new(update);
        let evict = match self.outboxes.get(&player_id) {
            Some(outbox) => !deliver(player_id, outbox, update),
            None => false,
        };
        if evict {
            self.outboxes.remove(&player_id);
        }
    }

    /// Sends to every registered session.
    pub fn multicast(&mut self, update: GameUpdate) {
        self.fan_out(None, update);
    }

    /// Sends to every registered session except `skip`.
    pub fn multicast_except(&mut self, skip: PlayerId, update: GameUpdate) {
        self.fan_out(Some(skip), update);
    }

    /// Publishes the end-of-tick snapshot. Having no subscribers is not an error.
    pub fn publish_snapshot(&self, snapshot: WorldSnapshot) {
        let _ = self.world_tx.send(Arc::new(snapshot));
    }

    fn fan_out(&mut self, skip: Option<PlayerId>, update: GameUpdate) {
        let update = Arc::new(update);
        self.outboxes.retain(|&player_id, outbox| {
            Some(player_id) == skip || deliver(player_id, outbox, update.clone())
        });
    }
}

// Returns false when the session should be dropped from the recipient set.
fn deliver(player_id: PlayerId, outbox: &Outbox, update: Arc<GameUpdate>) -> bool {
    match outbox.try_send(update) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(player_id, "session outbox full; evicting slow session");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(player_id, "session outbox closed; deregistering");
            false
        }
    }
}
