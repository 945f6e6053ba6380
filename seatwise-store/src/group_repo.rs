use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seatwise_core::{BookingError, BookingResult};
use seatwise_order::{GroupBooking, GroupBookingStore, GroupId, GroupSnapshot};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Groups {
    stored: BTreeMap<GroupId, GroupBooking>,
    /// Ids handed out but not yet stored, so pending groups never collide.
    issued: HashSet<GroupId>,
}

/// Paid group bookings kept in memory, ordered by id.
pub struct InMemoryGroupBookingStore {
    groups: RwLock<Groups>,
    rng: Mutex<StdRng>,
}

impl InMemoryGroupBookingStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible id sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            groups: RwLock::new(Groups::default()),
            rng: Mutex::new(rng),
        }
    }
}

impl Default for InMemoryGroupBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 10_000;

#[async_trait]
impl GroupBookingStore for InMemoryGroupBookingStore {
    async fn next_group_id(&self) -> BookingResult<GroupId> {
        let mut groups = self.groups.write().await;
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = GroupId::new(format!("GRP-{:06}", self.rng.lock().gen_range(0..1_000_000u32)));
            if !groups.stored.contains_key(&candidate) && groups.issued.insert(candidate.clone()) {
                debug!(group = %candidate, "group id issued");
                return Ok(candidate);
            }
        }
        warn!(
            stored = groups.stored.len(),
            pending = groups.issued.len(),
            "no free group id found"
        );
        Err(BookingError::Validation("group id space exhausted".to_string()))
    }

    async fn release_group_id(&self, id: &GroupId) {
        if self.groups.write().await.issued.remove(id) {
            debug!(group = %id, "group id released");
        }
    }

    async fn insert(&self, group: GroupBooking) -> bool {
        let mut groups = self.groups.write().await;
        if groups.stored.contains_key(group.id()) {
            return false;
        }
        let id = group.id().clone();
        groups.issued.remove(&id);
        info!(group = %id, passengers = group.passenger_count(), "group booking stored");
        groups.stored.insert(id, group);
        true
    }

    async fn get(&self, id: &GroupId) -> Option<GroupSnapshot> {
        self.groups.read().await.stored.get(id).map(GroupBooking::snapshot)
    }

    async fn remove(&self, id: &GroupId) -> Option<GroupSnapshot> {
        let mut group = self.groups.write().await.stored.remove(id)?;
        let names: Vec<String> = group.passenger_names().iter().map(|n| n.to_string()).collect();
        for name in &names {
            group.remove_member(name);
        }
        info!(group = %id, released = names.len(), "group booking removed");
        Some(group.snapshot())
    }

    async fn remove_member(&self, id: &GroupId, passenger_name: &str) -> BookingResult<bool> {
        let mut groups = self.groups.write().await;
        let group = groups
            .stored
            .get_mut(id)
            .ok_or_else(|| BookingError::GroupNotFound(id.to_string()))?;
        Ok(group.remove_member(passenger_name))
    }

    async fn for_passenger(&self, passenger_name: &str) -> Vec<GroupSnapshot> {
        self.groups
            .read()
            .await
            .stored
            .values()
            .filter(|g| g.contains(passenger_name))
            .map(GroupBooking::snapshot)
            .collect()
    }

    async fn all(&self) -> Vec<GroupSnapshot> {
        self.groups.read().await.stored.values().map(GroupBooking::snapshot).collect()
    }
}
