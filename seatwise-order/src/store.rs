use async_trait::async_trait;
use seatwise_core::BookingResult;

use crate::group::{GroupBooking, GroupId, GroupSnapshot};

/// Persistence for paid group bookings.
///
/// Reads return snapshots; the stored group is only changed through
/// `remove_member` and `remove`.
#[async_trait]
pub trait GroupBookingStore: Send + Sync {
    /// A fresh `GRP-` id not used by any stored or pending group.
    async fn next_group_id(&self) -> BookingResult<GroupId>;

    /// Hand back an id from `next_group_id` whose group was never stored.
    async fn release_group_id(&self, id: &GroupId);

    /// Returns false without storing anything if the id is already taken.
    async fn insert(&self, group: GroupBooking) -> bool;

    async fn get(&self, id: &GroupId) -> Option<GroupSnapshot>;

    /// Delete a group and release every seat it holds.
    async fn remove(&self, id: &GroupId) -> Option<GroupSnapshot>;

    /// Remove one passenger from a stored group, releasing their seat.
    /// `Ok(false)` when the group exists but the passenger is not in it.
    async fn remove_member(&self, id: &GroupId, passenger_name: &str) -> BookingResult<bool>;

    /// Groups that include the named passenger.
    async fn for_passenger(&self, passenger_name: &str) -> Vec<GroupSnapshot>;

    async fn all(&self) -> Vec<GroupSnapshot>;
}
