//! Occupancy store port

use async_trait::async_trait;

use core_kernel::{ResidentId, RoomId, StoreError};

use crate::resident::Resident;
use crate::room::Room;

/// Persistence port for rooms and residents
///
/// Update methods carry the expected version and fail with
/// `StoreError::VersionConflict` when the stored version differs.
#[async_trait]
pub trait OccupancyStore: Send + Sync {
    // Rooms

    /// Inserts a new room; fails with `Conflict` on a duplicate room number
    async fn insert_room(&self, room: &Room) -> Result<(), StoreError>;

    async fn room(&self, id: RoomId) -> Result<Room, StoreError>;

    async fn rooms(&self) -> Result<Vec<Room>, StoreError>;

    async fn update_room(&self, room: &Room, expected_version: i64) -> Result<(), StoreError>;

    /// Deletes a room; the caller must have verified it is empty
    async fn delete_room(&self, id: RoomId) -> Result<(), StoreError>;

    // Residents

    async fn insert_resident(&self, resident: &Resident) -> Result<(), StoreError>;

    async fn resident(&self, id: ResidentId) -> Result<Resident, StoreError>;

    async fn residents(&self) -> Result<Vec<Resident>, StoreError>;

    async fn update_resident(
        &self,
        resident: &Resident,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// Writes a resident and a room in one transaction so the pairing between
    /// `resident.room_id` and `room.occupants` can never half-apply. Version
    /// checks apply to both writes.
    async fn update_pair(&self, resident: &Resident, room: &Room) -> Result<(), StoreError>;
}
