//! Room allocator
//!
//! Moves residents in and out of rooms while keeping `resident.room_id` and
//! `room.occupants` paired. Every move re-reads both aggregates, applies the
//! domain rules, and writes them in one transaction, retrying a bounded
//! number of times when a version race is lost.

use std::sync::Arc;

use chrono::Utc;

use core_kernel::{ResidentId, RetryPolicy, RoomId};

use crate::error::OccupancyError;
use crate::ports::OccupancyStore;
use crate::resident::Resident;
use crate::room::{Room, RoomStatus};

/// The resident and room after a successful move
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub resident: Resident,
    pub room: Room,
}

pub struct RoomAllocator {
    store: Arc<dyn OccupancyStore>,
    retry: RetryPolicy,
}

impl RoomAllocator {
    pub fn new(store: Arc<dyn OccupancyStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Allocates a resident into a room
    ///
    /// The room must be available or part-filled below capacity; the resident
    /// must not already hold a room. Under concurrent allocation into the
    /// last slot, the version check makes exactly one caller win.
    pub async fn allocate(
        &self,
        resident_id: ResidentId,
        room_id: RoomId,
    ) -> Result<AllocationOutcome, OccupancyError> {
        self.run_with_retry(|| async {
            let mut resident = self.store.resident(resident_id).await?;
            let mut room = self.store.room(room_id).await?;

            if let Some(current) = resident.room_id {
                return Err(OccupancyError::conflict(format!(
                    "resident {resident_id} is already in room {current}"
                )));
            }

            let now = Utc::now();
            room.add_occupant(resident_id, now)?;
            resident.check_in(room_id, now);

            self.store.update_pair(&resident, &room).await?;
            resident.version += 1;
            room.version += 1;

            tracing::info!(
                resident_id = %resident_id,
                room = %room.room_number,
                occupants = room.occupant_count(),
                "resident allocated"
            );
            Ok(AllocationOutcome { resident, room })
        })
        .await
    }

    /// Removes a resident from their room without checking them out
    pub async fn vacate(
        &self,
        resident_id: ResidentId,
    ) -> Result<AllocationOutcome, OccupancyError> {
        self.run_with_retry(|| async {
            let mut resident = self.store.resident(resident_id).await?;
            let Some(room_id) = resident.room_id else {
                return Err(OccupancyError::conflict(format!(
                    "resident {resident_id} holds no room"
                )));
            };
            let mut room = self.store.room(room_id).await?;

            let now = Utc::now();
            room.remove_occupant(resident_id, now)?;
            resident.clear_room(now);

            self.store.update_pair(&resident, &room).await?;
            resident.version += 1;
            room.version += 1;

            tracing::info!(
                resident_id = %resident_id,
                room = %room.room_number,
                "resident vacated"
            );
            Ok(AllocationOutcome { resident, room })
        })
        .await
    }

    /// Checks a resident out of the hostel, freeing their room if they hold
    /// one
    pub async fn check_out(&self, resident_id: ResidentId) -> Result<Resident, OccupancyError> {
        self.run_with_retry(|| async {
            let mut resident = self.store.resident(resident_id).await?;
            let now = Utc::now();

            match resident.room_id {
                Some(room_id) => {
                    let mut room = self.store.room(room_id).await?;
                    room.remove_occupant(resident_id, now)?;
                    resident.check_out(now);
                    self.store.update_pair(&resident, &room).await?;
                    resident.version += 1;
                }
                None => {
                    let version = resident.version;
                    resident.check_out(now);
                    self.store.update_resident(&resident, version).await?;
                    resident.version += 1;
                }
            }

            tracing::info!(resident_id = %resident_id, "resident checked out");
            Ok(resident)
        })
        .await
    }

    /// Applies an explicit room status, subject to the occupancy invariant
    pub async fn set_room_status(
        &self,
        room_id: RoomId,
        status: RoomStatus,
    ) -> Result<Room, OccupancyError> {
        self.run_with_retry(|| async {
            let mut room = self.store.room(room_id).await?;
            let version = room.version;
            room.set_status(status, Utc::now())?;
            self.store.update_room(&room, version).await?;
            room.version += 1;
            Ok(room)
        })
        .await
    }

    /// Deletes a room; refused while anyone is housed in it
    pub async fn delete_room(&self, room_id: RoomId) -> Result<(), OccupancyError> {
        let room = self.store.room(room_id).await?;
        if !room.occupants.is_empty() {
            return Err(OccupancyError::conflict(format!(
                "room {} still has {} occupant(s)",
                room.room_number,
                room.occupants.len()
            )));
        }
        self.store.delete_room(room_id).await?;
        tracing::info!(room = %room.room_number, "room deleted");
        Ok(())
    }

    async fn run_with_retry<T, F, Fut>(&self, operation: F) -> Result<T, OccupancyError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, OccupancyError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(OccupancyError::Store(err)) if err.is_version_conflict() => {
                    if self.retry.should_retry(attempt) {
                        attempt += 1;
                        continue;
                    }
                    return Err(OccupancyError::conflict(err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }
    }
}
