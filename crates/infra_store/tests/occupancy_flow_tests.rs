//! Allocation flows over the in-memory store

use std::sync::Arc;

use rust_decimal_macros::dec;

use domain_occupancy::{
    OccupancyStore, ResidencyStatus, Resident, Room, RoomAllocator, RoomStatus, RoomType,
};
use infra_store::InMemoryStore;
use test_utils::{assert_occupancy_conflict, MoneyFixtures, ResidentBuilder, RoomBuilder};

struct Harness {
    store: Arc<InMemoryStore>,
    allocator: RoomAllocator,
}

impl Harness {
    fn new() -> Self {
        let store = InMemoryStore::shared();
        let occupancy: Arc<dyn OccupancyStore> = store.clone();
        Self {
            allocator: RoomAllocator::new(occupancy),
            store,
        }
    }

    async fn room(&self, number: &str, room_type: RoomType, capacity: u32) -> Room {
        let room = RoomBuilder::new()
            .with_number(number)
            .with_type(room_type)
            .with_capacity(capacity)
            .build();
        self.store.insert_room(&room).await.unwrap();
        room
    }

    async fn resident(&self, name: &str) -> Resident {
        let resident = ResidentBuilder::new().with_name(name).build();
        self.store.insert_resident(&resident).await.unwrap();
        resident
    }
}

#[tokio::test]
async fn allocation_pairs_resident_and_room() {
    let h = Harness::new();
    let room = h.room("101", RoomType::Single, 1).await;
    let resident = h.resident("Asha Verma").await;

    let outcome = h.allocator.allocate(resident.id, room.id).await.unwrap();

    // Allocation doubles as check-in for a checked-out resident
    assert_eq!(outcome.resident.room_id, Some(room.id));
    assert_eq!(outcome.resident.status, ResidencyStatus::CheckedIn);
    assert!(outcome.resident.checked_in_at.is_some());
    assert_eq!(outcome.room.status, RoomStatus::Occupied);
    assert!(outcome.room.houses(resident.id));

    // Both sides persisted together
    let stored_room = h.store.room(room.id).await.unwrap();
    let stored_resident = h.store.resident(resident.id).await.unwrap();
    assert!(stored_room.houses(resident.id));
    assert_eq!(stored_resident.room_id, Some(room.id));
}

#[tokio::test]
async fn part_filled_room_accepts_another_resident() {
    let h = Harness::new();
    let room = h.room("201", RoomType::Double, 2).await;
    let first = h.resident("First").await;
    let second = h.resident("Second").await;

    h.allocator.allocate(first.id, room.id).await.unwrap();
    let outcome = h.allocator.allocate(second.id, room.id).await.unwrap();

    assert_eq!(outcome.room.occupant_count(), 2);
    assert!(outcome.room.is_full());
}

#[tokio::test]
async fn full_room_rejects_allocation() {
    let h = Harness::new();
    let room = h.room("101", RoomType::Single, 1).await;
    let first = h.resident("First").await;
    let second = h.resident("Second").await;

    h.allocator.allocate(first.id, room.id).await.unwrap();
    assert_occupancy_conflict(h.allocator.allocate(second.id, room.id).await);
}

#[tokio::test]
async fn housed_resident_cannot_be_allocated_again() {
    let h = Harness::new();
    let first_room = h.room("101", RoomType::Single, 1).await;
    let second_room = h.room("102", RoomType::Single, 1).await;
    let resident = h.resident("Asha Verma").await;

    h.allocator.allocate(resident.id, first_room.id).await.unwrap();
    assert_occupancy_conflict(h.allocator.allocate(resident.id, second_room.id).await);
}

#[tokio::test]
async fn maintenance_room_rejects_allocation() {
    let h = Harness::new();
    let room = h.room("101", RoomType::Single, 1).await;
    let resident = h.resident("Asha Verma").await;

    h.allocator
        .set_room_status(room.id, RoomStatus::Maintenance)
        .await
        .unwrap();
    assert_occupancy_conflict(h.allocator.allocate(resident.id, room.id).await);
}

#[tokio::test]
async fn vacate_frees_the_room() {
    let h = Harness::new();
    let room = h.room("101", RoomType::Single, 1).await;
    let resident = h.resident("Asha Verma").await;
    h.allocator.allocate(resident.id, room.id).await.unwrap();

    let outcome = h.allocator.vacate(resident.id).await.unwrap();

    assert_eq!(outcome.room.status, RoomStatus::Available);
    assert!(outcome.resident.room_id.is_none());
    // Vacating is not a check-out
    assert_eq!(outcome.resident.status, ResidencyStatus::CheckedIn);
}

#[tokio::test]
async fn check_out_clears_room_and_status() {
    let h = Harness::new();
    let room = h.room("101", RoomType::Single, 1).await;
    let resident = h.resident("Asha Verma").await;
    h.allocator.allocate(resident.id, room.id).await.unwrap();

    let checked_out = h.allocator.check_out(resident.id).await.unwrap();

    assert_eq!(checked_out.status, ResidencyStatus::CheckedOut);
    assert!(checked_out.room_id.is_none());
    assert!(checked_out.checked_out_at.is_some());

    let stored_room = h.store.room(room.id).await.unwrap();
    assert_eq!(stored_room.status, RoomStatus::Available);
    assert!(stored_room.occupants.is_empty());
}

#[tokio::test]
async fn delete_room_refused_while_occupied() {
    let h = Harness::new();
    let room = h.room("101", RoomType::Single, 1).await;
    let resident = h.resident("Asha Verma").await;
    h.allocator.allocate(resident.id, room.id).await.unwrap();

    assert_occupancy_conflict(h.allocator.delete_room(room.id).await);

    h.allocator.vacate(resident.id).await.unwrap();
    h.allocator.delete_room(room.id).await.unwrap();
    assert!(h.store.room(room.id).await.is_err());
}

#[tokio::test]
async fn duplicate_room_number_conflicts() {
    let h = Harness::new();
    h.room("101", RoomType::Single, 1).await;

    let duplicate = RoomBuilder::new()
        .with_number("101")
        .with_type(RoomType::Double)
        .with_rate(MoneyFixtures::inr(dec!(7000)))
        .build();
    let result = h.store.insert_room(&duplicate).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn concurrent_allocation_for_last_slot_has_one_winner() {
    let h = Harness::new();
    let room = h.room("101", RoomType::Single, 1).await;
    let first = h.resident("First").await;
    let second = h.resident("Second").await;

    let allocator = Arc::new(h.allocator);
    let a = {
        let allocator = Arc::clone(&allocator);
        tokio::spawn(async move { allocator.allocate(first.id, room.id).await })
    };
    let b = {
        let allocator = Arc::clone(&allocator);
        tokio::spawn(async move { allocator.allocate(second.id, room.id).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    let stored = h.store.room(room.id).await.unwrap();
    assert_eq!(stored.occupant_count(), 1);
}
