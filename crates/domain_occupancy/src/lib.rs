//! Occupancy domain - rooms, residents, and allocation
//!
//! Tracks who lives where. Rooms carry their occupant lists and capacity;
//! the allocator moves residents in and out while keeping both sides of the
//! pairing consistent.

pub mod allocator;
pub mod error;
pub mod ports;
pub mod resident;
pub mod room;

pub use allocator::{AllocationOutcome, RoomAllocator};
pub use error::OccupancyError;
pub use ports::OccupancyStore;
pub use resident::{ResidencyStatus, Resident};
pub use room::{Room, RoomStatus, RoomType};
