//! Room aggregate
//!
//! A room carries its occupant list and capacity. Status and occupancy are
//! bound by one invariant: a room is occupied exactly when its occupant list
//! is non-empty, with maintenance and reserved overriding both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, ResidentId, RoomId};

use crate::error::OccupancyError;

/// Room availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// No occupants; open for allocation
    Available,
    /// At least one occupant; open for allocation while below capacity
    Occupied,
    /// Closed for repairs; never allocatable
    Maintenance,
    /// Held administratively; never allocatable
    Reserved,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::Reserved => "reserved",
        }
    }
}

impl std::str::FromStr for RoomStatus {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(RoomStatus::Available),
            "occupied" => Ok(RoomStatus::Occupied),
            "maintenance" => Ok(RoomStatus::Maintenance),
            "reserved" => Ok(RoomStatus::Reserved),
            other => Err(OccupancyError::validation(format!(
                "unknown room status: {other}"
            ))),
        }
    }
}

/// Room layout category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Triple,
    Suite,
    Other,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Single => "single",
            RoomType::Double => "double",
            RoomType::Triple => "triple",
            RoomType::Suite => "suite",
            RoomType::Other => "other",
        }
    }

    /// Default capacity for the layout
    pub fn default_capacity(&self) -> u32 {
        match self {
            RoomType::Single => 1,
            RoomType::Double => 2,
            RoomType::Triple => 3,
            RoomType::Suite => 4,
            RoomType::Other => 1,
        }
    }
}

impl std::str::FromStr for RoomType {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(RoomType::Single),
            "double" => Ok(RoomType::Double),
            "triple" => Ok(RoomType::Triple),
            "suite" => Ok(RoomType::Suite),
            "other" => Ok(RoomType::Other),
            other => Err(OccupancyError::validation(format!(
                "unknown room type: {other}"
            ))),
        }
    }
}

/// A hostel room with its occupants and monthly rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Human-visible room number, unique per hostel
    pub room_number: String,
    pub room_type: RoomType,
    /// Maximum occupants; at least one
    pub capacity: u32,
    /// Monthly rate billed to each occupant
    pub price_per_month: Money,
    pub status: RoomStatus,
    /// Residents currently housed here
    pub occupants: Vec<ResidentId>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        room_number: impl Into<String>,
        room_type: RoomType,
        capacity: u32,
        price_per_month: Money,
    ) -> Result<Self, OccupancyError> {
        let room_number = room_number.into();
        if room_number.trim().is_empty() {
            return Err(OccupancyError::validation("room number must not be empty"));
        }
        if capacity == 0 {
            return Err(OccupancyError::validation("capacity must be at least one"));
        }
        if price_per_month.is_negative() {
            return Err(OccupancyError::validation(
                "price per month must not be negative",
            ));
        }
        let now = Utc::now();

        Ok(Self {
            id: RoomId::new_v7(),
            room_number,
            room_type,
            capacity,
            price_per_month,
            status: RoomStatus::Available,
            occupants: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() as u32 >= self.capacity
    }

    pub fn houses(&self, resident_id: ResidentId) -> bool {
        self.occupants.contains(&resident_id)
    }

    /// Returns true if a new resident may be allocated into this room
    pub fn is_allocatable(&self) -> bool {
        matches!(self.status, RoomStatus::Available | RoomStatus::Occupied) && !self.is_full()
    }

    /// Adds an occupant and re-derives the status
    pub fn add_occupant(
        &mut self,
        resident_id: ResidentId,
        now: DateTime<Utc>,
    ) -> Result<(), OccupancyError> {
        match self.status {
            RoomStatus::Maintenance => {
                return Err(OccupancyError::conflict(format!(
                    "room {} is under maintenance",
                    self.room_number
                )))
            }
            RoomStatus::Reserved => {
                return Err(OccupancyError::conflict(format!(
                    "room {} is reserved",
                    self.room_number
                )))
            }
            RoomStatus::Available | RoomStatus::Occupied => {}
        }
        if self.is_full() {
            return Err(OccupancyError::conflict(format!(
                "room {} is at capacity ({})",
                self.room_number, self.capacity
            )));
        }
        if self.houses(resident_id) {
            return Err(OccupancyError::conflict(format!(
                "resident {resident_id} is already in room {}",
                self.room_number
            )));
        }

        self.occupants.push(resident_id);
        self.status = RoomStatus::Occupied;
        self.updated_at = now;
        Ok(())
    }

    /// Removes an occupant and re-derives the status
    ///
    /// Maintenance and reserved are preserved; only the available/occupied
    /// pair is re-derived from the occupant list.
    pub fn remove_occupant(
        &mut self,
        resident_id: ResidentId,
        now: DateTime<Utc>,
    ) -> Result<(), OccupancyError> {
        let Some(position) = self.occupants.iter().position(|r| *r == resident_id) else {
            return Err(OccupancyError::conflict(format!(
                "resident {resident_id} is not in room {}",
                self.room_number
            )));
        };
        self.occupants.remove(position);
        if self.status == RoomStatus::Occupied && self.occupants.is_empty() {
            self.status = RoomStatus::Available;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Sets an explicit status, guarding the occupancy invariant
    ///
    /// Available cannot be forced on a room with occupants and occupied
    /// cannot be forced on an empty one. Maintenance and reserved are
    /// allowed regardless of occupancy.
    pub fn set_status(
        &mut self,
        status: RoomStatus,
        now: DateTime<Utc>,
    ) -> Result<(), OccupancyError> {
        match status {
            RoomStatus::Available if !self.occupants.is_empty() => {
                return Err(OccupancyError::conflict(format!(
                    "room {} still has {} occupant(s)",
                    self.room_number,
                    self.occupants.len()
                )))
            }
            RoomStatus::Occupied if self.occupants.is_empty() => {
                return Err(OccupancyError::conflict(format!(
                    "room {} has no occupants",
                    self.room_number
                )))
            }
            _ => {}
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }
}
