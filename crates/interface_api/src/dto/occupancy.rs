//! Occupancy DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_occupancy::{Resident, Room};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 16))]
    pub room_number: String,
    /// single, double, triple, suite, or other
    pub room_type: String,
    /// Defaults to the room type's standard capacity
    #[validate(range(min = 1, max = 16))]
    pub capacity: Option<u32>,
    pub price_per_month: Decimal,
    /// ISO 4217 code; defaults to INR
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResidentRequest {
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub resident_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SetRoomStatusRequest {
    /// available, occupied, maintenance, or reserved
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: Uuid,
    pub room_number: String,
    pub room_type: String,
    pub capacity: u32,
    pub price_per_month: Decimal,
    pub currency: String,
    pub status: String,
    pub occupants: Vec<Uuid>,
}

impl From<&Room> for RoomResponse {
    fn from(room: &Room) -> Self {
        Self {
            id: (*room.id.as_uuid()),
            room_number: room.room_number.clone(),
            room_type: room.room_type.as_str().to_string(),
            capacity: room.capacity,
            price_per_month: room.price_per_month.amount(),
            currency: room.price_per_month.currency().code().to_string(),
            status: room.status.as_str().to_string(),
            occupants: room.occupants.iter().map(|r| *r.as_uuid()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResidentResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub room_id: Option<Uuid>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl From<&Resident> for ResidentResponse {
    fn from(resident: &Resident) -> Self {
        Self {
            id: (*resident.id.as_uuid()),
            full_name: resident.full_name.clone(),
            email: resident.email.clone(),
            phone: resident.phone.clone(),
            status: resident.status.as_str().to_string(),
            room_id: resident.room_id.map(|r| *r.as_uuid()),
            checked_in_at: resident.checked_in_at,
            checked_out_at: resident.checked_out_at,
        }
    }
}

/// The two sides of an allocation move
#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub resident: ResidentResponse,
    pub room: RoomResponse,
}
