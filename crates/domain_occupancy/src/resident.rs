//! Resident aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ResidentId, RoomId};

use crate::error::OccupancyError;

/// Whether the resident is currently housed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidencyStatus {
    #[serde(rename = "checked-in")]
    CheckedIn,
    #[serde(rename = "checked-out")]
    CheckedOut,
}

impl ResidencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResidencyStatus::CheckedIn => "checked-in",
            ResidencyStatus::CheckedOut => "checked-out",
        }
    }
}

impl std::str::FromStr for ResidencyStatus {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checked-in" => Ok(ResidencyStatus::CheckedIn),
            "checked-out" => Ok(ResidencyStatus::CheckedOut),
            other => Err(OccupancyError::validation(format!(
                "unknown residency status: {other}"
            ))),
        }
    }
}

/// A person registered at the hostel
///
/// `room_id` is set exactly when the resident is checked in; the room's
/// occupant list is the authoritative side of the pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: ResidencyStatus,
    /// Room the resident occupies, when checked in
    pub room_id: Option<RoomId>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resident {
    pub fn new(full_name: impl Into<String>) -> Result<Self, OccupancyError> {
        let full_name = full_name.into();
        if full_name.trim().is_empty() {
            return Err(OccupancyError::validation("full name must not be empty"));
        }
        let now = Utc::now();

        Ok(Self {
            id: ResidentId::new_v7(),
            full_name,
            email: None,
            phone: None,
            status: ResidencyStatus::CheckedOut,
            room_id: None,
            checked_in_at: None,
            checked_out_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn is_housed(&self) -> bool {
        self.room_id.is_some()
    }

    /// Records the check-in side of an allocation
    pub(crate) fn check_in(&mut self, room_id: RoomId, now: DateTime<Utc>) {
        self.status = ResidencyStatus::CheckedIn;
        self.room_id = Some(room_id);
        self.checked_in_at = Some(now);
        self.checked_out_at = None;
        self.updated_at = now;
    }

    /// Clears the room pairing; used by both vacate and check-out
    pub(crate) fn clear_room(&mut self, now: DateTime<Utc>) {
        self.room_id = None;
        self.updated_at = now;
    }

    /// Records a final check-out
    pub(crate) fn check_out(&mut self, now: DateTime<Utc>) {
        self.status = ResidencyStatus::CheckedOut;
        self.room_id = None;
        self.checked_out_at = Some(now);
        self.updated_at = now;
    }
}
