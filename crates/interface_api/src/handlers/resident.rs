//! Resident handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::ResidentId;
use domain_occupancy::{OccupancyStore, Resident};

use crate::dto::occupancy::{
    AllocationResponse, CreateResidentRequest, ResidentResponse, RoomResponse,
};
use crate::{error::ApiError, AppState};

/// Registers a resident
pub async fn create_resident(
    State(state): State<AppState>,
    Json(request): Json<CreateResidentRequest>,
) -> Result<(StatusCode, Json<ResidentResponse>), ApiError> {
    request.validate()?;
    let mut resident = Resident::new(request.full_name)?;
    resident.email = request.email;
    resident.phone = request.phone;

    state.occupancy.insert_resident(&resident).await?;
    Ok((StatusCode::CREATED, Json(ResidentResponse::from(&resident))))
}

/// Lists all residents
pub async fn list_residents(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResidentResponse>>, ApiError> {
    let residents = state.occupancy.residents().await?;
    Ok(Json(residents.iter().map(ResidentResponse::from).collect()))
}

/// Gets a resident by ID
pub async fn get_resident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResidentResponse>, ApiError> {
    let resident = state.occupancy.resident(ResidentId::from(id)).await?;
    Ok(Json(ResidentResponse::from(&resident)))
}

/// Removes the resident from their room without checking them out
pub async fn vacate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AllocationResponse>, ApiError> {
    let outcome = state.allocator.vacate(ResidentId::from(id)).await?;
    Ok(Json(AllocationResponse {
        resident: ResidentResponse::from(&outcome.resident),
        room: RoomResponse::from(&outcome.room),
    }))
}

/// Checks the resident out of the hostel
pub async fn check_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResidentResponse>, ApiError> {
    let resident = state.allocator.check_out(ResidentId::from(id)).await?;
    Ok(Json(ResidentResponse::from(&resident)))
}
