//! Room handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Money, ResidentId, RoomId};
use domain_occupancy::{OccupancyStore, Room, RoomStatus, RoomType};

use crate::dto::occupancy::{
    AllocateRequest, AllocationResponse, CreateRoomRequest, ResidentResponse, RoomResponse,
    SetRoomStatusRequest,
};
use crate::handlers::billing::parse_currency;
use crate::{error::ApiError, AppState};

/// Creates a room
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), ApiError> {
    request.validate()?;
    let currency = parse_currency(request.currency.as_deref())?;
    let room_type = RoomType::from_str(&request.room_type)?;
    let capacity = request.capacity.unwrap_or_else(|| room_type.default_capacity());

    let room = Room::new(
        request.room_number,
        room_type,
        capacity,
        Money::new(request.price_per_month, currency),
    )?;
    state.occupancy.insert_room(&room).await?;
    Ok((StatusCode::CREATED, Json(RoomResponse::from(&room))))
}

/// Lists all rooms
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    let rooms = state.occupancy.rooms().await?;
    Ok(Json(rooms.iter().map(RoomResponse::from).collect()))
}

/// Gets a room by ID
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomResponse>, ApiError> {
    let room = state.occupancy.room(RoomId::from(id)).await?;
    Ok(Json(RoomResponse::from(&room)))
}

/// Deletes an empty room
pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.allocator.delete_room(RoomId::from(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Applies an explicit room status
pub async fn set_room_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetRoomStatusRequest>,
) -> Result<Json<RoomResponse>, ApiError> {
    let status = RoomStatus::from_str(&request.status)?;
    let room = state
        .allocator
        .set_room_status(RoomId::from(id), status)
        .await?;
    Ok(Json(RoomResponse::from(&room)))
}

/// Allocates a resident into the room
pub async fn allocate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AllocateRequest>,
) -> Result<Json<AllocationResponse>, ApiError> {
    let outcome = state
        .allocator
        .allocate(ResidentId::from(request.resident_id), RoomId::from(id))
        .await?;
    Ok(Json(AllocationResponse {
        resident: ResidentResponse::from(&outcome.resident),
        room: RoomResponse::from(&outcome.room),
    }))
}
