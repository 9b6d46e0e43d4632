use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::rooms::{RoomDetail, RoomSummary},
    error::AppError,
    services::room_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/rooms",
    responses((status = 200, description = "Active rooms", body = [RoomSummary]))
)]
/// List the currently active rooms for lobby pages that poll before connecting.
pub async fn list_rooms(State(state): State<SharedState>) -> Json<Vec<RoomSummary>> {
    Json(room_service::list_rooms(&state))
}

#[utoipa::path(
    get,
    path = "/rooms/{room_id}",
    params(("room_id" = Uuid, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Room detail", body = RoomDetail),
        (status = 404, description = "No such room")
    )
)]
/// Detailed view of one active room.
pub async fn room_detail(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomDetail>, AppError> {
    let detail = room_service::room_detail(&state, room_id)?;
    Ok(Json(detail))
}

/// Configure the read-only room routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{room_id}", get(room_detail))
}
