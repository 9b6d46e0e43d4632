use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::room::{PlaybackState, RoomState};

/// Listing entry describing one active room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoomSummary {
    /// Stable identifier of the room.
    pub room_id: Uuid,
    /// Display name chosen by the host.
    pub name: String,
    /// Number of current participants, host included.
    pub participant_count: usize,
}

impl From<&RoomState> for RoomSummary {
    fn from(room: &RoomState) -> Self {
        Self {
            room_id: room.id,
            name: room.name.clone(),
            participant_count: room.participants.len(),
        }
    }
}

/// Detailed view of one room, served by `GET /rooms/{room_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RoomDetail {
    /// Stable identifier of the room.
    pub room_id: Uuid,
    /// Display name chosen by the host.
    pub name: String,
    /// User hosting the room.
    pub host: Uuid,
    /// Current participants in join order, host included.
    pub participants: Vec<Uuid>,
    /// Current playback mode.
    pub playback_state: PlaybackState,
    /// Offset into the current song, in seconds.
    pub offset_seconds: f64,
}

impl From<&RoomState> for RoomDetail {
    fn from(room: &RoomState) -> Self {
        Self {
            room_id: room.id,
            name: room.name.clone(),
            host: room.host,
            participants: room.participants.iter().copied().collect(),
            playback_state: room.playback.state,
            offset_seconds: room.playback.offset_seconds,
        }
    }
}
