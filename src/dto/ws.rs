use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    catalog::Song,
    dto::{rooms::RoomSummary, validation::validate_room_name},
    state::room::PlaybackState,
};

/// Commands accepted from room WebSocket clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Open a new room and become its host.
    CreateRoom {
        /// Display name for the new room.
        name: String,
    },
    /// Join an existing room as a participant.
    JoinRoom {
        /// Identifier of the room to join.
        room_id: Uuid,
    },
    /// Leave the currently occupied room, if any.
    LeaveRoom,
    /// Replace the room's playback state (host only).
    UpdatePlayback {
        /// Playback state token: `stopped`, `playing` or `paused`.
        state: String,
        /// Identifier of the song to load.
        song_id: Uuid,
        /// Offset into the song, in seconds.
        offset_seconds: f64,
    },
    /// Request the current room listing.
    ListRooms,
    /// Catch-all for unrecognized command types.
    #[serde(other)]
    Unknown,
}

impl ClientCommand {
    /// Parse and validate a command from its JSON text frame.
    pub fn from_json_str(payload: &str) -> Result<Self, CommandParseError> {
        let command: Self = serde_json::from_str(payload)?;
        if let Self::CreateRoom { name } = &command {
            validate_room_name(name)?;
        }
        Ok(command)
    }
}

/// Error raised while decoding or validating an inbound command frame.
#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    /// The frame was not valid JSON for any known command shape.
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The frame decoded but carried invalid field values.
    #[error("invalid command: {0}")]
    Invalid(#[from] validator::ValidationError),
}

/// Events pushed to room WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The caller's room was created; the caller is its host.
    RoomCreated {
        /// Identifier of the freshly created room.
        room_id: Uuid,
    },
    /// The caller joined the room.
    RoomJoined {
        /// Identifier of the joined room.
        room_id: Uuid,
    },
    /// A user joined the room.
    UserJoined {
        /// Identifier of the new participant.
        user_id: Uuid,
    },
    /// A user left the room.
    UserLeft {
        /// Identifier of the departed participant.
        user_id: Uuid,
    },
    /// The host left and the room no longer exists.
    RoomClosed,
    /// Playback stopped because the room closed.
    PlaybackStopped,
    /// The host replaced the room's playback state.
    PlaybackUpdated {
        /// New playback mode.
        state: PlaybackState,
        /// Song now loaded in the room.
        song: Song,
        /// Offset into the song, in seconds.
        offset_seconds: f64,
    },
    /// Snapshot of the active rooms, answering `list_rooms`.
    RoomList {
        /// One entry per active room.
        rooms: Vec<RoomSummary>,
    },
    /// Caller-directed failure report; the connection stays open.
    Error {
        /// Human-readable description of the failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_room_parses_and_validates() {
        let command = ClientCommand::from_json_str(
            r#"{"type": "create_room", "name": "Friday Night"}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            ClientCommand::CreateRoom {
                name: "Friday Night".into()
            }
        );
    }

    #[test]
    fn blank_room_name_is_rejected_at_parse_time() {
        let err = ClientCommand::from_json_str(r#"{"type": "create_room", "name": "  "}"#)
            .unwrap_err();
        assert!(matches!(err, CommandParseError::Invalid(_)));
    }

    #[test]
    fn update_playback_parses_all_fields() {
        let song_id = Uuid::new_v4();
        let payload = format!(
            r#"{{"type": "update_playback", "state": "playing", "song_id": "{song_id}", "offset_seconds": 12.5}}"#
        );
        let command = ClientCommand::from_json_str(&payload).unwrap();
        assert_eq!(
            command,
            ClientCommand::UpdatePlayback {
                state: "playing".into(),
                song_id,
                offset_seconds: 12.5,
            }
        );
    }

    #[test]
    fn unknown_command_type_parses_to_unknown() {
        let command = ClientCommand::from_json_str(r#"{"type": "shuffle_queue"}"#).unwrap();
        assert_eq!(command, ClientCommand::Unknown);
    }

    #[test]
    fn garbage_frame_is_malformed() {
        let err = ClientCommand::from_json_str("not json").unwrap_err();
        assert!(matches!(err, CommandParseError::Malformed(_)));
    }

    #[test]
    fn server_events_are_tagged_snake_case() {
        let event = ServerEvent::UserJoined {
            user_id: Uuid::nil(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"user_joined""#));
    }
}
