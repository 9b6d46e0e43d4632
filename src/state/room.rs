use std::fmt;
use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::Song;

/// Coarse playback mode driven by the room host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing is playing; a freshly created room starts here.
    Stopped,
    /// The current song is playing from the stored offset.
    Playing,
    /// The current song is paused at the stored offset.
    Paused,
}

/// Error returned when a playback token does not name a known state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown playback state `{0}` (expected stopped, playing or paused)")]
pub struct InvalidPlaybackToken(pub String);

impl FromStr for PlaybackState {
    type Err = InvalidPlaybackToken;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "stopped" => Ok(Self::Stopped),
            "playing" => Ok(Self::Playing),
            "paused" => Ok(Self::Paused),
            _ => Err(InvalidPlaybackToken(token.to_string())),
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
        };
        f.write_str(token)
    }
}

/// Playback triple replaced as one unit by a host update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playback {
    /// Song currently loaded in the room, if any.
    pub song: Option<Song>,
    /// Playback mode for the current song.
    pub state: PlaybackState,
    /// Offset into the current song, in seconds.
    pub offset_seconds: f64,
}

impl Playback {
    /// Playback value every room starts with: stopped, no song, offset zero.
    pub fn stopped() -> Self {
        Self {
            song: None,
            state: PlaybackState::Stopped,
            offset_seconds: 0.0,
        }
    }
}

/// Immutable snapshot of one active room.
///
/// Snapshots are stored behind an [`std::sync::Arc`] in the registry and are
/// never mutated in place; every structural change builds a new value and
/// swaps it in whole, so concurrent readers observe either the previous or
/// the next snapshot, never a mix of the two.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomState {
    /// Stable identifier for the room.
    pub id: Uuid,
    /// Display name chosen by the host at creation time.
    pub name: String,
    /// User with exclusive authority over the room's playback.
    pub host: Uuid,
    /// Members in join order; the host is always present.
    pub participants: IndexSet<Uuid>,
    /// Shared playback state pushed to every member.
    pub playback: Playback,
}

impl RoomState {
    /// Create a room with `host` as its only participant and playback stopped.
    pub fn new(id: Uuid, name: String, host: Uuid) -> Self {
        let mut participants = IndexSet::new();
        participants.insert(host);
        Self {
            id,
            name,
            host,
            participants,
            playback: Playback::stopped(),
        }
    }

    /// Snapshot with `user` appended to the participant set.
    pub fn with_participant(&self, user: Uuid) -> Self {
        let mut next = self.clone();
        next.participants.insert(user);
        next
    }

    /// Snapshot with `user` removed from the participant set.
    pub fn without_participant(&self, user: Uuid) -> Self {
        let mut next = self.clone();
        next.participants.shift_remove(&user);
        next
    }

    /// Snapshot with the whole playback triple replaced.
    pub fn with_playback(&self, song: Song, state: PlaybackState, offset_seconds: f64) -> Self {
        let mut next = self.clone();
        next.playback = Playback {
            song: Some(song),
            state,
            offset_seconds,
        };
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str) -> Song {
        Song {
            id: Uuid::new_v4(),
            title: title.into(),
            artist: "test artist".into(),
            url: "https://media.example/1.ogg".into(),
            duration_ms: 180_000,
        }
    }

    #[test]
    fn playback_tokens_parse_case_insensitively() {
        assert_eq!("stopped".parse::<PlaybackState>(), Ok(PlaybackState::Stopped));
        assert_eq!("Playing".parse::<PlaybackState>(), Ok(PlaybackState::Playing));
        assert_eq!("PAUSED".parse::<PlaybackState>(), Ok(PlaybackState::Paused));
    }

    #[test]
    fn unknown_playback_token_is_rejected() {
        let err = "rewinding".parse::<PlaybackState>().unwrap_err();
        assert_eq!(err, InvalidPlaybackToken("rewinding".into()));
    }

    #[test]
    fn new_room_starts_stopped_with_host_as_sole_participant() {
        let host = Uuid::new_v4();
        let room = RoomState::new(Uuid::new_v4(), "Party".into(), host);

        assert_eq!(room.participants.len(), 1);
        assert!(room.participants.contains(&host));
        assert_eq!(room.playback, Playback::stopped());
    }

    #[test]
    fn participant_changes_build_fresh_snapshots() {
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let room = RoomState::new(Uuid::new_v4(), "Party".into(), host);

        let joined = room.with_participant(guest);
        assert_eq!(room.participants.len(), 1);
        assert_eq!(joined.participants.len(), 2);

        let left = joined.without_participant(guest);
        assert_eq!(left.participants.len(), 1);
        assert!(left.participants.contains(&host));
    }

    #[test]
    fn playback_replacement_swaps_the_whole_triple() {
        let host = Uuid::new_v4();
        let room = RoomState::new(Uuid::new_v4(), "Party".into(), host);

        let updated = room.with_playback(song("one"), PlaybackState::Playing, 12.5);
        assert_eq!(updated.playback.state, PlaybackState::Playing);
        assert_eq!(updated.playback.offset_seconds, 12.5);
        assert_eq!(updated.playback.song.as_ref().unwrap().title, "one");
        // Original snapshot untouched.
        assert_eq!(room.playback, Playback::stopped());
    }
}
