use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        rooms::{RoomDetail, RoomSummary},
        ws::ServerEvent,
    },
    error::ServiceError,
    state::{
        ClientSender, SharedState,
        room::{PlaybackState, RoomState},
    },
};

/// Open a new room with `caller` as host and sole participant.
///
/// Fails with a conflict when the caller already occupies a room; nothing is
/// mutated in that case. The caller's sender is subscribed to the room's
/// broadcast group so later events reach it.
pub fn create_room(
    state: &SharedState,
    caller: Uuid,
    name: String,
    sender: ClientSender,
) -> Result<ServerEvent, ServiceError> {
    // The vacant membership entry is held through the whole mutation, making
    // the one-room-per-user check and the index write a single atomic step
    // even when the same user id runs commands on two sockets at once. The
    // registry insert still happens before the index write so observers that
    // see the index entry always find the matching registry snapshot.
    match state.membership().entry(caller) {
        Entry::Occupied(_) => Err(already_in_room()),
        Entry::Vacant(slot) => {
            let room_id = Uuid::new_v4();
            let room = Arc::new(RoomState::new(room_id, name.clone(), caller));
            state.rooms().insert(room_id, room);
            slot.insert(room_id);
            state.groups().subscribe(room_id, caller, sender);

            info!(user_id = %caller, room_id = %room_id, name = %name, "room created");
            Ok(ServerEvent::RoomCreated { room_id })
        }
    }
}

/// Join an existing room as a participant.
///
/// Broadcasts `user_joined` to the room (the caller included, as it is
/// already subscribed) and answers the caller with `room_joined`.
pub fn join_room(
    state: &SharedState,
    caller: Uuid,
    room_id: Uuid,
    sender: ClientSender,
) -> Result<ServerEvent, ServiceError> {
    // Same membership reservation as room creation; see create_room.
    match state.membership().entry(caller) {
        Entry::Occupied(_) => Err(already_in_room()),
        Entry::Vacant(slot) => {
            state
                .update_room(room_id, |room| room.with_participant(caller))
                .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;
            slot.insert(room_id);
            state.groups().subscribe(room_id, caller, sender);

            state
                .groups()
                .broadcast(room_id, &ServerEvent::UserJoined { user_id: caller });

            info!(user_id = %caller, room_id = %room_id, "user joined room");
            Ok(ServerEvent::RoomJoined { room_id })
        }
    }
}

/// Leave the currently occupied room.
///
/// A caller with no membership entry is a silent no-op, which keeps double
/// leaves and leave-after-close idempotent. When the leaver hosts the room,
/// the whole room closes and every remaining participant is evicted.
pub fn leave_room(state: &SharedState, caller: Uuid) {
    let Some(room_id) = state.membership().get(&caller).map(|entry| *entry.value()) else {
        return;
    };

    let hosts_room = state
        .rooms()
        .get(&room_id)
        .is_some_and(|entry| entry.host == caller);

    if hosts_room {
        close_room(state, room_id);
        return;
    }

    state.update_room(room_id, |room| room.without_participant(caller));
    state.membership().remove(&caller);
    state.groups().unsubscribe(room_id, caller);
    state
        .groups()
        .broadcast(room_id, &ServerEvent::UserLeft { user_id: caller });

    info!(user_id = %caller, room_id = %room_id, "user left room");
}

/// Tear a room down after its host left or vanished.
///
/// Hosts are never migrated: the room closes unconditionally and the former
/// members are told so before their group is dropped.
fn close_room(state: &SharedState, room_id: Uuid) {
    let Some((_, room)) = state.rooms().remove(&room_id) else {
        return;
    };

    for participant in &room.participants {
        state.membership().remove(participant);
    }

    let members = state.groups().remove_group(room_id);
    for sender in members.values() {
        sender.send(&ServerEvent::RoomClosed);
        sender.send(&ServerEvent::PlaybackStopped);
    }

    info!(
        room_id = %room_id,
        participants = room.participants.len(),
        "room closed"
    );
}

/// Handle the termination of a client's channel.
///
/// Semantically identical to [`leave_room`]; rooms and membership entries
/// never outlive a client that vanished without an explicit leave.
pub fn disconnect(state: &SharedState, caller: Uuid) {
    leave_room(state, caller);
}

/// Replace the room's playback triple and push the update to every member.
///
/// Host-only. The mutation is gated behind every precondition check and the
/// catalog lookup, then committed as one snapshot swap before the fanout.
pub async fn update_playback(
    state: &SharedState,
    caller: Uuid,
    token: &str,
    song_id: Uuid,
    offset_seconds: f64,
) -> Result<(), ServiceError> {
    let playback_state: PlaybackState = token.parse()?;

    let room_id = state
        .membership()
        .get(&caller)
        .map(|entry| *entry.value())
        .ok_or_else(|| ServiceError::NotFound("caller is not in any room".into()))?;

    // The room may have been closed concurrently by its host.
    let room = state
        .rooms()
        .get(&room_id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))?;

    if room.host != caller {
        return Err(ServiceError::Unauthorized(
            "only the host controls playback".into(),
        ));
    }

    let catalog = state.require_catalog().await?;
    let song = catalog
        .resolve(song_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("song `{song_id}` not found")))?;

    state
        .update_room(room_id, |room| {
            room.with_playback(song.clone(), playback_state, offset_seconds)
        })
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` closed during update")))?;

    state.groups().broadcast(
        room_id,
        &ServerEvent::PlaybackUpdated {
            state: playback_state,
            song,
            offset_seconds,
        },
    );

    info!(
        user_id = %caller,
        room_id = %room_id,
        state = %playback_state,
        offset_seconds,
        "playback updated"
    );
    Ok(())
}

/// Read-only snapshot of the active rooms, sorted by name for stable output.
pub fn list_rooms(state: &SharedState) -> Vec<RoomSummary> {
    let mut rooms = state
        .rooms()
        .iter()
        .map(|entry| RoomSummary::from(entry.value().as_ref()))
        .collect::<Vec<_>>();
    rooms.sort_by(|a, b| a.name.cmp(&b.name).then(a.room_id.cmp(&b.room_id)));
    rooms
}

/// Detailed view of one room for the REST surface.
pub fn room_detail(state: &SharedState, room_id: Uuid) -> Result<RoomDetail, ServiceError> {
    state
        .rooms()
        .get(&room_id)
        .map(|entry| RoomDetail::from(entry.value().as_ref()))
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))
}

fn already_in_room() -> ServiceError {
    ServiceError::Conflict("caller already occupies a room".into())
}
