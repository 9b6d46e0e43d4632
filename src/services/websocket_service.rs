use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientCommand, ServerEvent},
    error::ServiceError,
    services::room_service,
    state::{ClientSender, SharedState},
};

/// Handle the full lifecycle for an individual room WebSocket connection.
///
/// `user_id` was resolved once from the connect-time query string and stays
/// fixed for the channel's lifetime. Whatever way the socket ends, the user
/// is disconnected from its room so no membership entry leaks.
pub async fn handle_socket(state: SharedState, socket: WebSocket, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let client = ClientSender::new(outbound_tx.clone());
    info!(user_id = %user_id, "client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                dispatch(&state, user_id, &client, &text).await;
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(user_id = %user_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "websocket error");
                break;
            }
        }
    }

    // Abrupt network loss and explicit close both land here.
    room_service::disconnect(&state, user_id);
    info!(user_id = %user_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Decode one inbound frame and run the command it carries.
///
/// Every failure, anticipated or not, comes back to the caller alone as an
/// `error` event; the connection itself is never torn down over a bad command.
async fn dispatch(state: &SharedState, user_id: Uuid, client: &ClientSender, text: &str) {
    let command = match ClientCommand::from_json_str(text) {
        Ok(command) => command,
        Err(err) => {
            warn!(user_id = %user_id, error = %err, "failed to parse or validate command");
            client.send(&ServerEvent::Error {
                message: err.to_string(),
            });
            return;
        }
    };

    match run_command(state, user_id, client, command).await {
        Ok(Some(reply)) => client.send(&reply),
        Ok(None) => {}
        Err(err) => {
            warn!(user_id = %user_id, error = %err, "command failed");
            client.send(&ServerEvent::Error {
                message: err.to_string(),
            });
        }
    }
}

/// Route a decoded command into the room coordinator.
async fn run_command(
    state: &SharedState,
    user_id: Uuid,
    client: &ClientSender,
    command: ClientCommand,
) -> Result<Option<ServerEvent>, ServiceError> {
    match command {
        ClientCommand::CreateRoom { name } => {
            room_service::create_room(state, user_id, name, client.clone()).map(Some)
        }
        ClientCommand::JoinRoom { room_id } => {
            room_service::join_room(state, user_id, room_id, client.clone()).map(Some)
        }
        ClientCommand::LeaveRoom => {
            room_service::leave_room(state, user_id);
            Ok(None)
        }
        ClientCommand::UpdatePlayback {
            state: token,
            song_id,
            offset_seconds,
        } => room_service::update_playback(state, user_id, &token, song_id, offset_seconds)
            .await
            .map(|()| None),
        ClientCommand::ListRooms => Ok(Some(ServerEvent::RoomList {
            rooms: room_service::list_rooms(state),
        })),
        ClientCommand::Unknown => Err(ServiceError::InvalidInput(
            "unrecognized command type".into(),
        )),
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn client() -> (ClientSender, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientSender::new(tx), rx)
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<Message>) -> ServerEvent {
        match rx.try_recv().expect("expected a queued event") {
            Message::Text(payload) => serde_json::from_str(&payload).expect("decode event"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_frame_yields_caller_directed_error() {
        let state = AppState::new();
        let (sender, mut rx) = client();

        dispatch(&state, Uuid::new_v4(), &sender, "not json").await;

        assert!(matches!(next_event(&mut rx), ServerEvent::Error { .. }));
    }

    #[tokio::test]
    async fn unknown_command_yields_caller_directed_error() {
        let state = AppState::new();
        let (sender, mut rx) = client();

        dispatch(&state, Uuid::new_v4(), &sender, r#"{"type": "warp_drive"}"#).await;

        assert!(matches!(next_event(&mut rx), ServerEvent::Error { .. }));
    }

    #[tokio::test]
    async fn create_then_list_over_the_command_surface() {
        let state = AppState::new();
        let user = Uuid::new_v4();
        let (sender, mut rx) = client();

        dispatch(
            &state,
            user,
            &sender,
            r#"{"type": "create_room", "name": "Party"}"#,
        )
        .await;
        assert!(matches!(
            next_event(&mut rx),
            ServerEvent::RoomCreated { .. }
        ));

        dispatch(&state, user, &sender, r#"{"type": "list_rooms"}"#).await;
        match next_event(&mut rx) {
            ServerEvent::RoomList { rooms } => {
                assert_eq!(rooms.len(), 1);
                assert_eq!(rooms[0].name, "Party");
                assert_eq!(rooms[0].participant_count, 1);
            }
            other => panic!("expected room_list, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn leave_room_replies_with_nothing() {
        let state = AppState::new();
        let (sender, mut rx) = client();

        dispatch(&state, Uuid::new_v4(), &sender, r#"{"type": "leave_room"}"#).await;

        assert!(rx.try_recv().is_err());
    }
}
