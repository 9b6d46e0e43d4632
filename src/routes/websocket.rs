use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{services::websocket_service, state::SharedState};

/// Connect-time parameters identifying the client behind the socket.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ConnectParams {
    /// Identifier of the user opening the channel; fixed for its lifetime.
    pub user_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/ws",
    params(ConnectParams),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 400, description = "Missing or malformed user_id")
    )
)]
/// Upgrade the HTTP connection into a listening-room WebSocket session.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let shared_state = state.clone();
    ws.on_upgrade(move |socket| {
        websocket_service::handle_socket(shared_state, socket, params.user_id)
    })
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
