use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Listen Party Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::list_rooms,
        crate::routes::rooms::room_detail,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::rooms::RoomSummary,
            crate::dto::rooms::RoomDetail,
            crate::dto::ws::ClientCommand,
            crate::dto::ws::ServerEvent,
            crate::catalog::Song,
            crate::state::room::PlaybackState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Read-only room listing endpoints"),
        (name = "ws", description = "WebSocket command surface for listening rooms"),
    )
)]
pub struct ApiDoc;
