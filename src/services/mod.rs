/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Room coordinator: create/join/leave/playback logic over the shared stores.
pub mod room_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
