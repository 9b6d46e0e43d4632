//! Data transfer objects shared between the HTTP and WebSocket surfaces.

pub mod health;
pub mod rooms;
pub mod validation;
pub mod ws;
