//! Song Lookup collaborator: the only external capability the room
//! coordinator consumes. Everything else (accounts, payments, playlists)
//! lives in other services and never reaches this process.

pub mod http;

use std::error::Error;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error raised by catalog backends regardless of the underlying transport.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog could not be reached or answered with a failure.
    #[error("catalog unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failed operation.
        message: String,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl CatalogError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        CatalogError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Song metadata as served by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Song {
    /// Stable identifier for the song.
    pub id: Uuid,
    /// Song title.
    pub title: String,
    /// Performing artist.
    pub artist: String,
    /// URL pointing to the media resource.
    pub url: String,
    /// Song length in milliseconds.
    pub duration_ms: u64,
}

/// Abstraction over the song catalog used to resolve playback updates.
pub trait SongCatalog: Send + Sync {
    /// Resolve a song id to its metadata, or `None` when unknown.
    fn resolve(&self, id: Uuid) -> BoxFuture<'static, CatalogResult<Option<Song>>>;
    /// Cheap liveness check used by the connection supervisor.
    fn health_check(&self) -> BoxFuture<'static, CatalogResult<()>>;
}
