//! HTTP implementation of the song catalog collaborator.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use uuid::Uuid;

use super::{CatalogError, CatalogResult, Song, SongCatalog};

/// Song catalog backed by the catalog service's REST API.
#[derive(Clone)]
pub struct HttpSongCatalog {
    client: Client,
    base_url: Arc<str>,
}

impl HttpSongCatalog {
    /// Build a client for the catalog at `base_url` and verify it responds.
    pub async fn connect(base_url: &str, request_timeout: Duration) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|source| {
                CatalogError::unavailable("building catalog HTTP client".into(), source)
            })?;

        let catalog = Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        };

        catalog.ping().await?;
        Ok(catalog)
    }

    async fn ping(&self) -> CatalogResult<()> {
        let url = format!("{}/healthcheck", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| CatalogError::unavailable("pinging catalog".into(), source))?;

        response
            .error_for_status()
            .map_err(|source| CatalogError::unavailable("catalog ping status".into(), source))?;
        Ok(())
    }

    async fn fetch_song(client: Client, url: String) -> CatalogResult<Option<Song>> {
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|source| CatalogError::unavailable(format!("requesting {url}"), source))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .map_err(|source| CatalogError::unavailable(format!("status for {url}"), source))?;

        let song = response
            .json::<Song>()
            .await
            .map_err(|source| CatalogError::unavailable(format!("decoding {url}"), source))?;

        Ok(Some(song))
    }
}

impl SongCatalog for HttpSongCatalog {
    fn resolve(&self, id: Uuid) -> BoxFuture<'static, CatalogResult<Option<Song>>> {
        let client = self.client.clone();
        let url = format!("{}/songs/{id}", self.base_url);
        Box::pin(Self::fetch_song(client, url))
    }

    fn health_check(&self) -> BoxFuture<'static, CatalogResult<()>> {
        let catalog = self.clone();
        Box::pin(async move { catalog.ping().await })
    }
}
