//! Asynchronous poster retrieval.
//!
//! Cover art is downloaded tile by tile after the catalog is on screen.
//! Each tile gets its own fire-and-forget task; the outcome is reported
//! over an event channel so a slow or dead poster never holds up the UI
//! or its sibling tiles.

use reqwest::Client;
use tokio::sync::mpsc;

use crate::error::PosterError;

/// Outcome of one poster download, tagged with the tile it belongs to.
#[derive(Debug)]
pub enum PosterEvent {
    /// Poster bytes arrived.
    Loaded {
        /// Index of the tile in the grid.
        tile: usize,
        /// Payload size.
        bytes: u64,
    },
    /// The download failed; the tile keeps its placeholder.
    Failed {
        /// Index of the tile in the grid.
        tile: usize,
        /// What went wrong.
        error: PosterError,
    },
}

/// Downloads cover art for grid tiles, one task per tile.
#[derive(Debug, Clone)]
pub struct PosterFetcher {
    http: Client,
}

impl PosterFetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Spawn one download task for `tile`, reporting through `sender`.
    /// A send failure means the UI is gone; it is ignored.
    pub fn spawn_fetch(&self, tile: usize, url: String, sender: mpsc::Sender<PosterEvent>) {
        let http = self.http.clone();
        tokio::spawn(async move {
            let event = match fetch(&http, &url).await {
                Ok(bytes) => PosterEvent::Loaded { tile, bytes },
                Err(error) => PosterEvent::Failed { tile, error },
            };
            let _ = sender.send(event).await;
        });
    }
}

impl Default for PosterFetcher {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch(http: &Client, url: &str) -> Result<u64, PosterError> {
    let body = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    if body.is_empty() {
        return Err(PosterError::EmptyBody);
    }
    Ok(body.len() as u64)
}
