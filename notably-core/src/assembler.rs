//! Tracklist assembler
//!
//! Turns a finished tracklist into a playlist on the music service. This is
//! the only place the playlist provider is used; segmentation never touches it.

use crate::error::AssemblyError;
use crate::search::PlaylistProvider;
use crate::types::Tracklist;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Default playlist name prefix
pub const DEFAULT_NAME_PREFIX: &str = "Notably";

/// A created playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistHandle {
    pub id: String,
    /// Shareable URL, when the provider has one
    pub url: Option<String>,
    pub track_count: usize,
}

/// Hands tracklists to a [`PlaylistProvider`]
pub struct TracklistAssembler {
    provider: Arc<dyn PlaylistProvider>,
}

impl TracklistAssembler {
    pub fn new(provider: Arc<dyn PlaylistProvider>) -> Self {
        Self { provider }
    }

    /// Create a playlist holding the tracklist's tracks in order
    ///
    /// # Errors
    /// * [`AssemblyError::EmptyTracklist`] - no track ids to add
    /// * [`AssemblyError::Provider`] - the provider call failed
    pub async fn assemble(
        &self,
        tracklist: &Tracklist,
        name: &str,
    ) -> Result<PlaylistHandle, AssemblyError> {
        let track_ids: Vec<String> = tracklist
            .track_ids()
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .collect();

        if track_ids.is_empty() {
            return Err(AssemblyError::EmptyTracklist);
        }

        let id = self
            .provider
            .create_playlist(name, &track_ids)
            .await
            .map_err(|e| {
                error!(playlist = %name, error = %e, "Error creating playlist");
                AssemblyError::Provider(e)
            })?;

        let url = self.provider.playlist_url(&id);
        info!(
            playlist_id = %id,
            tracks = track_ids.len(),
            "Playlist created"
        );

        Ok(PlaylistHandle {
            id,
            url,
            track_count: track_ids.len(),
        })
    }

    /// Remove a playlist created earlier
    pub async fn remove(&self, playlist_id: &str) -> Result<(), AssemblyError> {
        self.provider
            .delete_playlist(playlist_id)
            .await
            .map_err(|e| {
                error!(playlist_id = %playlist_id, error = %e, "Error removing playlist");
                AssemblyError::Provider(e)
            })?;
        info!(playlist_id = %playlist_id, "Playlist removed");
        Ok(())
    }
}

/// Playlist name for a phrase ("Notably: hello world")
pub fn playlist_name(prefix: &str, phrase: &str) -> String {
    let prefix = prefix.trim();
    let phrase = phrase.trim();
    if prefix.is_empty() {
        phrase.to_string()
    } else {
        format!("{}: {}", prefix, phrase)
    }
}
