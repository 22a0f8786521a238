//! Collaborator traits
//!
//! The engine and the assembler only ever talk to a music service through
//! these traits. `services::SpotifyClient` is the production implementation;
//! tests plug in in-memory stubs.

use crate::error::{ProviderError, SearchError};
use crate::types::Candidate;
use async_trait::async_trait;

/// Title search capability consumed by the candidate cache
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Service identifier for logs (e.g., "Spotify")
    fn source_id(&self) -> &'static str;

    /// Search tracks by title text
    ///
    /// # Arguments
    /// * `query` - Normalized window text (lowercase, single spaces)
    /// * `max_results` - Upper bound on returned candidates
    ///
    /// # Returns
    /// * `Ok(vec)` - Zero or more candidates, in service ranking order
    /// * `Err(SearchError::Transient)` - Retry or treat as empty
    /// * `Err(SearchError::Unauthorized)` - Abort the run
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Candidate>, SearchError>;
}

/// Playlist lifecycle capability consumed by the tracklist assembler
#[async_trait]
pub trait PlaylistProvider: Send + Sync {
    /// Create a playlist holding `track_ids` in order, returning its id
    async fn create_playlist(&self, name: &str, track_ids: &[String]) -> Result<String, ProviderError>;

    /// Remove (unfollow) a playlist previously created
    async fn delete_playlist(&self, playlist_id: &str) -> Result<(), ProviderError>;

    /// Shareable URL for a playlist, when the service has one
    fn playlist_url(&self, _playlist_id: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_playlist_url_default() {
        struct NullProvider;

        #[async_trait]
        impl PlaylistProvider for NullProvider {
            async fn create_playlist(
                &self,
                _name: &str,
                _track_ids: &[String],
            ) -> Result<String, ProviderError> {
                Ok("p1".to_string())
            }

            async fn delete_playlist(&self, _playlist_id: &str) -> Result<(), ProviderError> {
                Ok(())
            }
        }

        let provider = NullProvider;
        assert!(provider.playlist_url("p1").is_none());
        assert_eq!(provider.create_playlist("n", &[]).await.unwrap(), "p1");
    }
}
