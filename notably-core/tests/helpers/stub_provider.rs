//! In-memory playlist provider

use async_trait::async_trait;
use notably_core::{PlaylistProvider, ProviderError};
use std::sync::Mutex;

#[derive(Default)]
pub struct StubProvider {
    created: Mutex<Vec<(String, Vec<String>)>>,
    deleted: Mutex<Vec<String>>,
    fail: bool,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a request error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(name, track_ids)` per created playlist
    pub fn created(&self) -> Vec<(String, Vec<String>)> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaylistProvider for StubProvider {
    async fn create_playlist(&self, name: &str, track_ids: &[String]) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::Request("502 Bad Gateway".to_string()));
        }
        let mut created = self.created.lock().unwrap();
        created.push((name.to_string(), track_ids.to_vec()));
        Ok(format!("pl{}", created.len()))
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<(), ProviderError> {
        if self.fail {
            return Err(ProviderError::Request("502 Bad Gateway".to_string()));
        }
        self.deleted.lock().unwrap().push(playlist_id.to_string());
        Ok(())
    }

    fn playlist_url(&self, playlist_id: &str) -> Option<String> {
        Some(format!("https://playlists.test/{}", playlist_id))
    }
}
