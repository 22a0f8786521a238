//! Spotify Web API client
//!
//! Implements [`SearchAdapter`] (track search) and [`PlaylistProvider`]
//! (private playlist creation and unfollow) over the Spotify Web API.
//!
//! The client is handed a bearer token; obtaining and refreshing it is the
//! caller's business. Requests are rate limited client-side with a token
//! bucket so bursts from concurrent lookups stay under the service quota.

use crate::error::{ProviderError, SearchError};
use crate::search::{PlaylistProvider, SearchAdapter};
use crate::types::Candidate;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use notably_common::config::SpotifySettings;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("notably/", env!("CARGO_PKG_VERSION"));

/// Spotify caps search `limit` at 50
const MAX_SEARCH_LIMIT: usize = 50;

/// Spotify caps "add items" at 100 URIs per request
const ADD_ITEMS_CHUNK: usize = 100;

/// Spotify client errors
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unauthorized ({0}): {1}")]
    Unauthorized(u16, String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<SpotifyError> for SearchError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Unauthorized(..) => SearchError::Unauthorized(err.to_string()),
            _ => SearchError::Transient(err.to_string()),
        }
    }
}

impl From<SpotifyError> for ProviderError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Unauthorized(..) => ProviderError::Unauthorized(err.to_string()),
            SpotifyError::ParseError(_) => ProviderError::Parse(err.to_string()),
            _ => ProviderError::Request(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    album: Option<SpotifyAlbum>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistCreated {
    id: String,
}

#[derive(Debug, Serialize)]
struct CreatePlaylistBody<'a> {
    name: &'a str,
    public: bool,
}

#[derive(Debug, Serialize)]
struct AddItemsBody {
    uris: Vec<String>,
}

impl From<SpotifyTrack> for Candidate {
    fn from(track: SpotifyTrack) -> Self {
        // Second image is the mid-size cover; fall back to whatever exists
        let artwork_url = track.album.and_then(|album| {
            let mut images = album.images.into_iter();
            let first = images.next();
            images.next().or(first).map(|img| img.url)
        });

        Candidate {
            id: track.id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            artwork_url,
        }
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, body: String) -> SpotifyError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SpotifyError::Unauthorized(status.as_u16(), body)
        }
        StatusCode::TOO_MANY_REQUESTS => SpotifyError::RateLimitExceeded,
        _ => SpotifyError::ApiError(status.as_u16(), body),
    }
}

/// "Add items" request bodies, at most [`ADD_ITEMS_CHUNK`] URIs each
fn track_uri_chunks(track_ids: &[String]) -> Vec<AddItemsBody> {
    track_ids
        .chunks(ADD_ITEMS_CHUNK)
        .map(|chunk| AddItemsBody {
            uris: chunk.iter().map(|id| format!("spotify:track:{}", id)).collect(),
        })
        .collect()
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: Client,
    base_url: String,
    access_token: String,
    rate_limiter: RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl SpotifyClient {
    /// Create a client from settings and a bearer token
    pub fn new(access_token: String, settings: &SpotifySettings) -> Result<Self, SpotifyError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let per_second = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            http_client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            access_token,
            rate_limiter,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Wait for a rate-limit permit, then send
    async fn send(&self, request: RequestBuilder) -> Result<Response, SpotifyError> {
        self.rate_limiter.until_ready().await;

        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SpotifyError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| SpotifyError::ParseError(e.to_string()))
    }

    /// Search tracks by free text
    pub async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, SpotifyError> {
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        tracing::debug!(query = %query, limit = %limit, "Querying Spotify search");

        let request = self
            .http_client
            .get(self.url("search"))
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())]);

        let response: SearchResponse = self.send_json(request).await?;
        Ok(response
            .tracks
            .map(|page| page.items.into_iter().map(Candidate::from).collect())
            .unwrap_or_default())
    }

    /// Id of the user owning the token
    pub async fn current_user_id(&self) -> Result<String, SpotifyError> {
        let profile: UserProfile = self.send_json(self.http_client.get(self.url("me"))).await?;
        Ok(profile.id)
    }

    /// Cover image of a playlist, best effort
    pub async fn cover_image_url(&self, playlist_id: &str) -> Option<String> {
        let request = self
            .http_client
            .get(self.url(&format!("playlists/{}/images", playlist_id)));

        match self.send_json::<Vec<SpotifyImage>>(request).await {
            Ok(images) => images.into_iter().next().map(|img| img.url),
            Err(e) => {
                tracing::warn!(playlist_id = %playlist_id, error = %e, "Error fetching playlist cover image");
                None
            }
        }
    }
}

#[async_trait]
impl SearchAdapter for SpotifyClient {
    fn source_id(&self) -> &'static str {
        "Spotify"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Candidate>, SearchError> {
        Ok(self.search_tracks(query, max_results).await?)
    }
}

#[async_trait]
impl PlaylistProvider for SpotifyClient {
    async fn create_playlist(&self, name: &str, track_ids: &[String]) -> Result<String, ProviderError> {
        let user_id = self.current_user_id().await?;

        let request = self
            .http_client
            .post(self.url(&format!("users/{}/playlists", user_id)))
            .json(&CreatePlaylistBody { name, public: false });
        let playlist: PlaylistCreated = self.send_json(request).await?;

        for body in track_uri_chunks(track_ids) {
            let request = self
                .http_client
                .post(self.url(&format!("playlists/{}/tracks", playlist.id)))
                .json(&body);
            self.send(request).await?;
        }

        tracing::info!(
            playlist_id = %playlist.id,
            tracks = track_ids.len(),
            "Created Spotify playlist"
        );
        Ok(playlist.id)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<(), ProviderError> {
        let request = self
            .http_client
            .delete(self.url(&format!("playlists/{}/followers", playlist_id)));
        self.send(request).await?;
        Ok(())
    }

    fn playlist_url(&self, playlist_id: &str) -> Option<String> {
        Some(format!("https://open.spotify.com/playlist/{}", playlist_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SpotifyClient {
        SpotifyClient::new("token".to_string(), &SpotifySettings::default()).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.source_id(), "Spotify");
        assert_eq!(client.url("/search"), "https://api.spotify.com/v1/search");
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let settings = SpotifySettings {
            api_base_url: "http://localhost:9000/v1/".to_string(),
            ..SpotifySettings::default()
        };
        let client = SpotifyClient::new("t".to_string(), &settings).unwrap();
        assert_eq!(client.url("me"), "http://localhost:9000/v1/me");
    }

    #[test]
    fn test_playlist_url() {
        assert_eq!(
            client().playlist_url("abc").as_deref(),
            Some("https://open.spotify.com/playlist/abc")
        );
    }

    #[test]
    fn test_track_conversion() {
        let json = r#"{
            "tracks": { "items": [
                { "id": "1", "name": "Good Day Sunshine",
                  "artists": [{"name": "The Beatles"}],
                  "album": { "images": [{"url": "big"}, {"url": "medium"}, {"url": "small"}] } },
                { "id": "2", "name": "Sunshine", "artists": [],
                  "album": { "images": [{"url": "only"}] } },
                { "id": "3", "name": "Day" }
            ] }
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let candidates: Vec<Candidate> = response
            .tracks
            .unwrap()
            .items
            .into_iter()
            .map(Candidate::from)
            .collect();

        assert_eq!(candidates[0].artists, vec!["The Beatles"]);
        assert_eq!(candidates[0].artwork_url.as_deref(), Some("medium"));
        assert_eq!(candidates[1].artwork_url.as_deref(), Some("only"));
        assert!(candidates[2].artwork_url.is_none());
        assert!(candidates[2].artists.is_empty());
    }

    #[test]
    fn test_error_mapping() {
        let search: SearchError = SpotifyError::Unauthorized(401, "expired".to_string()).into();
        assert!(matches!(search, SearchError::Unauthorized(_)));

        let search: SearchError = SpotifyError::RateLimitExceeded.into();
        assert!(matches!(search, SearchError::Transient(_)));

        let provider: ProviderError = SpotifyError::ParseError("bad".to_string()).into();
        assert!(matches!(provider, ProviderError::Parse(_)));
    }

    #[test]
    fn test_status_mapping() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = status_error(status, "denied".to_string());
            assert!(matches!(err, SpotifyError::Unauthorized(code, _) if code == status.as_u16()));
            assert!(matches!(SearchError::from(err), SearchError::Unauthorized(_)));
        }

        let err = status_error(StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(matches!(err, SpotifyError::RateLimitExceeded));

        for status in [StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND, StatusCode::BAD_GATEWAY] {
            let err = status_error(status, "oops".to_string());
            assert!(matches!(err, SpotifyError::ApiError(code, _) if code == status.as_u16()));
            assert!(matches!(SearchError::from(err), SearchError::Transient(_)));
        }
    }

    #[test]
    fn test_track_uris_chunked_by_hundred() {
        let ids: Vec<String> = (0..250).map(|i| format!("id{}", i)).collect();
        let chunks = track_uri_chunks(&ids);

        let sizes: Vec<usize> = chunks.iter().map(|c| c.uris.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(chunks[0].uris[0], "spotify:track:id0");
        assert_eq!(chunks[2].uris[49], "spotify:track:id249");

        assert_eq!(track_uri_chunks(&ids[..100]).len(), 1);
        assert!(track_uri_chunks(&[]).is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access and a valid token in NOTABLY_SPOTIFY_TOKEN
    async fn test_live_search() {
        let token = std::env::var("NOTABLY_SPOTIFY_TOKEN").unwrap();
        let client = SpotifyClient::new(token, &SpotifySettings::default()).unwrap();
        let results = client.search_tracks("hey jude", 5).await.unwrap();
        assert!(!results.is_empty());
    }
}
