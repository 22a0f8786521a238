//! Music service clients
//!
//! Concrete implementations of the collaborator traits in [`crate::search`].

pub mod spotify_client;

pub use spotify_client::{SpotifyClient, SpotifyError};
