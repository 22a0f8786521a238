//! # Notably Common Library
//!
//! Shared code for the Notably crates:
//! - Error type used by configuration loading
//! - TOML bootstrap configuration and its resolution order
//! - Access token resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
