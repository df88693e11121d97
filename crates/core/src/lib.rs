#![warn(clippy::all, missing_docs)]

//! Core domain logic for the gamedeck catalog browser.
//!
//! This crate hosts the data models, configuration handling,
//! remote catalog access, and poster retrieval used by the
//! terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod poster;

pub use catalog::{CatalogLoad, GameCatalogClient};
pub use config::AppConfig;
pub use error::{ConfigError, FetchError, PosterError};
pub use models::GameRecord;
pub use poster::{PosterEvent, PosterFetcher};
