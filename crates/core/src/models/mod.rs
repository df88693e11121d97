//! Shared domain models.

use serde::{Deserialize, Serialize};

/// Sentinel substituted when the API omits a game's description.
pub const NO_DESCRIPTION: &str = "No description available";

/// Sentinel substituted when the API omits a game's release date.
pub const UNKNOWN_RELEASE_DATE: &str = "Unknown release date";

/// One game entry decoded from the catalog API.
///
/// A record is immutable after construction; optional wire fields are
/// replaced with the sentinel constants at decode time, so every field
/// is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Game title as reported by the API.
    pub name: String,
    /// Long-form description, or [`NO_DESCRIPTION`].
    pub description: String,
    /// Free-form release date string, or [`UNKNOWN_RELEASE_DATE`].
    pub release_date: String,
    /// Cover-art URL; empty when the API has no artwork for this entry.
    pub image_url: String,
}

impl GameRecord {
    /// Whether this record carries cover art worth rendering.
    pub fn has_poster(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// Raw shape of one entry in the API `results` array.
///
/// Every field is optional on the wire; [`RawGame::into_record`] is the
/// single place where sentinels are applied and the name requirement is
/// enforced.
#[derive(Debug, Deserialize)]
pub struct RawGame {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) released: Option<String>,
    pub(crate) background_image: Option<String>,
}

impl RawGame {
    /// Convert into a [`GameRecord`], substituting sentinels for absent
    /// optional fields. Returns `None` when `name` is missing or blank;
    /// the caller decides whether to warn and move on.
    pub fn into_record(self) -> Option<GameRecord> {
        let name = self.name.map(|value| value.trim().to_string())?;
        if name.is_empty() {
            return None;
        }

        Some(GameRecord {
            name,
            description: self
                .description
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            release_date: self
                .released
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_RELEASE_DATE.to_string()),
            image_url: self.background_image.unwrap_or_default(),
        })
    }
}
