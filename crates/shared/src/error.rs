use std::io;

use thiserror::Error;

/// Problems with the card configuration. Fatal for the render pass that hits them.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("You need to define at least one entity")]
    NoEntities,

    #[error("center_latitude and center_longitude must be set together")]
    PartialCenterOverride,

    #[error("A moving center entity cannot be combined with a static center or a zone entity")]
    ConflictingCenter,

    #[error("No center location could be resolved")]
    NoCenter,

    #[error("Center entity {entity_id} has no location")]
    CenterEntityUnavailable { entity_id: String },

    #[error("radar_max_distance must be a positive number, got {0}")]
    InvalidMaxDistance(f64),

    #[error("Could not parse card configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Localization key for the message shown in place of the chart.
    pub fn message_key(&self) -> &'static str {
        match self {
            ConfigError::NoEntities => "error.no_entities",
            ConfigError::PartialCenterOverride => "error.partial_center",
            ConfigError::ConflictingCenter => "error.conflicting_center",
            ConfigError::NoCenter => "error.no_center",
            ConfigError::CenterEntityUnavailable { .. } => "error.center_unavailable",
            ConfigError::InvalidMaxDistance(_) => "error.invalid_max_distance",
            ConfigError::Parse(_) => "error.parse",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("An I/O error occurred: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Unknown marker {0}")]
    UnknownMarker(String),

    #[error("Markers can only be added when the radar follows a moving entity")]
    MarkersUnavailable,

    #[error("Invalid marker coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}
