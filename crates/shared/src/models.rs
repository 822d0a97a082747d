use serde::{Deserialize, Serialize};

#[cfg(feature = "uuid-support")]
use uuid::Uuid;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        GeoCoordinate {
            latitude,
            longitude,
        }
    }

    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Mi,
}

impl DistanceUnit {
    /// Parse the host platform's length unit. Anything that isn't miles is km.
    pub fn from_host(length: &str) -> Self {
        match length.trim().to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => DistanceUnit::Mi,
            _ => DistanceUnit::Km,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }

    /// Smaller unit used for sub-unit ring labels, with its conversion factor.
    pub fn sub_unit(self) -> (&'static str, f64) {
        match self {
            DistanceUnit::Km => ("m", 1000.0),
            DistanceUnit::Mi => ("ft", 5280.0),
        }
    }
}

impl std::fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    Entity,
    Marker,
}

/// One renderable point, already projected into (distance, azimuth) space.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarPoint {
    pub id: String,
    pub distance: f64,
    pub azimuth: f64,
    pub label: String,
    pub color: Option<String>,
    pub kind: PointKind,
    pub is_moving: bool,
}

/// A user-placed point persisted in the marker store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Marker {
    pub fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.latitude, self.longitude)
    }
}

/// Fields captured by the create-marker dialog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDraft {
    pub name: String,
    pub color: Option<String>,
}

/// Fields captured by the edit-marker dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEdit {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: Option<String>,
}

/// Generate a fresh marker id.
#[cfg(feature = "uuid-support")]
pub fn new_marker_id() -> String {
    format!("marker_{}", Uuid::new_v4().simple())
}
