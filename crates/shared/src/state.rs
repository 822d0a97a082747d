//! Seam to the host platform's entity state and ambient configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{DistanceUnit, GeoCoordinate};

/// Snapshot of one entity as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

impl EntityState {
    pub fn new(entity_id: impl Into<String>) -> Self {
        EntityState {
            entity_id: entity_id.into(),
            state: String::new(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_location(self, latitude: f64, longitude: f64) -> Self {
        self.with_attribute("latitude", latitude)
            .with_attribute("longitude", longitude)
    }

    /// Both `latitude` and `longitude` attributes, if present and numeric.
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        let latitude = self.attributes.get("latitude").and_then(as_number)?;
        let longitude = self.attributes.get("longitude").and_then(as_number)?;
        Some(GeoCoordinate::new(latitude, longitude))
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// An attribute rendered as text; numbers and booleans are stringified.
    pub fn attribute_text(&self, name: &str) -> Option<String> {
        match self.attributes.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Anything that can look up the current state of an entity by id.
pub trait EntityStateProvider {
    fn entity_state(&self, entity_id: &str) -> Option<&EntityState>;
}

impl EntityStateProvider for HashMap<String, EntityState> {
    fn entity_state(&self, entity_id: &str) -> Option<&EntityState> {
        self.get(entity_id)
    }
}

impl EntityStateProvider for [EntityState] {
    fn entity_state(&self, entity_id: &str) -> Option<&EntityState> {
        self.iter().find(|s| s.entity_id == entity_id)
    }
}

impl EntityStateProvider for Vec<EntityState> {
    fn entity_state(&self, entity_id: &str) -> Option<&EntityState> {
        self.as_slice().entity_state(entity_id)
    }
}

/// Ambient settings of the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub home: Option<GeoCoordinate>,
    #[serde(default)]
    pub unit: DistanceUnit,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl HostConfig {
    pub fn new(home: GeoCoordinate, unit: DistanceUnit) -> Self {
        HostConfig {
            home: Some(home),
            unit,
            language: default_language(),
        }
    }
}
