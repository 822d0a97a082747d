//! Builds the canonical point list from configuration, entity state and markers.

use std::collections::HashSet;

use crate::config::{CenterSource, RadarConfig};
use crate::error::ConfigError;
use crate::geo;
use crate::models::{DistanceUnit, GeoCoordinate, Marker, PointKind, RadarPoint};
use crate::state::{EntityState, EntityStateProvider, HostConfig};

/// Case-insensitive test of an entity's activity attribute against the moving set.
#[derive(Debug, Clone)]
pub struct ActivityMatcher {
    attribute: String,
    moving: HashSet<String>,
}

impl ActivityMatcher {
    pub fn new<I, S>(attribute: &str, moving_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ActivityMatcher {
            attribute: attribute.to_string(),
            moving: moving_values
                .into_iter()
                .map(|v| v.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &RadarConfig) -> Self {
        Self::new(&config.activity_attribute, config.moving_activity_values())
    }

    /// `attribute` overrides the configured attribute name for this entity.
    pub fn is_moving(&self, state: &EntityState, attribute: Option<&str>) -> bool {
        let attribute = attribute.unwrap_or(&self.attribute);
        state
            .attribute_text(attribute)
            .map(|value| self.moving.contains(&value.trim().to_lowercase()))
            .unwrap_or(false)
    }
}

fn located(provider: &dyn EntityStateProvider, entity_id: &str) -> Result<GeoCoordinate, ConfigError> {
    provider
        .entity_state(entity_id)
        .and_then(EntityState::coordinate)
        .ok_or_else(|| ConfigError::CenterEntityUnavailable {
            entity_id: entity_id.to_string(),
        })
}

/// Resolve the radar center for this pass. Never guesses a fallback.
pub fn resolve_center(
    config: &RadarConfig,
    provider: &dyn EntityStateProvider,
    host: &HostConfig,
) -> Result<GeoCoordinate, ConfigError> {
    match config.center_source()? {
        CenterSource::Static(coord) => Ok(coord),
        CenterSource::Zone(entity_id) => located(provider, &entity_id),
        CenterSource::MovingEntity(entity_id) => located(provider, &entity_id),
        CenterSource::Home => host.home.ok_or(ConfigError::NoCenter),
    }
}

/// Produce the renderable points for one pass.
///
/// Entities without a location are skipped. Ids are unique; later duplicates
/// are dropped. `markers` should be empty when markers are disabled.
pub fn build_points(
    config: &RadarConfig,
    provider: &dyn EntityStateProvider,
    markers: &[Marker],
    center: GeoCoordinate,
    unit: DistanceUnit,
) -> Vec<RadarPoint> {
    let matcher = ActivityMatcher::from_config(config);
    let mut seen = HashSet::new();
    let mut points = Vec::new();

    for entity in config.entity_configs() {
        if seen.contains(&entity.entity) {
            continue;
        }
        let Some(state) = provider.entity_state(&entity.entity) else {
            continue;
        };
        let Some(coord) = state.coordinate() else {
            continue;
        };
        let label = entity
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| state.friendly_name().map(str::to_string))
            .unwrap_or_else(|| entity.entity.clone());
        let is_moving = matcher.is_moving(state, entity.activity_attribute.as_deref());

        seen.insert(entity.entity.clone());
        points.push(RadarPoint {
            id: entity.entity.clone(),
            distance: geo::distance(center, coord, unit),
            azimuth: geo::azimuth(center, coord),
            label,
            color: entity.color.clone(),
            kind: PointKind::Entity,
            is_moving,
        });
    }

    if config.enable_markers {
        for marker in markers {
            if !seen.insert(marker.id.clone()) {
                continue;
            }
            let coord = marker.coordinate();
            points.push(RadarPoint {
                id: marker.id.clone(),
                distance: geo::distance(center, coord, unit),
                azimuth: geo::azimuth(center, coord),
                label: marker.name.clone(),
                color: marker.color.clone(),
                kind: PointKind::Marker,
                is_moving: false,
            });
        }
    }

    points
}
