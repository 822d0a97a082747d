use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::GeoCoordinate;

pub const DEFAULT_MOVING_ACTIVITIES: [&str; 4] = ["Automotive", "Cycling", "Walking", "Driving"];
pub const DEFAULT_ACTIVITY_ATTRIBUTE: &str = "activity";
pub const DEFAULT_ANIMATION_DURATION_MS: f64 = 750.0;
pub const DEFAULT_CHART_SIZE: f64 = 220.0;
pub const DEFAULT_CHART_MARGIN: f64 = 20.0;

/// Per-entity settings. Only `entity` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_attribute: Option<String>,
}

/// An entry of `entities`: either a bare entity id or a detailed block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Detailed(EntityConfig),
}

impl EntityRef {
    pub fn entity_id(&self) -> &str {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Detailed(cfg) => &cfg.entity,
        }
    }

    pub fn to_config(&self) -> EntityConfig {
        match self {
            EntityRef::Id(id) => EntityConfig {
                entity: id.clone(),
                name: None,
                color: None,
                activity_attribute: None,
            },
            EntityRef::Detailed(cfg) => cfg.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    #[default]
    Bottom,
    Right,
    Left,
}

/// Where the radar's center comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CenterSource {
    Static(GeoCoordinate),
    Zone(String),
    MovingEntity(String),
    Home,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub title: Option<String>,
    pub entities: Vec<EntityRef>,
    pub auto_radar_max_distance: bool,
    pub radar_max_distance: Option<f64>,
    pub grid_color: Option<String>,
    pub font_color: Option<String>,
    pub entity_color: Option<String>,
    pub points_clickable: bool,
    pub show_legend: bool,
    pub legend_position: LegendPosition,
    pub legend_show_distance: bool,
    pub show_grid_labels: bool,
    pub center_latitude: Option<f64>,
    pub center_longitude: Option<f64>,
    pub location_zone_entity: Option<String>,
    pub moving_center_entity: Option<String>,
    pub enable_markers: bool,
    pub animation_enabled: bool,
    /// Transition duration in milliseconds.
    pub animation_duration: f64,
    pub moving_animation_enabled: bool,
    pub moving_activities: Option<Vec<String>>,
    pub activity_attribute: String,
    pub chart_size: f64,
    pub chart_margin: f64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        RadarConfig {
            title: None,
            entities: Vec::new(),
            auto_radar_max_distance: true,
            radar_max_distance: None,
            grid_color: None,
            font_color: None,
            entity_color: None,
            points_clickable: true,
            show_legend: true,
            legend_position: LegendPosition::Bottom,
            legend_show_distance: true,
            show_grid_labels: true,
            center_latitude: None,
            center_longitude: None,
            location_zone_entity: None,
            moving_center_entity: None,
            enable_markers: false,
            animation_enabled: true,
            animation_duration: DEFAULT_ANIMATION_DURATION_MS,
            moving_animation_enabled: true,
            moving_activities: None,
            activity_attribute: DEFAULT_ACTIVITY_ATTRIBUTE.to_string(),
            chart_size: DEFAULT_CHART_SIZE,
            chart_margin: DEFAULT_CHART_MARGIN,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl RadarConfig {
    /// Parse and validate a JSON card configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RadarConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Minimal configuration offered to new cards.
    pub fn stub() -> Self {
        RadarConfig {
            entities: vec![EntityRef::Id("device_tracker.your_device".to_string())],
            ..RadarConfig::default()
        }
    }

    pub fn with_entities<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RadarConfig {
            entities: ids.into_iter().map(|id| EntityRef::Id(id.into())).collect(),
            ..RadarConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entities.iter().all(|e| e.entity_id().trim().is_empty()) {
            return Err(ConfigError::NoEntities);
        }
        self.center_source()?;
        if !self.auto_radar_max_distance {
            if let Some(max) = self.radar_max_distance {
                if !max.is_finite() || max <= 0.0 {
                    return Err(ConfigError::InvalidMaxDistance(max));
                }
            }
        }
        Ok(())
    }

    /// Decide which center source is active.
    ///
    /// A moving center excludes both the static override and the zone entity,
    /// and the static override and zone entity exclude each other.
    pub fn center_source(&self) -> Result<CenterSource, ConfigError> {
        let fixed = match (self.center_latitude, self.center_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoCoordinate::new(latitude, longitude)),
            (None, None) => None,
            _ => return Err(ConfigError::PartialCenterOverride),
        };
        let zone = non_empty(&self.location_zone_entity);
        let moving = non_empty(&self.moving_center_entity);

        if moving.is_some() && (fixed.is_some() || zone.is_some()) {
            return Err(ConfigError::ConflictingCenter);
        }
        if fixed.is_some() && zone.is_some() {
            return Err(ConfigError::ConflictingCenter);
        }

        if let Some(coord) = fixed {
            Ok(CenterSource::Static(coord))
        } else if let Some(zone) = zone {
            Ok(CenterSource::Zone(zone.to_string()))
        } else if let Some(moving) = moving {
            Ok(CenterSource::MovingEntity(moving.to_string()))
        } else {
            Ok(CenterSource::Home)
        }
    }

    pub fn is_moving_center_mode(&self) -> bool {
        matches!(self.center_source(), Ok(CenterSource::MovingEntity(_)))
    }

    pub fn entity_configs(&self) -> Vec<EntityConfig> {
        self.entities
            .iter()
            .filter(|e| !e.entity_id().trim().is_empty())
            .map(EntityRef::to_config)
            .collect()
    }

    pub fn moving_activity_values(&self) -> Vec<String> {
        match &self.moving_activities {
            Some(values) if !values.is_empty() => values.clone(),
            _ => DEFAULT_MOVING_ACTIVITIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = RadarConfig::from_json(
            r#"{"type": "custom:radar-card", "entities": ["device_tracker.phone"]}"#,
        )
        .unwrap();
        assert!(config.auto_radar_max_distance);
        assert!(config.points_clickable);
        assert!(config.animation_enabled);
        assert!(!config.enable_markers);
        assert_eq!(config.activity_attribute, "activity");
        assert_eq!(config.legend_position, LegendPosition::Bottom);
        assert!((config.animation_duration - 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_entities_accept_strings_and_objects() {
        let config = RadarConfig::from_json(
            r#"{"entities": ["person.a", {"entity": "person.b", "name": "Bee", "color": "red"}]}"#,
        )
        .unwrap();
        let entities = config.entity_configs();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity, "person.a");
        assert_eq!(entities[0].name, None);
        assert_eq!(entities[1].name.as_deref(), Some("Bee"));
        assert_eq!(entities[1].color.as_deref(), Some("red"));
    }

    #[test]
    fn test_no_entities_is_error() {
        let err = RadarConfig::from_json(r#"{"entities": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoEntities));
        assert_eq!(err.to_string(), "You need to define at least one entity");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = RadarConfig::from_json(r#"{"entities": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_partial_center_override() {
        let config = RadarConfig {
            center_latitude: Some(52.0),
            ..RadarConfig::with_entities(["person.a"])
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PartialCenterOverride)
        ));
    }

    #[test]
    fn test_center_source_precedence() {
        let base = RadarConfig::with_entities(["person.a"]);
        assert_eq!(base.center_source().unwrap(), CenterSource::Home);

        let fixed = RadarConfig {
            center_latitude: Some(1.0),
            center_longitude: Some(2.0),
            ..base.clone()
        };
        assert_eq!(
            fixed.center_source().unwrap(),
            CenterSource::Static(GeoCoordinate::new(1.0, 2.0))
        );

        let zone = RadarConfig {
            location_zone_entity: Some("zone.work".to_string()),
            ..base.clone()
        };
        assert_eq!(
            zone.center_source().unwrap(),
            CenterSource::Zone("zone.work".to_string())
        );

        let moving = RadarConfig {
            moving_center_entity: Some("person.me".to_string()),
            ..base
        };
        assert_eq!(
            moving.center_source().unwrap(),
            CenterSource::MovingEntity("person.me".to_string())
        );
        assert!(moving.is_moving_center_mode());
    }

    #[test]
    fn test_moving_center_conflicts_with_zone() {
        let config = RadarConfig {
            location_zone_entity: Some("zone.home".to_string()),
            moving_center_entity: Some("person.me".to_string()),
            ..RadarConfig::with_entities(["person.a"])
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingCenter)
        ));
    }

    #[test]
    fn test_static_center_conflicts_with_zone() {
        let config = RadarConfig {
            center_latitude: Some(1.0),
            center_longitude: Some(2.0),
            location_zone_entity: Some("zone.home".to_string()),
            ..RadarConfig::with_entities(["person.a"])
        };
        assert!(matches!(
            config.center_source(),
            Err(ConfigError::ConflictingCenter)
        ));
    }

    #[test]
    fn test_blank_zone_entity_is_ignored() {
        let config = RadarConfig {
            location_zone_entity: Some("  ".to_string()),
            ..RadarConfig::with_entities(["person.a"])
        };
        assert_eq!(config.center_source().unwrap(), CenterSource::Home);
    }

    #[test]
    fn test_manual_max_distance_must_be_positive() {
        let config = RadarConfig {
            auto_radar_max_distance: false,
            radar_max_distance: Some(0.0),
            ..RadarConfig::with_entities(["person.a"])
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxDistance(_))
        ));
    }

    #[test]
    fn test_moving_activities_default_and_override() {
        let config = RadarConfig::with_entities(["person.a"]);
        assert_eq!(
            config.moving_activity_values(),
            vec!["Automotive", "Cycling", "Walking", "Driving"]
        );
        let custom = RadarConfig {
            moving_activities: Some(vec!["Running".to_string()]),
            ..config
        };
        assert_eq!(custom.moving_activity_values(), vec!["Running"]);
    }
}
