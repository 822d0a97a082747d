//! Tooltips, legend highlighting and click dispatch.

use crate::config::RadarConfig;
use crate::i18n::localize;
use crate::models::{DistanceUnit, PointKind, RadarPoint};
use crate::scene::point_color;

/// Gap between the pointer and the tooltip box, in pixels.
pub const TOOLTIP_OFFSET: f64 = 12.0;

/// Events the card emits to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    InspectEntity { entity_id: String },
    TestAnimationRequested,
}

/// What a click on a point should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    Inspect(OutboundEvent),
    EditMarker(String),
    Ignore,
}

/// Entities honor `points_clickable`; markers always open their editor.
pub fn click_action(point: &RadarPoint, points_clickable: bool) -> ClickAction {
    match point.kind {
        PointKind::Marker => ClickAction::EditMarker(point.id.clone()),
        PointKind::Entity if points_clickable => ClickAction::Inspect(OutboundEvent::InspectEntity {
            entity_id: point.id.clone(),
        }),
        PointKind::Entity => ClickAction::Ignore,
    }
}

/// One decimal below 10, whole numbers above.
pub fn format_distance(distance: f64, unit: DistanceUnit) -> String {
    if distance < 10.0 {
        format!("{distance:.1} {unit}")
    } else {
        format!("{distance:.0} {unit}")
    }
}

pub fn format_azimuth(azimuth: f64) -> String {
    let rounded = azimuth.round().rem_euclid(360.0);
    format!("{rounded:.0}°")
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub label: String,
    pub distance_caption: String,
    pub distance: String,
    pub azimuth_caption: String,
    pub azimuth: String,
}

impl TooltipContent {
    pub fn for_point(point: &RadarPoint, unit: DistanceUnit, language: &str) -> Self {
        TooltipContent {
            label: point.label.clone(),
            distance_caption: localize(language, "tooltip.distance").to_string(),
            distance: format_distance(point.distance, unit),
            azimuth_caption: localize(language, "tooltip.azimuth").to_string(),
            azimuth: format_azimuth(point.azimuth),
        }
    }
}

/// Top-left corner of the tooltip, relative to the card container.
///
/// The box goes on the side of the pointer facing the chart center and
/// above the pointer unless that would clip the top edge.
pub fn tooltip_position(pointer: (f64, f64), container: (f64, f64), tooltip: (f64, f64)) -> (f64, f64) {
    let (px, py) = pointer;
    let (container_w, _) = container;
    let (tooltip_w, tooltip_h) = tooltip;

    let left = if px > container_w / 2.0 {
        px - TOOLTIP_OFFSET - tooltip_w
    } else {
        px + TOOLTIP_OFFSET
    };
    let above = py - TOOLTIP_OFFSET - tooltip_h;
    let top = if above < 0.0 {
        py + TOOLTIP_OFFSET
    } else {
        above
    };
    (left, top)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub point_id: String,
    pub content: TooltipContent,
    pub left: f64,
    pub top: f64,
}

/// At most one point pulses at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseState {
    current: Option<String>,
}

impl PulseState {
    /// Toggle `id`; returns the id now pulsing, if any.
    pub fn toggle(&mut self, id: &str) -> Option<&str> {
        if self.current.as_deref() == Some(id) {
            self.current = None;
        } else {
            self.current = Some(id.to_string());
        }
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_pulsing(&self, id: &str) -> bool {
        self.current.as_deref() == Some(id)
    }

    /// Forget the highlight if its point is gone.
    pub fn retain_existing(&mut self, points: &[RadarPoint]) {
        if let Some(id) = &self.current {
            if !points.iter().any(|p| &p.id == id) {
                self.current = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub id: String,
    pub label: String,
    pub color: String,
    pub kind: PointKind,
    pub distance: Option<String>,
    pub pulsing: bool,
}

pub fn legend_entries(
    points: &[RadarPoint],
    config: &RadarConfig,
    unit: DistanceUnit,
    pulse: &PulseState,
) -> Vec<LegendEntry> {
    points
        .iter()
        .map(|p| LegendEntry {
            id: p.id.clone(),
            label: p.label.clone(),
            color: point_color(p, config.entity_color.as_deref()).to_string(),
            kind: p.kind,
            distance: config
                .legend_show_distance
                .then(|| format_distance(p.distance, unit)),
            pulsing: pulse.is_pulsing(&p.id),
        })
        .collect()
}

/// Markers can be dropped only when markers are on and the center follows an entity.
pub fn can_add_marker(config: &RadarConfig) -> bool {
    config.enable_markers && config.is_moving_center_mode()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, kind: PointKind) -> RadarPoint {
        RadarPoint {
            id: id.to_string(),
            distance: 10.97,
            azimuth: 35.8,
            label: "My Test Device".to_string(),
            color: None,
            kind,
            is_moving: false,
        }
    }

    #[test]
    fn test_click_entity_respects_flag() {
        let p = point("device_tracker.test_device", PointKind::Entity);
        assert_eq!(
            click_action(&p, true),
            ClickAction::Inspect(OutboundEvent::InspectEntity {
                entity_id: "device_tracker.test_device".to_string()
            })
        );
        assert_eq!(click_action(&p, false), ClickAction::Ignore);
    }

    #[test]
    fn test_click_marker_always_edits() {
        let p = point("marker_1", PointKind::Marker);
        assert_eq!(click_action(&p, false), ClickAction::EditMarker("marker_1".to_string()));
        assert_eq!(click_action(&p, true), ClickAction::EditMarker("marker_1".to_string()));
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.34, DistanceUnit::Km), "0.3 km");
        assert_eq!(format_distance(10.97, DistanceUnit::Km), "11 km");
        assert_eq!(format_distance(3.0, DistanceUnit::Mi), "3.0 mi");
    }

    #[test]
    fn test_format_azimuth_wraps() {
        assert_eq!(format_azimuth(35.8), "36°");
        assert_eq!(format_azimuth(359.7), "0°");
    }

    #[test]
    fn test_tooltip_content() {
        let content = TooltipContent::for_point(&point("a", PointKind::Entity), DistanceUnit::Km, "en");
        assert_eq!(content.label, "My Test Device");
        assert_eq!(content.distance_caption, "Distance");
        assert_eq!(content.azimuth_caption, "Azimuth");
        assert_eq!(content.distance, "11 km");
    }

    #[test]
    fn test_tooltip_position_sides() {
        // Left half: tooltip to the right, above.
        assert_eq!(tooltip_position((50.0, 100.0), (220.0, 220.0), (80.0, 40.0)), (62.0, 48.0));
        // Right half: tooltip to the left.
        assert_eq!(tooltip_position((200.0, 100.0), (220.0, 220.0), (80.0, 40.0)), (108.0, 48.0));
        // Near the top edge: below the pointer.
        assert_eq!(tooltip_position((50.0, 20.0), (220.0, 220.0), (80.0, 40.0)), (62.0, 32.0));
    }

    #[test]
    fn test_pulse_toggle() {
        let mut pulse = PulseState::default();
        assert_eq!(pulse.toggle("a"), Some("a"));
        assert_eq!(pulse.toggle("b"), Some("b"));
        assert!(!pulse.is_pulsing("a"));
        assert_eq!(pulse.toggle("b"), None);
        assert_eq!(pulse.current(), None);
    }

    #[test]
    fn test_pulse_cleared_when_point_disappears() {
        let mut pulse = PulseState::default();
        pulse.toggle("gone");
        pulse.retain_existing(&[point("a", PointKind::Entity)]);
        assert_eq!(pulse.current(), None);
    }

    #[test]
    fn test_legend_entries() {
        let config = RadarConfig {
            entity_color: Some("teal".to_string()),
            ..RadarConfig::with_entities(["a"])
        };
        let mut pulse = PulseState::default();
        pulse.toggle("a");
        let entries = legend_entries(&[point("a", PointKind::Entity)], &config, DistanceUnit::Km, &pulse);
        assert_eq!(entries[0].color, "teal");
        assert_eq!(entries[0].distance.as_deref(), Some("11 km"));
        assert!(entries[0].pulsing);

        let hidden = RadarConfig {
            legend_show_distance: false,
            ..config
        };
        let entries = legend_entries(&[point("a", PointKind::Entity)], &hidden, DistanceUnit::Km, &pulse);
        assert_eq!(entries[0].distance, None);
    }

    #[test]
    fn test_can_add_marker_needs_moving_center() {
        let base = RadarConfig {
            enable_markers: true,
            ..RadarConfig::with_entities(["a"])
        };
        assert!(!can_add_marker(&base));
        let moving = RadarConfig {
            moving_center_entity: Some("person.me".to_string()),
            ..base
        };
        assert!(can_add_marker(&moving));
    }
}
