//! Radial scale: maps the distance domain onto chart pixels.

use crate::config::RadarConfig;
use crate::models::{DistanceUnit, RadarPoint};

/// Domain ceiling used when auto scaling has nothing to measure.
pub const FALLBACK_MAX_DISTANCE: f64 = 100.0;

/// Tick count hint for grid rings.
pub const RING_TICKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl ChartGeometry {
    pub fn square(size: f64, margin: f64) -> Self {
        ChartGeometry {
            width: size,
            height: size,
            margin,
        }
    }

    pub fn from_config(config: &RadarConfig) -> Self {
        Self::square(config.chart_size, config.chart_margin)
    }

    /// Largest usable radius around the center.
    pub fn radius(&self) -> f64 {
        (self.width.min(self.height) / 2.0 - self.margin).max(0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Linear map from `[0, max_distance]` to `[0, chart_radius]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialScale {
    max_distance: f64,
    chart_radius: f64,
}

impl RadialScale {
    pub fn new(max_distance: f64, chart_radius: f64) -> Self {
        let max_distance = if max_distance.is_finite() && max_distance > 0.0 {
            max_distance
        } else {
            FALLBACK_MAX_DISTANCE
        };
        RadialScale {
            max_distance,
            chart_radius,
        }
    }

    /// Auto mode takes the farthest point; manual mode takes the configured ceiling.
    pub fn for_points(points: &[RadarPoint], config: &RadarConfig, geometry: &ChartGeometry) -> Self {
        let max_distance = if config.auto_radar_max_distance {
            points
                .iter()
                .map(|p| p.distance)
                .filter(|d| d.is_finite())
                .fold(0.0, f64::max)
        } else {
            config.radar_max_distance.unwrap_or(FALLBACK_MAX_DISTANCE)
        };
        Self::new(max_distance, geometry.radius())
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn chart_radius(&self) -> f64 {
        self.chart_radius
    }

    /// Pixel radius for `distance`. Not clamped: points past the ceiling land outside the rings.
    pub fn radius(&self, distance: f64) -> f64 {
        distance / self.max_distance * self.chart_radius
    }

    /// Cartesian offset from the chart center, north up, clockwise.
    pub fn project(&self, distance: f64, azimuth: f64) -> (f64, f64) {
        let r = self.radius(distance);
        let angle = (azimuth - 90.0).to_radians();
        (r * angle.cos(), r * angle.sin())
    }

    pub fn ring_values(&self) -> Vec<f64> {
        nice_ticks(self.max_distance, RING_TICKS)
    }
}

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Round tick values in `(0, stop]`, roughly `count` of them, at 1/2/5 x 10^n steps.
pub fn nice_ticks(stop: f64, count: usize) -> Vec<f64> {
    if !stop.is_finite() || stop <= 0.0 || count == 0 {
        return Vec::new();
    }
    let step = stop / count as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    if power >= 0.0 {
        let inc = factor * 10f64.powf(power);
        let mut n = (stop / inc).round() as usize;
        if n as f64 * inc > stop {
            n -= 1;
        }
        (1..=n).map(|i| i as f64 * inc).collect()
    } else {
        // Divide by the inverse increment to keep decimal ticks exact.
        let inv = 10f64.powf(-power) / factor;
        let mut n = (stop * inv).round() as usize;
        if n as f64 / inv > stop {
            n -= 1;
        }
        (1..=n).map(|i| i as f64 / inv).collect()
    }
}

fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if (rounded - rounded.round()).abs() < 1e-9 {
        format!("{}", rounded.round() as i64)
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Split a ring value into display number and unit suffix.
/// Values under one unit switch to the sub-unit (m or ft).
pub fn format_ring_value(value: f64, unit: DistanceUnit) -> (String, &'static str) {
    if value > 0.0 && value < 1.0 {
        let (suffix, factor) = unit.sub_unit();
        (format_number(value * factor), suffix)
    } else {
        (format_number(value), unit.suffix())
    }
}

/// Labels for ascending ring values. Only the outermost ring of a run sharing
/// the same suffix carries it.
pub fn ring_labels(values: &[f64], unit: DistanceUnit) -> Vec<String> {
    let parts: Vec<_> = values.iter().map(|v| format_ring_value(*v, unit)).collect();
    parts
        .iter()
        .enumerate()
        .map(|(i, (number, suffix))| match parts.get(i + 1) {
            Some((_, next_suffix)) if next_suffix == suffix => number.clone(),
            _ => format!("{number} {suffix}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PointKind;

    fn point(id: &str, distance: f64) -> RadarPoint {
        RadarPoint {
            id: id.to_string(),
            distance,
            azimuth: 0.0,
            label: id.to_string(),
            color: None,
            kind: PointKind::Entity,
            is_moving: false,
        }
    }

    #[test]
    fn test_chart_radius() {
        let geometry = ChartGeometry::square(220.0, 20.0);
        assert!((geometry.radius() - 90.0).abs() < 1e-9);
        let wide = ChartGeometry {
            width: 400.0,
            height: 220.0,
            margin: 20.0,
        };
        assert!((wide.radius() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_auto_scale_farthest_point_on_edge() {
        let config = RadarConfig::with_entities(["a", "b"]);
        let geometry = ChartGeometry::square(220.0, 20.0);
        let points = vec![point("far", 10.97), point("near", 0.34)];
        let scale = RadialScale::for_points(&points, &config, &geometry);
        assert!((scale.radius(10.97) - 90.0).abs() < 1e-9);
        assert!(scale.radius(0.34) < 10.0);
    }

    #[test]
    fn test_auto_scale_without_points_uses_fallback() {
        let config = RadarConfig::with_entities(["a"]);
        let geometry = ChartGeometry::square(220.0, 20.0);
        let scale = RadialScale::for_points(&[], &config, &geometry);
        assert!((scale.max_distance() - FALLBACK_MAX_DISTANCE).abs() < 1e-9);
    }

    #[test]
    fn test_manual_scale_allows_points_outside() {
        let config = RadarConfig {
            auto_radar_max_distance: false,
            radar_max_distance: Some(50.0),
            ..RadarConfig::with_entities(["a"])
        };
        let geometry = ChartGeometry::square(220.0, 20.0);
        let scale = RadialScale::for_points(&[point("x", 100.0)], &config, &geometry);
        assert!((scale.radius(100.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_north_is_up_and_east_is_right() {
        let scale = RadialScale::new(10.0, 100.0);
        let (x, y) = scale.project(10.0, 0.0);
        assert!(x.abs() < 1e-9 && (y + 100.0).abs() < 1e-9);
        let (x, y) = scale.project(10.0, 90.0);
        assert!((x - 100.0).abs() < 1e-9 && y.abs() < 1e-9);
        let (x, y) = scale.project(5.0, 180.0);
        assert!(x.abs() < 1e-9 && (y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(50.0, 4), vec![10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(nice_ticks(100.0, 4), vec![20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(nice_ticks(10.97, 4), vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(0.34, 4), vec![0.1, 0.2, 0.3]);
        assert!(nice_ticks(0.0, 4).is_empty());
        assert!(nice_ticks(f64::NAN, 4).is_empty());
    }

    #[test]
    fn test_manual_max_outer_ring_label() {
        let scale = RadialScale::new(50.0, 90.0);
        let labels = ring_labels(&scale.ring_values(), DistanceUnit::Km);
        assert_eq!(labels.last().map(String::as_str), Some("50 km"));
        assert_eq!(labels[0], "10");
    }

    #[test]
    fn test_ring_labels_switch_to_sub_unit() {
        let labels = ring_labels(&[0.5, 1.0, 1.5], DistanceUnit::Km);
        assert_eq!(labels, vec!["500 m", "1", "1.5 km"]);
        let labels = ring_labels(&[0.1, 0.2], DistanceUnit::Mi);
        assert_eq!(labels, vec!["528", "1056 ft"]);
    }
}
