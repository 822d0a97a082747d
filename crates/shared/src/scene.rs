//! Scene description, keyed reconciliation and eased transitions.
//!
//! Every pass builds a fresh [`SceneDescription`] and hands it to the
//! [`SceneRenderer`], which diffs it against what is on screen by
//! [`PrimitiveKey`] and starts transitions only for the delta.

use std::collections::{HashMap, HashSet};

use crate::models::{DistanceUnit, PointKind, RadarPoint};
use crate::scale::{self, RadialScale};

pub const DEFAULT_POINT_COLOR: &str = "#03a9f4";
pub const DEFAULT_MARKER_COLOR: &str = "#ff9800";

pub const POINT_RADIUS: f64 = 5.0;
pub const MARKER_SIZE: f64 = 7.0;
pub const PING_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cardinal {
    North,
    East,
    South,
    West,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [
        Cardinal::North,
        Cardinal::East,
        Cardinal::South,
        Cardinal::West,
    ];

    pub fn azimuth(self) -> f64 {
        match self {
            Cardinal::North => 0.0,
            Cardinal::East => 90.0,
            Cardinal::South => 180.0,
            Cardinal::West => 270.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Cardinal::North => "N",
            Cardinal::East => "E",
            Cardinal::South => "S",
            Cardinal::West => "W",
        }
    }
}

/// Stable identity of a primitive across passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveKey {
    /// Keyed by the ring value's bit pattern.
    Ring(u64),
    RingLabel(u64),
    Axis(Cardinal),
    Ping(String),
    Point(String),
}

impl PrimitiveKey {
    pub fn point_id(&self) -> Option<&str> {
        match self {
            PrimitiveKey::Point(id) => Some(id),
            _ => None,
        }
    }
}

/// Animatable state. `x`/`y` are offsets from the chart center; `size` is the
/// ring radius for rings and the glyph radius for points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub opacity: f64,
}

impl Geometry {
    pub const ORIGIN: Geometry = Geometry {
        x: 0.0,
        y: 0.0,
        size: 0.0,
        opacity: 0.0,
    };

    pub fn at(x: f64, y: f64, size: f64) -> Self {
        Geometry {
            x,
            y,
            size,
            opacity: 1.0,
        }
    }

    pub fn lerp(&self, to: &Geometry, t: f64) -> Geometry {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Geometry {
            x: mix(self.x, to.x),
            y: mix(self.y, to.y),
            size: mix(self.size, to.size),
            opacity: mix(self.opacity, to.opacity),
        }
    }
}

/// Non-animated properties. Replaced immediately on update.
#[derive(Debug, Clone, PartialEq)]
pub enum Style {
    Ring,
    RingLabel {
        text: String,
    },
    Axis {
        cardinal: Cardinal,
    },
    Ping {
        point_id: String,
        color: String,
    },
    Point {
        point_id: String,
        kind: PointKind,
        label: String,
        color: String,
        pulsing: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub key: PrimitiveKey,
    pub geometry: Geometry,
    pub style: Style,
}

/// Target state of one pass, in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDescription {
    pub primitives: Vec<Primitive>,
}

pub struct SceneOptions<'a> {
    pub unit: DistanceUnit,
    pub default_color: &'a str,
    pub show_ring_labels: bool,
    pub moving_animation: bool,
    pub pulsing: Option<&'a str>,
}

/// Resolve a point's color: explicit color, then the card default, then the kind default.
pub fn point_color<'a>(point: &'a RadarPoint, default_color: Option<&'a str>) -> &'a str {
    match (&point.color, point.kind) {
        (Some(color), _) if !color.is_empty() => color.as_str(),
        (_, PointKind::Marker) => DEFAULT_MARKER_COLOR,
        (_, PointKind::Entity) => default_color.unwrap_or(DEFAULT_POINT_COLOR),
    }
}

/// Build the scene for `points` under `scale`.
pub fn describe(points: &[RadarPoint], scale: &RadialScale, options: &SceneOptions<'_>) -> SceneDescription {
    let mut primitives = Vec::new();
    let rings = scale.ring_values();

    for value in &rings {
        primitives.push(Primitive {
            key: PrimitiveKey::Ring(value.to_bits()),
            geometry: Geometry::at(0.0, 0.0, scale.radius(*value)),
            style: Style::Ring,
        });
    }

    if options.show_ring_labels {
        for (value, text) in rings.iter().zip(scale::ring_labels(&rings, options.unit)) {
            primitives.push(Primitive {
                key: PrimitiveKey::RingLabel(value.to_bits()),
                geometry: Geometry::at(2.0, -scale.radius(*value), 0.0),
                style: Style::RingLabel { text },
            });
        }
    }

    let outer = scale.chart_radius();
    for cardinal in Cardinal::ALL {
        let angle = (cardinal.azimuth() - 90.0).to_radians();
        primitives.push(Primitive {
            key: PrimitiveKey::Axis(cardinal),
            geometry: Geometry::at(outer * angle.cos(), outer * angle.sin(), outer),
            style: Style::Axis { cardinal },
        });
    }

    for point in points {
        let (x, y) = scale.project(point.distance, point.azimuth);
        let color = point_color(point, Some(options.default_color)).to_string();

        if point.is_moving && options.moving_animation && point.kind == PointKind::Entity {
            primitives.push(Primitive {
                key: PrimitiveKey::Ping(point.id.clone()),
                geometry: Geometry::at(x, y, PING_RADIUS),
                style: Style::Ping {
                    point_id: point.id.clone(),
                    color: color.clone(),
                },
            });
        }

        let size = match point.kind {
            PointKind::Entity => POINT_RADIUS,
            PointKind::Marker => MARKER_SIZE,
        };
        primitives.push(Primitive {
            key: PrimitiveKey::Point(point.id.clone()),
            geometry: Geometry::at(x, y, size),
            style: Style::Point {
                point_id: point.id.clone(),
                kind: point.kind,
                label: point.label.clone(),
                color,
                pulsing: options.pulsing == Some(point.id.as_str()),
            },
        });
    }

    SceneDescription { primitives }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub enter: Vec<PrimitiveKey>,
    pub update: Vec<PrimitiveKey>,
    pub exit: Vec<PrimitiveKey>,
}

impl Reconciliation {
    pub fn entered_points(&self) -> impl Iterator<Item = &str> {
        self.enter.iter().filter_map(PrimitiveKey::point_id)
    }

    pub fn exited_points(&self) -> impl Iterator<Item = &str> {
        self.exit.iter().filter_map(PrimitiveKey::point_id)
    }
}

/// Diff two keyed primitive lists into enter/update/exit sets.
pub fn reconcile(previous: &[Primitive], next: &[Primitive]) -> Reconciliation {
    let before: HashSet<&PrimitiveKey> = previous.iter().map(|p| &p.key).collect();
    let after: HashSet<&PrimitiveKey> = next.iter().map(|p| &p.key).collect();

    let mut result = Reconciliation::default();
    for primitive in next {
        if before.contains(&primitive.key) {
            result.update.push(primitive.key.clone());
        } else {
            result.enter.push(primitive.key.clone());
        }
    }
    result.exit = previous
        .iter()
        .filter(|p| !after.contains(&p.key))
        .map(|p| p.key.clone())
        .collect();
    result
}

/// Cubic ease-out.
pub fn ease_cubic_out(t: f64) -> f64 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u * u
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSettings {
    pub enabled: bool,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: Geometry,
    to: Geometry,
    start_ms: f64,
    duration_ms: f64,
}

impl Transition {
    fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    fn sample(&self, now_ms: f64) -> Geometry {
        self.from.lerp(&self.to, ease_cubic_out(self.progress(now_ms)))
    }

    fn finished(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }
}

#[derive(Debug, Clone)]
struct Live {
    primitive: Primitive,
    transition: Option<Transition>,
}

impl Live {
    fn geometry_at(&self, now_ms: f64) -> Geometry {
        match &self.transition {
            Some(t) => t.sample(now_ms),
            None => self.primitive.geometry,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub reconciliation: Reconciliation,
    /// Point primitives that started from the origin this pass.
    pub animated_entries: usize,
    /// Point primitives moving from their previous position.
    pub animated_updates: usize,
    pub generation: u64,
    pub forced: bool,
}

/// A primitive sampled at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePrimitive {
    pub key: PrimitiveKey,
    pub geometry: Geometry,
    pub style: Style,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub primitives: Vec<FramePrimitive>,
}

impl Frame {
    pub fn point(&self, id: &str) -> Option<&FramePrimitive> {
        self.primitives
            .iter()
            .find(|p| p.key.point_id() == Some(id))
    }

    pub fn contains(&self, key: &PrimitiveKey) -> bool {
        self.primitives.iter().any(|p| &p.key == key)
    }
}

/// Holds what is on screen and animates the delta between passes.
///
/// The first pass that brings points in animates them out of the center; after
/// that the latch is set and new points appear in place. Forced passes ignore
/// the latch without resetting it.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    live: Vec<Live>,
    first_animation_done: bool,
    generation: u64,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_animated(&self) -> bool {
        self.first_animation_done
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn render(
        &mut self,
        next: SceneDescription,
        settings: AnimationSettings,
        now_ms: f64,
        force: bool,
    ) -> RenderReport {
        self.generation += 1;

        let current: Vec<Primitive> = self.live.iter().map(|l| l.primitive.clone()).collect();
        let reconciliation = reconcile(&current, &next.primitives);

        let mut previous: HashMap<PrimitiveKey, Live> = self
            .live
            .drain(..)
            .map(|l| (l.primitive.key.clone(), l))
            .collect();

        let from_origin = settings.enabled && !self.first_animation_done;
        let duration_ms = settings.duration_ms.max(0.0);
        let mut animated_entries = 0;
        let mut animated_updates = 0;
        let mut live = Vec::with_capacity(next.primitives.len());

        for primitive in next.primitives {
            let target = primitive.geometry;
            let is_point = matches!(primitive.key, PrimitiveKey::Point(_));
            let old = previous.remove(&primitive.key);

            let enter_from_origin = Transition {
                from: Geometry::ORIGIN,
                to: target,
                start_ms: now_ms,
                duration_ms,
            };

            let (transition, entered) = match old {
                _ if force => (Some(enter_from_origin), true),
                // Unchanged primitives keep whatever transition is running.
                Some(old) if old.primitive.geometry == target => (old.transition, false),
                Some(_) if !settings.enabled => (None, false),
                Some(old) => {
                    if is_point {
                        animated_updates += 1;
                    }
                    let moving = Transition {
                        from: old.geometry_at(now_ms),
                        ..enter_from_origin
                    };
                    (Some(moving), false)
                }
                None if from_origin => (Some(enter_from_origin), true),
                None => (None, false),
            };

            if is_point && entered {
                animated_entries += 1;
            }
            live.push(Live {
                primitive,
                transition,
            });
        }

        if animated_entries > 0 && !force {
            self.first_animation_done = true;
        }
        self.live = live;

        tracing::debug!(
            generation = self.generation,
            enter = reconciliation.enter.len(),
            update = reconciliation.update.len(),
            exit = reconciliation.exit.len(),
            animated_entries,
            animated_updates,
            forced = force,
            "Rendered radar scene"
        );

        RenderReport {
            reconciliation,
            animated_entries,
            animated_updates,
            generation: self.generation,
            forced: force,
        }
    }

    /// Sample every primitive at `now_ms`, dropping transitions that have finished.
    pub fn frame(&mut self, now_ms: f64) -> Frame {
        let primitives = self
            .live
            .iter()
            .map(|l| FramePrimitive {
                key: l.primitive.key.clone(),
                geometry: l.geometry_at(now_ms),
                style: l.primitive.style.clone(),
            })
            .collect();
        for live in &mut self.live {
            if live.transition.is_some_and(|t| t.finished(now_ms)) {
                live.transition = None;
            }
        }
        Frame { primitives }
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        self.live
            .iter()
            .any(|l| l.transition.is_some_and(|t| !t.finished(now_ms)))
    }

    /// Drop everything on screen but keep the first-animation latch.
    pub fn clear_scene(&mut self) {
        self.live.clear();
    }

    /// Instance teardown: forget the scene and re-arm the first animation.
    pub fn reset(&mut self) {
        self.live.clear();
        self.first_animation_done = false;
    }
}
