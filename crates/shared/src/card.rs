//! One radar card instance: configuration, marker cache, scene and interaction
//! state, driven explicitly by its host after every input change.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::RadarConfig;
use crate::error::{ConfigError, StoreError};
use crate::i18n::localize;
use crate::interaction::{
    can_add_marker, click_action, legend_entries, tooltip_position, ClickAction, LegendEntry,
    OutboundEvent, PulseState, Tooltip, TooltipContent,
};
use crate::markers::{MarkerBus, MarkerStorage, MarkerStore, Subscription};
use crate::models::{GeoCoordinate, Marker, MarkerDraft, MarkerEdit, RadarPoint};
use crate::points::{build_points, resolve_center};
use crate::scale::{ChartGeometry, RadialScale};
use crate::scene::{
    describe, AnimationSettings, Frame, RenderReport, SceneDescription, SceneOptions, SceneRenderer,
    DEFAULT_POINT_COLOR,
};
use crate::state::{EntityStateProvider, HostConfig};
use crate::svg::{build_svg, Theme};

/// What a render pass produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The configuration cannot be rendered; show `message` instead of the chart.
    ConfigError { key: &'static str, message: String },
    /// Nothing is locatable right now.
    NoEntities { message: String },
    Chart(RenderReport),
}

/// Returned by [`RadarCard::request_test_animation`].
#[derive(Debug, Clone, PartialEq)]
pub struct TestAnimation {
    pub event: OutboundEvent,
    pub generation: u64,
    /// When the host should report completion through `finish_test_animation`.
    pub done_at_ms: f64,
}

pub struct RadarCard<S: MarkerStorage> {
    config: RadarConfig,
    host: HostConfig,
    geometry: ChartGeometry,
    store: MarkerStore<S>,
    subscription: Option<Subscription>,
    markers_stale: Rc<Cell<bool>>,
    renderer: SceneRenderer,
    points: Vec<RadarPoint>,
    center: Option<GeoCoordinate>,
    scale: RadialScale,
    pulse: PulseState,
    tooltip: Option<Tooltip>,
    test_animation: Option<u64>,
}

impl<S: MarkerStorage> RadarCard<S> {
    pub fn new(config: RadarConfig, host: HostConfig, storage: S, bus: MarkerBus) -> Result<Self, ConfigError> {
        config.validate()?;
        let geometry = ChartGeometry::from_config(&config);
        Ok(RadarCard {
            scale: RadialScale::for_points(&[], &config, &geometry),
            config,
            host,
            geometry,
            store: MarkerStore::open(storage, bus),
            subscription: None,
            markers_stale: Rc::new(Cell::new(false)),
            renderer: SceneRenderer::new(),
            points: Vec::new(),
            center: None,
            pulse: PulseState::default(),
            tooltip: None,
            test_animation: None,
        })
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    pub fn points(&self) -> &[RadarPoint] {
        &self.points
    }

    pub fn center(&self) -> Option<GeoCoordinate> {
        self.center
    }

    pub fn scale(&self) -> &RadialScale {
        &self.scale
    }

    pub fn markers(&self) -> &[Marker] {
        self.store.markers()
    }

    pub fn has_animated(&self) -> bool {
        self.renderer.has_animated()
    }

    /// Replace the configuration. The previous one stays active if the new one is invalid.
    pub fn set_config(&mut self, config: RadarConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.geometry = ChartGeometry::from_config(&config);
        self.config = config;
        Ok(())
    }

    pub fn set_host(&mut self, host: HostConfig) {
        self.host = host;
    }

    pub fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }

    /// Attach to the marker broadcast. `on_markers_updated` runs after every
    /// marker write from any instance and must not borrow this card.
    pub fn connect(&mut self, on_markers_updated: impl Fn() + 'static) {
        if self.subscription.is_some() {
            return;
        }
        self.store.reload();
        let stale = Rc::clone(&self.markers_stale);
        let subscription = self.store.bus().subscribe(move || {
            stale.set(true);
            on_markers_updated();
        });
        self.subscription = Some(subscription);
        tracing::debug!(markers = self.store.markers().len(), "Radar card connected");
    }

    /// Detach from the marker broadcast and forget the scene. The next
    /// connect animates its first pass again.
    pub fn disconnect(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.store.bus().unsubscribe(subscription);
        }
        self.renderer.reset();
        self.tooltip = None;
        self.test_animation = None;
        tracing::debug!("Radar card disconnected");
    }

    fn message(&self, key: &'static str) -> String {
        localize(&self.host.language, key).to_string()
    }

    fn animation(&self) -> AnimationSettings {
        AnimationSettings {
            enabled: self.config.animation_enabled,
            duration_ms: self.config.animation_duration,
        }
    }

    fn scene(&self) -> SceneDescription {
        let options = SceneOptions {
            unit: self.host.unit,
            default_color: self.config.entity_color.as_deref().unwrap_or(DEFAULT_POINT_COLOR),
            show_ring_labels: self.config.show_grid_labels,
            moving_animation: self.config.moving_animation_enabled,
            pulsing: self.pulse.current(),
        };
        describe(&self.points, &self.scale, &options)
    }

    /// Run one render pass against the latest entity states.
    pub fn update(&mut self, provider: &dyn EntityStateProvider, now_ms: f64) -> RenderOutcome {
        if self.markers_stale.replace(false) {
            self.store.reload();
        }

        let center = match resolve_center(&self.config, provider, &self.host) {
            Ok(center) => center,
            Err(e) => {
                tracing::warn!(error = %e, "Radar card configuration error");
                self.center = None;
                self.points.clear();
                self.tooltip = None;
                self.renderer.clear_scene();
                let key = e.message_key();
                return RenderOutcome::ConfigError {
                    key,
                    message: self.message(key),
                };
            }
        };
        self.center = Some(center);

        let markers: &[Marker] = if self.config.enable_markers {
            self.store.markers()
        } else {
            &[]
        };
        self.points = build_points(&self.config, provider, markers, center, self.host.unit);
        self.pulse.retain_existing(&self.points);
        if let Some(tooltip) = &self.tooltip {
            if !self.points.iter().any(|p| p.id == tooltip.point_id) {
                self.tooltip = None;
            }
        }

        if self.points.is_empty() {
            self.renderer.clear_scene();
            return RenderOutcome::NoEntities {
                message: self.message("card.no_entities"),
            };
        }

        self.scale = RadialScale::for_points(&self.points, &self.config, &self.geometry);
        let report = self.renderer.render(self.scene(), self.animation(), now_ms, false);
        RenderOutcome::Chart(report)
    }

    /// Re-render the current points, e.g. after a highlight change.
    fn redraw(&mut self, now_ms: f64) {
        if self.points.is_empty() {
            return;
        }
        self.renderer.render(self.scene(), self.animation(), now_ms, false);
    }

    pub fn frame(&mut self, now_ms: f64) -> Frame {
        self.renderer.frame(now_ms)
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        self.renderer.is_animating(now_ms)
    }

    /// The chart as a standalone `<svg>` document, sampled at `now_ms`.
    pub fn svg(&mut self, now_ms: f64) -> String {
        let frame = self.renderer.frame(now_ms);
        let defaults = Theme::default();
        let theme = Theme {
            grid_color: self.config.grid_color.as_deref().unwrap_or(defaults.grid_color),
            font_color: self.config.font_color.as_deref().unwrap_or(defaults.font_color),
        };
        build_svg(&frame, &self.geometry, &theme)
    }

    fn point(&self, id: &str) -> Option<&RadarPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Show the tooltip for `point_id`. Positions are relative to the card container.
    pub fn hover(
        &mut self,
        point_id: &str,
        pointer: (f64, f64),
        container: (f64, f64),
        tooltip_size: (f64, f64),
    ) -> Option<&Tooltip> {
        let point = self.point(point_id)?;
        let content = TooltipContent::for_point(point, self.host.unit, &self.host.language);
        let (left, top) = tooltip_position(pointer, container, tooltip_size);
        self.tooltip = Some(Tooltip {
            point_id: point_id.to_string(),
            content,
            left,
            top,
        });
        self.tooltip.as_ref()
    }

    pub fn leave(&mut self) {
        self.tooltip = None;
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn click(&self, point_id: &str) -> ClickAction {
        match self.point(point_id) {
            Some(point) => click_action(point, self.config.points_clickable),
            None => ClickAction::Ignore,
        }
    }

    /// Legend click. Returns the id pulsing afterwards.
    pub fn toggle_legend(&mut self, point_id: &str, now_ms: f64) -> Option<String> {
        let pulsing = self.pulse.toggle(point_id).map(str::to_string);
        self.redraw(now_ms);
        pulsing
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        if !self.config.show_legend {
            return Vec::new();
        }
        legend_entries(&self.points, &self.config, self.host.unit, &self.pulse)
    }

    /// Replay the entry animation for everything on screen. Leaves the
    /// first-animation latch as it was.
    pub fn request_test_animation(&mut self, now_ms: f64) -> TestAnimation {
        let settings = AnimationSettings {
            enabled: true,
            duration_ms: self.config.animation_duration,
        };
        let report = self.renderer.render(self.scene(), settings, now_ms, true);
        self.test_animation = Some(report.generation);
        tracing::debug!(generation = report.generation, "Test animation started");
        TestAnimation {
            event: OutboundEvent::TestAnimationRequested,
            generation: report.generation,
            done_at_ms: now_ms + settings.duration_ms.max(0.0),
        }
    }

    pub fn is_test_animating(&self) -> bool {
        self.test_animation.is_some()
    }

    /// Completion of a test animation. Ignored unless it belongs to the latest request.
    pub fn finish_test_animation(&mut self, generation: u64) -> bool {
        if self.test_animation == Some(generation) {
            self.test_animation = None;
            true
        } else {
            false
        }
    }

    pub fn can_add_marker(&self) -> bool {
        can_add_marker(&self.config)
    }

    /// Drop a marker at the current center.
    pub fn add_marker(&mut self, id: String, draft: MarkerDraft) -> Result<Marker, StoreError> {
        if !self.can_add_marker() {
            return Err(StoreError::MarkersUnavailable);
        }
        let center = self.center.ok_or(StoreError::MarkersUnavailable)?;
        self.store.add(id, draft, center)
    }

    #[cfg(feature = "uuid-support")]
    pub fn add_marker_with_new_id(&mut self, draft: MarkerDraft) -> Result<Marker, StoreError> {
        self.add_marker(crate::models::new_marker_id(), draft)
    }

    pub fn edit_marker(&mut self, id: &str, edit: MarkerEdit) -> Result<Marker, StoreError> {
        self.store.edit(id, edit)
    }

    pub fn delete_marker(&mut self, id: &str) -> Result<bool, StoreError> {
        self.store.delete(id)
    }

    pub fn clear_markers(&mut self) -> Result<(), StoreError> {
        self.store.clear()
    }
}

impl<S: MarkerStorage> Drop for RadarCard<S> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.store.bus().unsubscribe(subscription);
        }
    }
}
