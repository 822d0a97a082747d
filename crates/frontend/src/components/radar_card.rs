use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use radar_shared::card::{RadarCard, RenderOutcome};
use radar_shared::config::{LegendPosition, RadarConfig};
use radar_shared::i18n::localize;
use radar_shared::interaction::{ClickAction, LegendEntry, OutboundEvent, Tooltip};
use radar_shared::markers::MarkerBus;
use radar_shared::models::{GeoCoordinate, Marker, MarkerDraft, MarkerEdit, PointKind};

use crate::components::marker_dialog::MarkerDialog;
use crate::coords;
use crate::demo::DemoWorld;
use crate::storage::{self, LocalStorage};

/// Poll interval of the animation loop.
const FRAME_MS: u32 = 16;

/// Used until the tooltip has been painted once and can be measured.
const TOOLTIP_ESTIMATE: (f64, f64) = (140.0, 48.0);

/// Shared handle to one card engine. Equal only to itself.
#[derive(Clone)]
pub struct CardHandle(Rc<RefCell<RadarCard<LocalStorage>>>);

impl PartialEq for CardHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// State of the create/edit marker form. Coordinates stay text until saved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerForm {
    pub editing: Option<String>,
    pub name: String,
    pub color: String,
    pub latitude: String,
    pub longitude: String,
}

impl MarkerForm {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn edit(marker: &Marker) -> Self {
        MarkerForm {
            editing: Some(marker.id.clone()),
            name: marker.name.clone(),
            color: marker.color.clone().unwrap_or_default(),
            latitude: marker.latitude.to_string(),
            longitude: marker.longitude.to_string(),
        }
    }

    fn color(&self) -> Option<String> {
        let color = self.color.trim();
        (!color.is_empty()).then(|| color.to_string())
    }

    pub fn draft(&self) -> MarkerDraft {
        MarkerDraft {
            name: self.name.clone(),
            color: self.color(),
        }
    }

    /// `None` when the coordinates don't parse or are not a real position.
    pub fn edit_request(&self) -> Option<MarkerEdit> {
        let at = GeoCoordinate::new(
            self.latitude.trim().parse().ok()?,
            self.longitude.trim().parse().ok()?,
        );
        at.is_valid().then(|| MarkerEdit {
            name: self.name.clone(),
            latitude: at.latitude,
            longitude: at.longitude,
            color: self.color(),
        })
    }
}

fn layout_class(position: LegendPosition) -> &'static str {
    match position {
        LegendPosition::Bottom => "radar-card legend-bottom",
        LegendPosition::Right => "radar-card legend-right",
        LegendPosition::Left => "radar-card legend-left",
    }
}

/// Keys that activate a focused point like a click does.
fn activates(key: &Key) -> bool {
    match key {
        Key::Enter => true,
        Key::Character(c) => c == " ",
        _ => false,
    }
}

fn legend_glyph(entry: &LegendEntry) -> &'static str {
    match entry.kind {
        PointKind::Entity => "legend-dot",
        PointKind::Marker => "legend-triangle",
    }
}

/// One card instance. Builds the engine once; an invalid configuration shows
/// its localized message instead of the chart.
#[component]
pub fn RadarCardView(
    card_id: String,
    config: RadarConfig,
    world: Signal<DemoWorld>,
    on_event: EventHandler<OutboundEvent>,
) -> Element {
    let bus = use_context::<MarkerBus>();
    let language = use_hook(storage::browser_language);

    let setup = use_hook(|| {
        let host = DemoWorld::host(&language);
        match RadarCard::new(config.clone(), host, LocalStorage, bus.clone()) {
            Ok(card) => Ok(CardHandle(Rc::new(RefCell::new(card)))),
            Err(e) => {
                tracing::warn!(error = %e, card = %card_id, "Invalid radar card configuration");
                Err(localize(&language, e.message_key()).to_string())
            }
        }
    });

    match setup {
        Ok(handle) => rsx! {
            RadarChart { card_id, handle, world, on_event }
        },
        Err(message) => rsx! {
            div { class: "radar-card",
                div { class: "radar-error", "{message}" }
            }
        },
    }
}

/// Show the tooltip for `id` anchored at `anchor` (container pixels), then
/// re-place it once it has been painted and has a real size.
fn show_tooltip(
    handle: &CardHandle,
    tooltip_id: &str,
    id: String,
    anchor: (f64, f64),
    container: (f64, f64),
    mut tooltip: Signal<Option<Tooltip>>,
) {
    let newly_shown = {
        let mut card = handle.0.borrow_mut();
        let newly_shown = card.tooltip().map(|t| t.point_id.as_str()) != Some(id.as_str());
        let size = coords::element_rect(tooltip_id)
            .filter(|_| !newly_shown)
            .map(|r| (r.width(), r.height()))
            .unwrap_or(TOOLTIP_ESTIMATE);
        tooltip.set(card.hover(&id, anchor, container, size).cloned());
        newly_shown
    };

    if newly_shown {
        let handle = handle.clone();
        let tooltip_id = tooltip_id.to_string();
        spawn(async move {
            TimeoutFuture::new(0).await;
            let Some(rect) = coords::element_rect(&tooltip_id) else { return };
            let mut card = handle.0.borrow_mut();
            if card.tooltip().map(|t| t.point_id.as_str()) == Some(id.as_str()) {
                let placed = card.hover(&id, anchor, container, (rect.width(), rect.height())).cloned();
                tooltip.set(placed);
            }
        });
    }
}

fn apply_click(
    action: ClickAction,
    handle: &CardHandle,
    on_event: &EventHandler<OutboundEvent>,
    mut form: Signal<Option<MarkerForm>>,
    mut form_error: Signal<Option<String>>,
) {
    match action {
        ClickAction::Inspect(event) => on_event.call(event),
        ClickAction::EditMarker(id) => {
            let marker = handle.0.borrow().markers().iter().find(|m| m.id == id).cloned();
            if let Some(marker) = marker {
                form_error.set(None);
                form.set(Some(MarkerForm::edit(&marker)));
            }
        }
        ClickAction::Ignore => {}
    }
}

#[component]
fn RadarChart(
    card_id: String,
    handle: CardHandle,
    world: Signal<DemoWorld>,
    on_event: EventHandler<OutboundEvent>,
) -> Element {
    let chart_id = format!("{card_id}-chart");
    let tooltip_id = format!("{card_id}-tooltip");

    let mut markers_version = use_signal(|| 0u64);
    let mut outcome = use_signal(|| None::<RenderOutcome>);
    let mut tick = use_signal(|| 0u64);
    let mut tooltip = use_signal(|| None::<Tooltip>);
    let mut form = use_signal(|| None::<MarkerForm>);
    let mut form_error = use_signal(|| None::<String>);
    let mut testing = use_signal(|| false);

    // Subscribe to marker broadcasts for the lifetime of this component.
    use_hook({
        let handle = handle.clone();
        move || {
            handle.0.borrow_mut().connect(move || {
                let mut version = markers_version;
                *version.write() += 1;
            });
        }
    });

    use_drop({
        let handle = handle.clone();
        move || handle.0.borrow_mut().disconnect()
    });

    // One render pass per entity-state or marker change.
    use_effect({
        let handle = handle.clone();
        move || {
            let world = world.read();
            let _ = *markers_version.read();
            let result = handle.0.borrow_mut().update(world.states(), storage::now_ms());
            outcome.set(Some(result));
            if tooltip.peek().is_some() && handle.0.borrow().tooltip().is_none() {
                tooltip.set(None);
            }
        }
    });

    // Repaint while transitions run, plus one frame after they settle.
    use_future({
        let handle = handle.clone();
        move || {
            let handle = handle.clone();
            async move {
                let mut was_animating = false;
                loop {
                    TimeoutFuture::new(FRAME_MS).await;
                    let animating = handle.0.borrow().is_animating(storage::now_ms());
                    if animating || was_animating {
                        *tick.write() += 1;
                    }
                    was_animating = animating;
                }
            }
        }
    });

    let _ = *tick.read();
    let (svg_html, legend, config, can_add, has_markers, language) = {
        let mut card = handle.0.borrow_mut();
        (
            card.svg(storage::now_ms()),
            card.legend(),
            card.config().clone(),
            card.can_add_marker(),
            !card.markers().is_empty(),
            card.host().language.clone(),
        )
    };

    let on_pointer = {
        let handle = handle.clone();
        let chart_id = chart_id.clone();
        let tooltip_id = tooltip_id.clone();
        move |evt: Event<MouseData>| {
            let Some(rect) = coords::element_rect(&chart_id) else { return };
            let client = evt.client_coordinates();
            let pointer = coords::client_to_container(client.x, client.y, rect.left(), rect.top());
            let container = (rect.width(), rect.height());
            let hit = {
                let mut card = handle.0.borrow_mut();
                let geometry = *card.geometry();
                let frame = card.frame(storage::now_ms());
                coords::container_to_chart(pointer.0, pointer.1, rect.width(), &geometry)
                    .and_then(|p| coords::hit_test(&frame, p, coords::HIT_SLACK))
            };
            match hit {
                Some(id) => show_tooltip(&handle, &tooltip_id, id, pointer, container, tooltip),
                None => {
                    handle.0.borrow_mut().leave();
                    tooltip.set(None);
                }
            }
        }
    };

    let on_focus = {
        let handle = handle.clone();
        let chart_id = chart_id.clone();
        let tooltip_id = tooltip_id.clone();
        move |_: Event<FocusData>| {
            let Some(id) = coords::focused_point_id() else { return };
            let Some(rect) = coords::element_rect(&chart_id) else { return };
            let anchor = {
                let mut card = handle.0.borrow_mut();
                let geometry = *card.geometry();
                let frame = card.frame(storage::now_ms());
                coords::focus_anchor(&frame, &id, rect.width(), &geometry)
            };
            if let Some(anchor) = anchor {
                show_tooltip(&handle, &tooltip_id, id, anchor, (rect.width(), rect.height()), tooltip);
            }
        }
    };

    let on_blur = {
        let handle = handle.clone();
        move |_: Event<FocusData>| {
            handle.0.borrow_mut().leave();
            tooltip.set(None);
        }
    };

    let on_key = {
        let handle = handle.clone();
        move |evt: Event<KeyboardData>| {
            if !activates(&evt.key()) {
                return;
            }
            let Some(id) = coords::focused_point_id() else { return };
            evt.prevent_default();
            let action = handle.0.borrow().click(&id);
            apply_click(action, &handle, &on_event, form, form_error);
        }
    };

    let on_leave = {
        let handle = handle.clone();
        move |_: Event<MouseData>| {
            handle.0.borrow_mut().leave();
            tooltip.set(None);
        }
    };

    let on_click = {
        let handle = handle.clone();
        let chart_id = chart_id.clone();
        move |evt: Event<MouseData>| {
            let Some(rect) = coords::element_rect(&chart_id) else { return };
            let client = evt.client_coordinates();
            let (x, y) = coords::client_to_container(client.x, client.y, rect.left(), rect.top());
            let action = {
                let mut card = handle.0.borrow_mut();
                let geometry = *card.geometry();
                let frame = card.frame(storage::now_ms());
                coords::container_to_chart(x, y, rect.width(), &geometry)
                    .and_then(|p| coords::hit_test(&frame, p, coords::HIT_SLACK))
                    .map(|id| card.click(&id))
            };
            if let Some(action) = action {
                apply_click(action, &handle, &on_event, form, form_error);
            }
        }
    };

    let on_test_animation = {
        let handle = handle.clone();
        move |_: Event<MouseData>| {
            let test = handle.0.borrow_mut().request_test_animation(storage::now_ms());
            testing.set(true);
            *tick.write() += 1;
            on_event.call(test.event.clone());

            let handle = handle.clone();
            let wait = (test.done_at_ms - storage::now_ms()).max(0.0) as u32;
            spawn(async move {
                TimeoutFuture::new(wait).await;
                if handle.0.borrow_mut().finish_test_animation(test.generation) {
                    testing.set(false);
                }
            });
        }
    };

    let on_save = {
        let handle = handle.clone();
        let language = language.clone();
        move |submitted: MarkerForm| {
            let result = {
                let mut card = handle.0.borrow_mut();
                match &submitted.editing {
                    None => card
                        .add_marker(storage::new_marker_id(), submitted.draft())
                        .map(|_| ()),
                    Some(id) => match submitted.edit_request() {
                        Some(edit) => card.edit_marker(id, edit).map(|_| ()),
                        None => {
                            form_error.set(Some(localize(&language, "marker.invalid_coordinates").to_string()));
                            return;
                        }
                    },
                }
            };
            match result {
                Ok(()) => form.set(None),
                Err(e) => {
                    tracing::warn!(error = %e, "Marker update failed");
                    form_error.set(Some(e.to_string()));
                }
            }
        }
    };

    let on_delete = {
        let handle = handle.clone();
        move |id: String| {
            let result = handle.0.borrow_mut().delete_marker(&id);
            match result {
                Ok(_) => form.set(None),
                Err(e) => {
                    tracing::warn!(error = %e, marker = %id, "Marker delete failed");
                    form_error.set(Some(e.to_string()));
                }
            }
        }
    };

    let on_clear = {
        let handle = handle.clone();
        move |_: Event<MouseData>| {
            if let Err(e) = handle.0.borrow_mut().clear_markers() {
                tracing::warn!(error = %e, "Clearing markers failed");
            }
        }
    };

    let body = match &*outcome.read() {
        Some(RenderOutcome::ConfigError { message, .. }) => rsx! {
            div { class: "radar-error", "{message}" }
        },
        Some(RenderOutcome::NoEntities { message }) => rsx! {
            div { class: "radar-empty", "{message}" }
        },
        _ => rsx! {
            div {
                id: "{chart_id}",
                class: "radar-chart-container",
                onmousemove: on_pointer,
                onmouseleave: on_leave,
                onclick: on_click,
                onfocusin: on_focus,
                onfocusout: on_blur,
                onkeydown: on_key,
                dangerous_inner_html: "{svg_html}",
            }
        },
    };

    let test_label = localize(&language, "card.test_animation");
    let add_label = localize(&language, "marker.add");
    let clear_label = localize(&language, "marker.clear_all");

    rsx! {
        div { class: layout_class(config.legend_position),
            if let Some(title) = &config.title {
                h2 { class: "radar-title", "{title}" }
            }
            div { class: "radar-body",
                {body}
                if let Some(t) = &*tooltip.read() {
                    div {
                        id: "{tooltip_id}",
                        class: "radar-tooltip",
                        style: "left: {t.left}px; top: {t.top}px;",
                        strong { "{t.content.label}" }
                        div { "{t.content.distance_caption}: {t.content.distance}" }
                        div { "{t.content.azimuth_caption}: {t.content.azimuth}" }
                    }
                }
            }
            if !legend.is_empty() {
                ul { class: "radar-legend",
                    for entry in legend {
                        li {
                            key: "{entry.id}",
                            class: if entry.pulsing { "legend-item pulsing" } else { "legend-item" },
                            onclick: {
                                let handle = handle.clone();
                                let id = entry.id.clone();
                                move |_| {
                                    handle.0.borrow_mut().toggle_legend(&id, storage::now_ms());
                                    *tick.write() += 1;
                                }
                            },
                            span { class: legend_glyph(&entry), style: "background: {entry.color}; color: {entry.color};" }
                            span { class: "legend-label", "{entry.label}" }
                            if let Some(distance) = &entry.distance {
                                span { class: "legend-distance", "{distance}" }
                            }
                        }
                    }
                }
            }
            div { class: "radar-actions",
                button {
                    class: "secondary",
                    disabled: *testing.read(),
                    onclick: on_test_animation,
                    "{test_label}"
                }
                if can_add {
                    button {
                        onclick: move |_| {
                            form_error.set(None);
                            form.set(Some(MarkerForm::create()));
                        },
                        "{add_label}"
                    }
                }
                if has_markers && config.enable_markers {
                    button { class: "secondary", onclick: on_clear, "{clear_label}" }
                }
            }
            if form.read().is_some() {
                MarkerDialog {
                    form,
                    error: form_error,
                    language: language.clone(),
                    on_save,
                    on_delete,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked() -> Marker {
        Marker {
            id: "marker_1".to_string(),
            name: "Car".to_string(),
            latitude: 52.5,
            longitude: 13.4,
            color: None,
        }
    }

    #[test]
    fn test_marker_form_roundtrips_marker() {
        let form = MarkerForm::edit(&parked());
        assert_eq!(form.editing.as_deref(), Some("marker_1"));
        let edit = form.edit_request().unwrap();
        assert!((edit.latitude - 52.5).abs() < 1e-9);
        assert!((edit.longitude - 13.4).abs() < 1e-9);
        assert_eq!(edit.color, None);
    }

    #[test]
    fn test_marker_form_rejects_bad_coordinates() {
        let form = MarkerForm {
            latitude: "north".to_string(),
            ..MarkerForm::edit(&parked())
        };
        assert!(form.edit_request().is_none());
    }

    #[test]
    fn test_marker_form_rejects_non_finite_and_out_of_range() {
        for (latitude, longitude) in [("NaN", "13.4"), ("52.5", "inf"), ("95", "13.4"), ("52.5", "-200")] {
            let form = MarkerForm {
                latitude: latitude.to_string(),
                longitude: longitude.to_string(),
                ..MarkerForm::edit(&parked())
            };
            assert!(form.edit_request().is_none(), "{latitude}, {longitude}");
        }
    }

    #[test]
    fn test_enter_and_space_activate_points() {
        assert!(activates(&Key::Enter));
        assert!(activates(&Key::Character(" ".to_string())));
        assert!(!activates(&Key::Character("a".to_string())));
        assert!(!activates(&Key::Tab));
    }

    #[test]
    fn test_marker_form_blank_color_is_none() {
        let form = MarkerForm {
            name: "Tent".to_string(),
            color: "  ".to_string(),
            ..MarkerForm::create()
        };
        assert_eq!(
            form.draft(),
            MarkerDraft {
                name: "Tent".to_string(),
                color: None
            }
        );
    }

    #[test]
    fn test_layout_class_follows_legend_position() {
        assert_eq!(layout_class(LegendPosition::Right), "radar-card legend-right");
    }
}
