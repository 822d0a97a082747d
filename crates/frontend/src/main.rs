mod components;
mod coords;
mod demo;
mod storage;

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use radar_shared::config::RadarConfig;
use radar_shared::i18n::localize;
use radar_shared::interaction::OutboundEvent;
use radar_shared::markers::MarkerBus;

use components::radar_card::RadarCardView;
use demo::DemoWorld;

const CSS: Asset = asset!("/assets/main.css");

/// How often the simulated trackers report a new position.
const DEMO_TICK_MS: u32 = 2_000;

/// Cards shown on the page, as they would appear in a dashboard configuration.
const DEMO_CARDS: [(&str, &str); 3] = [
    (
        "home",
        r##"{
            "title": "Around home",
            "entities": [
                "person.alice",
                { "entity": "device_tracker.car", "color": "#e91e63" },
                "device_tracker.bike",
                "device_tracker.lost"
            ],
            "location_zone_entity": "zone.home"
        }"##,
    ),
    (
        "follow",
        r##"{
            "title": "Following me",
            "entities": [
                "person.me",
                "person.alice",
                { "entity": "device_tracker.bike", "name": "Bicycle" }
            ],
            "moving_center_entity": "person.me",
            "enable_markers": true,
            "auto_radar_max_distance": false,
            "radar_max_distance": 5,
            "legend_position": "right"
        }"##,
    ),
    (
        "broken",
        r#"{
            "title": "Half a center",
            "entities": ["person.alice"],
            "center_latitude": 52.5
        }"#,
    ),
];

#[allow(non_snake_case)]
fn App() -> Element {
    use_context_provider(MarkerBus::new);
    let language = use_hook(storage::browser_language);
    let mut world = use_signal(DemoWorld::new);
    let mut events = use_signal(Vec::<String>::new);

    use_future(move || async move {
        loop {
            TimeoutFuture::new(DEMO_TICK_MS).await;
            world.write().advance();
        }
    });

    let tick = world.read().tick();
    let recent: Vec<String> = events.read().iter().rev().take(10).cloned().collect();

    let cards = DEMO_CARDS.into_iter().map(|(id, json)| match RadarConfig::from_json(json) {
        Ok(config) => rsx! {
            RadarCardView {
                key: "{id}",
                card_id: id.to_string(),
                config,
                world,
                on_event: move |event: OutboundEvent| {
                    tracing::info!(card = id, ?event, "Radar card event");
                    events.write().push(format!("{id}: {event:?}"));
                },
            }
        },
        Err(e) => {
            tracing::warn!(card = id, error = %e, "Rejected radar card configuration");
            let message = localize(&language, e.message_key()).to_string();
            rsx! {
                div { key: "{id}", class: "radar-card",
                    div { class: "radar-error", "{message}" }
                }
            }
        }
    });

    rsx! {
        document::Stylesheet { href: CSS }
        div { class: "app",
            div { class: "header",
                h1 { "Radar" }
                span { class: "demo-tick", "tick {tick}" }
            }
            div { class: "cards", {cards} }
            if !recent.is_empty() {
                div { class: "panel event-log",
                    h3 { "Events" }
                    for (i, line) in recent.iter().enumerate() {
                        div { key: "{i}", "{line}" }
                    }
                }
            }
        }
    }
}

fn main() {
    dioxus::logger::initialize_default();
    launch(App);
}
