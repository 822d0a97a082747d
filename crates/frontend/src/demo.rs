//! Simulated host: a handful of trackers moving around a fixed home.

use std::collections::HashMap;
use std::f64::consts::TAU;

use radar_shared::models::{DistanceUnit, GeoCoordinate};
use radar_shared::state::{EntityState, HostConfig};

pub const DEMO_HOME: GeoCoordinate = GeoCoordinate::new(52.520008, 13.404954);

/// Demo ticks per full lap of the circling trackers.
const LAP_TICKS: f64 = 120.0;

struct Tracker {
    id: &'static str,
    name: &'static str,
    /// Orbit radius in degrees of latitude.
    orbit: f64,
    /// Starting phase in turns.
    phase: f64,
    /// Orbits per lap; negative runs counter-clockwise.
    speed: f64,
}

const TRACKERS: [Tracker; 3] = [
    Tracker {
        id: "person.alice",
        name: "Alice",
        orbit: 0.004,
        phase: 0.0,
        speed: 1.0,
    },
    Tracker {
        id: "device_tracker.bike",
        name: "Bike",
        orbit: 0.03,
        phase: 0.35,
        speed: -0.5,
    },
    Tracker {
        id: "device_tracker.car",
        name: "Car",
        orbit: 0.08,
        phase: 0.6,
        speed: 2.0,
    },
];

/// Entity states that change every [`DemoWorld::advance`].
#[derive(Debug, Clone, PartialEq)]
pub struct DemoWorld {
    tick: u64,
    states: HashMap<String, EntityState>,
}

impl Default for DemoWorld {
    fn default() -> Self {
        let mut world = DemoWorld {
            tick: 0,
            states: HashMap::new(),
        };
        world.refresh();
        world
    }
}

impl DemoWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn states(&self) -> &HashMap<String, EntityState> {
        &self.states
    }

    pub fn host(language: &str) -> HostConfig {
        HostConfig {
            language: language.to_string(),
            ..HostConfig::new(DEMO_HOME, DistanceUnit::Km)
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
        self.refresh();
    }

    fn activity(&self, tracker: &Tracker) -> &'static str {
        // The car parks for a few ticks every so often.
        if tracker.id == "device_tracker.car" && self.tick % 20 >= 15 {
            return "Stationary";
        }
        match tracker.id {
            "person.alice" => "Walking",
            "device_tracker.bike" => "Cycling",
            _ => "Automotive",
        }
    }

    fn refresh(&mut self) {
        let turns = self.tick as f64 / LAP_TICKS;
        let mut states = HashMap::new();

        for tracker in &TRACKERS {
            let angle = (tracker.phase + turns * tracker.speed) * TAU;
            let latitude = DEMO_HOME.latitude + tracker.orbit * angle.cos();
            // Stretch longitude so the orbit is roughly circular on the ground.
            let longitude =
                DEMO_HOME.longitude + tracker.orbit * angle.sin() / DEMO_HOME.latitude.to_radians().cos();
            let state = EntityState::new(tracker.id)
                .with_location(latitude, longitude)
                .with_attribute("friendly_name", tracker.name)
                .with_attribute("activity", self.activity(tracker));
            states.insert(tracker.id.to_string(), state);
        }

        // "Me" drifts slowly north-east and carries the moving-center radar.
        let drift = self.tick as f64 * 0.0002;
        states.insert(
            "person.me".to_string(),
            EntityState::new("person.me")
                .with_location(DEMO_HOME.latitude + drift, DEMO_HOME.longitude + drift)
                .with_attribute("friendly_name", "Me")
                .with_attribute("activity", "Walking"),
        );
        states.insert(
            "zone.home".to_string(),
            EntityState::new("zone.home")
                .with_location(DEMO_HOME.latitude, DEMO_HOME.longitude)
                .with_attribute("friendly_name", "Home"),
        );
        // Known to the host but never located.
        states.insert(
            "device_tracker.lost".to_string(),
            EntityState::new("device_tracker.lost").with_attribute("friendly_name", "Lost phone"),
        );

        self.states = states;
    }
}
