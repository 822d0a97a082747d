pub mod card;
pub mod config;
pub mod error;
pub mod geo;
pub mod i18n;
pub mod interaction;
pub mod markers;
pub mod models;
pub mod points;
pub mod scale;
pub mod scene;
pub mod state;
pub mod svg;
