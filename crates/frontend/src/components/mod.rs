pub mod marker_dialog;
pub mod radar_card;
