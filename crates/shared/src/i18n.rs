//! Message tables for user-visible strings.

const EN: &[(&str, &str)] = &[
    ("error.no_entities", "You need to define at least one entity"),
    (
        "error.partial_center",
        "Both center latitude and center longitude must be set",
    ),
    (
        "error.conflicting_center",
        "A moving center entity cannot be combined with a fixed center or zone",
    ),
    ("error.no_center", "No home location is configured"),
    ("error.center_unavailable", "The center entity has no location yet"),
    (
        "error.invalid_max_distance",
        "The radar max distance must be a positive number",
    ),
    ("error.parse", "The card configuration could not be read"),
    ("card.no_entities", "No entities to show"),
    ("tooltip.distance", "Distance"),
    ("tooltip.azimuth", "Azimuth"),
    ("marker.add", "Add marker"),
    ("marker.edit", "Edit marker"),
    ("marker.name", "Name"),
    ("marker.color", "Color"),
    ("marker.latitude", "Latitude"),
    ("marker.longitude", "Longitude"),
    ("marker.save", "Save"),
    ("marker.delete", "Delete"),
    ("marker.clear_all", "Clear all markers"),
    ("marker.cancel", "Cancel"),
    ("marker.invalid_coordinates", "Latitude and longitude must be numbers"),
    ("card.test_animation", "Test animation"),
];

const DE: &[(&str, &str)] = &[
    ("error.no_entities", "Es muss mindestens eine Entität definiert werden"),
    (
        "error.partial_center",
        "Breiten- und Längengrad des Zentrums müssen beide gesetzt sein",
    ),
    (
        "error.conflicting_center",
        "Eine bewegliche Zentrums-Entität kann nicht mit festem Zentrum oder Zone kombiniert werden",
    ),
    ("error.no_center", "Es ist kein Heimatstandort konfiguriert"),
    ("error.center_unavailable", "Die Zentrums-Entität hat noch keinen Standort"),
    (
        "error.invalid_max_distance",
        "Die maximale Radar-Entfernung muss eine positive Zahl sein",
    ),
    ("error.parse", "Die Kartenkonfiguration konnte nicht gelesen werden"),
    ("card.no_entities", "Keine Entitäten vorhanden"),
    ("tooltip.distance", "Entfernung"),
    ("tooltip.azimuth", "Azimut"),
    ("marker.add", "Markierung hinzufügen"),
    ("marker.edit", "Markierung bearbeiten"),
    ("marker.name", "Name"),
    ("marker.color", "Farbe"),
    ("marker.latitude", "Breitengrad"),
    ("marker.longitude", "Längengrad"),
    ("marker.save", "Speichern"),
    ("marker.delete", "Löschen"),
    ("marker.clear_all", "Alle Markierungen löschen"),
    ("marker.cancel", "Abbrechen"),
    ("marker.invalid_coordinates", "Breiten- und Längengrad müssen Zahlen sein"),
    ("card.test_animation", "Animation testen"),
];

fn table(language: &str) -> &'static [(&'static str, &'static str)] {
    let primary = language.split(['-', '_']).next().unwrap_or_default();
    match primary.to_ascii_lowercase().as_str() {
        "de" => DE,
        _ => EN,
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Look up `key` for `language`, falling back to English and then to the key itself.
pub fn localize<'a>(language: &str, key: &'a str) -> &'a str {
    match lookup(table(language), key).or_else(|| lookup(EN, key)) {
        Some(text) => text,
        None => key,
    }
}
