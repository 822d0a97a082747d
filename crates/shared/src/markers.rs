//! Locally persisted user markers, shared between card instances through a
//! broadcast bus. Last writer wins; every write notifies all live listeners.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::StoreError;
use crate::models::{GeoCoordinate, Marker, MarkerDraft, MarkerEdit};

/// Storage key shared by every card instance.
pub const MARKER_STORAGE_KEY: &str = "radar-card-markers";

const DEFAULT_MARKER_NAME: &str = "Marker";

/// Flat string key/value persistence.
pub trait MarkerStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkerStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory. Backend for native hosts; the
/// web frontend persists through `localStorage` instead.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl MarkerStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }
}

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Process-wide "markers updated" notification. Clones share listeners.
#[derive(Clone, Default)]
pub struct MarkerBus {
    inner: Rc<RefCell<BusInner>>,
}

/// Handle returned by [`MarkerBus::subscribe`]; give it back to unsubscribe.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

impl std::fmt::Debug for MarkerBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl MarkerBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.push((id, Rc::new(listener)));
        tracing::debug!(subscription = id, "Subscribed to marker updates");
        Subscription { id }
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(id, _)| *id != subscription.id);
        tracing::debug!(subscription = subscription.id, "Unsubscribed from marker updates");
        inner.listeners.len() != before
    }

    /// Call every listener. Listeners may subscribe or unsubscribe while running.
    pub fn notify(&self) {
        let listeners: Vec<Listener> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

// NaN would be written as `null` and make the whole list unreadable.
fn check_coordinate(at: GeoCoordinate) -> Result<(), StoreError> {
    if at.is_valid() {
        Ok(())
    } else {
        Err(StoreError::InvalidCoordinates {
            latitude: at.latitude,
            longitude: at.longitude,
        })
    }
}

/// One instance's cached view of the shared marker list.
#[derive(Debug)]
pub struct MarkerStore<S> {
    storage: S,
    bus: MarkerBus,
    markers: Vec<Marker>,
}

impl<S: MarkerStorage> MarkerStore<S> {
    pub fn open(storage: S, bus: MarkerBus) -> Self {
        let mut store = MarkerStore {
            storage,
            bus,
            markers: Vec::new(),
        };
        store.reload();
        store
    }

    pub fn bus(&self) -> &MarkerBus {
        &self.bus
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Refresh the cache from storage. Unreadable data counts as no markers.
    pub fn reload(&mut self) -> &[Marker] {
        self.markers = self.load();
        &self.markers
    }

    fn load(&self) -> Vec<Marker> {
        let raw = match self.storage.read(MARKER_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read marker storage");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(markers) => markers,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed marker storage");
                Vec::new()
            }
        }
    }

    fn commit(&mut self, markers: Vec<Marker>) -> Result<(), StoreError> {
        let json = serde_json::to_string(&markers)?;
        self.storage.write(MARKER_STORAGE_KEY, &json)?;
        self.markers = markers;
        tracing::debug!(markers = self.markers.len(), "Saved markers");
        self.bus.notify();
        Ok(())
    }

    pub fn add(&mut self, id: String, draft: MarkerDraft, at: GeoCoordinate) -> Result<Marker, StoreError> {
        check_coordinate(at)?;
        let mut markers = self.load();
        let name = draft.name.trim();
        let marker = Marker {
            id,
            name: if name.is_empty() {
                DEFAULT_MARKER_NAME.to_string()
            } else {
                name.to_string()
            },
            latitude: at.latitude,
            longitude: at.longitude,
            color: draft.color.filter(|c| !c.is_empty()),
        };
        markers.retain(|m| m.id != marker.id);
        markers.push(marker.clone());
        self.commit(markers)?;
        Ok(marker)
    }

    pub fn edit(&mut self, id: &str, edit: MarkerEdit) -> Result<Marker, StoreError> {
        check_coordinate(GeoCoordinate::new(edit.latitude, edit.longitude))?;
        let mut markers = self.load();
        let marker = markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::UnknownMarker(id.to_string()))?;
        let name = edit.name.trim();
        if !name.is_empty() {
            marker.name = name.to_string();
        }
        marker.latitude = edit.latitude;
        marker.longitude = edit.longitude;
        marker.color = edit.color.filter(|c| !c.is_empty());
        let updated = marker.clone();
        self.commit(markers)?;
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut markers = self.load();
        let before = markers.len();
        markers.retain(|m| m.id != id);
        if markers.len() == before {
            self.markers = markers;
            return Ok(false);
        }
        self.commit(markers)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.commit(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn draft(name: &str) -> MarkerDraft {
        MarkerDraft {
            name: name.to_string(),
            color: None,
        }
    }

    const PARKING: GeoCoordinate = GeoCoordinate::new(52.5, 13.4);

    #[test]
    fn test_add_persists_json_array() {
        let storage = MemoryStorage::new();
        let mut store = MarkerStore::open(storage.clone(), MarkerBus::new());
        store.add("m1".to_string(), draft(" Car "), PARKING).unwrap();

        let raw = storage.read(MARKER_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"id":"m1","name":"Car","latitude":52.5,"longitude":13.4}]"#);
        assert_eq!(store.markers().len(), 1);
    }

    #[test]
    fn test_blank_name_gets_default() {
        let mut store = MarkerStore::open(MemoryStorage::new(), MarkerBus::new());
        let marker = store.add("m1".to_string(), draft("   "), PARKING).unwrap();
        assert_eq!(marker.name, "Marker");
    }

    #[test]
    fn test_edit_and_delete() {
        let mut store = MarkerStore::open(MemoryStorage::new(), MarkerBus::new());
        store.add("m1".to_string(), draft("Car"), PARKING).unwrap();
        let edited = store
            .edit(
                "m1",
                MarkerEdit {
                    name: "Bike".to_string(),
                    latitude: 1.0,
                    longitude: 2.0,
                    color: Some("#ff0000".to_string()),
                },
            )
            .unwrap();
        assert_eq!(edited.name, "Bike");
        assert_eq!(store.get("m1").unwrap().color.as_deref(), Some("#ff0000"));

        assert!(store.delete("m1").unwrap());
        assert!(!store.delete("m1").unwrap());
        assert!(store.markers().is_empty());
    }

    #[test]
    fn test_edit_unknown_marker() {
        let mut store = MarkerStore::open(MemoryStorage::new(), MarkerBus::new());
        let err = store
            .edit(
                "nope",
                MarkerEdit {
                    name: "x".to_string(),
                    latitude: 0.0,
                    longitude: 0.0,
                    color: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownMarker(id) if id == "nope"));
    }

    #[test]
    fn test_non_finite_edit_leaves_storage_untouched() {
        let storage = MemoryStorage::new();
        let mut store = MarkerStore::open(storage.clone(), MarkerBus::new());
        store.add("m1".to_string(), draft("Car"), PARKING).unwrap();
        store.add("m2".to_string(), draft("Bike"), PARKING).unwrap();
        let before = storage.read(MARKER_STORAGE_KEY).unwrap();

        for (latitude, longitude) in [(f64::NAN, 13.4), (52.5, f64::INFINITY), (91.0, 0.0), (0.0, -181.0)] {
            let err = store
                .edit(
                    "m1",
                    MarkerEdit {
                        name: "Car".to_string(),
                        latitude,
                        longitude,
                        color: None,
                    },
                )
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidCoordinates { .. }));
        }

        assert_eq!(storage.read(MARKER_STORAGE_KEY).unwrap(), before);
        let reopened = MarkerStore::open(storage, MarkerBus::new());
        assert_eq!(reopened.markers().len(), 2);
    }

    #[test]
    fn test_add_rejects_non_finite_position() {
        let storage = MemoryStorage::new();
        let mut store = MarkerStore::open(storage.clone(), MarkerBus::new());
        let err = store
            .add("m1".to_string(), draft("Car"), GeoCoordinate::new(f64::NAN, 0.0))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidCoordinates { .. }));
        assert_eq!(storage.read(MARKER_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_malformed_storage_is_empty() {
        let storage = MemoryStorage::new();
        storage.write(MARKER_STORAGE_KEY, "{not json").unwrap();
        let store = MarkerStore::open(storage.clone(), MarkerBus::new());
        assert!(store.markers().is_empty());

        storage
            .write(MARKER_STORAGE_KEY, r#"[{"id": "m1", "name": "x"}]"#)
            .unwrap();
        let store = MarkerStore::open(storage, MarkerBus::new());
        assert!(store.markers().is_empty());
    }

    #[test]
    fn test_write_notifies_other_instances() {
        let storage = MemoryStorage::new();
        let bus = MarkerBus::new();
        let mut writer = MarkerStore::open(storage.clone(), bus.clone());
        let mut reader = MarkerStore::open(storage, bus.clone());

        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = bus.subscribe(move || counter.set(counter.get() + 1));

        writer.add("m1".to_string(), draft("Car"), PARKING).unwrap();
        assert_eq!(hits.get(), 1);
        assert!(reader.markers().is_empty());
        assert_eq!(reader.reload().len(), 1);

        writer.clear().unwrap();
        assert_eq!(hits.get(), 2);
        assert!(reader.reload().is_empty());

        assert!(bus.unsubscribe(subscription));
        writer.add("m2".to_string(), draft("Bike"), PARKING).unwrap();
        assert_eq!(hits.get(), 2);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_mutations_start_from_latest_storage() {
        let storage = MemoryStorage::new();
        let bus = MarkerBus::new();
        let mut a = MarkerStore::open(storage.clone(), bus.clone());
        let mut b = MarkerStore::open(storage, bus);
        a.add("m1".to_string(), draft("One"), PARKING).unwrap();
        // b never reloaded, but its write still keeps a's marker.
        b.add("m2".to_string(), draft("Two"), PARKING).unwrap();
        assert_eq!(b.markers().len(), 2);
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));
        assert_eq!(storage.read(MARKER_STORAGE_KEY).unwrap(), None);

        let mut store = MarkerStore::open(storage.clone(), MarkerBus::new());
        store.add("m1".to_string(), draft("Car"), PARKING).unwrap();

        let reopened = MarkerStore::open(storage, MarkerBus::new());
        assert_eq!(reopened.markers()[0].name, "Car");
    }

    #[test]
    fn test_file_storage_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{MARKER_STORAGE_KEY}.json")), "garbage").unwrap();
        let store = MarkerStore::open(FileStorage::new(dir.path()), MarkerBus::new());
        assert!(store.markers().is_empty());
    }
}
