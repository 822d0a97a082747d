use crate::models::{DistanceUnit, GeoCoordinate};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const EARTH_RADIUS_MI: f64 = 3959.0;

impl DistanceUnit {
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Km => EARTH_RADIUS_KM,
            DistanceUnit::Mi => EARTH_RADIUS_MI,
        }
    }
}

/// Great-circle (haversine) distance between two coordinates in `unit`.
/// Non-finite inputs propagate into the result.
pub fn distance(a: GeoCoordinate, b: GeoCoordinate, unit: DistanceUnit) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    unit.earth_radius() * c
}

/// Initial bearing from `a` to `b` in degrees [0, 360), clockwise from north.
/// Identical coordinates have no defined bearing and yield 0.
pub fn azimuth(a: GeoCoordinate, b: GeoCoordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let deg = y.atan2(x).to_degrees();
    if deg.is_nan() {
        return 0.0;
    }
    let deg = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}
