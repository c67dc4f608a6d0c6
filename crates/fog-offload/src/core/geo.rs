//! Geographic distance and network delay computations.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Propagation speed of light in optical fiber, km/s.
pub const FIBER_SPEED_KM_PER_SEC: f64 = 200_000.0;

/// Fixed per-transfer link setup overhead in seconds.
const LINK_SETUP_OVERHEAD: f64 = 0.005;

/// Approximates per-hop routing and queuing delay as a linear function of distance.
const ROUTING_DELAY_PER_KM: f64 = 2e-5;

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Returns the great-circle distance between two points in kilometers (Haversine formula).
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.).sin().powi(2);
    let c = 2. * h.sqrt().atan2((1. - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Returns the base transmission delay in seconds for sending `payload` units of data
/// over `distance_km` to a node with the specified bandwidth capacity.
///
/// Combines a fixed setup overhead, the light-in-fiber propagation floor, a
/// distance-proportional routing term and a size-proportional serialization term.
pub fn transmission_delay(distance_km: f64, payload: u64, bandwidth: u64) -> f64 {
    LINK_SETUP_OVERHEAD
        + distance_km / FIBER_SPEED_KM_PER_SEC
        + distance_km * ROUTING_DELAY_PER_KM
        + payload as f64 / bandwidth.max(1) as f64
}
