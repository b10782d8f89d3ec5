use crate::model::place::{Place, Position};

/// Mean earth radius (IUGG), meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters (haversine).
pub fn distance_meters(from: Position, to: Position) -> f64 {
    let (lat1, lat2) = (from.latitude.to_radians(), to.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// `true` when no place is configured or `position` lies within its radius.
pub fn validate(place: Option<&Place>, position: Position) -> bool {
    let Some(place) = place else {
        return true;
    };
    let centre = Position {
        latitude: place.latitude,
        longitude: place.longitude,
    };
    distance_meters(centre, position) <= f64::from(place.radius)
}
