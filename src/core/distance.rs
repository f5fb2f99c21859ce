/// Earth's radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lng1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lng2` - Longitude of second point in degrees
#[inline]
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Human-readable walking distance, e.g. `約 350 公尺` or `約 1.2 公里`
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        // Round to the nearest 10 m; GPS noise makes finer precision meaningless
        format!("約 {} 公尺", ((meters / 10.0).round() * 10.0) as u32)
    } else {
        format!("約 {:.1} 公里", meters / 1000.0)
    }
}
