use glam::DVec3;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 semi-minor axis (meters).
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
/// WGS84 second eccentricity squared.
const WGS84_EP2: f64 = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);

/// Convert lon/lat (degrees) and height above the ellipsoid (meters) to ECEF meters.
pub fn geodetic_to_ecef(lon: f64, lat: f64, height: f64) -> DVec3 {
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    DVec3::new(
        (n + height) * cos_lat * cos_lon,
        (n + height) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + height) * sin_lat,
    )
}

/// Convert ECEF meters back to (lon, lat, height) in degrees and meters.
/// Uses Bowring's closed form, accurate to well under a millimeter near the surface.
pub fn ecef_to_geodetic(p: DVec3) -> (f64, f64, f64) {
    let horiz = (p.x * p.x + p.y * p.y).sqrt();
    let lon = p.y.atan2(p.x);

    let theta = (p.z * WGS84_A).atan2(horiz * WGS84_B);
    let (sin_t, cos_t) = theta.sin_cos();

    let lat = (p.z + WGS84_EP2 * WGS84_B * sin_t * sin_t * sin_t)
        .atan2(horiz - WGS84_E2 * WGS84_A * cos_t * cos_t * cos_t);

    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let height = if lat.cos().abs() > 1e-12 {
        horiz / lat.cos() - n
    } else {
        // At the poles the horizontal distance degenerates
        p.z.abs() - WGS84_B
    };

    (lon.to_degrees(), lat.to_degrees(), height)
}
