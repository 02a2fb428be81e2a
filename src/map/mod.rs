mod geodesy;
mod globe;
mod occluder;

pub use geodesy::{ecef_to_geodetic, geodetic_to_ecef, WGS84_A, WGS84_B};
pub use globe::GlobeCamera;
pub use occluder::EllipsoidOccluder;
