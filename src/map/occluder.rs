use glam::DVec3;

use crate::labels::Occluder;
use crate::map::geodesy::{WGS84_A, WGS84_B};

/// Horizon test against an ellipsoid.
///
/// Points are scaled into a space where the ellipsoid becomes the unit sphere.
/// There the camera's visible region is bounded by the horizon cone; a point
/// is hidden when it lies past the horizon plane *and* inside that cone.
#[derive(Clone, Copy, Debug)]
pub struct EllipsoidOccluder {
    inv_radii: DVec3,
}

impl EllipsoidOccluder {
    pub fn new(radii: DVec3) -> Self {
        Self {
            inv_radii: DVec3::ONE / radii,
        }
    }

    pub fn wgs84() -> Self {
        Self::new(DVec3::new(WGS84_A, WGS84_A, WGS84_B))
    }

    /// True when `point` can be seen from `camera` without passing through the body.
    pub fn is_point_visible(&self, camera: DVec3, point: DVec3) -> bool {
        let cam = camera * self.inv_radii;
        let vh_mag_sq = cam.length_squared() - 1.0;

        let target = point * self.inv_radii;
        let vt = target - cam;
        let vt_dot_vc = -vt.dot(cam);

        let occluded = if vh_mag_sq < 0.0 {
            // Camera inside the body: anything toward the center is hidden
            vt_dot_vc > 0.0
        } else {
            vt_dot_vc > vh_mag_sq && vt_dot_vc * vt_dot_vc / vt.length_squared() > vh_mag_sq
        };
        !occluded
    }
}

impl Default for EllipsoidOccluder {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Occluder for EllipsoidOccluder {
    fn is_occluded(&self, camera: DVec3, world: DVec3) -> bool {
        !self.is_point_visible(camera, world)
    }
}
