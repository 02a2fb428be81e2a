use glam::DVec3;

use crate::labels::{CameraState, Occluder, Projector, ScreenPoint};
use crate::map::geodesy::{geodetic_to_ecef, WGS84_A};
use crate::map::occluder::EllipsoidOccluder;

const MIN_HEIGHT: f64 = 2.0e5;
const MAX_HEIGHT: f64 = 4.0e7;
const ZOOM_STEP: f64 = 1.25;
/// Closest distance in front of the camera that still projects.
const NEAR_PLANE: f64 = 1.0;

/// Perspective camera orbiting the globe, always looking at the earth's center.
///
/// Orientation is stored as three orthonormal vectors: `forward` points from
/// the earth's center to the point under the camera, `right` points east and
/// `up` points north on screen.
#[derive(Clone, Debug)]
pub struct GlobeCamera {
    forward: DVec3,
    right: DVec3,
    up: DVec3,
    /// Height above the ellipsoid in meters
    height: f64,
    /// Vertical field of view in radians
    fov_y: f64,
    /// Canvas pixel width
    pub width: f64,
    /// Canvas pixel height
    pub height_px: f64,
    occluder: EllipsoidOccluder,
}

impl GlobeCamera {
    /// Camera above (lon, lat) at `height` meters, for a canvas of the given pixel size.
    pub fn new(center_lon: f64, center_lat: f64, height: f64, width: f64, height_px: f64) -> Self {
        let lat = center_lat.clamp(-89.9, 89.9);
        let lon_rad = center_lon.to_radians();
        let lat_rad = lat.to_radians();

        let forward = lonlat_to_vec3(center_lon, lat);

        // Derivative of forward w.r.t. latitude: north on the sphere
        let raw_up = DVec3::new(
            -lat_rad.sin() * lon_rad.cos(),
            -lat_rad.sin() * lon_rad.sin(),
            lat_rad.cos(),
        );

        // Seen from outside, looking back at the center: east is screen right
        let right = raw_up.cross(forward).normalize();
        let up = forward.cross(right).normalize();

        Self {
            forward,
            right,
            up,
            height: height.clamp(MIN_HEIGHT, MAX_HEIGHT),
            fov_y: 60f64.to_radians(),
            width,
            height_px,
            occluder: EllipsoidOccluder::wgs84(),
        }
    }

    /// The lon/lat (degrees) directly under the camera.
    pub fn center_lonlat(&self) -> (f64, f64) {
        let lat = self.forward.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = self.forward.y.atan2(self.forward.x).to_degrees();
        (lon, lat)
    }

    /// Height above the ellipsoid in meters.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// ECEF position in meters.
    pub fn position(&self) -> DVec3 {
        let (lon, lat) = self.center_lonlat();
        geodetic_to_ecef(lon, lat, self.height)
    }

    pub fn set_size(&mut self, width: f64, height_px: f64) {
        self.width = width;
        self.height_px = height_px;
    }

    /// Everything a decluttering pass needs to know about this camera.
    pub fn state(&self) -> CameraState {
        CameraState {
            height: self.height,
            position: self.position(),
            viewport_width: self.width,
            viewport_height: self.height_px,
        }
    }

    /// Straight-line distance from the camera to a world point, meters.
    pub fn distance_to(&self, world: DVec3) -> f64 {
        self.position().distance(world)
    }

    /// Focal length in pixels for the vertical field of view.
    fn focal_px(&self) -> f64 {
        (self.height_px / 2.0) / (self.fov_y / 2.0).tan()
    }

    /// Screen radius of the globe's silhouette, in pixels.
    pub fn limb_radius_px(&self) -> f64 {
        let dist = WGS84_A + self.height;
        let half_angle = (WGS84_A / dist).clamp(-1.0, 1.0).asin();
        self.focal_px() * half_angle.tan()
    }

    /// Project a world point to canvas pixels.
    /// Returns `None` for points on or behind the near plane.
    pub fn project_world(&self, world: DVec3) -> Option<ScreenPoint> {
        let view = world - self.position();

        // Looking down -forward, toward the earth's center
        let depth = -view.dot(self.forward);
        if depth < NEAR_PLANE {
            return None;
        }

        let f = self.focal_px();
        let sx = view.dot(self.right) / depth;
        let sy = view.dot(self.up) / depth;

        Some(ScreenPoint::new(
            self.width / 2.0 + sx * f,
            self.height_px / 2.0 - sy * f,
        ))
    }

    /// Rotate the globe by a pixel drag delta.
    /// Positive dx = dragged left, so the view center shifts east (surface follows cursor).
    pub fn rotate_drag(&mut self, dx: f64, dy: f64) {
        // Pixels per radian of arc at the sub-camera point
        let scale = self.focal_px() * WGS84_A / self.height;
        self.rotate(dx / scale, -dy / scale);
    }

    fn rotate(&mut self, angle_x: f64, angle_y: f64) {
        // Around up: longitude-ish change
        if angle_x.abs() > 1e-12 {
            let (sin_a, cos_a) = angle_x.sin_cos();
            let new_forward = self.forward * cos_a + self.right * sin_a;
            let new_right = self.right * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.right = new_right.normalize();
        }

        // Around right: latitude-ish change
        if angle_y.abs() > 1e-12 {
            let (sin_a, cos_a) = angle_y.sin_cos();
            let new_forward = self.forward * cos_a + self.up * sin_a;
            let new_up = self.up * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.up = new_up.normalize();
        }
    }

    /// Move the camera closer to the surface.
    pub fn zoom_in(&mut self) {
        self.height = (self.height / ZOOM_STEP).max(MIN_HEIGHT);
    }

    /// Move the camera away from the surface.
    pub fn zoom_out(&mut self) {
        self.height = (self.height * ZOOM_STEP).min(MAX_HEIGHT);
    }
}

impl Projector for GlobeCamera {
    fn project(&self, world: DVec3) -> Option<ScreenPoint> {
        self.project_world(world)
    }
}

impl Occluder for GlobeCamera {
    fn is_occluded(&self, camera: DVec3, world: DVec3) -> bool {
        self.occluder.is_occluded(camera, world)
    }
}

/// Convert lon/lat (degrees) to a unit sphere vector.
#[inline(always)]
fn lonlat_to_vec3(lon: f64, lat: f64) -> DVec3 {
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}
