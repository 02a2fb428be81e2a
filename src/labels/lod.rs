//! Camera-height level-of-detail policy for labels.
//!
//! Two sets of thresholds live here. [`DeclutterConfig`] drives the boolean
//! gates of the decluttering pass (city enable height, city caps, grid sizes).
//! [`DistanceCues`] is what a renderer applies on top of a visible label:
//! size, fade and a display-distance window, each interpolated between two
//! anchors. The two must agree; see [`DeclutterConfig::check_cues`].

use crate::error::ConfigError;
use crate::labels::entity::LabelKind;

/// Thresholds for one decluttering pass. Heights in meters, sizes in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeclutterConfig {
    /// Above this camera height no city label is shown.
    pub city_enable_height_m: f64,
    /// At or below this height the near (larger) city cap applies.
    pub city_soft_height_m: f64,
    pub max_city_near: usize,
    pub max_city_far: usize,
    /// Side of a city collision cell.
    pub city_grid_px: f64,
    /// Side of a country collision cell.
    pub country_grid_px: f64,
    /// Margin around the canvas still treated as on-screen.
    pub viewport_padding_px: f64,
}

impl Default for DeclutterConfig {
    fn default() -> Self {
        Self {
            city_enable_height_m: 6.0e6,
            city_soft_height_m: 3.0e6,
            max_city_near: 60,
            max_city_far: 25,
            city_grid_px: 70.0,
            country_grid_px: 140.0,
            viewport_padding_px: 30.0,
        }
    }
}

impl DeclutterConfig {
    /// Cities are gated off entirely above the enable height.
    #[inline]
    pub fn city_enabled(&self, camera_height: f64) -> bool {
        camera_height <= self.city_enable_height_m
    }

    /// Hard cap on visible cities at this camera height.
    #[inline]
    pub fn city_cap(&self, camera_height: f64) -> usize {
        if camera_height <= self.city_soft_height_m {
            self.max_city_near
        } else {
            self.max_city_far
        }
    }

    /// Collision cell side for a kind.
    #[inline]
    pub fn grid_px(&self, kind: LabelKind) -> f64 {
        match kind {
            LabelKind::Country => self.country_grid_px,
            LabelKind::City => self.city_grid_px,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("city_grid_px", self.city_grid_px),
            ("country_grid_px", self.country_grid_px),
            ("city_enable_height_m", self.city_enable_height_m),
            ("city_soft_height_m", self.city_soft_height_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }

        if !self.viewport_padding_px.is_finite() || self.viewport_padding_px < 0.0 {
            return Err(ConfigError::BadPadding(self.viewport_padding_px));
        }

        if self.city_soft_height_m > self.city_enable_height_m {
            return Err(ConfigError::SoftAboveEnable {
                soft: self.city_soft_height_m,
                enable: self.city_enable_height_m,
            });
        }

        Ok(())
    }

    /// Warn when the renderer's city display window would show labels from
    /// heights the pass already gates off. Returns whether the two agree.
    pub fn check_cues(&self, city: &DistanceCues) -> bool {
        let consistent = city.display.max <= self.city_enable_height_m;
        if !consistent {
            tracing::warn!(
                display_max = city.display.max,
                enable_height = self.city_enable_height_m,
                "city display window reaches past the city enable height"
            );
        }
        consistent
    }
}

/// Linear interpolation between two (distance, value) anchors, clamped outside them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearFarScalar {
    pub near: f64,
    pub near_value: f64,
    pub far: f64,
    pub far_value: f64,
}

impl NearFarScalar {
    pub const fn new(near: f64, near_value: f64, far: f64, far_value: f64) -> Self {
        Self {
            near,
            near_value,
            far,
            far_value,
        }
    }

    pub fn value_at(&self, distance: f64) -> f64 {
        if self.far <= self.near {
            return if distance <= self.near {
                self.near_value
            } else {
                self.far_value
            };
        }
        let t = ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0);
        self.near_value + (self.far_value - self.near_value) * t
    }
}

/// Camera distance band in which a label is drawn at all.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayWindow {
    pub min: f64,
    pub max: f64,
}

impl DisplayWindow {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }
}

/// Per-kind distance styling, evaluated by the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceCues {
    pub scale: NearFarScalar,
    pub translucency: Option<NearFarScalar>,
    pub display: DisplayWindow,
}

const CITY_MAX_DISTANCE: f64 = 1.6e6;
const COUNTRY_MIN_DISTANCE: f64 = 1.6e6;
const COUNTRY_MAX_DISTANCE: f64 = 1.5e7;

impl DistanceCues {
    pub fn for_kind(kind: LabelKind) -> Self {
        match kind {
            LabelKind::Country => Self {
                scale: NearFarScalar::new(2.0e6, 1.0, 1.2e7, 0.85),
                translucency: None,
                display: DisplayWindow::new(COUNTRY_MIN_DISTANCE, COUNTRY_MAX_DISTANCE),
            },
            LabelKind::City => Self {
                scale: NearFarScalar::new(3.0e5, 1.15, 3.0e6, 0.7),
                translucency: Some(NearFarScalar::new(1.5e6, 1.0, CITY_MAX_DISTANCE, 0.0)),
                display: DisplayWindow::new(0.0, CITY_MAX_DISTANCE),
            },
        }
    }

    /// Opacity at a camera distance; 1.0 when no fade is configured.
    pub fn alpha_at(&self, distance: f64) -> f64 {
        self.translucency.map_or(1.0, |t| t.value_at(distance))
    }
}
