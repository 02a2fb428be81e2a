//! Label visibility for a moving globe camera.
//!
//! Country and city labels are loaded from GeoJSON point collections into a
//! [`labels::LabelLayer`]. Camera changes arm a decluttering pass that runs at
//! most once per frame and decides which labels are shown: cities are gated
//! by camera height, anything behind the globe or off-canvas is hidden, one
//! label per screen-grid cell survives, and visible cities are capped.

pub mod data;
pub mod error;
pub mod labels;
pub mod map;
