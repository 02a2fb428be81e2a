use glam::DVec3;

/// Which layer a label belongs to. Fixed for the lifetime of the entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Country,
    City,
}

impl LabelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelKind::Country => "country",
            LabelKind::City => "city",
        }
    }
}

/// A validated input record: position in degrees plus resolved display text.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelPoint {
    pub lon: f64,
    pub lat: f64,
    pub text: String,
}

impl LabelPoint {
    pub fn new(lon: f64, lat: f64, text: impl Into<String>) -> Self {
        Self {
            lon,
            lat,
            text: text.into(),
        }
    }

    /// Finite coordinates and non-blank text.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite() && !self.text.trim().is_empty()
    }
}

/// Visibility toggle on whatever object the rendering layer draws.
pub trait RenderHandle {
    fn set_visible(&mut self, visible: bool);
}

/// Handle for callers that read visibility straight from the store.
impl RenderHandle for () {
    fn set_visible(&mut self, _visible: bool) {}
}

/// The rendering layer's side of the store: creates a drawable per label and
/// takes it back when the store is cleared.
pub trait LabelRenderer {
    type Handle: RenderHandle;

    fn add_label(&mut self, kind: LabelKind, point: &LabelPoint, world: DVec3) -> Self::Handle;

    fn remove_label(&mut self, handle: Self::Handle);
}

/// Renderer with no drawables of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct Headless;

impl LabelRenderer for Headless {
    type Handle = ();

    fn add_label(&mut self, _kind: LabelKind, _point: &LabelPoint, _world: DVec3) {}

    fn remove_label(&mut self, _handle: ()) {}
}

/// One label on the globe.
#[derive(Debug)]
pub struct LabelEntity<H = ()> {
    kind: LabelKind,
    text: String,
    lon: f64,
    lat: f64,
    world: DVec3,
    pub(crate) handle: H,
    visible: bool,
}

impl<H: RenderHandle> LabelEntity<H> {
    pub(crate) fn new(kind: LabelKind, point: LabelPoint, world: DVec3, handle: H) -> Self {
        Self {
            kind,
            text: point.text.trim().to_string(),
            lon: point.lon,
            lat: point.lat,
            world,
            handle,
            visible: false,
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.handle.set_visible(visible);
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Geodetic position as (lon, lat) degrees, on the ellipsoid surface.
    pub fn lonlat(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }

    /// ECEF position in meters.
    pub fn world(&self) -> DVec3 {
        self.world
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
