use globe_labels::labels::{CameraSubscription, DistanceCues, LabelKind, LabelLayer, PassSummary};
use globe_labels::map::GlobeCamera;

/// Virtual pixels per terminal cell. Label spacing thresholds are tuned in
/// browser-canvas pixels, so the camera renders to a canvas of this scale.
pub const CELL_PX_W: f64 = 8.0;
pub const CELL_PX_H: f64 = 16.0;

/// Initial camera placement, kept for reset.
#[derive(Clone, Copy, Debug)]
pub struct Home {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

/// A label ready to draw, in terminal cells.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenLabel {
    pub col: i32,
    pub row: i32,
    pub text: String,
    pub kind: LabelKind,
    /// Size factor by distance; shortens long names.
    pub scale: f64,
    /// Faded by distance; drawn dim.
    pub faded: bool,
}

/// Application state
pub struct App {
    pub camera: GlobeCamera,
    pub labels: LabelLayer,
    camera_events: CameraSubscription,
    home: Home,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Where the labels came from, for the status bar
    pub source: String,
}

impl App {
    pub fn new(
        width: usize,
        height: usize,
        labels: LabelLayer,
        home: Home,
        source: String,
    ) -> Self {
        let (w, h) = canvas_size(width, height);
        let camera_events = labels.subscribe();
        Self {
            camera: GlobeCamera::new(home.lon, home.lat, home.height, w, h),
            labels,
            camera_events,
            home,
            should_quit: false,
            last_mouse: None,
            source,
        }
    }

    /// Update canvas size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (w, h) = canvas_size(width, height);
        self.camera.set_size(w, h);
        self.camera_events.notify();
    }

    /// Rotate the globe by a cell delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.camera
            .rotate_drag(dx as f64 * CELL_PX_W, dy as f64 * CELL_PX_H);
        self.camera_events.notify();
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
        self.camera_events.notify();
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
        self.camera_events.notify();
    }

    /// Back to the initial camera
    pub fn reset(&mut self) {
        let (w, h) = (self.camera.width, self.camera.height_px);
        self.camera = GlobeCamera::new(self.home.lon, self.home.lat, self.home.height, w, h);
        self.camera_events.notify();
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            if dx != 0 || dy != 0 {
                self.pan(dx, dy);
            }
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// One display frame: runs the label pass if the camera moved since the last one.
    pub fn tick(&mut self) -> Option<PassSummary> {
        let state = self.camera.state();
        self.labels.frame(&state, &self.camera, &self.camera)
    }

    /// Visible labels with the distance cues applied, positioned in terminal cells.
    pub fn screen_labels(&self) -> Vec<ScreenLabel> {
        let country = DistanceCues::for_kind(LabelKind::Country);
        let city = DistanceCues::for_kind(LabelKind::City);

        self.labels
            .store()
            .visible()
            .filter_map(|entity| {
                let cues = match entity.kind() {
                    LabelKind::Country => &country,
                    LabelKind::City => &city,
                };
                let distance = self.camera.distance_to(entity.world());
                if !cues.display.contains(distance) {
                    return None;
                }
                let alpha = cues.alpha_at(distance);
                if alpha <= 0.0 {
                    return None;
                }

                let p = self.camera.project_world(entity.world())?;
                Some(ScreenLabel {
                    col: (p.x / CELL_PX_W).floor() as i32,
                    row: (p.y / CELL_PX_H).floor() as i32,
                    text: entity.text().to_string(),
                    kind: entity.kind(),
                    scale: cues.scale.value_at(distance),
                    faded: alpha < 0.5,
                })
            })
            .collect()
    }

    /// Camera height as a string
    pub fn height_text(&self) -> String {
        let h = self.camera.height();
        if h >= 1.0e6 {
            format!("{:.1}k km", h / 1.0e6)
        } else {
            format!("{:.0} km", h / 1.0e3)
        }
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let (lon, lat) = self.camera.center_lonlat();
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Canvas size in virtual pixels for a terminal of `width` x `height` cells.
/// Accounts for the border (2 cells each way) and the status bar (1 row).
fn canvas_size(width: usize, height: usize) -> (f64, f64) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    (inner_width as f64 * CELL_PX_W, inner_height as f64 * CELL_PX_H)
}
