use std::collections::HashSet;

use glam::DVec3;

use crate::labels::entity::{LabelKind, RenderHandle};
use crate::labels::lod::DeclutterConfig;
use crate::labels::store::LabelStore;

/// A projected position in canvas pixels, origin top-left, y down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Maps a world position (ECEF meters) to canvas pixels for the current camera.
/// `None` means the point cannot be projected, e.g. it is behind the camera.
pub trait Projector {
    fn project(&self, world: DVec3) -> Option<ScreenPoint>;
}

impl<F> Projector for F
where
    F: Fn(DVec3) -> Option<ScreenPoint>,
{
    fn project(&self, world: DVec3) -> Option<ScreenPoint> {
        self(world)
    }
}

/// Reports whether the globe body hides `world` from a camera at `camera`.
pub trait Occluder {
    fn is_occluded(&self, camera: DVec3, world: DVec3) -> bool;
}

impl<F> Occluder for F
where
    F: Fn(DVec3, DVec3) -> bool,
{
    fn is_occluded(&self, camera: DVec3, world: DVec3) -> bool {
        self(camera, world)
    }
}

/// Camera inputs read by a pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// Height above the ellipsoid, meters.
    pub height: f64,
    /// ECEF position, meters.
    pub position: DVec3,
    /// Canvas size in pixels.
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl CameraState {
    pub fn has_area(&self) -> bool {
        self.viewport_width > 0.0 && self.viewport_height > 0.0
    }
}

/// Why an entity was hidden, in the order the checks run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    KindGate,
    Occluded,
    Unprojectable,
    OffScreen,
    Collision,
    CityCap,
}

/// Outcome counts of one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub evaluated: usize,
    pub visible_countries: usize,
    pub visible_cities: usize,
    pub kind_gated: usize,
    pub occluded: usize,
    pub unprojectable: usize,
    pub off_screen: usize,
    pub collided: usize,
    pub capped: usize,
}

impl PassSummary {
    pub fn visible(&self) -> usize {
        self.visible_countries + self.visible_cities
    }

    fn record(&mut self, outcome: Result<LabelKind, Rejection>) {
        self.evaluated += 1;
        match outcome {
            Ok(LabelKind::Country) => self.visible_countries += 1,
            Ok(LabelKind::City) => self.visible_cities += 1,
            Err(Rejection::KindGate) => self.kind_gated += 1,
            Err(Rejection::Occluded) => self.occluded += 1,
            Err(Rejection::Unprojectable) => self.unprojectable += 1,
            Err(Rejection::OffScreen) => self.off_screen += 1,
            Err(Rejection::Collision) => self.collided += 1,
            Err(Rejection::CityCap) => self.capped += 1,
        }
    }
}

/// Screen-space occupancy grid: one label per square cell.
pub struct CollisionGrid {
    occupied: HashSet<(i64, i64)>,
    cell_px: f64,
}

impl CollisionGrid {
    pub fn new(cell_px: f64) -> Self {
        Self {
            occupied: HashSet::new(),
            cell_px,
        }
    }

    #[inline(always)]
    pub fn to_cell(&self, p: ScreenPoint) -> (i64, i64) {
        let x = (p.x / self.cell_px).floor() as i64;
        let y = (p.y / self.cell_px).floor() as i64;
        (x, y)
    }

    /// Claim the cell under `p`. False if something already holds it.
    #[inline]
    pub fn try_claim(&mut self, p: ScreenPoint) -> bool {
        let cell = self.to_cell(p);
        self.occupied.insert(cell)
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }
}

/// Per-pass working state. Built fresh for every pass and dropped after it.
struct PassWork<'a> {
    config: &'a DeclutterConfig,
    camera: &'a CameraState,
    show_cities: bool,
    city_cap: usize,
    countries: CollisionGrid,
    cities: CollisionGrid,
    visible_cities: usize,
}

impl<'a> PassWork<'a> {
    fn new(config: &'a DeclutterConfig, camera: &'a CameraState) -> Self {
        Self {
            config,
            camera,
            show_cities: config.city_enabled(camera.height),
            city_cap: config.city_cap(camera.height),
            countries: CollisionGrid::new(config.country_grid_px),
            cities: CollisionGrid::new(config.city_grid_px),
            visible_cities: 0,
        }
    }

    fn on_screen(&self, p: ScreenPoint) -> bool {
        let pad = self.config.viewport_padding_px;
        p.x >= -pad
            && p.x <= self.camera.viewport_width + pad
            && p.y >= -pad
            && p.y <= self.camera.viewport_height + pad
    }

    fn evaluate<P, O>(
        &mut self,
        kind: LabelKind,
        world: DVec3,
        projector: &P,
        occluder: &O,
    ) -> Result<LabelKind, Rejection>
    where
        P: Projector + ?Sized,
        O: Occluder + ?Sized,
    {
        if kind == LabelKind::City && !self.show_cities {
            return Err(Rejection::KindGate);
        }

        if occluder.is_occluded(self.camera.position, world) {
            return Err(Rejection::Occluded);
        }

        let screen = projector
            .project(world)
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .ok_or(Rejection::Unprojectable)?;

        if !self.on_screen(screen) {
            return Err(Rejection::OffScreen);
        }

        let grid = match kind {
            LabelKind::Country => &mut self.countries,
            LabelKind::City => &mut self.cities,
        };
        if !grid.try_claim(screen) {
            return Err(Rejection::Collision);
        }

        // Cap after declutter so dropped cells do not spend the budget
        if kind == LabelKind::City {
            if self.visible_cities >= self.city_cap {
                return Err(Rejection::CityCap);
            }
            self.visible_cities += 1;
        }

        Ok(kind)
    }
}

/// Decide visibility for every entity in the store.
///
/// Entities are visited in store order (countries first, then build order),
/// so on a collision the earlier entity keeps the cell. Returns `None` and
/// leaves every flag untouched when the viewport has no area yet.
pub fn run_pass<H, P, O>(
    store: &mut LabelStore<H>,
    camera: &CameraState,
    projector: &P,
    occluder: &O,
    config: &DeclutterConfig,
) -> Option<PassSummary>
where
    H: RenderHandle,
    P: Projector + ?Sized,
    O: Occluder + ?Sized,
{
    if !camera.has_area() {
        return None;
    }

    let mut work = PassWork::new(config, camera);
    let mut summary = PassSummary::default();

    for entity in store.iter_mut() {
        let outcome = work.evaluate(entity.kind(), entity.world(), projector, occluder);
        entity.set_visible(outcome.is_ok());
        summary.record(outcome);
    }

    tracing::debug!(
        height = camera.height,
        evaluated = summary.evaluated,
        countries = summary.visible_countries,
        cities = summary.visible_cities,
        collided = summary.collided,
        capped = summary.capped,
        "declutter pass"
    );

    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::entity::{Headless, LabelPoint};
    use crate::map::ecef_to_geodetic;

    const W: f64 = 1000.0;
    const H: f64 = 600.0;

    /// Lays lon/lat out linearly: 10 px per degree, (0, 0) at canvas center.
    fn flat(world: DVec3) -> Option<ScreenPoint> {
        let (lon, lat, _) = ecef_to_geodetic(world);
        Some(ScreenPoint::new(W / 2.0 + lon * 10.0, H / 2.0 - lat * 10.0))
    }

    fn never_occluded(_camera: DVec3, _world: DVec3) -> bool {
        false
    }

    fn camera(height: f64) -> CameraState {
        CameraState {
            height,
            position: DVec3::new(1.0e7, 0.0, 0.0),
            viewport_width: W,
            viewport_height: H,
        }
    }

    fn store_with(countries: &[(f64, f64, &str)], cities: &[(f64, f64, &str)]) -> LabelStore {
        fn pts(v: &[(f64, f64, &str)]) -> Vec<LabelPoint> {
            v.iter()
                .map(|&(lon, lat, t)| LabelPoint::new(lon, lat, t))
                .collect()
        }

        let mut store = LabelStore::new();
        store.build(LabelKind::Country, pts(countries), &mut Headless);
        store.build(LabelKind::City, pts(cities), &mut Headless);
        store
    }

    fn visible_names(store: &LabelStore) -> Vec<String> {
        store.visible().map(|e| e.text().to_string()).collect()
    }

    /// Ten cities 10 degrees apart along the equator: 100 px apart on screen.
    fn spread_cities(n: usize) -> Vec<(f64, f64, String)> {
        (0..n)
            .map(|i| (-45.0 + i as f64 * 10.0, 0.0, format!("city{i}")))
            .collect()
    }

    fn refs(v: &[(f64, f64, String)]) -> Vec<(f64, f64, &str)> {
        v.iter().map(|(a, b, s)| (*a, *b, s.as_str())).collect()
    }

    #[test]
    fn near_band_cap_keeps_first_six_in_store_order() {
        let cfg = DeclutterConfig {
            max_city_near: 6,
            ..DeclutterConfig::default()
        };
        let cities = spread_cities(10);
        let mut store = store_with(&[], &refs(&cities));

        let summary = run_pass(
            &mut store,
            &camera(cfg.city_soft_height_m - 1.0),
            &flat,
            &never_occluded,
            &cfg,
        )
        .unwrap();

        assert_eq!(summary.visible_cities, 6);
        assert_eq!(summary.capped, 4);
        assert_eq!(
            visible_names(&store),
            vec!["city0", "city1", "city2", "city3", "city4", "city5"]
        );
    }

    #[test]
    fn far_band_uses_far_cap() {
        let cfg = DeclutterConfig {
            max_city_near: 8,
            max_city_far: 3,
            ..DeclutterConfig::default()
        };
        let cities = spread_cities(10);
        let mut store = store_with(&[], &refs(&cities));

        let summary = run_pass(
            &mut store,
            &camera(cfg.city_soft_height_m + 1.0),
            &flat,
            &never_occluded,
            &cfg,
        )
        .unwrap();
        assert_eq!(summary.visible_cities, 3);
    }

    #[test]
    fn occluded_country_is_hidden_even_when_on_canvas() {
        let cfg = DeclutterConfig::default();
        let mut store = store_with(&[(0.0, 0.0, "Hidden"), (20.0, 10.0, "Shown")], &[]);
        let behind = |_camera: DVec3, world: DVec3| {
            let (lon, _, _) = ecef_to_geodetic(world);
            lon.abs() < 1e-9
        };

        let summary = run_pass(&mut store, &camera(1.0e7), &flat, &behind, &cfg).unwrap();
        assert_eq!(summary.occluded, 1);
        assert_eq!(visible_names(&store), vec!["Shown"]);
    }

    #[test]
    fn cities_gate_off_above_enable_height_but_countries_stay() {
        let cfg = DeclutterConfig::default();
        let cities = spread_cities(5);
        let mut store = store_with(&[(10.0, 20.0, "Land")], &refs(&cities));

        let summary = run_pass(
            &mut store,
            &camera(cfg.city_enable_height_m + 1.0),
            &flat,
            &never_occluded,
            &cfg,
        )
        .unwrap();

        assert_eq!(summary.visible_cities, 0);
        assert_eq!(summary.kind_gated, 5);
        assert_eq!(visible_names(&store), vec!["Land"]);
    }

    #[test]
    fn earlier_entity_wins_a_shared_cell() {
        let cfg = DeclutterConfig::default();
        // 0.5 degrees apart = 5 px, well inside one 70 px cell
        let mut store = store_with(&[], &[(1.0, 1.0, "First"), (1.5, 1.0, "Second")]);

        run_pass(&mut store, &camera(1.0e6), &flat, &never_occluded, &cfg).unwrap();
        assert_eq!(visible_names(&store), vec!["First"]);
    }

    #[test]
    fn collided_city_does_not_spend_the_cap() {
        let cfg = DeclutterConfig {
            max_city_near: 2,
            ..DeclutterConfig::default()
        };
        // a and b share a 70 px cell; c sits 90 px to the right in a free one
        let mut store = store_with(&[], &[(1.0, 1.0, "a"), (1.5, 1.0, "b"), (10.0, 1.0, "c")]);

        let summary = run_pass(&mut store, &camera(1.0e6), &flat, &never_occluded, &cfg).unwrap();
        assert_eq!(visible_names(&store), vec!["a", "c"]);
        assert_eq!(summary.collided, 1);
        assert_eq!(summary.capped, 0);
    }

    #[test]
    fn occluded_label_does_not_claim_its_cell() {
        let cfg = DeclutterConfig::default();
        // Both land in the same 140 px country cell
        let mut store = store_with(&[(0.0, 0.0, "Hidden"), (0.5, 0.0, "Shown")], &[]);
        let behind = |_camera: DVec3, world: DVec3| ecef_to_geodetic(world).0.abs() < 1e-9;

        let summary = run_pass(&mut store, &camera(1.0e7), &flat, &behind, &cfg).unwrap();
        assert_eq!(visible_names(&store), vec!["Shown"]);
        assert_eq!(summary.collided, 0);
    }

    #[test]
    fn occluded_city_does_not_spend_the_cap() {
        let cfg = DeclutterConfig {
            max_city_near: 1,
            ..DeclutterConfig::default()
        };
        let mut store = store_with(&[], &[(0.0, 0.0, "behind"), (10.0, 0.0, "front")]);
        let behind = |_camera: DVec3, world: DVec3| ecef_to_geodetic(world).0.abs() < 1e-9;

        run_pass(&mut store, &camera(1.0e6), &flat, &behind, &cfg).unwrap();
        assert_eq!(visible_names(&store), vec!["front"]);
    }

    #[test]
    fn off_screen_label_claims_nothing() {
        let cfg = DeclutterConfig {
            max_city_near: 1,
            ..DeclutterConfig::default()
        };
        // x = -40 is past the pad and x = -20 is inside it; both floor to country cell -1.
        // The off-screen city comes first and must not use up the single city slot.
        let mut store = store_with(
            &[(-54.0, 0.0, "Gone"), (-52.0, 0.0, "Edge")],
            &[(-54.0, 10.0, "gone"), (10.0, 0.0, "kept")],
        );

        let summary = run_pass(&mut store, &camera(1.0e6), &flat, &never_occluded, &cfg).unwrap();
        assert_eq!(visible_names(&store), vec!["Edge", "kept"]);
        assert_eq!(summary.off_screen, 2);
        assert_eq!(summary.collided, 0);
        assert_eq!(summary.capped, 0);
    }

    #[test]
    fn gated_cities_stop_at_the_gate() {
        let cfg = DeclutterConfig {
            max_city_far: 1,
            ..DeclutterConfig::default()
        };
        // Crowded and over the cap, yet every city is counted only as gated
        let mut store = store_with(
            &[(1.0, 1.0, "Land")],
            &[(1.0, 1.0, "a"), (1.5, 1.0, "b"), (30.0, 1.0, "c")],
        );
        let summary = run_pass(
            &mut store,
            &camera(cfg.city_enable_height_m + 1.0),
            &flat,
            &never_occluded,
            &cfg,
        )
        .unwrap();

        assert_eq!(summary.kind_gated, 3);
        assert_eq!(summary.collided, 0);
        assert_eq!(summary.capped, 0);
        assert_eq!(visible_names(&store), vec!["Land"]);
    }

    #[test]
    fn kinds_use_independent_grids() {
        let cfg = DeclutterConfig::default();
        let mut store = store_with(&[(1.0, 1.0, "Country")], &[(1.0, 1.0, "City")]);

        run_pass(&mut store, &camera(1.0e6), &flat, &never_occluded, &cfg).unwrap();
        assert_eq!(visible_names(&store), vec!["Country", "City"]);
    }

    #[test]
    fn padding_admits_points_just_off_canvas() {
        let cfg = DeclutterConfig::default();
        // x = 500 + 51.5 * 10 = 1015 is inside the 30 px pad; x = 500 - 54 * 10 = -40 is not
        let mut store = store_with(&[(51.5, 0.0, "Edge"), (-54.0, 20.0, "Gone")], &[]);

        let summary = run_pass(&mut store, &camera(1.0e7), &flat, &never_occluded, &cfg).unwrap();
        assert_eq!(summary.off_screen, 1);
        assert_eq!(visible_names(&store), vec!["Edge"]);
    }

    #[test]
    fn unprojectable_points_are_hidden() {
        let cfg = DeclutterConfig::default();
        let mut store = store_with(&[(0.0, 0.0, "A"), (5.0, 0.0, "B")], &[]);
        let nothing = |_world: DVec3| -> Option<ScreenPoint> { None };
        let nan = |_world: DVec3| Some(ScreenPoint::new(f64::NAN, 0.0));

        let summary =
            run_pass(&mut store, &camera(1.0e7), &nothing, &never_occluded, &cfg).unwrap();
        assert_eq!(summary.unprojectable, 2);
        let summary = run_pass(&mut store, &camera(1.0e7), &nan, &never_occluded, &cfg).unwrap();
        assert_eq!(summary.unprojectable, 2);
        assert_eq!(store.visible().count(), 0);
    }

    #[test]
    fn zero_area_viewport_leaves_flags_alone() {
        let cfg = DeclutterConfig::default();
        let mut store = store_with(&[(0.0, 0.0, "A")], &[]);
        run_pass(&mut store, &camera(1.0e7), &flat, &never_occluded, &cfg).unwrap();
        assert_eq!(visible_names(&store), vec!["A"]);

        let empty = CameraState {
            viewport_width: 0.0,
            ..camera(1.0e7)
        };
        assert!(run_pass(&mut store, &empty, &flat, &never_occluded, &cfg).is_none());
        assert_eq!(visible_names(&store), vec!["A"]);
    }

    /// A dense random-ish field checked against every pass property at once.
    #[test]
    fn dense_field_respects_all_properties_and_is_idempotent() {
        let cfg = DeclutterConfig {
            max_city_near: 12,
            ..DeclutterConfig::default()
        };
        let mut countries = Vec::new();
        let mut cities = Vec::new();
        for i in 0..40 {
            let lon = ((i * 37) % 120) as f64 - 60.0;
            let lat = ((i * 23) % 60) as f64 - 30.0;
            countries.push((lon, lat, format!("country{i}")));
            cities.push((lon + 0.7, lat - 0.3, format!("city{i}")));
        }
        let mut store = store_with(&refs(&countries), &refs(&cities));
        let west_hidden = |_c: DVec3, w: DVec3| ecef_to_geodetic(w).0 < -50.0;
        let cam = camera(cfg.city_soft_height_m);

        run_pass(&mut store, &cam, &flat, &west_hidden, &cfg).unwrap();
        let first: Vec<bool> = store.all().map(|e| e.is_visible()).collect();
        run_pass(&mut store, &cam, &flat, &west_hidden, &cfg).unwrap();
        let second: Vec<bool> = store.all().map(|e| e.is_visible()).collect();
        assert_eq!(first, second);

        let pad = cfg.viewport_padding_px;
        let mut seen: HashSet<(LabelKind, (i64, i64))> = HashSet::new();
        let mut cities_shown = 0;
        for e in store.visible() {
            assert!(!west_hidden(cam.position, e.world()));
            let p = flat(e.world()).unwrap();
            assert!(p.x >= -pad && p.x <= W + pad && p.y >= -pad && p.y <= H + pad);
            let cell = CollisionGrid::new(cfg.grid_px(e.kind())).to_cell(p);
            assert!(seen.insert((e.kind(), cell)), "two {:?} labels share a cell", e.kind());
            if e.kind() == LabelKind::City {
                cities_shown += 1;
            }
        }
        assert!(cities_shown <= cfg.max_city_near);
    }

    #[test]
    fn grid_cells_floor_negative_coordinates() {
        let mut grid = CollisionGrid::new(70.0);
        assert_eq!(grid.to_cell(ScreenPoint::new(-1.0, 69.9)), (-1, 0));
        assert_eq!(grid.to_cell(ScreenPoint::new(70.0, -70.0)), (1, -1));

        assert!(grid.is_empty());
        assert!(grid.try_claim(ScreenPoint::new(-1.0, 69.9)));
        assert!(!grid.try_claim(ScreenPoint::new(-69.0, 0.0)));
        assert!(grid.try_claim(ScreenPoint::new(0.0, 0.0)));
        assert_eq!(grid.len(), 2);
    }
}
