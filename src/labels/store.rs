use crate::labels::entity::{LabelEntity, LabelKind, LabelPoint, LabelRenderer, RenderHandle};
use crate::map::geodetic_to_ecef;

/// All label entities, kept per kind.
///
/// Iteration always yields countries before cities, each in build order.
/// The decluttering pass relies on this order to break collisions.
pub struct LabelStore<H = ()> {
    countries: Vec<LabelEntity<H>>,
    cities: Vec<LabelEntity<H>>,
}

impl<H: RenderHandle> LabelStore<H> {
    pub fn new() -> Self {
        Self {
            countries: Vec::new(),
            cities: Vec::new(),
        }
    }

    /// Append one entity per valid point. Returns how many were added;
    /// malformed points are skipped.
    pub fn build<R>(
        &mut self,
        kind: LabelKind,
        points: impl IntoIterator<Item = LabelPoint>,
        renderer: &mut R,
    ) -> usize
    where
        R: LabelRenderer<Handle = H>,
    {
        let target = match kind {
            LabelKind::Country => &mut self.countries,
            LabelKind::City => &mut self.cities,
        };

        let before = target.len();
        let mut skipped = 0usize;
        for point in points {
            if !point.is_valid() {
                skipped += 1;
                continue;
            }
            let world = geodetic_to_ecef(point.lon, point.lat, 0.0);
            let handle = renderer.add_label(kind, &point, world);
            target.push(LabelEntity::new(kind, point, world, handle));
        }

        if skipped > 0 {
            tracing::debug!(kind = kind.as_str(), skipped, "skipped malformed label points");
        }
        target.len() - before
    }

    /// Drop every entity, handing each handle back to the renderer.
    pub fn clear<R>(&mut self, renderer: &mut R)
    where
        R: LabelRenderer<Handle = H>,
    {
        for entity in self.countries.drain(..).chain(self.cities.drain(..)) {
            renderer.remove_label(entity.handle);
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &LabelEntity<H>> {
        self.countries.iter().chain(self.cities.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LabelEntity<H>> {
        self.countries.iter_mut().chain(self.cities.iter_mut())
    }

    pub fn visible(&self) -> impl Iterator<Item = &LabelEntity<H>> {
        self.all().filter(|e| e.is_visible())
    }

    pub fn count(&self, kind: LabelKind) -> usize {
        match kind {
            LabelKind::Country => self.countries.len(),
            LabelKind::City => self.cities.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.countries.len() + self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.cities.is_empty()
    }
}

impl<H: RenderHandle> Default for LabelStore<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::entity::Headless;
    use glam::DVec3;

    /// Renderer that hands out numbered handles and remembers removals.
    #[derive(Default)]
    struct Recording {
        next: usize,
        removed: Vec<usize>,
    }

    struct Slot(usize, bool);

    impl RenderHandle for Slot {
        fn set_visible(&mut self, visible: bool) {
            self.1 = visible;
        }
    }

    impl LabelRenderer for Recording {
        type Handle = Slot;

        fn add_label(&mut self, _kind: LabelKind, _point: &LabelPoint, _world: DVec3) -> Slot {
            self.next += 1;
            Slot(self.next, false)
        }

        fn remove_label(&mut self, handle: Slot) {
            self.removed.push(handle.0);
        }
    }

    #[test]
    fn countries_iterate_before_cities_in_build_order() {
        let mut store = LabelStore::new();
        store.build(
            LabelKind::City,
            vec![
                LabelPoint::new(1.0, 1.0, "Lyon"),
                LabelPoint::new(2.0, 2.0, "Nice"),
            ],
            &mut Headless,
        );
        store.build(
            LabelKind::Country,
            vec![
                LabelPoint::new(3.0, 3.0, "France"),
                LabelPoint::new(4.0, 4.0, "Spain"),
            ],
            &mut Headless,
        );

        let names: Vec<_> = store.all().map(|e| e.text()).collect();
        assert_eq!(names, vec!["France", "Spain", "Lyon", "Nice"]);
        assert_eq!(store.count(LabelKind::Country), 2);
        assert_eq!(store.count(LabelKind::City), 2);
    }

    #[test]
    fn malformed_points_are_skipped() {
        let mut store: LabelStore = LabelStore::new();
        let added = store.build(
            LabelKind::City,
            vec![
                LabelPoint::new(f64::NAN, 1.0, "Nowhere"),
                LabelPoint::new(1.0, f64::INFINITY, "Nowhere"),
                LabelPoint::new(1.0, 1.0, "   "),
                LabelPoint::new(1.0, 1.0, " Oslo "),
            ],
            &mut Headless,
        );
        assert_eq!(added, 1);
        let oslo = store.all().next().unwrap();
        assert_eq!(oslo.text(), "Oslo");
        assert_eq!(oslo.lonlat(), (1.0, 1.0));
    }

    #[test]
    fn clear_returns_every_handle() {
        let mut renderer = Recording::default();
        let mut store = LabelStore::new();
        store.build(LabelKind::Country, vec![LabelPoint::new(0.0, 0.0, "A")], &mut renderer);
        store.build(LabelKind::City, vec![LabelPoint::new(0.0, 0.0, "B")], &mut renderer);

        store.clear(&mut renderer);
        assert!(store.is_empty());
        assert_eq!(renderer.removed, vec![1, 2]);
    }

    #[test]
    fn new_entities_start_hidden() {
        let mut renderer = Recording::default();
        let mut store = LabelStore::new();
        store.build(LabelKind::Country, vec![LabelPoint::new(0.0, 0.0, "A")], &mut renderer);
        assert_eq!(store.visible().count(), 0);
        assert!(!store.all().any(|e| e.handle().1));
    }
}
