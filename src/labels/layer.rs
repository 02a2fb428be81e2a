use crate::data::{self, LabelSources};
use crate::error::LoadError;
use crate::labels::declutter::{run_pass, CameraState, Occluder, PassSummary, Projector};
use crate::labels::entity::{Headless, LabelKind, LabelPoint, LabelRenderer};
use crate::labels::lod::{DeclutterConfig, DistanceCues};
use crate::labels::scheduler::{CameraSubscription, PassScheduler};
use crate::labels::store::LabelStore;

/// Entity counts after a load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadCounts {
    pub countries: usize,
    pub cities: usize,
}

/// Country and city labels over a globe: the store, the pass scheduler and
/// the renderer that owns the drawables.
pub struct LabelLayer<R: LabelRenderer = Headless> {
    store: LabelStore<R::Handle>,
    scheduler: PassScheduler,
    config: DeclutterConfig,
    renderer: R,
    last_pass: Option<PassSummary>,
}

impl LabelLayer<Headless> {
    pub fn headless(config: DeclutterConfig) -> Self {
        Self::new(config, Headless)
    }
}

impl<R: LabelRenderer> LabelLayer<R> {
    pub fn new(config: DeclutterConfig, renderer: R) -> Self {
        config.check_cues(&DistanceCues::for_kind(LabelKind::City));
        Self {
            store: LabelStore::new(),
            scheduler: PassScheduler::new(),
            config,
            renderer,
            last_pass: None,
        }
    }

    /// Replace all labels with the contents of `sources`.
    ///
    /// Both collections are parsed before anything is built, so a failure
    /// leaves the layer empty. A pass is armed for the next frame.
    pub fn load_and_build(&mut self, sources: &LabelSources) -> Result<LoadCounts, LoadError> {
        self.clear_all();
        let (countries, cities) = data::load_sources(sources)?;
        Ok(self.build(countries, cities))
    }

    /// Replace all labels with already-validated points.
    pub fn build(&mut self, countries: Vec<LabelPoint>, cities: Vec<LabelPoint>) -> LoadCounts {
        self.clear_all();
        let counts = LoadCounts {
            countries: self.store.build(LabelKind::Country, countries, &mut self.renderer),
            cities: self.store.build(LabelKind::City, cities, &mut self.renderer),
        };
        tracing::info!(
            countries = counts.countries,
            cities = counts.cities,
            "built label entities"
        );
        self.scheduler.request();
        counts
    }

    /// Remove every label and release its drawable.
    pub fn clear_all(&mut self) {
        self.store.clear(&mut self.renderer);
        self.last_pass = None;
    }

    /// Listener to wire to the camera's change events.
    pub fn subscribe(&self) -> CameraSubscription {
        self.scheduler.subscribe()
    }

    /// Frame callback: runs the decluttering pass if a camera change is pending.
    ///
    /// A pass against a viewport with no area changes nothing and is re-armed
    /// for the following frame.
    pub fn frame<P, O>(
        &mut self,
        camera: &CameraState,
        projector: &P,
        occluder: &O,
    ) -> Option<PassSummary>
    where
        P: Projector + ?Sized,
        O: Occluder + ?Sized,
    {
        let store = &mut self.store;
        let config = &self.config;
        match self
            .scheduler
            .run_frame(|| run_pass(store, camera, projector, occluder, config))
        {
            Some(Some(summary)) => {
                self.last_pass = Some(summary);
                Some(summary)
            }
            Some(None) => {
                self.scheduler.request();
                None
            }
            None => None,
        }
    }

    pub fn store(&self) -> &LabelStore<R::Handle> {
        &self.store
    }

    pub fn config(&self) -> &DeclutterConfig {
        &self.config
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Summary of the most recent pass that ran since the last clear.
    pub fn last_pass(&self) -> Option<&PassSummary> {
        self.last_pass.as_ref()
    }
}
