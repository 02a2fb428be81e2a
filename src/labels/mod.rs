mod declutter;
mod entity;
mod layer;
pub mod lod;
mod scheduler;
mod store;

pub use declutter::{
    run_pass, CameraState, CollisionGrid, Occluder, PassSummary, Projector, Rejection, ScreenPoint,
};
pub use entity::{Headless, LabelEntity, LabelKind, LabelPoint, LabelRenderer, RenderHandle};
pub use layer::{LabelLayer, LoadCounts};
pub use lod::{DeclutterConfig, DistanceCues};
pub use scheduler::{CameraSubscription, PassScheduler, PassState};
pub use store::LabelStore;
