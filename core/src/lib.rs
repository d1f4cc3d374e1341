pub mod api;
pub mod config;
pub mod geometry;
pub mod interaction;
pub mod loader;
pub mod pins;
pub mod quiz;
pub mod region;
pub mod spatial;
pub mod timing;
pub mod tooltip;
pub mod transform;
pub mod viewport;

pub use api::ApiError;
pub use config::MapConfig;
pub use geometry::{BoundingBox, Point, ScreenRect};
pub use interaction::{
    InteractionOutcome, MapInteractionSession, MapSurface, MountGeneration, MountToken,
    SessionOracle, SurfaceEvent, SurfaceEventKind, TaggedNode, nearest_region,
};
pub use loader::{AssetLoader, FetchError};
pub use pins::{Pin, PinBoard, PinId, PinStatus, PinType};
pub use quiz::{AnswerSheet, QuizBook, QuizScore, RegionQuiz};
pub use region::{MapMode, Region, RegionCatalog};
pub use spatial::{MapDocument, RegionLabel, ShapeRecord, SpatialIndex};
pub use tooltip::TooltipPlacement;
pub use transform::ScreenTransform;
pub use viewport::{ViewportSnapshot, ViewportSource, ViewportTransformCache};
