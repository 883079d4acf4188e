pub mod geo_utils;
#[allow(clippy::module_inception)]
pub mod storage;

pub use geo_utils::{parse_coordinate, BoundingBox, Coordinate};
pub use storage::{FieldStats, IndexEntry, IndexStats, IndexStore, RebuildStaging};
