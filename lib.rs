pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod query;
pub mod registry;
pub mod rtree;
pub mod service;
pub mod storage;
pub mod sync;

// 重新导出主要的公共接口
pub use config::GeoSearchConfig;
pub use content::{ContentItem, ContentQuery, ContentRepository, FieldEvent, FieldObserver, MemoryRepository};
pub use error::GeoSearchError;
pub use query::{GeoFilter, GeoMatch, QueryPlanner, SearchRequest};
pub use registry::{FieldRegistry, FieldSpec, StaticRegistry};
pub use rtree::{RTree, Rectangle};
pub use service::{AnnotatedResult, GeoSearch};
pub use storage::{BoundingBox, Coordinate, IndexEntry, IndexStore};
pub use sync::{IndexSynchronizer, RebuildStats, SyncOutcome};

pub type Result<T> = std::result::Result<T, GeoSearchError>;
