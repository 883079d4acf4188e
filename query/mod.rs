pub mod distance;
pub mod planner;
pub mod request;

pub use crate::storage::BoundingBox;
pub use distance::{distance_miles, radius_bounding_box, EARTH_RADIUS_MILES, MILES_PER_DEGREE};
pub use planner::{GeoFilter, GeoMatch, QueryPlanner};
pub use request::{SearchArea, SearchRequest};
