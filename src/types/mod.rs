pub mod geometry;
pub mod polygon;

pub use geometry::{BoundingBox, Point};
pub use polygon::{PolygonRef, PolygonRing, RingKey};
