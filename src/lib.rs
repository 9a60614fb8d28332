pub mod config;
pub mod containment;
pub mod error;
pub mod index;
pub mod local_time;
pub mod resolver;
pub mod store;
pub mod types;

pub use config::{EvaluationMode, ResolverConfig};
pub use containment::Containment;
pub use error::{Result, TzError};
pub use index::{ArtifactFormat, BvhIndex};
pub use local_time::{DayWindow, Ephemeris, LocalTimeInfo, local_time_info};
pub use resolver::{Resolution, ResolutionReport, TimezoneResolver};
pub use store::{FsRingSource, MemoryRingSource, PolygonCache, PolygonStore, RingSource};
pub use types::{BoundingBox, Point, PolygonRef, PolygonRing, RingKey};
