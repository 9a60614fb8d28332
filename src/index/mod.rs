pub mod artifact;
pub mod bvh;

pub use artifact::ArtifactFormat;
pub use bvh::{BvhIndex, BvhNode, IndexStats, NodeId};
