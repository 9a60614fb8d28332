use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bvh::{BvhIndex, BvhNode, NodeId};
use crate::error::{Result, TzError};
use crate::store::source::{decode_timezone_id, encode_timezone_id};
use crate::types::{BoundingBox, PolygonRef};

/// On-disk layout of the hierarchy artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    /// Nested tree `{ "b", "l", "r", "p" }` with URI-encoded timezone ids.
    #[default]
    Nested,
    /// Flat arena as written by [`BvhIndex::save`].
    Arena,
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactFormat::Nested => write!(f, "nested"),
            ArtifactFormat::Arena => write!(f, "arena"),
        }
    }
}

/// One node of the nested layout.
#[derive(Debug, Deserialize)]
struct NestedNode {
    b: BoundingBox,
    #[serde(default)]
    l: Option<Box<NestedNode>>,
    #[serde(default)]
    r: Option<Box<NestedNode>>,
    #[serde(default)]
    p: Vec<PolygonRef>,
}

/// Arena layout file.
#[derive(Debug, Serialize, Deserialize)]
struct ArenaFile {
    nodes: Vec<BvhNode>,
}

impl BvhIndex {
    /// Load the hierarchy artifact. Any failure here is fatal for the
    /// process: without the index no query can be served.
    pub fn load(path: &Path, format: ArtifactFormat) -> Result<Self> {
        if !path.exists() {
            return Err(TzError::Artifact(format!(
                "BVH artifact not found: {}",
                path.display()
            )));
        }

        let bytes = fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), format = %format, "Read BVH artifact");

        let index = match format {
            ArtifactFormat::Nested => Self::from_nested_json(&bytes),
            ArtifactFormat::Arena => Self::from_arena_json(&bytes),
        }
        .map_err(|e| {
            TzError::Artifact(format!("malformed BVH artifact {}: {e}", path.display()))
        })?;

        let stats = index.stats();
        info!(
            path = %path.display(),
            nodes = stats.nodes,
            leaves = stats.leaves,
            polygon_refs = stats.polygon_refs,
            depth = stats.depth,
            "Loaded BVH index"
        );
        Ok(index)
    }

    /// Parse the nested layout and flatten it into an arena.
    pub fn from_nested_json(bytes: &[u8]) -> Result<Self> {
        let root: NestedNode = serde_json::from_slice(bytes)?;
        let mut nodes = Vec::new();
        flatten(root, &mut nodes)?;
        Self::from_nodes(nodes)
    }

    pub fn from_arena_json(bytes: &[u8]) -> Result<Self> {
        let file: ArenaFile = serde_json::from_slice(bytes)?;
        Self::from_nodes(file.nodes)
    }

    /// Serialize to the arena layout.
    pub fn to_arena_json(&self) -> Result<Vec<u8>> {
        let file = ArenaFile {
            nodes: self.nodes().to_vec(),
        };
        Ok(serde_json::to_vec(&file)?)
    }

    /// Write the arena layout to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_arena_json()?)?;
        info!(path = %path.display(), nodes = self.nodes().len(), "Wrote BVH arena");
        Ok(())
    }
}

fn push(nodes: &mut Vec<BvhNode>, node: BvhNode) -> Result<NodeId> {
    let id = u32::try_from(nodes.len())
        .map_err(|_| TzError::Artifact("hierarchy exceeds u32 node handles".into()))?;
    nodes.push(node);
    Ok(NodeId(id))
}

/// Decode the ids of a leaf's refs. Ring files live under the id as the
/// artifact spells it, so a spelling other than the canonical encoding is
/// kept as the ref's directory name.
fn leaf(bbox: BoundingBox, refs: Vec<PolygonRef>) -> Result<BvhNode> {
    let polygons = refs
        .into_iter()
        .map(|mut p| {
            let raw = std::mem::take(&mut p.timezone_id);
            p.timezone_id = decode_timezone_id(&raw)?;
            if encode_timezone_id(&p.timezone_id) != raw {
                p.dir_name = Some(raw);
            }
            Ok(p)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(BvhNode::Leaf { bbox, polygons })
}

/// Pre-order flattening: a parent is pushed before its children, so child
/// handles are always greater than the parent's.
///
/// Only nodes without a left child are leaves in the nested layout; refs
/// on any node with an `l` are ignored. A node with a single child
/// collapses into that child. A node with only an `r` child that also
/// carries refs becomes an extra leaf ahead of the child.
fn flatten(node: NestedNode, nodes: &mut Vec<BvhNode>) -> Result<NodeId> {
    let NestedNode { b, l, r, p } = node;

    match (l, r) {
        (None, None) => push(nodes, leaf(b, p)?),
        (Some(only), None) => {
            if !p.is_empty() {
                debug!(refs = p.len(), "Ignoring refs on a node with a left child");
            }
            flatten(*only, nodes)
        }
        (None, Some(only)) if p.is_empty() => flatten(*only, nodes),
        (None, Some(only)) => {
            let id = push(nodes, placeholder(b))?;
            let refs = push(nodes, leaf(b, p)?)?;
            let child = flatten(*only, nodes)?;
            nodes[id.index()] = BvhNode::Internal {
                bbox: b,
                children: [refs, child],
            };
            Ok(id)
        }
        (Some(left), Some(right)) => {
            if !p.is_empty() {
                debug!(refs = p.len(), "Ignoring refs on a node with a left child");
            }
            let id = push(nodes, placeholder(b))?;
            let left = flatten(*left, nodes)?;
            let right = flatten(*right, nodes)?;
            nodes[id.index()] = BvhNode::Internal {
                bbox: b,
                children: [left, right],
            };
            Ok(id)
        }
    }
}

fn placeholder(bbox: BoundingBox) -> BvhNode {
    BvhNode::Leaf {
        bbox,
        polygons: Vec::new(),
    }
}
