use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TzError};
use crate::types::{BoundingBox, Point, PolygonRef};

/// Handle of a node inside a [`BvhIndex`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the bounding volume hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BvhNode {
    Internal {
        bbox: BoundingBox,
        children: [NodeId; 2],
    },
    Leaf {
        bbox: BoundingBox,
        polygons: Vec<PolygonRef>,
    },
}

impl BvhNode {
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            BvhNode::Internal { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }

    /// Whether this node is a leaf (no children).
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }
}

/// Shape summary of a loaded hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub nodes: usize,
    pub leaves: usize,
    pub polygon_refs: usize,
    pub depth: usize,
}

/// Immutable BVH over timezone polygon refs, stored as a flat arena with
/// the root at index 0.
///
/// Every child handle is greater than its parent's handle, so the arena is
/// acyclic and can be walked without a visited set.
#[derive(Debug, Clone, PartialEq)]
pub struct BvhIndex {
    nodes: Vec<BvhNode>,
}

impl BvhIndex {
    /// Build an index from arena nodes, validating the handles.
    pub fn from_nodes(nodes: Vec<BvhNode>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(TzError::Index("hierarchy has no root node".into()));
        }

        let mut loose_boxes = 0usize;
        for (i, node) in nodes.iter().enumerate() {
            match node {
                BvhNode::Internal { bbox, children } => {
                    for child in children {
                        let c = child.index();
                        if c >= nodes.len() || c <= i {
                            return Err(TzError::Index(format!(
                                "node {i} has invalid child handle {c} (arena size {})",
                                nodes.len()
                            )));
                        }
                        if !bbox.contains_box(nodes[c].bbox()) {
                            loose_boxes += 1;
                        }
                    }
                }
                BvhNode::Leaf { bbox, polygons } => {
                    loose_boxes += polygons.iter().filter(|p| !bbox.contains_box(&p.bbox)).count();
                }
            }
        }

        if loose_boxes > 0 {
            // Descent only enters boxes that contain the point, so content
            // sticking out of its parent box can be missed there.
            warn!(
                loose_boxes,
                "Hierarchy has boxes that are not contained in their parent"
            );
        }

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<BvhNode> {
        self.nodes
    }

    pub fn root(&self) -> &BvhNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Result<&BvhNode> {
        self.nodes.get(id.index()).ok_or_else(|| {
            TzError::Index(format!(
                "node handle {} out of range (arena size {})",
                id.0,
                self.nodes.len()
            ))
        })
    }

    /// Every polygon ref held by any leaf, in arena order.
    pub fn polygon_refs(&self) -> impl Iterator<Item = &PolygonRef> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                BvhNode::Leaf { polygons, .. } => Some(polygons),
                BvhNode::Internal { .. } => None,
            })
            .flatten()
    }

    /// All polygon refs whose bounding box contains `point`.
    ///
    /// Never misses a ref whose own box contains the point, provided every
    /// node box encloses its content. Refs come back in descent order:
    /// pre-order, left child before right. A ring reachable through several
    /// leaves is listed once, at its first position.
    pub fn candidates(&self, point: Point) -> Result<Vec<&PolygonRef>> {
        let mut hits = Vec::new();
        if !self.root().bbox().contains_point(point) {
            return Ok(hits);
        }
        self.descend(NodeId::ROOT, point, &mut hits)?;
        Ok(hits)
    }

    fn descend<'a>(&'a self, id: NodeId, point: Point, hits: &mut Vec<&'a PolygonRef>) -> Result<()> {
        match self.node(id)? {
            BvhNode::Internal { children, .. } => {
                for &child in children {
                    if self.node(child)?.bbox().contains_point(point) {
                        self.descend(child, point, hits)?;
                    }
                }
            }
            BvhNode::Leaf { polygons, .. } => {
                for p in polygons.iter().filter(|p| p.bbox.contains_point(point)) {
                    let seen = hits
                        .iter()
                        .any(|h| h.is_ring(&p.timezone_id, p.ring_index));
                    if !seen {
                        hits.push(p);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        let leaves = self.nodes.iter().filter(|n| n.is_leaf()).count();
        IndexStats {
            nodes: self.nodes.len(),
            leaves,
            polygon_refs: self.polygon_refs().count(),
            depth: self.depth(NodeId::ROOT),
        }
    }

    /// Levels below and including `id` on the deepest path.
    fn depth(&self, id: NodeId) -> usize {
        match self.nodes.get(id.index()) {
            Some(BvhNode::Internal { children, .. }) => {
                1 + children.iter().map(|&c| self.depth(c)).max().unwrap_or(0)
            }
            Some(BvhNode::Leaf { .. }) => 1,
            None => 0,
        }
    }
}
