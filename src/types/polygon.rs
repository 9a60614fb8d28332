use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use super::geometry::BoundingBox;

/// Reference to one ring owned by one timezone.
///
/// A timezone with several disjoint areas owns several refs sharing the
/// same `timezone_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRef {
    #[serde(rename = "tz")]
    pub timezone_id: String,
    #[serde(rename = "i")]
    pub ring_index: u32,
    #[serde(rename = "b")]
    pub bbox: BoundingBox,
    /// Ring directory name exactly as the artifact spelled the id. `None`
    /// means the directory is the canonical encoding of `timezone_id`.
    #[serde(rename = "dir", default, skip_serializing_if = "Option::is_none")]
    pub dir_name: Option<String>,
}

impl PolygonRef {
    pub fn key(&self) -> RingKey {
        let key = RingKey::new(self.timezone_id.clone(), self.ring_index);
        match &self.dir_name {
            Some(dir) => key.with_dir_name(dir.clone()),
            None => key,
        }
    }

    pub fn is_ring(&self, timezone_id: &str, ring_index: u32) -> bool {
        self.ring_index == ring_index && self.timezone_id == timezone_id
    }
}

/// Cache and storage key of a ring.
///
/// Identity (equality, hashing, ordering) is `(timezone_id, ring_index)`.
/// `dir_name` only tells a filesystem source where the ring lives.
#[derive(Debug, Clone)]
pub struct RingKey {
    pub timezone_id: String,
    pub ring_index: u32,
    pub dir_name: Option<String>,
}

impl RingKey {
    pub fn new(timezone_id: impl Into<String>, ring_index: u32) -> Self {
        Self {
            timezone_id: timezone_id.into(),
            ring_index,
            dir_name: None,
        }
    }

    pub fn with_dir_name(mut self, dir_name: impl Into<String>) -> Self {
        self.dir_name = Some(dir_name.into());
        self
    }
}

impl PartialEq for RingKey {
    fn eq(&self, other: &Self) -> bool {
        self.ring_index == other.ring_index && self.timezone_id == other.timezone_id
    }
}

impl Eq for RingKey {}

impl Hash for RingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.timezone_id.hash(state);
        self.ring_index.hash(state);
    }
}

impl PartialOrd for RingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.timezone_id, self.ring_index).cmp(&(&other.timezone_id, other.ring_index))
    }
}

impl std::fmt::Display for RingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.timezone_id, self.ring_index)
    }
}

/// Ordered, implicitly closed vertex ring in (lon, lat) degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRing {
    /// Hole-free polygon whose exterior is the closed ring: the first vertex
    /// is repeated at the end when the source data did not already close it.
    polygon: Polygon<f64>,
    /// Number of vertices as decoded, excluding any synthesized closing vertex.
    vertex_count: usize,
    bbox: Option<BoundingBox>,
}

impl PolygonRing {
    pub fn new(vertices: Vec<[f64; 2]>) -> Self {
        let vertex_count = vertices.len();
        let bbox = BoundingBox::from_points(&vertices);
        let exterior: LineString<f64> = vertices
            .into_iter()
            .map(|[x, y]| Coord { x, y })
            .collect();

        Self {
            polygon: Polygon::new(exterior, Vec::new()),
            vertex_count,
            bbox,
        }
    }

    /// Number of vertices in the ring as stored.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Bounding box of the vertices, `None` for an empty ring.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    /// The vertices as stored, without the implicit closing edge.
    pub fn vertices(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.polygon
            .exterior()
            .0
            .iter()
            .take(self.vertex_count)
            .map(|c| [c.x, c.y])
    }

    /// The ring as a closed `LineString`.
    pub fn as_line_string(&self) -> &LineString<f64> {
        self.polygon.exterior()
    }
}
