use serde::{Deserialize, Serialize};

use crate::error::{Result, TzError};

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    /// Build a point without range checks.
    ///
    /// The resolution core assumes its caller already validated the input.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn try_new(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(TzError::Input(format!(
                "coordinates must be finite, got ({lon}, {lat})"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(TzError::Input(format!(
                "longitude {lon} outside [-180, 180]"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(TzError::Input(format!("latitude {lat} outside [-90, 90]")));
        }
        Ok(Self { lon, lat })
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<[f64; 2]> for Point {
    fn from(p: [f64; 2]) -> Self {
        Point::new(p[0], p[1])
    }
}

/// Axis-aligned bounding box in lon/lat, inclusive on all four bounds.
///
/// Serialized as `[[min_x, min_y], [max_x, max_y]]`; deserialization
/// rejects inverted or non-finite corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct BoundingBox {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl BoundingBox {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Result<Self> {
        if min.iter().chain(max.iter()).any(|v| !v.is_finite()) {
            return Err(TzError::Artifact(format!(
                "bounding box corners must be finite: {min:?} {max:?}"
            )));
        }
        if min[0] > max[0] || min[1] > max[1] {
            return Err(TzError::Artifact(format!(
                "inverted bounding box: min {min:?} max {max:?}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Smallest box enclosing every point, or `None` for an empty slice.
    pub fn from_points(points: &[[f64; 2]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bb = BoundingBox {
            min: *first,
            max: *first,
        };
        for p in rest {
            bb.min[0] = bb.min[0].min(p[0]);
            bb.min[1] = bb.min[1].min(p[1]);
            bb.max[0] = bb.max[0].max(p[0]);
            bb.max[1] = bb.max[1].max(p[1]);
        }
        Some(bb)
    }

    /// Whether a point lies inside (or on the boundary of) the box.
    pub fn contains_point(&self, p: Point) -> bool {
        p.lon >= self.min[0] && p.lon <= self.max[0] && p.lat >= self.min[1] && p.lat <= self.max[1]
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.min[0] >= self.min[0]
            && other.max[0] <= self.max[0]
            && other.min[1] >= self.min[1]
            && other.max[1] <= self.max[1]
    }

    /// Return the smallest box that contains both `self` and `other`.
    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }
}

impl TryFrom<[[f64; 2]; 2]> for BoundingBox {
    type Error = TzError;

    fn try_from(corners: [[f64; 2]; 2]) -> Result<Self> {
        BoundingBox::new(corners[0], corners[1])
    }
}

impl From<BoundingBox> for [[f64; 2]; 2] {
    fn from(bb: BoundingBox) -> Self {
        [bb.min, bb.max]
    }
}
