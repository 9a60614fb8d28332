use geo::Coord;
use geo::kernels::{Kernel, Orientation, RobustKernel};

use crate::types::{Point, PolygonRing};

/// Position of a point relative to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    Outside,
    Boundary,
}

impl Containment {
    /// Inside-or-boundary counts as a match, so a point on a seam shared by
    /// two timezones is claimed by at least one of them.
    pub fn is_match(self) -> bool {
        matches!(self, Containment::Inside | Containment::Boundary)
    }
}

/// Classify `point` against the ring, including its implicit closing edge.
///
/// Inside means an odd number of edge crossings (even-odd rule), so a
/// region a self-overlapping ring winds twice is outside. Orientation
/// tests use `geo`'s exact predicates, so points on or very near edges
/// and shared vertices are classified consistently. Holes are not
/// considered; a ring is a single outer boundary.
pub fn classify(ring: &PolygonRing, point: Point) -> Containment {
    if ring.is_empty() {
        return Containment::Outside;
    }
    if let Some(bb) = ring.bbox() {
        if !bb.contains_point(point) {
            return Containment::Outside;
        }
    }

    let p = Coord {
        x: point.lon,
        y: point.lat,
    };
    let mut inside = false;
    for edge in ring.as_line_string().lines() {
        let (a, b) = (edge.start, edge.end);
        let orientation = RobustKernel::orient2d(a, b, p);

        if orientation == Orientation::Collinear && within_span(a, b, p) {
            return Containment::Boundary;
        }
        // Half-open on y so a ray through a vertex counts it once.
        if (a.y > p.y) != (b.y > p.y) {
            let crosses = match orientation {
                Orientation::CounterClockwise => b.y > a.y,
                Orientation::Clockwise => a.y > b.y,
                Orientation::Collinear => false,
            };
            if crosses {
                inside = !inside;
            }
        }
    }

    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// `p` lies within the axis-aligned span of segment `a`-`b`.
fn within_span(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> bool {
    a.x.min(b.x) <= p.x && p.x <= a.x.max(b.x) && a.y.min(b.y) <= p.y && p.y <= a.y.max(b.y)
}
