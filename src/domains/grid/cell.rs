use super::line::LineSeg;
use crate::common::Point2;
use crate::domains::vision::Detection;

/// One cell of the planning lattice. The shape fields are fixed at grid
/// creation; wall and clearance mutate only during the wall-detection and
/// clearance passes, the occupant during the per-tick overlay refresh, and
/// the search fields only inside a path search working on its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub index: (usize, usize),
    /// Corners ordered top-left, top-right, bottom-right, bottom-left.
    pub corners: [Point2; 4],
    pub center: Point2,
    pub has_wall: bool,
    /// Largest square ring radius around this cell that is fully in bounds
    /// and wall-free. 0 for wall cells, at least 1 otherwise.
    pub clearance: u32,
    /// Marker currently overlapping this cell, if any.
    pub occupant: Option<u32>,
    /// Search backlink as an index pair into the lattice, never a reference.
    pub parent: Option<(usize, usize)>,
    pub g: i64,
    pub h: i64,
    pub f: i64,
}

impl GridCell {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, index: (usize, usize)) -> Self {
        let corners = [
            Point2::new(x1, y1),
            Point2::new(x2, y1),
            Point2::new(x2, y2),
            Point2::new(x1, y2),
        ];
        Self {
            index,
            corners,
            center: corners[0].midpoint(corners[2]),
            has_wall: false,
            clearance: 1,
            occupant: None,
            parent: None,
            g: 0,
            h: 0,
            f: 0,
        }
    }

    /// The four boundary edges: top, right, bottom, left.
    pub fn edges(&self) -> [LineSeg; 4] {
        [
            LineSeg::new(self.corners[0], self.corners[1]),
            LineSeg::new(self.corners[1], self.corners[2]),
            LineSeg::new(self.corners[2], self.corners[3]),
            LineSeg::new(self.corners[3], self.corners[0]),
        ]
    }

    /// Mark the cell walled if the segment crosses any boundary edge, or if
    /// the whole segment lies inside the cell without crossing one.
    pub fn check_wall(&mut self, seg: &LineSeg) {
        if self.has_wall {
            return;
        }
        for edge in self.edges() {
            if edge.intersects(seg) {
                self.set_wall();
                return;
            }
        }
        if self.contains(seg.first()) && self.contains(seg.second()) {
            self.set_wall();
        }
    }

    fn set_wall(&mut self) {
        self.has_wall = true;
        self.clearance = 0;
    }

    /// Refresh the occupancy overlay: the first detection whose bounding
    /// rectangle covers the cell center or any corner claims the cell.
    /// Walled cells never carry an occupant.
    pub fn refresh_occupant(&mut self, detections: &[Detection]) {
        self.occupant = if self.has_wall {
            None
        } else {
            self.occupant_among(detections)
        };
    }

    fn occupant_among(&self, detections: &[Detection]) -> Option<u32> {
        detections
            .iter()
            .find(|det| {
                let (min, max) = detection_rect(det);
                rect_contains(min, max, self.center)
                    || self
                        .corners
                        .iter()
                        .any(|corner| rect_contains(min, max, *corner))
            })
            .map(|det| det.marker_id)
    }

    fn contains(&self, p: Point2) -> bool {
        rect_contains(self.corners[0], self.corners[2], p)
    }
}

/// Bounding rectangle of a detection from its corner-0/corner-2 diagonal.
fn detection_rect(det: &Detection) -> (Point2, Point2) {
    let a = det.corners[0];
    let b = det.corners[2];
    (
        Point2::new(a.x.min(b.x), a.y.min(b.y)),
        Point2::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

/// Half-open containment, matching image-rectangle semantics.
fn rect_contains(min: Point2, max: Point2, p: Point2) -> bool {
    p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y
}
