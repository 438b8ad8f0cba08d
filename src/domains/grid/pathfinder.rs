use super::{Grid, GridCell};
use crate::domains::vision::{Detection, PixelScale};

/// The eight neighbor offsets of a cell.
const STEPS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const ORTHO_COST: i64 = 10;
const DIAG_COST: i64 = 14;
const HEURISTIC_WEIGHT: i64 = 10;

/// One path query against the current lattice and detection state.
#[derive(Debug, Clone)]
pub struct PathRequest<'a> {
    pub start: (usize, usize),
    pub target: (usize, usize),
    /// Minimum clearance a cell needs to be traversable.
    pub clearance_level: u32,
    /// Marker id of the robot this path is for.
    pub owner_id: u32,
    /// Marker never treated as an obstacle (the pursued robot).
    pub protected_id: Option<u32>,
    /// Whether other tracked markers block cells around them.
    pub avoid_markers: bool,
    pub detections: &'a [Detection],
    pub pixel_scale: Option<PixelScale>,
}

/// 8-connected A* over the lattice with per-query exclusion of tracked
/// markers. Deterministic for identical grid, occupancy and obstacle state.
///
/// The heuristic is 10x the Manhattan index distance, deliberately kept
/// against a 14-cost diagonal step, so the search is fast rather than
/// strictly optimal. Intended to run at a bounded rate, not per rendered
/// frame: each call rebuilds its whole working set.
#[derive(Debug, Clone)]
pub struct PathFinder {
    exclusion_radius_cm: f32,
}

impl PathFinder {
    pub fn new(exclusion_radius_cm: f32) -> Self {
        Self {
            exclusion_radius_cm,
        }
    }

    /// Search for a route. The returned cells run from the one after
    /// `start` through `target` inclusive; an empty vector means no route
    /// (including out-of-bounds endpoints), which callers treat as "hold
    /// position", not as a fault.
    pub fn astar(&self, grid: &Grid, request: &PathRequest) -> Vec<GridCell> {
        let start = request.start;
        let target = request.target;
        if !grid.in_bounds(start.0 as isize, start.1 as isize)
            || !grid.in_bounds(target.0 as isize, target.1 as isize)
        {
            return Vec::new();
        }

        // Search state lives in the cells of a scratch copy of the lattice.
        let mut grid = grid.clone();

        let mut open: Vec<(usize, usize)> = vec![start];
        let mut closed: Vec<(usize, usize)> = Vec::new();

        while !open.is_empty() {
            open.sort_by_key(|&index| grid.cell(index).f);
            let current = open[0];

            if current == target {
                closed.push(current);
                break;
            }

            open.remove(0);
            closed.push(current);

            for step in STEPS {
                let ni = current.0 as isize + step.0;
                let nj = current.1 as isize + step.1;
                if !grid.in_bounds(ni, nj) {
                    continue;
                }
                let neighbor = (ni as usize, nj as usize);
                if closed.contains(&neighbor) {
                    continue;
                }

                {
                    let cell = grid.cell(neighbor);
                    if cell.has_wall
                        || cell.clearance < request.clearance_level
                        || (request.avoid_markers && self.marker_blocks(cell, request))
                    {
                        continue;
                    }
                }

                let step_cost = if step.0 != 0 && step.1 != 0 {
                    DIAG_COST
                } else {
                    ORTHO_COST
                };
                let g = grid.cell(current).g + step_cost;
                let h = HEURISTIC_WEIGHT
                    * ((target.0 as i64 - neighbor.0 as i64).abs()
                        + (target.1 as i64 - neighbor.1 as i64).abs());
                let f = g + h;

                if open.contains(&neighbor) {
                    if g < grid.cell(neighbor).g {
                        let cell = grid.cell_mut(neighbor);
                        cell.parent = Some(current);
                        cell.g = g;
                        cell.h = h;
                        cell.f = f;
                    }
                } else {
                    let cell = grid.cell_mut(neighbor);
                    cell.parent = Some(current);
                    cell.g = g;
                    cell.h = h;
                    cell.f = f;
                    open.push(neighbor);
                }
            }
        }

        if !closed.contains(&target) {
            return Vec::new();
        }

        // Walk the parent indices back from the target, then flip.
        let mut path = Vec::new();
        let mut current = target;
        let mut count = 0;
        while current != start && count < closed.len() {
            let cell = grid.cell(current).clone();
            let parent = cell.parent;
            path.push(cell);
            match parent {
                Some(p) => current = p,
                None => break,
            }
            count += 1;
        }
        path.reverse();
        path
    }

    /// Whether a tracked marker makes this cell impassable. The cell's own
    /// occupant being the path owner always keeps it passable; the pursued
    /// marker and the owner itself never block.
    fn marker_blocks(&self, cell: &GridCell, request: &PathRequest) -> bool {
        let Some(scale) = request.pixel_scale else {
            return false;
        };
        if request.detections.is_empty() {
            return false;
        }
        if cell.occupant == Some(request.owner_id) {
            return false;
        }

        let mut nearest = self.exclusion_radius_cm;
        for det in request.detections {
            if det.marker_id == request.owner_id || Some(det.marker_id) == request.protected_id {
                continue;
            }
            let distance = scale.to_cm(det.center().distance(cell.center));
            if distance < nearest {
                nearest = distance;
            }
        }
        nearest < self.exclusion_radius_cm
    }
}
