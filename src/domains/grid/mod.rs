pub mod cell;
pub mod line;
pub mod pathfinder;

pub use cell::GridCell;
pub use line::LineSeg;
pub use pathfinder::{PathFinder, PathRequest};

use crate::common::Point2;
use crate::domains::vision::Detection;

/// Static planning lattice over the camera frame. The shape never changes
/// after creation; walls and clearance are recomputed together on demand,
/// and the marker-occupancy overlay is refreshed every tick.
#[derive(Debug, Clone)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cell_size: u32,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Build the lattice for a frame of the given pixel dimensions. Cell
    /// (i, j) spans `[i*cell_size, (i+1)*cell_size) x [j*cell_size,
    /// (j+1)*cell_size)`.
    pub fn new(frame_width: u32, frame_height: u32, cell_size: u32) -> Self {
        let cols = frame_width.div_ceil(cell_size) as usize;
        let rows = frame_height.div_ceil(cell_size) as usize;
        let size = cell_size as f32;

        let mut cells = Vec::with_capacity(cols * rows);
        for i in 0..cols {
            for j in 0..rows {
                cells.push(GridCell::new(
                    i as f32 * size,
                    j as f32 * size,
                    (i + 1) as f32 * size,
                    (j + 1) as f32 * size,
                    (i, j),
                ));
            }
        }

        Self {
            cols,
            rows,
            cell_size,
            cells,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn cell(&self, index: (usize, usize)) -> &GridCell {
        &self.cells[index.0 * self.rows + index.1]
    }

    pub fn cell_mut(&mut self, index: (usize, usize)) -> &mut GridCell {
        &mut self.cells[index.0 * self.rows + index.1]
    }

    pub fn in_bounds(&self, i: isize, j: isize) -> bool {
        i >= 0 && j >= 0 && (i as usize) < self.cols && (j as usize) < self.rows
    }

    /// Cell index a pixel point maps to, by rounding to the nearest cell
    /// origin. `None` when the point falls off the lattice.
    pub fn index_for_point(&self, p: Point2) -> Option<(usize, usize)> {
        let i = (p.x / self.cell_size as f32).round() as isize;
        let j = (p.y / self.cell_size as f32).round() as isize;
        if self.in_bounds(i, j) {
            Some((i as usize, j as usize))
        } else {
            None
        }
    }

    /// Mark every cell crossed (or fully entered) by one of the segments as
    /// walled. Clearance must be recomputed afterwards.
    pub fn detect_walls(&mut self, segments: &[LineSeg]) {
        for cell in &mut self.cells {
            for seg in segments {
                cell.check_wall(seg);
                if cell.has_wall {
                    break;
                }
            }
        }
    }

    /// Recompute clearance for every cell from the current wall layout.
    ///
    /// A non-wall cell holds clearance r when the square rings up to radius
    /// r around it are fully in bounds and wall-free; the scan stops at the
    /// first failing radius and a partial failure invalidates that whole
    /// radius. Every non-wall cell keeps at least clearance 1.
    pub fn add_clearance(&mut self) {
        let mut clearances = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            if cell.has_wall {
                clearances.push(0);
                continue;
            }
            let (i, j) = (cell.index.0 as isize, cell.index.1 as isize);
            let mut radius: isize = 1;
            while self.ring_clear(i, j, radius + 1) {
                radius += 1;
            }
            clearances.push(radius as u32);
        }
        for (cell, clearance) in self.cells.iter_mut().zip(clearances) {
            cell.clearance = clearance;
        }
    }

    fn ring_clear(&self, i: isize, j: isize, r: isize) -> bool {
        let (min_i, max_i) = (i - r, i + r);
        let (min_j, max_j) = (j - r, j + r);
        if min_i < 0
            || min_j < 0
            || max_i >= self.cols as isize
            || max_j >= self.rows as isize
        {
            return false;
        }
        for x in min_i..=max_i {
            if self.cell((x as usize, min_j as usize)).has_wall
                || self.cell((x as usize, max_j as usize)).has_wall
            {
                return false;
            }
        }
        for y in (min_j + 1)..max_j {
            if self.cell((min_i as usize, y as usize)).has_wall
                || self.cell((max_i as usize, y as usize)).has_wall
            {
                return false;
            }
        }
        true
    }

    /// Refresh the per-tick marker-occupancy overlay on every cell.
    pub fn refresh_occupancy(&mut self, detections: &[Detection]) {
        for cell in &mut self.cells {
            cell.refresh_occupant(detections);
        }
    }
}
