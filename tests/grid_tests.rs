use botswarm::common::Point2;
use botswarm::domains::grid::{Grid, LineSeg};
use botswarm::domains::vision::Detection;

fn seg(x1: f32, y1: f32, x2: f32, y2: f32) -> LineSeg {
    LineSeg::new(Point2::new(x1, y1), Point2::new(x2, y2))
}

fn marker(id: u32, cx: f32, cy: f32, side: f32) -> Detection {
    let half = side / 2.0;
    Detection::new(
        id,
        [
            Point2::new(cx - half, cy - half),
            Point2::new(cx + half, cy - half),
            Point2::new(cx + half, cy + half),
            Point2::new(cx - half, cy + half),
        ],
    )
}

#[test]
fn lattice_dimensions_round_up() {
    let grid = Grid::new(100, 50, 8);
    assert_eq!(grid.cols(), 13);
    assert_eq!(grid.rows(), 7);

    let cell = grid.cell((1, 2));
    assert_eq!(cell.corners[0], Point2::new(8.0, 16.0));
    assert_eq!(cell.corners[2], Point2::new(16.0, 24.0));
    assert_eq!(cell.center, Point2::new(12.0, 20.0));
}

#[test]
fn crossing_segments_mark_walls() {
    let mut grid = Grid::new(40, 40, 8);
    grid.detect_walls(&[seg(0.0, 20.0, 40.0, 20.0)]);

    for i in 0..grid.cols() {
        assert!(grid.cell((i, 2)).has_wall, "cell ({i}, 2) should be walled");
        assert_eq!(grid.cell((i, 2)).clearance, 0);
        assert!(!grid.cell((i, 0)).has_wall);
    }
}

#[test]
fn a_segment_entirely_inside_a_cell_still_walls_it() {
    let mut grid = Grid::new(40, 40, 8);
    grid.detect_walls(&[seg(17.0, 17.0, 22.0, 22.0)]);

    assert!(grid.cell((2, 2)).has_wall);
    assert!(!grid.cell((1, 2)).has_wall);
    assert!(!grid.cell((2, 1)).has_wall);
}

#[test]
fn clearance_grows_away_from_borders_and_walls() {
    let mut grid = Grid::new(80, 80, 8);
    grid.add_clearance();

    // border cells cannot fit a radius-2 ring
    assert_eq!(grid.cell((0, 0)).clearance, 1);
    assert_eq!(grid.cell((5, 0)).clearance, 1);
    // the lattice is 10x10, so the middle fits rings up to radius 4
    assert_eq!(grid.cell((4, 4)).clearance, 4);
    assert_eq!(grid.cell((2, 2)).clearance, 2);
}

#[test]
fn adding_walls_never_increases_clearance() {
    let mut open = Grid::new(80, 80, 8);
    open.add_clearance();

    let mut walled = Grid::new(80, 80, 8);
    walled.detect_walls(&[seg(0.0, 20.0, 30.0, 20.0)]);
    walled.add_clearance();

    for i in 0..open.cols() {
        for j in 0..open.rows() {
            let before = open.cell((i, j)).clearance;
            let after = walled.cell((i, j)).clearance;
            assert!(after <= before, "clearance grew at ({i}, {j})");
        }
    }

    // and a second wall only shrinks it further
    let mut more = Grid::new(80, 80, 8);
    more.detect_walls(&[seg(0.0, 20.0, 30.0, 20.0), seg(60.0, 0.0, 60.0, 80.0)]);
    more.add_clearance();
    for i in 0..walled.cols() {
        for j in 0..walled.rows() {
            assert!(more.cell((i, j)).clearance <= walled.cell((i, j)).clearance);
        }
    }
}

#[test]
fn every_non_wall_cell_keeps_at_least_clearance_one() {
    let mut grid = Grid::new(48, 48, 8);
    grid.detect_walls(&[seg(0.0, 20.0, 48.0, 20.0), seg(20.0, 0.0, 20.0, 48.0)]);
    grid.add_clearance();

    for i in 0..grid.cols() {
        for j in 0..grid.rows() {
            let cell = grid.cell((i, j));
            if cell.has_wall {
                assert_eq!(cell.clearance, 0);
            } else {
                assert!(cell.clearance >= 1);
            }
        }
    }
}

#[test]
fn occupancy_overlay_claims_covered_cells() {
    let mut grid = Grid::new(80, 80, 8);
    grid.refresh_occupancy(&[marker(9, 20.0, 20.0, 16.0)]);

    // marker spans pixels 12..28 on both axes
    assert_eq!(grid.cell((2, 2)).occupant, Some(9));
    assert_eq!(grid.cell((8, 8)).occupant, None);

    // the overlay is replaced, not accumulated
    grid.refresh_occupancy(&[marker(4, 60.0, 60.0, 16.0)]);
    assert_eq!(grid.cell((2, 2)).occupant, None);
    assert_eq!(grid.cell((7, 7)).occupant, Some(4));
}

#[test]
fn walled_cells_never_carry_an_occupant() {
    let mut grid = Grid::new(80, 80, 8);
    grid.detect_walls(&[seg(12.0, 12.0, 28.0, 28.0)]);
    grid.refresh_occupancy(&[marker(9, 20.0, 20.0, 16.0)]);

    assert!(grid.cell((2, 2)).has_wall);
    assert_eq!(grid.cell((2, 2)).occupant, None);
}

#[test]
fn point_lookup_rounds_to_the_nearest_cell_origin() {
    let grid = Grid::new(80, 80, 8);
    assert_eq!(grid.index_for_point(Point2::new(0.0, 0.0)), Some((0, 0)));
    assert_eq!(grid.index_for_point(Point2::new(20.0, 36.0)), Some((3, 5)));
    assert_eq!(grid.index_for_point(Point2::new(-9.0, 0.0)), None);
    assert_eq!(grid.index_for_point(Point2::new(0.0, 79.0)), None);
}
