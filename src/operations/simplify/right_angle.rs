use std::collections::HashMap;

use geo::{Area, BooleanOps, Coord, Rect};

use crate::error::{GeometryError, Result};
use crate::geometry::Polygon;
use crate::math::polygon_2d::{point_in_ring, remove_collinear, ring_area, signed_area_2d};
use crate::math::{Point2, TOLERANCE};
use crate::operations::query::Iou;

use super::{simplify_holes, StrategyContext};

/// Upper bound on the grid phases tried along each axis.
pub const MAX_PHASES_PER_AXIS: u32 = 64;

/// Rectilinear approximation on a grid aligned with the building orientation.
///
/// A grid cell is filled when the polygon covers at least half of it; the
/// boundary of the filled cells becomes the simplified polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RightAngle {
    resolution: f64,
    offset: Option<(f64, f64)>,
}

impl RightAngle {
    /// Creates a new strategy with cell size `resolution`.
    ///
    /// Without an explicit offset every integer grid phase is tried.
    #[must_use]
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            offset: None,
        }
    }

    /// Fixes the grid phase `(dx, dy)`.
    #[must_use]
    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = Some((dx, dy));
        self
    }

    /// Simplifies `polygon` in the frame rotated by `-ctx.orientation`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the input has fewer than 3
    /// vertices or no grid phase fills any cell.
    pub fn execute(&self, polygon: &Polygon, ctx: &StrategyContext) -> Result<Polygon> {
        if polygon.contour().len() < 3 {
            return Err(GeometryError::Degenerate("contour has fewer than 3 vertices".to_owned()).into());
        }
        if self.resolution <= 0.0 {
            return Err(GeometryError::InvalidParameters(format!(
                "RightAngle resolution {} must be positive",
                self.resolution
            ))
            .into());
        }

        let aligned = polygon.rotated(-ctx.orientation);
        let result = match self.offset {
            Some((dx, dy)) => self.rasterize(&aligned, dx, dy, ctx.min_hole_ratio)?,
            None => self.best_phase(&aligned, ctx.min_hole_ratio)?,
        };
        Ok(result.rotated(ctx.orientation))
    }

    /// Tries every integer phase in `[0, resolution)` along both axes and
    /// keeps the one with the highest IOU; the first wins ties.
    ///
    /// Phases past the polygon's extent place no interior grid line, so
    /// each axis stops there, and at `MAX_PHASES_PER_AXIS`.
    fn best_phase(&self, aligned: &Polygon, min_hole_ratio: f64) -> Result<Polygon> {
        let Some((min, max)) = aligned.bounding_box() else {
            return Err(GeometryError::Degenerate("empty contour".to_owned()).into());
        };
        let x_steps = phase_count(self.resolution, max.x - min.x);
        let y_steps = phase_count(self.resolution, max.y - min.y);
        let mut best: Option<(Polygon, f64)> = None;
        let mut last_err = None;
        for dx in 0..x_steps {
            for dy in 0..y_steps {
                match self.rasterize(aligned, f64::from(dx), f64::from(dy), min_hole_ratio) {
                    Ok(candidate) => {
                        let iou = Iou::new(&candidate, aligned).execute();
                        if best.as_ref().map_or(true, |(_, b)| iou > *b) {
                            best = Some((candidate, iou));
                        }
                    }
                    Err(e) => last_err = Some(e),
                }
            }
        }
        match (best, last_err) {
            (Some((poly, _)), _) => Ok(poly),
            (None, Some(e)) => Err(e),
            (None, None) => Err(GeometryError::Degenerate("no grid phase evaluated".to_owned()).into()),
        }
    }

    fn rasterize(&self, aligned: &Polygon, dx: f64, dy: f64, min_hole_ratio: f64) -> Result<Polygon> {
        let Some((min, max)) = aligned.bounding_box() else {
            return Err(GeometryError::Degenerate("empty contour".to_owned()).into());
        };
        let xs = grid_lines(min.x, max.x, self.resolution, dx);
        let ys = grid_lines(min.y, max.y, self.resolution, dy);
        let grid = CellGrid::fill(&xs, &ys, aligned);

        let mut outer: Option<(Vec<Point2>, f64)> = None;
        let mut inner: Vec<(Vec<Point2>, Point2)> = Vec::new();
        for ring in grid.boundary_loops() {
            let sample = Point2::from((ring[0].coords + ring[1].coords) * 0.5);
            let signed = signed_area_2d(&ring);
            if signed > TOLERANCE {
                if outer.as_ref().map_or(true, |(_, a)| signed > *a) {
                    outer = Some((ring, signed));
                }
            } else if signed < -TOLERANCE {
                inner.push((ring, sample));
            }
        }

        let Some((outer, _)) = outer else {
            return Err(GeometryError::Degenerate(format!(
                "no grid cell at resolution {} is half covered",
                self.resolution
            ))
            .into());
        };
        let contour = remove_collinear(&outer);
        if contour.len() < 3 {
            return Err(GeometryError::Degenerate("grid outline collapsed".to_owned()).into());
        }

        let enclosed: Vec<Vec<Point2>> = inner
            .into_iter()
            .filter(|(_, sample)| point_in_ring(sample, &outer))
            .map(|(ring, _)| ring)
            .collect();
        let holes = simplify_holes(&enclosed, ring_area(&contour), min_hole_ratio, remove_collinear);
        Ok(Polygon::new(contour, holes))
    }
}

/// Number of integer phases worth trying along an axis of length `extent`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn phase_count(resolution: f64, extent: f64) -> u32 {
    let limit = resolution.min(extent.floor() + 1.0).min(f64::from(MAX_PHASES_PER_AXIS));
    // Bounded to [1, MAX_PHASES_PER_AXIS], so the cast is exact.
    limit.ceil().max(1.0) as u32
}

/// Grid line coordinates covering `[min, max]`: the interval ends plus every
/// `min + offset + k * resolution` strictly inside.
fn grid_lines(min: f64, max: f64, resolution: f64, offset: f64) -> Vec<f64> {
    let eps = resolution * 1e-6;
    let mut lines = vec![min];
    let mut k = 0.0;
    loop {
        let x = min + offset + k * resolution;
        if x >= max - eps {
            break;
        }
        if lines.last().map_or(true, |&last| x > last + eps) {
            lines.push(x);
        }
        k += 1.0;
    }
    lines.push(max);
    lines
}

/// Area of `shape` (holes excluded) inside the axis-aligned cell
/// `[min, max]`.
fn cell_coverage(shape: &geo::Polygon<f64>, min: Point2, max: Point2) -> f64 {
    let cell = Rect::new(Coord { x: min.x, y: min.y }, Coord { x: max.x, y: max.y });
    shape.intersection(&cell.to_polygon()).unsigned_area()
}

/// Direction of a boundary edge: `+x`, `+y`, `-x`, `-y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    East,
    North,
    West,
    South,
}

impl Dir {
    fn left(self) -> Self {
        match self {
            Self::East => Self::North,
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
        }
    }

    fn right(self) -> Self {
        match self {
            Self::East => Self::South,
            Self::North => Self::East,
            Self::West => Self::North,
            Self::South => Self::West,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: (usize, usize),
    dir: Dir,
}

impl Edge {
    fn to(self) -> (usize, usize) {
        let (i, j) = self.from;
        match self.dir {
            Dir::East => (i + 1, j),
            Dir::North => (i, j + 1),
            Dir::West => (i - 1, j),
            Dir::South => (i, j - 1),
        }
    }
}

struct CellGrid<'a> {
    xs: &'a [f64],
    ys: &'a [f64],
    filled: Vec<bool>,
}

impl<'a> CellGrid<'a> {
    fn fill(xs: &'a [f64], ys: &'a [f64], polygon: &Polygon) -> Self {
        let (nx, ny) = (xs.len() - 1, ys.len() - 1);
        let shape = polygon.to_geo();
        let mut filled = vec![false; nx * ny];
        for j in 0..ny {
            for i in 0..nx {
                let (min, max) = (Point2::new(xs[i], ys[j]), Point2::new(xs[i + 1], ys[j + 1]));
                let area = (max.x - min.x) * (max.y - min.y);
                filled[j * nx + i] = area > TOLERANCE && cell_coverage(&shape, min, max) >= 0.5 * area;
            }
        }
        Self { xs, ys, filled }
    }

    fn is_filled(&self, i: isize, j: isize) -> bool {
        let (nx, ny) = (self.xs.len() - 1, self.ys.len() - 1);
        match (usize::try_from(i), usize::try_from(j)) {
            (Ok(i), Ok(j)) if i < nx && j < ny => self.filled[j * nx + i],
            _ => false,
        }
    }

    /// Directed boundary edges with the filled region on their left.
    fn edges(&self) -> Vec<Edge> {
        let (nx, ny) = (self.xs.len() - 1, self.ys.len() - 1);
        let mut edges = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                #[allow(clippy::cast_possible_wrap)]
                let (ci, cj) = (i as isize, j as isize);
                if !self.is_filled(ci, cj) {
                    continue;
                }
                if !self.is_filled(ci, cj - 1) {
                    edges.push(Edge { from: (i, j), dir: Dir::East });
                }
                if !self.is_filled(ci + 1, cj) {
                    edges.push(Edge { from: (i + 1, j), dir: Dir::North });
                }
                if !self.is_filled(ci, cj + 1) {
                    edges.push(Edge { from: (i + 1, j + 1), dir: Dir::West });
                }
                if !self.is_filled(ci - 1, cj) {
                    edges.push(Edge { from: (i, j + 1), dir: Dir::South });
                }
            }
        }
        edges
    }

    /// Closed boundary loops, taking the left-most turn at saddle vertices
    /// so that diagonally touching cells yield separate loops.
    fn boundary_loops(&self) -> Vec<Vec<Point2>> {
        let edges = self.edges();
        let mut outgoing: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (k, e) in edges.iter().enumerate() {
            outgoing.entry(e.from).or_default().push(k);
        }
        let successor = |k: usize| -> Option<usize> {
            let e = edges[k];
            let candidates = outgoing.get(&e.to())?;
            [e.dir.left(), e.dir, e.dir.right()]
                .into_iter()
                .find_map(|d| candidates.iter().copied().find(|&c| edges[c].dir == d))
        };

        let mut used = vec![false; edges.len()];
        let mut loops = Vec::new();
        for start in 0..edges.len() {
            if used[start] {
                continue;
            }
            let mut ring = Vec::new();
            let mut k = start;
            loop {
                used[k] = true;
                let (i, j) = edges[k].from;
                ring.push(Point2::new(self.xs[i], self.ys[j]));
                match successor(k) {
                    Some(next) if next != start && !used[next] => k = next,
                    _ => break,
                }
            }
            if ring.len() >= 4 {
                loops.push(ring);
            }
        }
        loops
    }
}
