//! Procedural jigsaw edges.
//!
//! Every internal edge of the grid gets one perturbed copy of a fixed tab
//! template. Both pieces touching that edge read the same point set and only
//! differ in how they orient it, so neighbouring outlines are congruent by
//! construction.
//!
//! Coordinates live in template space: each side runs from `(0, 0)` to
//! `(EDGE_LENGTH, 0)` in its own frame and a piece spans
//! `EDGE_LENGTH × EDGE_LENGTH`. Renderers scale by the piece size.

use std::fmt::Write;

use crate::geometry::Point;
use crate::grid::GridShape;
use crate::rng::RngState;

pub const EDGE_LENGTH: f64 = 200.0;

/// Per-axis bound for the random offset applied to template points.
pub const EDGE_JITTER: i32 = 5;

/// Share of a piece's size that a tab can reach past its grid cell.
pub const TAB_REACH: f64 = 0.25;

/// Three chained cubic segments (control, control, end) forming one tab.
/// The path starts at the implicit origin; the last point is the far corner.
pub const DEFAULT_POINTS: [Point; 9] = [
    Point::new(70.0, 0.0),
    Point::new(90.0, 5.0),
    Point::new(85.0, -15.0),
    Point::new(75.0, -45.0),
    Point::new(125.0, -45.0),
    Point::new(115.0, -15.0),
    Point::new(110.0, 5.0),
    Point::new(130.0, 0.0),
    Point::new(EDGE_LENGTH, 0.0),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    /// Traversal order of an outline.
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::East => 1,
            Side::South => 2,
            Side::West => 3,
        }
    }

    /// Sides that see their shared edge backwards relative to the neighbour.
    fn is_reversed(self) -> bool {
        matches!(self, Side::South | Side::West)
    }

    /// Quarter turns applied when placing the side frame into the piece frame.
    fn quarter_turns(self) -> u8 {
        match self {
            Side::North => 0,
            Side::East => 1,
            Side::South => 2,
            Side::West => 3,
        }
    }
}

/// Perturbed point set of one shared edge, origin excluded.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCurve {
    points: [Point; 9],
}

impl EdgeCurve {
    /// Eight offsets, then the chirality bit. The terminal point never moves.
    pub fn generate(rng: &mut RngState) -> Self {
        let mut points = DEFAULT_POINTS;
        for p in points.iter_mut().take(8) {
            *p += rng.offset(EDGE_JITTER);
        }
        if rng.coin() {
            for p in points.iter_mut() {
                p.y = -p.y;
            }
        }
        EdgeCurve { points }
    }

    pub fn points(&self) -> &[Point; 9] {
        &self.points
    }

    /// Full sequence including the implicit origin.
    fn with_origin(&self) -> Vec<Point> {
        let mut out = Vec::with_capacity(10);
        out.push(Point::ORIGIN);
        out.extend_from_slice(&self.points);
        out
    }
}

/// One curve per internal edge, horizontal edges first.
pub fn generate_edges(grid: GridShape, rng: &mut RngState) -> Vec<EdgeCurve> {
    (0..grid.edge_count())
        .map(|_| EdgeCurve::generate(rng))
        .collect()
}

/// Shared edge index of `side` of `piece`, `None` on the puzzle border.
///
/// Horizontal edges (between a piece and the one below) are numbered
/// `row·nx + col`; vertical edges follow at `nx·(ny−1) + row·(nx−1) + col`.
pub fn edge_index(grid: GridShape, side: Side, piece: usize) -> Option<usize> {
    if piece >= grid.piece_count() {
        return None;
    }
    let col = grid.col(piece);
    let row = grid.row(piece);
    let vertical_base = grid.nx * (grid.ny - 1);
    match side {
        Side::North => (row > 0).then(|| (row - 1) * grid.nx + col),
        Side::South => (row + 1 < grid.ny).then(|| row * grid.nx + col),
        Side::West => (col > 0).then(|| vertical_base + row * (grid.nx - 1) + col - 1),
        Side::East => (col + 1 < grid.nx).then(|| vertical_base + row * (grid.nx - 1) + col),
    }
}

/// Orients a full edge sequence (origin first) for `side`, in that side's frame.
///
/// North and East keep the points. South and West walk the edge backwards:
/// the sequence is reversed and every point reflected through the midpoint `m`
/// of the end points, giving `2·m − p`. The end points stay on the corners.
pub fn orient(points: &[Point], side: Side) -> Vec<Point> {
    if !side.is_reversed() {
        return points.to_vec();
    }
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let twice_mid = *first + *last;
    points.iter().rev().map(|p| twice_mid - *p).collect()
}

/// Maps a side-frame point into the piece frame by the side's rigid placement.
pub fn place(p: Point, side: Side) -> Point {
    let l = EDGE_LENGTH;
    match side.quarter_turns() {
        0 => p,
        1 => Point::new(l - p.y, p.x),
        2 => Point::new(l - p.x, l - p.y),
        _ => Point::new(p.y, l - p.x),
    }
}

fn flat_edge() -> Vec<Point> {
    vec![Point::ORIGIN, Point::new(EDGE_LENGTH, 0.0)]
}

/// Outline of a single piece as four point sequences in the piece frame.
///
/// Each sequence starts at the corner where the previous one ended. Border
/// sides hold two points, shared sides ten (origin plus three cubic segments).
#[derive(Clone, Debug, PartialEq)]
pub struct PieceOutline {
    sides: [Vec<Point>; 4],
}

impl PieceOutline {
    pub fn build(grid: GridShape, piece: usize, edges: &[EdgeCurve]) -> Self {
        let sides = Side::ALL.map(|side| {
            let raw = edge_index(grid, side, piece)
                .and_then(|i| edges.get(i))
                .map(EdgeCurve::with_origin)
                .unwrap_or_else(flat_edge);
            orient(&raw, side)
                .into_iter()
                .map(|p| place(p, side))
                .collect()
        });
        PieceOutline { sides }
    }

    pub fn side(&self, side: Side) -> &[Point] {
        &self.sides[side.index()]
    }

    pub fn is_flat(&self, side: Side) -> bool {
        self.side(side).len() == 2
    }

    /// SVG path data with every point mapped through `to_px`.
    pub fn path_with<F>(&self, to_px: F) -> String
    where
        F: Fn(Point) -> (f64, f64),
    {
        let (x0, y0) = to_px(Point::ORIGIN);
        let mut out = format!("M {} {}", fmt_coord(x0), fmt_coord(y0));
        for pts in &self.sides {
            if pts.len() == 2 {
                let (x, y) = to_px(pts[1]);
                let _ = write!(out, " L {} {}", fmt_coord(x), fmt_coord(y));
                continue;
            }
            for seg in pts[1..].chunks(3) {
                out.push_str(" C");
                for p in seg {
                    let (x, y) = to_px(*p);
                    let _ = write!(out, " {} {}", fmt_coord(x), fmt_coord(y));
                }
            }
        }
        out.push_str(" Z");
        out
    }

    /// Path data in template units.
    pub fn path(&self) -> String {
        self.path_with(|p| (p.x, p.y))
    }
}

fn fmt_coord(v: f64) -> String {
    // Avoid "-0" from mirrored zeros.
    let v = if v == 0.0 { 0.0 } else { v };
    let rounded = (v * 100.0).round() / 100.0;
    format!("{rounded}")
}

/// Outlines for every piece of one grid, built once per grid shape.
#[derive(Clone, Debug)]
pub struct OutlineCache {
    grid: GridShape,
    edges: Vec<EdgeCurve>,
    outlines: Vec<PieceOutline>,
    paths: Vec<String>,
}

impl OutlineCache {
    pub fn build(grid: GridShape, rng: &mut RngState) -> Self {
        let edges = generate_edges(grid, rng);
        Self::from_edges(grid, edges)
    }

    pub fn from_edges(grid: GridShape, edges: Vec<EdgeCurve>) -> Self {
        let outlines: Vec<PieceOutline> = (0..grid.piece_count())
            .map(|piece| PieceOutline::build(grid, piece, &edges))
            .collect();
        let paths = outlines.iter().map(PieceOutline::path).collect();
        OutlineCache {
            grid,
            edges,
            outlines,
            paths,
        }
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    pub fn edges(&self) -> &[EdgeCurve] {
        &self.edges
    }

    pub fn outline(&self, piece: usize) -> Option<&PieceOutline> {
        self.outlines.get(piece)
    }

    pub fn outlines(&self) -> &[PieceOutline] {
        &self.outlines
    }

    /// Cached path data in template units; empty for unknown pieces.
    pub fn path(&self, piece: usize) -> &str {
        self.paths.get(piece).map(String::as_str).unwrap_or("")
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(nx: usize, ny: usize, seed: u64) -> OutlineCache {
        let mut rng = RngState::from_seed(seed);
        OutlineCache::build(GridShape::new(nx, ny), &mut rng)
    }

    #[test]
    fn test_edge_index_shared() {
        let g = GridShape::new(3, 2);
        assert_eq!(edge_index(g, Side::East, 0), edge_index(g, Side::West, 1));
        assert_eq!(edge_index(g, Side::South, 1), edge_index(g, Side::North, 4));
        assert_eq!(edge_index(g, Side::North, 1), None);
        assert_eq!(edge_index(g, Side::West, 3), None);
        assert_eq!(edge_index(g, Side::East, 5), None);
        assert_eq!(edge_index(g, Side::South, 5), None);
    }

    #[test]
    fn test_edge_index_covers_all_edges_once() {
        let g = GridShape::new(4, 3);
        let mut seen = Vec::new();
        for piece in 0..g.piece_count() {
            for side in [Side::East, Side::South] {
                if let Some(i) = edge_index(g, side, piece) {
                    seen.push(i);
                }
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..g.edge_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_terminal_point_is_pinned() {
        let mut rng = RngState::from_seed(99);
        for _ in 0..200 {
            let e = EdgeCurve::generate(&mut rng);
            assert_eq!(e.points()[8], Point::new(EDGE_LENGTH, 0.0));
            for (p, d) in e.points().iter().zip(DEFAULT_POINTS.iter()).take(8) {
                assert!((p.x - d.x).abs() <= 5.0);
                assert!((p.y - d.y).abs() <= 5.0 || (p.y + d.y).abs() <= 5.0);
            }
        }
    }

    #[test]
    fn test_tabs_stay_within_reach() {
        let reach = TAB_REACH * EDGE_LENGTH;
        let worst = DEFAULT_POINTS
            .iter()
            .map(|p| p.y.abs() + f64::from(EDGE_JITTER))
            .fold(0.0, f64::max);
        assert!(worst <= reach);
    }

    #[test]
    fn test_orient_reflects_and_reverses() {
        let pts = vec![Point::ORIGIN, Point::new(50.0, -20.0), Point::new(200.0, 0.0)];
        let south = orient(&pts, Side::South);
        assert_eq!(
            south,
            vec![Point::ORIGIN, Point::new(150.0, 20.0), Point::new(200.0, 0.0)]
        );
        assert_eq!(orient(&pts, Side::North), pts);
        assert_eq!(orient(&orient(&pts, Side::West), Side::West), pts);
    }

    #[test]
    fn test_place_corners() {
        let end = Point::new(EDGE_LENGTH, 0.0);
        assert_eq!(place(Point::ORIGIN, Side::East), Point::new(200.0, 0.0));
        assert_eq!(place(end, Side::East), Point::new(200.0, 200.0));
        assert_eq!(place(Point::ORIGIN, Side::South), Point::new(200.0, 200.0));
        assert_eq!(place(end, Side::South), Point::new(0.0, 200.0));
        assert_eq!(place(Point::ORIGIN, Side::West), Point::new(0.0, 200.0));
        assert_eq!(place(end, Side::West), Point::ORIGIN);
    }

    #[test]
    fn test_outline_is_closed_loop() {
        let c = cache(3, 3, 5);
        for outline in c.outlines() {
            let mut cursor = Point::ORIGIN;
            for side in Side::ALL {
                let pts = outline.side(side);
                assert_eq!(pts[0], cursor);
                cursor = *pts.last().unwrap();
            }
            assert_eq!(cursor, Point::ORIGIN);
        }
    }

    #[test]
    fn test_border_sides_are_flat() {
        let c = cache(3, 2, 8);
        let g = c.grid();
        for piece in 0..g.piece_count() {
            let o = c.outline(piece).unwrap();
            for side in Side::ALL {
                let border = edge_index(g, side, piece).is_none();
                assert_eq!(o.is_flat(side), border, "piece {piece} {side:?}");
            }
        }
    }

    #[test]
    fn test_single_piece_path() {
        let c = cache(1, 1, 0);
        assert!(c.edges().is_empty());
        assert_eq!(c.path(0), "M 0 0 L 200 0 L 200 200 L 0 200 L 0 0 Z");
        assert_eq!(c.path(7), "");
    }

    #[test]
    fn test_path_has_three_curves_per_shared_side() {
        let c = cache(2, 1, 4);
        let path = c.path(0);
        assert!(path.starts_with("M 0 0 L 200 0 C"));
        assert_eq!(path.matches(" C").count(), 3);
        assert!(path.ends_with(" Z"));
    }

    #[test]
    fn test_fmt_coord() {
        assert_eq!(fmt_coord(-0.0), "0");
        assert_eq!(fmt_coord(200.0), "200");
        assert_eq!(fmt_coord(12.3456), "12.35");
    }
}
