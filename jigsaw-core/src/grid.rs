use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Columns and rows of the cut grid. Piece `i` sits at column `i % nx`, row `i / nx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub nx: usize,
    pub ny: usize,
}

impl Default for GridShape {
    fn default() -> Self {
        GridShape { nx: 4, ny: 3 }
    }
}

impl GridShape {
    pub const fn new(nx: usize, ny: usize) -> Self {
        GridShape { nx, ny }
    }

    pub fn piece_count(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }

    pub fn col(&self, piece: usize) -> usize {
        piece % self.nx
    }

    pub fn row(&self, piece: usize) -> usize {
        piece / self.nx
    }

    pub fn piece_at(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.nx && row < self.ny).then(|| row * self.nx + col)
    }

    /// Shared internal edges: `2·nx·ny − nx − ny`.
    pub fn edge_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        2 * self.nx * self.ny - self.nx - self.ny
    }

    /// Pieces at taxicab distance one from `piece`, staying inside its row for
    /// horizontal steps.
    pub fn neighbours(&self, piece: usize) -> Vec<usize> {
        let n = self.piece_count();
        if piece >= n {
            return Vec::new();
        }
        let col = self.col(piece);
        let mut out = Vec::with_capacity(4);
        if piece >= self.nx {
            out.push(piece - self.nx);
        }
        if col > 0 {
            out.push(piece - 1);
        }
        if col + 1 < self.nx {
            out.push(piece + 1);
        }
        if piece + self.nx < n {
            out.push(piece + self.nx);
        }
        out
    }
}

/// Size of one piece in board units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceMetrics {
    pub width: f64,
    pub height: f64,
}

impl Default for PieceMetrics {
    fn default() -> Self {
        PieceMetrics {
            width: 100.0,
            height: 100.0,
        }
    }
}

impl PieceMetrics {
    /// Piece size for an image of `width × height` cut into `grid`.
    pub fn for_image(width: f64, height: f64, grid: GridShape) -> Self {
        if grid.is_empty() || width <= 0.0 || height <= 0.0 {
            return PieceMetrics::default();
        }
        PieceMetrics {
            width: width / grid.nx as f64,
            height: height / grid.ny as f64,
        }
    }

    /// Offset of `piece` inside the solved picture.
    pub fn offset(&self, grid: GridShape, piece: usize) -> Point {
        Point::new(
            grid.col(piece) as f64 * self.width,
            grid.row(piece) as f64 * self.height,
        )
    }

    /// Top-left corner of scatter slot `slot` when pieces are spread out with `spacing`.
    pub fn scatter_slot(&self, grid: GridShape, slot: usize, spacing: f64) -> Point {
        Point::new(
            grid.col(slot) as f64 * self.width * spacing,
            grid.row(slot) as f64 * self.height * spacing,
        )
    }
}

pub const GRID_REL_COUNT_TOL: f64 = 0.05;
pub const GRID_PIECE_RATIO_MAX: f64 = 1.42;
pub const GRID_ROW_MIN: usize = 2;
pub const GRID_ROW_WIDEN: f64 = 1.5;
pub const GRID_NEIGHBOR_COLS: i64 = 3;
pub const GRID_SCORE_PIECE: f64 = 0.5;

/// Grid closest to `target` pieces whose pieces stay roughly square for an
/// image of `width × height`.
pub fn best_grid_for_count(width: u32, height: u32, target: u32) -> Option<GridShape> {
    if target == 0 || width == 0 || height == 0 {
        return None;
    }
    let aspect = f64::from(width) / f64::from(height);
    let ratio_min = 1.0 / GRID_PIECE_RATIO_MAX;
    let target = f64::from(target);
    let base = target.sqrt().ceil();
    let r_hi = ((base * GRID_ROW_WIDEN).ceil() as usize).max(GRID_ROW_MIN);
    let mut best: Option<(GridShape, f64)> = None;
    for rows in GRID_ROW_MIN..=r_hi {
        let c0 = (target / rows as f64).round() as i64;
        for dc in -GRID_NEIGHBOR_COLS..=GRID_NEIGHBOR_COLS {
            let cols = c0 + dc;
            if cols < 2 {
                continue;
            }
            let cols = cols as usize;
            let actual = (cols * rows) as f64;
            let rel_err = (actual - target).abs() / target;
            if rel_err > GRID_REL_COUNT_TOL {
                continue;
            }
            let grid_ratio = cols as f64 / rows as f64;
            let piece_ratio = aspect / grid_ratio;
            if !(ratio_min..=GRID_PIECE_RATIO_MAX).contains(&piece_ratio) {
                continue;
            }
            let score = rel_err.powi(2)
                + (grid_ratio / aspect).ln().powi(2)
                + GRID_SCORE_PIECE * piece_ratio.ln().powi(2);
            if best.is_none_or(|(_, s)| score < s) {
                best = Some((GridShape::new(cols, rows), score));
            }
        }
    }
    best.map(|(grid, _)| grid)
}
