use std::ops::{Add, AddAssign, Sub};

use geo::Intersects;
use geo_types::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Basic two dimensional point used for board positions and edge geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn scale(self, sx: f64, sy: f64) -> Point {
        Point {
            x: self.x * sx,
            y: self.y * sy,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

impl From<Point> for Coord<f64> {
    fn from(p: Point) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Axis-aligned rectangle spanned by two corners given in any order.
pub fn rect_from_corners(a: Point, b: Point) -> Rect<f64> {
    Rect::new(Coord::from(a), Coord::from(b))
}

/// Bounding box of a single piece whose top-left corner sits at `origin`.
pub fn piece_rect(origin: Point, width: f64, height: f64) -> Rect<f64> {
    rect_from_corners(origin, origin + Point::new(width, height))
}

/// Edges count as inside, so a click on a seam still hits a piece.
pub fn rect_contains(rect: &Rect<f64>, p: Point) -> bool {
    rect.intersects(&Coord::from(p))
}

pub fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.intersects(b)
}
