//! Points and rectangles in list coordinates (points, y grows downward).

/// A position in list content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Self) -> f64 {
        let (dx, dy) = (other.x - self.x, other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle; `height` and `width` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Overlap band of two rectangles.
    ///
    /// Rows that merely touch (or have drifted apart) yield a zero-height band
    /// sitting on the upper rectangle's bottom edge, so callers always get a
    /// usable rectangle to grow from.
    pub fn intersection(&self, other: &Self) -> Self {
        let x0 = self.x.max(other.x);
        let x1 = self.right().min(other.right());
        let y0 = self.y.max(other.y);
        let y1 = self.bottom().min(other.bottom());
        let width = (x1 - x0).max(0.0);
        if y1 >= y0 {
            Self::new(x0, y0, width, y1 - y0)
        } else {
            Self::new(x0, y1, width, 0.0)
        }
    }

    /// Grow vertically by `dy` on both top and bottom.
    pub fn grow_vertical(&self, dy: f64) -> Self {
        Self::new(self.x, self.y - dy, self.width, (self.height + 2.0 * dy).max(0.0))
    }
}
