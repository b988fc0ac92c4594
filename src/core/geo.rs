use serde::{Deserialize, Serialize};

/// A 2-component vector used for both map-space coordinates and canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A position in map space (the native pixel space of the most detailed zoom level)
pub type Coordinate = Point;

/// A position in canvas space, measured in CSS pixels from the top-left corner
pub type PixelPoint = Point;

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn splat(v: f64) -> Self {
        Self::new(v, v)
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn divide(&self, scalar: f64) -> Point {
        Point::new(self.x / scalar, self.y / scalar)
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        self.subtract(other).length()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    pub fn round(&self) -> Point {
        Point::new(self.x.round(), self.y.round())
    }

    /// Linear interpolation towards `other`
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A tile address in the raster pyramid. Level `z` has `2^z` cells per axis
/// relative to level 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Gets the parent tile at the next lower level
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            None
        } else {
            Some(TileCoord::new(self.x / 2, self.y / 2, self.z - 1))
        }
    }

    /// Gets the four child tiles at the next higher level
    pub fn children(&self) -> [TileCoord; 4] {
        [
            TileCoord::new(self.x * 2, self.y * 2, self.z + 1),
            TileCoord::new(self.x * 2 + 1, self.y * 2, self.z + 1),
            TileCoord::new(self.x * 2, self.y * 2 + 1, self.z + 1),
            TileCoord::new(self.x * 2 + 1, self.y * 2 + 1, self.z + 1),
        ]
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Insets in CSS pixels that shrink the effective viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    /// Size left over inside a canvas of `size` once the padding is removed
    pub fn inner_size(&self, size: &Point) -> Point {
        Point::new(
            (size.x - self.horizontal()).max(0.0),
            (size.y - self.vertical()).max(0.0),
        )
    }

    /// Center of the padded area of a canvas of `size`
    pub fn center_of(&self, size: &Point) -> Point {
        let inner = self.inner_size(size);
        Point::new(self.left + inner.x / 2.0, self.top + inner.y / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite() && self.left.is_finite()
    }
}
