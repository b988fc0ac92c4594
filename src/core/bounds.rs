use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// Axis-aligned box used for map extents, visible areas and drawing rectangles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Creates normalized bounds spanning two arbitrary corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_coords(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// Creates bounds from a top-left origin and a size
    pub fn from_origin_and_size(origin: Point, width: f64, height: f64) -> Self {
        Self::new(origin, Point::new(origin.x + width, origin.y + height))
    }

    /// Creates bounds from a center point and size
    pub fn from_center_and_size(center: Point, width: f64, height: f64) -> Self {
        let half_width = width / 2.0;
        let half_height = height / 2.0;
        Self::new(
            Point::new(center.x - half_width, center.y - half_height),
            Point::new(center.x + half_width, center.y + half_height),
        )
    }

    /// Gets the width of the bounds
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Gets the height of the bounds
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Gets the size as a Point
    pub fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Checks if the bounds contain a point, edges included
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if a point lies strictly inside the bounds (open interval on both axes)
    pub fn contains_strict(&self, point: &Point) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }

    /// Checks if the bounds intersect with another bounds
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }

    /// Gets the intersection of two bounds
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        if !self.intersects(other) {
            return None;
        }

        Some(Bounds::new(
            Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        ))
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Extends the bounds to include another bounds
    pub fn extend_bounds(&mut self, other: &Bounds) {
        self.extend(&other.min);
        self.extend(&other.max);
    }

    /// Returns the bounds scaled around the origin
    pub fn scaled(&self, factor: f64) -> Bounds {
        Bounds::new(self.min.multiply(factor), self.max.multiply(factor))
    }

    /// Checks if the bounds are valid (min <= max)
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Clamps a point to be within the bounds
    pub fn clamp(&self, point: &Point) -> Point {
        Point::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(0.0, 0.0))
    }
}
