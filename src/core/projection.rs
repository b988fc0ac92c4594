use crate::core::geo::{Coordinate, PixelPoint};

/// Linear projection between map coordinates and pixels at a zoom level.
///
/// Map coordinates are the pixel space of `native_zoom`, so a coordinate
/// projects to itself at that zoom and halves with every level below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    native_zoom: f64,
    native_scale: f64,
}

impl Projection {
    pub fn new(native_zoom: f64) -> Self {
        Self {
            native_zoom,
            native_scale: native_zoom.exp2(),
        }
    }

    pub fn native_zoom(&self) -> f64 {
        self.native_zoom
    }

    pub fn native_scale(&self) -> f64 {
        self.native_scale
    }

    /// Pixels per map unit at `zoom`
    pub fn scale(&self, zoom: f64) -> f64 {
        zoom.exp2() / self.native_scale
    }

    pub fn project(&self, coordinate: &Coordinate, zoom: f64) -> PixelPoint {
        coordinate.multiply(self.scale(zoom))
    }

    pub fn unproject(&self, pixel: &PixelPoint, zoom: f64) -> Coordinate {
        pixel.divide(self.scale(zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;

    #[test]
    fn test_native_zoom_is_identity() {
        let projection = Projection::new(7.0);
        let p = Point::new(49432.0, 31440.0);
        assert_eq!(projection.project(&p, 7.0), p);
    }

    #[test]
    fn test_each_level_halves() {
        let projection = Projection::new(7.0);
        let p = Point::new(1024.0, 512.0);
        assert_eq!(projection.project(&p, 6.0), Point::new(512.0, 256.0));
        assert_eq!(projection.project(&p, 0.0), Point::new(8.0, 4.0));
    }

    #[test]
    fn test_round_trip() {
        let projection = Projection::new(7.0);
        for &zoom in &[0.0, 1.3, 2.5, 7.0, 9.75] {
            for &p in &[Point::new(0.0, 0.0), Point::new(123.456, -98.7), Point::new(81920.0, 114688.0)] {
                let back = projection.unproject(&projection.project(&p, zoom), zoom);
                assert!((back.x - p.x).abs() < 1e-9 * p.x.abs().max(1.0));
                assert!((back.y - p.y).abs() < 1e-9 * p.y.abs().max(1.0));
            }
        }
    }
}
