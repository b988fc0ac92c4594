use crate::core::{bounds::Bounds, geo::Point};
use crate::rendering::surface::Color;
use crate::{MapError, Result};
use std::sync::Arc;

/// A decoded RGBA8 raster. Clones share the pixel buffer.
#[derive(Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(MapError::Decode(format!(
                "expected {} bytes for a {}x{} RGBA image, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// A single-color image
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let pixels = [color.r, color.g, color.b, color.a]
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Point {
        Point::new(self.width as f64, self.height as f64)
    }

    /// The whole image as a source rectangle
    pub fn full_rect(&self) -> Bounds {
        Bounds::from_origin_and_size(Point::default(), self.width as f64, self.height as f64)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Whether both handles share the same pixel buffer
    pub fn ptr_eq(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
