//! The drawing capability the map renders into, plus a recording
//! implementation for headless use.

use crate::core::{bounds::Bounds, geo::Point};
use crate::images::Image;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 8-bit RGBA color. Serializes as a `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const DEBUG_MISSING: Color = Color::rgba(255, 0, 255, 64);
    pub const DEBUG_OUTLINE: Color = Color::rgba(255, 0, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let invalid = || MapError::InvalidConfig(format!("invalid hex color '{}'", hex));
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 | 8 => {
                let a = if digits.len() == 8 { channel(&digits[6..8])? } else { 255 };
                Ok(Self::rgba(
                    channel(&digits[0..2])?,
                    channel(&digits[2..4])?,
                    channel(&digits[4..6])?,
                    a,
                ))
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl TryFrom<String> for Color {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// A 2D raster target. Coordinates are CSS pixels; the implementation applies
/// the device pixel ratio.
pub trait Surface: Send {
    /// Called once at the start of every rendered frame
    fn begin_frame(&mut self, _size: Point) {}

    fn fill_rect(&mut self, rect: Bounds, color: Color);

    fn stroke_rect(&mut self, rect: Bounds, color: Color, width: f64);

    /// Draws the `src` sub-rectangle of `image` (in image pixels) into `dest`
    fn draw_image(&mut self, image: &Image, src: Bounds, dest: Bounds, opacity: f32);
}

/// Commands recorded by a [`RecordingSurface`]
#[derive(Debug, Clone)]
pub enum DrawCommand {
    FillRect {
        rect: Bounds,
        color: Color,
    },
    StrokeRect {
        rect: Bounds,
        color: Color,
        width: f64,
    },
    Image {
        image: Image,
        src: Bounds,
        dest: Bounds,
        opacity: f32,
    },
}

/// Surface that stores the last frame's drawing queue. Clones share the queue,
/// so a handle kept outside the map can inspect what was drawn.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    frame: Arc<Mutex<RecordedFrame>>,
}

#[derive(Debug, Default)]
struct RecordedFrame {
    size: Point,
    frames: u64,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands drawn since the last `begin_frame`
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.frame
            .lock()
            .map(|f| f.commands.clone())
            .unwrap_or_default()
    }

    /// Images drawn in the current frame, in draw order
    pub fn images(&self) -> Vec<(Image, Bounds, Bounds)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Image {
                    image, src, dest, ..
                } => Some((image, src, dest)),
                _ => None,
            })
            .collect()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame.lock().map(|f| f.frames).unwrap_or(0)
    }

    pub fn size(&self) -> Point {
        self.frame.lock().map(|f| f.size).unwrap_or_default()
    }

    fn push(&self, command: DrawCommand) {
        if let Ok(mut frame) = self.frame.lock() {
            frame.commands.push(command);
        }
    }
}

impl Surface for RecordingSurface {
    fn begin_frame(&mut self, size: Point) {
        if let Ok(mut frame) = self.frame.lock() {
            frame.size = size;
            frame.frames += 1;
            frame.commands.clear();
        }
    }

    fn fill_rect(&mut self, rect: Bounds, color: Color) {
        self.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Bounds, color: Color, width: f64) {
        self.push(DrawCommand::StrokeRect { rect, color, width });
    }

    fn draw_image(&mut self, image: &Image, src: Bounds, dest: Bounds, opacity: f32) {
        self.push(DrawCommand::Image {
            image: image.clone(),
            src,
            dest,
            opacity,
        });
    }
}
