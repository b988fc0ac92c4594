pub mod cache;
pub mod image;

pub use cache::{GetOptions, ImageCache, PreloadedImage};
pub use image::Image;
