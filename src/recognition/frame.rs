use image::RgbImage;
use serde::{Deserialize, Serialize};

/// A single RGB8 camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the capture stream, starting at 0
    pub sequence: u64,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
    pub width: u32,
    pub height: u32,
    /// Packed RGB pixels, row-major, `width * height * 3` bytes
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn from_image(sequence: u64, timestamp_ms: u64, image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            sequence,
            timestamp_ms,
            width,
            height,
            pixels: image.into_raw(),
        }
    }
}

/// Pixel box around a detected face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}
