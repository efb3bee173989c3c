//! Image containers exchanged with the middleware host
//!
//! `ColorImage` receives a verbatim byte copy of the vendor frame;
//! `DepthImage` stores per-pixel metric distances in meters.

use serde::{Deserialize, Serialize};

/// Middleware pixel code for color images
///
/// The subset of host pixel codes the driver can produce. Vendor formats
/// that map to none of these are rejected at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelCode {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
    Mono,
    Mono16,
}

impl PixelCode {
    /// Storage size of one pixel in bytes
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelCode::Mono => 1,
            PixelCode::Mono16 => 2,
            PixelCode::Rgb | PixelCode::Bgr => 3,
            PixelCode::Rgba | PixelCode::Bgra => 4,
        }
    }
}

/// Color image buffer
///
/// Caller-owned destination for RGB captures. The driver resizes it to the
/// negotiated stream resolution and copies raw pixel bytes verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorImage {
    width: u32,
    height: u32,
    code: Option<PixelCode>,
    data: Vec<u8>,
}

impl ColorImage {
    /// Create an empty image
    pub fn new() -> Self {
        Self::default()
    }

    /// Reshape the buffer to `width x height` pixels of `code`
    ///
    /// Existing contents are discarded; the buffer is zero-filled.
    pub fn resize(&mut self, width: u32, height: u32, code: PixelCode) {
        self.width = width;
        self.height = height;
        self.code = Some(code);
        self.data.clear();
        self.data
            .resize(width as usize * height as usize * code.bytes_per_pixel(), 0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_code(&self) -> Option<PixelCode> {
        self.code
    }

    /// Raw image bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw image bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Total byte size of the pixel buffer
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// Depth image buffer
///
/// Per-pixel metric distance in meters, row-major.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepthImage {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reshape to `width x height`, zero-filling all distances
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width as usize * height as usize, 0.0);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance at pixel (x, y), zero when out of bounds
    pub fn distance(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Write the distance at pixel (x, y); out-of-bounds writes are ignored
    pub fn set_distance(&mut self, x: u32, y: u32, meters: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.data[y as usize * self.width as usize + x as usize] = meters;
    }

    /// Raw distance plane
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_resize_allocates_by_code() {
        let mut img = ColorImage::new();
        img.resize(4, 2, PixelCode::Rgb);
        assert_eq!(img.byte_len(), 4 * 2 * 3);

        img.resize(4, 2, PixelCode::Bgra);
        assert_eq!(img.byte_len(), 4 * 2 * 4);
        assert_eq!(img.pixel_code(), Some(PixelCode::Bgra));
    }

    #[test]
    fn test_depth_pixel_access() {
        let mut img = DepthImage::new();
        img.resize(3, 3);
        img.set_distance(1, 2, 1.5);
        assert_eq!(img.distance(1, 2), 1.5);
        assert_eq!(img.distance(0, 0), 0.0);
        // Out of bounds reads are zero, writes are ignored
        img.set_distance(9, 9, 4.0);
        assert_eq!(img.distance(9, 9), 0.0);
    }

    #[test]
    fn test_bytes_per_pixel_table() {
        assert_eq!(PixelCode::Mono.bytes_per_pixel(), 1);
        assert_eq!(PixelCode::Mono16.bytes_per_pixel(), 2);
        assert_eq!(PixelCode::Rgb.bytes_per_pixel(), 3);
        assert_eq!(PixelCode::Rgba.bytes_per_pixel(), 4);
    }
}
