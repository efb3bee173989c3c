//! Vendor frame to host image conversion
//!
//! The fixed format table plus the two conversion paths: verbatim byte
//! copy for color, per-pixel metric distances for depth.

use camera_client::{DepthFrame, StreamFormat, VideoFrame};
use contracts::{ColorImage, DepthImage, Intrinsics, PixelCode};

use crate::error::{DriverError, Result};

/// Translate a vendor pixel format into the host pixel code
///
/// `None` is the invalid-format marker; capture fails cleanly on it.
pub fn pixel_code(format: StreamFormat) -> Option<PixelCode> {
    match format {
        StreamFormat::Rgb8 => Some(PixelCode::Rgb),
        StreamFormat::Bgr8 => Some(PixelCode::Bgr),
        StreamFormat::Rgba8 => Some(PixelCode::Rgba),
        StreamFormat::Bgra8 => Some(PixelCode::Bgra),
        StreamFormat::Y8 | StreamFormat::Raw8 => Some(PixelCode::Mono),
        StreamFormat::Z16
        | StreamFormat::Disparity16
        | StreamFormat::Y16
        | StreamFormat::Raw16 => Some(PixelCode::Mono16),
        StreamFormat::Other => None,
    }
}

/// Copy a color frame into the destination image
///
/// The destination is sized from the recorded stream intrinsics; the frame
/// must carry exactly that many bytes. On any failure the destination is
/// left untouched.
pub fn fill_color_image(
    frame: &VideoFrame,
    recorded: &Intrinsics,
    dest: &mut ColorImage,
) -> Result<()> {
    let code = pixel_code(frame.format).ok_or(DriverError::InvalidPixelFormat {
        format: frame.format,
    })?;

    let frame_bytes =
        frame.width as usize * frame.height as usize * frame.format.bytes_per_pixel();
    let expected_bytes =
        recorded.width as usize * recorded.height as usize * code.bytes_per_pixel();

    if frame_bytes != expected_bytes || frame.byte_len() != frame_bytes {
        return Err(DriverError::BufferSizeMismatch {
            frame_bytes: frame.byte_len(),
            expected_bytes,
        });
    }

    dest.resize(recorded.width, recorded.height, code);
    dest.as_bytes_mut().copy_from_slice(&frame.data);
    Ok(())
}

/// Write a depth frame's metric distances into the destination image
///
/// No bulk copy path exists: the destination representation (f32 meters)
/// differs in type and width from the raw sensor format.
pub fn fill_depth_image(frame: &DepthFrame, dest: &mut DepthImage) -> Result<()> {
    if pixel_code(frame.format).is_none() {
        return Err(DriverError::InvalidPixelFormat {
            format: frame.format,
        });
    }

    dest.resize(frame.width, frame.height);
    for y in 0..frame.height {
        for x in 0..frame.width {
            dest.set_distance(x, y, frame.distance(x, y));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::Distortion;

    fn intrinsics(width: u32, height: u32) -> Intrinsics {
        Intrinsics {
            width,
            height,
            fx: width as f64,
            fy: width as f64,
            ppx: width as f64 / 2.0,
            ppy: height as f64 / 2.0,
            distortion: Distortion::default(),
        }
    }

    fn rgb_frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame {
            width,
            height,
            format: StreamFormat::Rgb8,
            data: Bytes::from(vec![7u8; width as usize * height as usize * 3]),
        }
    }

    #[test]
    fn test_format_table_documented_codes() {
        assert_eq!(pixel_code(StreamFormat::Rgb8), Some(PixelCode::Rgb));
        assert_eq!(pixel_code(StreamFormat::Bgr8), Some(PixelCode::Bgr));
        assert_eq!(pixel_code(StreamFormat::Rgba8), Some(PixelCode::Rgba));
        assert_eq!(pixel_code(StreamFormat::Bgra8), Some(PixelCode::Bgra));
        assert_eq!(pixel_code(StreamFormat::Y8), Some(PixelCode::Mono));
        assert_eq!(pixel_code(StreamFormat::Raw8), Some(PixelCode::Mono));
        assert_eq!(pixel_code(StreamFormat::Z16), Some(PixelCode::Mono16));
        assert_eq!(pixel_code(StreamFormat::Disparity16), Some(PixelCode::Mono16));
        assert_eq!(pixel_code(StreamFormat::Y16), Some(PixelCode::Mono16));
        assert_eq!(pixel_code(StreamFormat::Raw16), Some(PixelCode::Mono16));
        assert_eq!(pixel_code(StreamFormat::Other), None);
    }

    #[test]
    fn test_color_copy_verbatim() {
        let frame = rgb_frame(4, 2);
        let mut dest = ColorImage::new();
        fill_color_image(&frame, &intrinsics(4, 2), &mut dest).unwrap();

        assert_eq!(dest.width(), 4);
        assert_eq!(dest.pixel_code(), Some(PixelCode::Rgb));
        assert!(dest.as_bytes().iter().all(|b| *b == 7));
    }

    #[test]
    fn test_color_unknown_format_rejected() {
        let mut frame = rgb_frame(4, 2);
        frame.format = StreamFormat::Other;
        let mut dest = ColorImage::new();
        let result = fill_color_image(&frame, &intrinsics(4, 2), &mut dest);
        assert!(matches!(
            result,
            Err(DriverError::InvalidPixelFormat { .. })
        ));
    }

    #[test]
    fn test_color_size_mismatch_leaves_destination_untouched() {
        let mut dest = ColorImage::new();
        dest.resize(2, 2, PixelCode::Rgb);
        dest.as_bytes_mut().fill(9);
        let before = dest.clone();

        // Frame is 8x8 but the recorded resolution says 2x2
        let frame = rgb_frame(8, 8);
        let result = fill_color_image(&frame, &intrinsics(2, 2), &mut dest);

        assert!(matches!(
            result,
            Err(DriverError::BufferSizeMismatch { .. })
        ));
        assert_eq!(dest.as_bytes(), before.as_bytes());
        assert_eq!(dest.width(), before.width());
    }

    #[test]
    fn test_depth_distances_written_per_pixel() {
        let raw: Vec<u8> = std::iter::repeat([0xE8u8, 0x03])
            .take(6)
            .flatten()
            .collect();
        let frame = DepthFrame {
            width: 3,
            height: 2,
            format: StreamFormat::Z16,
            depth_units: 0.001,
            data: Bytes::from(raw),
        };
        let mut dest = DepthImage::new();
        fill_depth_image(&frame, &mut dest).unwrap();

        assert_eq!((dest.width(), dest.height()), (3, 2));
        assert!((dest.distance(2, 1) - 1.0).abs() < 1e-6);
    }
}
