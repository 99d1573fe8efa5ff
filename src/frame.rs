//! Frame conversion between the camera buffer, the display surface and the
//! decoder input.

use dcv_color_primitives::{convert_image, ColorSpace, ImageFormat, PixelFormat};
use nokhwa::error::NokhwaError;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{FrameFormat, Resolution};
use nokhwa::Buffer;

/// A tightly packed RGB24 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Display surface for the live camera feed.
///
/// Stands in for the video element the scanner renders into; headless
/// embedders (and tests) simply omit it.
pub trait FrameSink: Send {
    fn present(&mut self, frame: &RgbFrame);
}

impl<F: FnMut(&RgbFrame) + Send> FrameSink for F {
    fn present(&mut self, frame: &RgbFrame) {
        self(frame);
    }
}

/// Convert a captured buffer to packed RGB24.
pub fn rgb_frame(frame: &Buffer) -> Result<RgbFrame, NokhwaError> {
    let resolution = frame.resolution();
    let width = resolution.width();
    let height = resolution.height();
    let mut data = vec![0u8; width as usize * height as usize * 3];

    match frame.source_frame_format() {
        // dcv has the fast NV12 to RGB conversion
        FrameFormat::NV12 => nv12_to_rgb(frame.buffer(), resolution, &mut data)?,
        _ => frame.decode_image_to_buffer::<RgbFormat>(&mut data)?,
    }

    Ok(RgbFrame {
        width,
        height,
        data,
    })
}

fn nv12_to_rgb(buffer: &[u8], resolution: Resolution, output: &mut [u8]) -> Result<(), NokhwaError> {
    let width = resolution.width();
    let height = resolution.height();

    let src_format = ImageFormat {
        pixel_format: PixelFormat::Nv12,
        color_space: ColorSpace::Bt601,
        num_planes: 1,
    };
    let dst_format = ImageFormat {
        pixel_format: PixelFormat::Rgb,
        color_space: ColorSpace::Rgb,
        num_planes: 1,
    };

    convert_image(
        width,
        height,
        &src_format,
        None,
        &[buffer],
        &dst_format,
        None,
        &mut [&mut output[..]],
    )
    .map_err(|e| NokhwaError::ProcessFrameError {
        src: FrameFormat::NV12,
        destination: "RGB".to_string(),
        error: format!("Conversion error: {:?}", e),
    })
}

/// Reduce an RGB frame to 8-bit luma (BT.601 integer weights) for the
/// decoder.
pub fn luma_plane(frame: &RgbFrame) -> Vec<u8> {
    frame
        .data
        .chunks_exact(3)
        .map(|px| {
            let r = u32::from(px[0]);
            let g = u32::from(px[1]);
            let b = u32::from(px[2]);
            ((77 * r + 150 * g + 29 * b) >> 8) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_of_white_is_near_full_scale() {
        let frame = RgbFrame {
            width: 2,
            height: 1,
            data: vec![255, 255, 255, 0, 0, 0],
        };
        let luma = luma_plane(&frame);
        assert_eq!(luma.len(), 2);
        assert!(luma[0] >= 254);
        assert_eq!(luma[1], 0);
    }

    #[test]
    fn luma_weights_favor_green() {
        let red = RgbFrame {
            width: 1,
            height: 1,
            data: vec![255, 0, 0],
        };
        let green = RgbFrame {
            width: 1,
            height: 1,
            data: vec![0, 255, 0],
        };
        assert!(luma_plane(&green)[0] > luma_plane(&red)[0]);
    }

    #[test]
    fn closure_acts_as_frame_sink() {
        let mut seen = 0u32;
        {
            let mut sink = |frame: &RgbFrame| {
                seen += frame.width;
            };
            sink.present(&RgbFrame {
                width: 4,
                height: 1,
                data: vec![0; 12],
            });
        }
        assert_eq!(seen, 4);
    }
}
