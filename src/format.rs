//! Stream format model and capture-format selection.

use nokhwa::utils::FrameFormat;

/// One stream format a device can deliver.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub frame_rate: u32,
}

/// Cheaper-to-decode frame formats win.
fn format_priority(format: FrameFormat) -> u8 {
    match format {
        FrameFormat::RAWRGB => 4,
        FrameFormat::NV12 => 3,
        FrameFormat::YUYV => 2,
        FrameFormat::MJPEG => 1,
        _ => 0,
    }
}

/// Pick the capture format for a decode session.
///
/// Ordered by frame-format priority, then frame rate, then resolution, so
/// a fast low-conversion-cost stream beats a slow high-resolution one.
pub fn select_stream_format(formats: &[VideoFormat]) -> Option<&VideoFormat> {
    formats.iter().max_by_key(|f| {
        (
            format_priority(f.format),
            f.frame_rate,
            u64::from(f.width) * u64::from(f.height),
        )
    })
}
