//! Decoder contract and the rqrr-backed implementation.
//!
//! The decode loop delivers one [`DecodeOutcome`] per processed frame.
//! "Not found" is the expected steady state while scanning and is a
//! distinguished non-error: the component silently ignores it, never
//! logging it or showing it as result text.

/// Outcome of decoding a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A code was read; carries the decoded text payload.
    Decoded(String),
    /// No code is visible in the current frame.
    NotFound,
    /// Any other decode failure (e.g. a code was located but could not be
    /// read). Scanning continues.
    Error(String),
}

/// The external decoding library behind the scan loop.
///
/// `luma` is an 8-bit grayscale plane of `width * height` pixels.
pub trait FrameDecoder: Send {
    fn decode_frame(&mut self, luma: &[u8], width: u32, height: u32) -> DecodeOutcome;
}

/// QR decoder backed by rqrr.
#[derive(Debug, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for QrDecoder {
    fn decode_frame(&mut self, luma: &[u8], width: u32, height: u32) -> DecodeOutcome {
        let width = width as usize;
        let height = height as usize;
        if luma.len() < width * height {
            return DecodeOutcome::Error(format!(
                "luma plane too small: {} bytes for {}x{}",
                luma.len(),
                width,
                height
            ));
        }

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);

        let grids = prepared.detect_grids();
        let Some(grid) = grids.first() else {
            return DecodeOutcome::NotFound;
        };

        match grid.decode() {
            Ok((_meta, content)) => DecodeOutcome::Decoded(content),
            Err(e) => DecodeOutcome::Error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frame_is_not_found() {
        let mut decoder = QrDecoder::new();
        let luma = vec![255u8; 64 * 64];
        assert_eq!(decoder.decode_frame(&luma, 64, 64), DecodeOutcome::NotFound);
    }

    #[test]
    fn noise_frame_is_not_found_or_error_never_decoded() {
        // A deterministic noise pattern must never produce a payload.
        let mut decoder = QrDecoder::new();
        let luma: Vec<u8> = (0..64 * 64u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
            .collect();
        let outcome = decoder.decode_frame(&luma, 64, 64);
        assert!(!matches!(outcome, DecodeOutcome::Decoded(_)));
    }

    #[test]
    fn short_luma_plane_is_an_error() {
        let mut decoder = QrDecoder::new();
        let outcome = decoder.decode_frame(&[0u8; 8], 64, 64);
        assert!(matches!(outcome, DecodeOutcome::Error(_)));
    }
}
