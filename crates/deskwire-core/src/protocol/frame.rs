//! Decoder for inbound binary video frames.
//!
//! Wire format:
//! ```text
//! [magic:4 = "OFRA"][width:4][height:4][format:4][payload:N]
//! ```
//! Header size: 16 bytes.  All integers are little-endian `u32`.  The payload
//! is the compressed image, passed through untouched.

use thiserror::Error;

/// Magic marker at the start of every frame.
pub const FRAME_MAGIC: [u8; 4] = *b"OFRA";

/// Fixed header length in bytes.
pub const FRAME_HEADER_SIZE: usize = 16;

/// Errors produced by [`decode_frame`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer than [`FRAME_HEADER_SIZE`] bytes.
    #[error("frame too short: need at least 16 bytes, got {0}")]
    TooShort(usize),

    /// The first four bytes are not `OFRA`.
    #[error("bad frame magic: {0:02X?}")]
    BadMagic([u8; 4]),
}

/// One decoded frame, borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFrame<'a> {
    pub width: u32,
    pub height: u32,
    /// Encoding tag chosen by the agent (opaque to this crate).
    pub format: u32,
    pub payload: &'a [u8],
}

/// Decodes the frame header of `bytes`.
///
/// # Errors
///
/// [`FrameError::TooShort`] for buffers under 16 bytes,
/// [`FrameError::BadMagic`] when the marker does not match.
///
/// # Examples
///
/// ```rust
/// use deskwire_core::decode_frame;
///
/// let mut buf = b"OFRA".to_vec();
/// buf.extend_from_slice(&640u32.to_le_bytes());
/// buf.extend_from_slice(&480u32.to_le_bytes());
/// buf.extend_from_slice(&1u32.to_le_bytes());
/// buf.extend_from_slice(&[0xFF, 0xD8]);
///
/// let frame = decode_frame(&buf).unwrap();
/// assert_eq!((frame.width, frame.height, frame.format), (640, 480, 1));
/// assert_eq!(frame.payload, &[0xFF, 0xD8]);
/// ```
pub fn decode_frame(bytes: &[u8]) -> Result<VideoFrame<'_>, FrameError> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(FrameError::TooShort(bytes.len()));
    }

    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if magic != FRAME_MAGIC {
        return Err(FrameError::BadMagic(magic));
    }

    Ok(VideoFrame {
        width: read_u32_le(bytes, 4),
        height: read_u32_le(bytes, 8),
        format: read_u32_le(bytes, 12),
        payload: &bytes[FRAME_HEADER_SIZE..],
    })
}

fn read_u32_le(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
