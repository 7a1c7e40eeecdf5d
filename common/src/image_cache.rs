use std::{fmt, sync::Arc};

/// Decoded images are always stored as RGBA8
pub const BYTES_PER_PIXEL: usize = 4;

/// A decoded image ready to be pushed into a row's image slot.
///
/// The pixel buffer is shared, cloning a `DecodedImage` never copies pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    pub fn blank(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;

        Self::new(width, height, vec![0u8; len])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Memory footprint used for cache accounting, derived from the
    /// dimensions rather than the buffer length
    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

// pixel buffers are far too large to be useful in logs
impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("byte_size", &self.byte_size())
            .finish()
    }
}
