use crate::image_cache::BYTES_PER_PIXEL;

/// Number of full screens worth of decoded pixels the image cache may hold
pub const CACHED_SCREENS: usize = 3;

/// Pixel dimensions of the surface the catalog is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub width_pixels: u32,
    pub height_pixels: u32,
}

impl DisplayMetrics {
    pub fn new(width_pixels: u32, height_pixels: u32) -> Self {
        Self {
            width_pixels,
            height_pixels,
        }
    }

    pub fn screen_bytes(&self) -> usize {
        self.width_pixels as usize * self.height_pixels as usize * BYTES_PER_PIXEL
    }

    pub fn image_cache_budget(&self) -> usize {
        self.screen_bytes() * CACHED_SCREENS
    }
}
