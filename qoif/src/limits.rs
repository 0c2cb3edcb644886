//! Resource limits for decoding.

/// Largest image the decoder accepts by default, in pixels.
pub const DEFAULT_MAX_PIXELS: u64 = 400_000_000;

/// Resource limits applied to a header before any pixel buffer is allocated.
///
/// Used to keep attacker-controlled headers from requesting unbounded allocations. Regardless of
/// the configured limit, images whose pixel buffer would not be addressable on the current
/// platform are always rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum total pixels (width × height).
    pub max_pixels: u64,
}

impl Limits {
    /// Limits that only reject images which could not be allocated at all.
    pub const fn none() -> Self {
        Self {
            max_pixels: u64::MAX,
        }
    }

    pub const fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Check if the dimensions are within the pixel limit.
    pub const fn allows(&self, width: u32, height: u32) -> bool {
        (width as u64) * (height as u64) <= self.max_pixels
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}
