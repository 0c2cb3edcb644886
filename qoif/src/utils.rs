use crate::Pixel;

/// Index of a pixel in the color array.
#[inline]
pub const fn hash(pixel: Pixel) -> u8 {
    // 256 is a multiple of 64, so wrapping in u8 before the reduction doesn't change the result.
    let sum = pixel
        .r
        .wrapping_mul(3)
        .wrapping_add(pixel.g.wrapping_mul(5))
        .wrapping_add(pixel.b.wrapping_mul(7))
        .wrapping_add(pixel.a.wrapping_mul(11));
    sum & 0b11_1111 // % 64
}

/// Computes the signed, wrapping difference between two channel values.
#[inline]
pub const fn diff(a: u8, b: u8) -> i8 {
    a.wrapping_sub(b) as i8
}

/// Applies signed differences to the RGB channels of a pixel, keeping its alpha.
#[inline]
pub const fn apply_diff(prev: Pixel, r_diff: i8, g_diff: i8, b_diff: i8) -> Pixel {
    Pixel {
        r: prev.r.wrapping_add_signed(r_diff),
        g: prev.g.wrapping_add_signed(g_diff),
        b: prev.b.wrapping_add_signed(b_diff),
        a: prev.a,
    }
}

/// Number of pixels of a `width` x `height` image, if a buffer of that many RGBA pixels is
/// addressable on this platform.
#[inline]
pub fn pixel_count(width: u32, height: u32) -> Option<usize> {
    let count = u64::from(width).checked_mul(u64::from(height))?;
    let count = usize::try_from(count).ok()?;
    // Allocations are capped at isize::MAX bytes.
    count
        .checked_mul(core::mem::size_of::<Pixel>())
        .filter(|&bytes| bytes <= isize::MAX as usize)
        .map(|_| count)
}

/// Largest pixel count [`pixel_count`] accepts on this platform.
#[inline]
pub fn max_addressable_pixels() -> u64 {
    (isize::MAX as usize / core::mem::size_of::<Pixel>()) as u64
}
