use crate::{utils::apply_diff, Pixel};

// OP: 0b01
#[inline(always)]
pub(crate) const fn direct_small_diff(prev: Pixel, byte: u8) -> Pixel {
    let (r_diff, g_diff, b_diff) = (
        ((byte >> 4) & 0b11) as i8 - 2,
        ((byte >> 2) & 0b11) as i8 - 2,
        (byte & 0b11) as i8 - 2,
    );

    apply_diff(prev, r_diff, g_diff, b_diff)
}

// OP: 0b10
#[inline(always)]
pub(crate) const fn direct_luma_diff(prev: Pixel, byte: u8, rg_bg_diffs: u8) -> Pixel {
    let g_diff = (byte & 0b0011_1111) as i8 - 32;
    let (rg_diff, bg_diff) = (
        (rg_bg_diffs >> 4) as i8 - 8,
        (rg_bg_diffs & 0b1111) as i8 - 8,
    );
    // Both sums stay within -40..38, no overflow possible.
    let (r_diff, b_diff) = (rg_diff + g_diff, bg_diff + g_diff);

    apply_diff(prev, r_diff, g_diff, b_diff)
}
