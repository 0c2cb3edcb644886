use crate::{
    consts::*,
    header::{Channels, ColorSpace, Header},
    utils::{diff, hash},
    Pixel,
};
use imgref::ImgRef;
use snafu::{ensure, ResultExt, Snafu};
use std::io::Write;

mod pool;
pub use pool::*;

#[derive(Debug, Snafu)]
pub enum EncodeError {
    #[snafu(display(
        "Image dimensions {width}x{height} can't be encoded, both need to be within 1..2^32"
    ))]
    InvalidDimensions { width: usize, height: usize },
    #[snafu(display(
        "Specified image dimensions don't match the number of pixels: {width} * {height} pixels, but {pixel_count} pixels were given"
    ))]
    PixelCountMismatch {
        width: usize,
        height: usize,
        pixel_count: usize,
    },
    #[snafu(display("failed to write image data"))]
    WriteIo { source: std::io::Error },
}

macro_rules! w {
    ($w:expr, $bytes:expr) => {
        $w.write_all($bytes).context(WriteIoSnafu)
    };
}

/// Header tags written by the encoder.
///
/// Both are informational: the pixel data is always encoded losslessly as RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub channels: Channels,
    pub colorspace: ColorSpace,
}

/// The state of the chunk stream encoder. Mirrors [`QoiDecodeContext`](crate::QoiDecodeContext).
#[derive(Debug, Clone, Copy)]
pub struct QoiEncodeContext {
    pub prev: Pixel,
    /// Repeats of `prev` not yet written out.
    pub run: u8,
    pub arr: [Pixel; 64],
    /// Whether the first pixel of the stream has been written.
    started: bool,
    /// Channel tag of the header being written.
    channels: Channels,
}

impl QoiEncodeContext {
    pub const fn new() -> Self {
        Self {
            prev: QOI_START_PIXEL,
            run: 0,
            arr: [Pixel {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            }; 64],
            started: false,
            channels: Channels::Rgba,
        }
    }

    /// Starts a stream whose header carries the given channel tag.
    ///
    /// With [`Channels::Rgb`], an opaque first pixel is written as `QOI_OP_RGB` instead of
    /// `QOI_OP_RGBA`.
    pub const fn with_channels(channels: Channels) -> Self {
        let mut ctx = Self::new();
        ctx.channels = channels;
        ctx
    }

    /// Returns the context to the state at the start of a stream.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for QoiEncodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl QoiEncodeContext {
    /// Encodes a complete QOI file using a fresh context.
    pub fn encode<W: Write>(
        img: ImgRef<'_, Pixel>,
        options: EncodeOptions,
        w: W,
    ) -> Result<(), EncodeError> {
        let mut ctx = QoiEncodeContext::new();
        ctx.encode_with_state(img, options, w)
    }

    pub fn encode_header<W: Write>(header: &Header, mut w: W) -> Result<(), EncodeError> {
        w!(w, &header.to_bytes())
    }

    /// Encodes a complete QOI file, reusing this context.
    ///
    /// The context is reset first, so any state left over from earlier images is discarded.
    pub fn encode_with_state<W: Write>(
        &mut self,
        img: ImgRef<'_, Pixel>,
        options: EncodeOptions,
        w: W,
    ) -> Result<(), EncodeError> {
        let header = checked_header(img.width(), img.height(), options)?;
        self.encode_rows(&header, img.rows(), w)
    }

    /// Encodes a complete QOI file from tightly packed rows of `width` pixels, reusing this
    /// context.
    pub fn encode_slice_with_state<W: Write>(
        &mut self,
        width: usize,
        height: usize,
        pixels: &[Pixel],
        options: EncodeOptions,
        w: W,
    ) -> Result<(), EncodeError> {
        let header = checked_header(width, height, options)?;
        ensure!(
            width.checked_mul(height) == Some(pixels.len()),
            PixelCountMismatchSnafu {
                width,
                height,
                pixel_count: pixels.len()
            }
        );

        self.encode_rows(&header, pixels.chunks(width), w)
    }

    fn encode_rows<'a, W: Write>(
        &mut self,
        header: &Header,
        rows: impl Iterator<Item = &'a [Pixel]>,
        mut w: W,
    ) -> Result<(), EncodeError> {
        log::debug!(
            "encoding {}x{} QOI image ({:?}, {:?})",
            header.width,
            header.height,
            header.channels,
            header.colorspace
        );

        *self = Self::with_channels(header.channels);
        Self::encode_header(header, &mut w)?;

        for row in rows {
            for &pixel in row {
                self.step(pixel, &mut w)?;
            }
        }

        self.finish(&mut w)
    }

    /// Feeds the next pixel to the encoder, writing out any chunk that is complete.
    pub fn step<W: Write + ?Sized>(&mut self, pixel: Pixel, w: &mut W) -> Result<(), EncodeError> {
        if self.started && pixel == self.prev {
            self.run += 1;
            if self.run == QOI_MAX_RUN {
                self.flush_run(w)?;
            }

            // already same as prev and already in color array
            return Ok(());
        }

        self.flush_run(w)?;

        let index = hash(pixel);
        let slot = usize::from(index);

        if !self.started {
            // The first pixel is always written out in full.
            self.started = true;
            if self.channels == Channels::Rgb && pixel.a == self.prev.a {
                w!(w, &[QOI_OP_RGB, pixel.r, pixel.g, pixel.b])?;
            } else {
                w!(w, &[QOI_OP_RGBA, pixel.r, pixel.g, pixel.b, pixel.a])?;
            }
        } else if self.arr[slot] == pixel {
            w!(w, &[QOI_OP_INDEX | index])?;
        } else if pixel.a == self.prev.a {
            let (r_diff, g_diff, b_diff) = (
                diff(pixel.r, self.prev.r),
                diff(pixel.g, self.prev.g),
                diff(pixel.b, self.prev.b),
            );

            let rg_diff = r_diff.wrapping_sub(g_diff);
            let bg_diff = b_diff.wrapping_sub(g_diff);

            if matches!((r_diff, g_diff, b_diff), (-2..=1, -2..=1, -2..=1)) {
                let mut b = QOI_OP_DIFF;
                b |= ((r_diff + 2) << 4) as u8;
                b |= ((g_diff + 2) << 2) as u8;
                b |= (b_diff + 2) as u8;

                w!(w, &[b])?;
            } else if matches!((rg_diff, g_diff, bg_diff), (-8..=7, -32..=31, -8..=7)) {
                let bytes = [
                    QOI_OP_LUMA | (g_diff + 32) as u8,
                    ((rg_diff + 8) as u8) << 4 | (bg_diff + 8) as u8,
                ];

                w!(w, &bytes)?;
            } else {
                w!(w, &[QOI_OP_RGB, pixel.r, pixel.g, pixel.b])?;
            }
        } else {
            w!(w, &[QOI_OP_RGBA, pixel.r, pixel.g, pixel.b, pixel.a])?;
        }

        self.arr[slot] = pixel;
        self.prev = pixel;

        Ok(())
    }

    /// Writes out the pending run, if any.
    pub fn flush_run<W: Write + ?Sized>(&mut self, w: &mut W) -> Result<(), EncodeError> {
        if self.run > 0 {
            // run-length is stored with a bias of -1
            w!(w, &[QOI_OP_RUN | (self.run - 1)])?;
            self.run = 0;
        }

        Ok(())
    }

    /// Flushes the pending run and writes the end marker.
    pub fn finish<W: Write + ?Sized>(&mut self, w: &mut W) -> Result<(), EncodeError> {
        self.flush_run(w)?;
        w!(w, &QOI_END_MARKER)
    }
}

/// Builds the header for an image, rejecting dimensions outside of `1..2^32`.
fn checked_header(
    width: usize,
    height: usize,
    options: EncodeOptions,
) -> Result<Header, EncodeError> {
    let invalid = || EncodeError::InvalidDimensions { width, height };
    let width = u32::try_from(width)
        .ok()
        .filter(|&width| width > 0)
        .ok_or_else(invalid)?;
    let height = u32::try_from(height)
        .ok()
        .filter(|&height| height > 0)
        .ok_or_else(invalid)?;

    Ok(Header::new(width, height, options.channels, options.colorspace))
}

/// Writes `img` to `w` as a QOI file.
///
/// `options` only select the channel count and colorspace tags stored in the header.
pub fn encode<W: Write>(
    w: W,
    img: ImgRef<'_, Pixel>,
    options: EncodeOptions,
) -> Result<(), EncodeError> {
    QoiEncodeContext::encode(img, options, w)
}

/// Writes `width` x `height` tightly packed pixels to `w` as a QOI file.
pub fn encode_slice<W: Write>(
    w: W,
    width: usize,
    height: usize,
    pixels: &[Pixel],
    options: EncodeOptions,
) -> Result<(), EncodeError> {
    QoiEncodeContext::new().encode_slice_with_state(width, height, pixels, options, w)
}
