use crate::{
    consts::*,
    header::Header,
    limits::Limits,
    utils::{hash, max_addressable_pixels},
    Pixel,
};
use byteorder::ReadBytesExt;
use imgref::ImgVec;
use snafu::{ensure, Snafu};
use std::io::{self, Read};

mod ops;

use ops::{direct_luma_diff, direct_small_diff};

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub(crate)))]
pub enum DecodeError {
    #[snafu(display("not a QOI file: bad magic \"{}\"", magic.escape_ascii()))]
    InvalidMagic { magic: [u8; 4] },
    #[snafu(display("invalid channel count: {channels}"))]
    InvalidChannels { channels: u8 },
    #[snafu(display("invalid color space: {colorspace}"))]
    InvalidColorSpace { colorspace: u8 },
    #[snafu(display("invalid image dimensions: {width}x{height}"))]
    InvalidDimensions { width: u32, height: u32 },
    #[snafu(display(
        "image dimensions {width}x{height} exceed the limit of {max_pixels} pixels"
    ))]
    TooManyPixels {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
    #[snafu(display("invalid chunk tag: {tag:#04x}"))]
    InvalidChunkTag { tag: u8 },
    #[snafu(display("invalid end marker: {marker:02x?}"))]
    InvalidEndMarker { marker: [u8; 8] },
    #[snafu(display("unexpected end of input"))]
    UnexpectedEof,
    #[snafu(display("no image data"))]
    EndOfStream,
    #[snafu(display("failed to read image data"))]
    Io { source: io::Error },
}

/// Broad classes of [`DecodeError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not a valid QOI image.
    Format,
    /// The input ended where more bytes were required.
    Truncated,
    /// The input ended cleanly before the first header byte.
    EndOfStream,
    /// The underlying reader failed.
    Io,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::UnexpectedEof => ErrorKind::Truncated,
            DecodeError::EndOfStream => ErrorKind::EndOfStream,
            DecodeError::Io { .. } => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }
}

fn eof_or_io(source: io::Error) -> DecodeError {
    if source.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::UnexpectedEof
    } else {
        DecodeError::Io { source }
    }
}

/// Upper bound for the pixel buffer reserved before any chunk is read (16 MiB of RGBA).
const MAX_INITIAL_PIXELS: usize = 1 << 22;

/// The state of the chunk stream decoder.
#[derive(Debug, Clone, Copy)]
pub struct QoiDecodeContext {
    pub prev: Pixel,
    /// Remaining repeats of `prev` from the last run chunk.
    pub run: u8,
    pub arr: [Pixel; 64],
}

impl QoiDecodeContext {
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
        }
    }
}

impl Default for QoiDecodeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl QoiDecodeContext {
    /// Produces the next pixel of the stream, reading a chunk from `r` if no run is pending.
    pub fn advance<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<Pixel, DecodeError> {
        if self.run > 0 {
            self.run -= 1;
            return Ok(self.prev);
        }

        let byte = r.read_u8().map_err(eof_or_io)?;

        let pixel = match byte {
            QOI_OP_RGB => {
                let mut rgb = [0; 3];
                r.read_exact(&mut rgb).map_err(eof_or_io)?;
                let [red, green, blue] = rgb;
                Pixel::new(red, green, blue, self.prev.a)
            }
            QOI_OP_RGBA => {
                let mut rgba = [0; 4];
                r.read_exact(&mut rgba).map_err(eof_or_io)?;
                let [red, green, blue, alpha] = rgba;
                Pixel::new(red, green, blue, alpha)
            }
            _ => match byte & QOI_MASK_2 {
                QOI_OP_INDEX => self.arr[usize::from(byte & 0b0011_1111)],
                QOI_OP_DIFF => direct_small_diff(self.prev, byte),
                QOI_OP_LUMA => {
                    direct_luma_diff(self.prev, byte, r.read_u8().map_err(eof_or_io)?)
                }
                QOI_OP_RUN => {
                    self.run = byte & 0b0011_1111;
                    return Ok(self.prev);
                }
                _ => return decode_error::InvalidChunkTagSnafu { tag: byte }.fail(),
            },
        };

        self.arr[usize::from(hash(pixel))] = pixel;
        self.prev = pixel;
        Ok(pixel)
    }

    /// Consumes and verifies the end marker.
    pub fn finish<R: Read + ?Sized>(&mut self, r: &mut R) -> Result<(), DecodeError> {
        let mut marker = [0; 8];
        r.read_exact(&mut marker).map_err(eof_or_io)?;
        ensure!(
            marker == QOI_END_MARKER,
            decode_error::InvalidEndMarkerSnafu { marker }
        );

        Ok(())
    }

    /// Decodes the chunk stream and end marker following `header`, starting from the current
    /// state.
    pub fn decode_pixels<R: Read + ?Sized>(
        &mut self,
        r: &mut R,
        header: &Header,
    ) -> Result<ImgVec<Pixel>, DecodeError> {
        let count = header.pixel_count().ok_or(DecodeError::TooManyPixels {
            width: header.width,
            height: header.height,
            max_pixels: max_addressable_pixels(),
        })?;

        // Grows with the decoded data past the initial reservation.
        let mut pixels = Vec::with_capacity(count.min(MAX_INITIAL_PIXELS));
        while pixels.len() < count {
            let pixel = self.advance(r)?;
            pixels.push(pixel);

            // Write out pending repeats in one go. Repeats past the last pixel are ignored.
            let repeats = usize::from(self.run).min(count - pixels.len());
            if repeats > 0 {
                pixels.extend(core::iter::repeat(pixel).take(repeats));
                self.run -= repeats as u8;
            }
        }

        self.finish(r)?;

        Ok(ImgVec::new(
            pixels,
            header.width as usize,
            header.height as usize,
        ))
    }
}

/// Reads a QOI image from `r`, with the default [`Limits`].
///
/// The result always holds RGBA pixels, independent of the channel count stored in the header.
pub fn decode<R: Read>(r: R) -> Result<ImgVec<Pixel>, DecodeError> {
    decode_with_limits(r, &Limits::default())
}

/// Reads a QOI image from `r`, rejecting headers that exceed `limits` before allocating.
pub fn decode_with_limits<R: Read>(
    mut r: R,
    limits: &Limits,
) -> Result<ImgVec<Pixel>, DecodeError> {
    let header = match Header::read_from(&mut r, limits) {
        Err(DecodeError::EndOfStream) => return decode_error::UnexpectedEofSnafu.fail(),
        header => header?,
    };

    log::debug!(
        "decoding {}x{} QOI image ({:?}, {:?})",
        header.width,
        header.height,
        header.channels,
        header.colorspace
    );

    QoiDecodeContext::new().decode_pixels(&mut r, &header)
}

/// Reads only the header of a QOI image from `r`.
///
/// The pixels of a decoded image are always RGBA, the header's channel count and colorspace are
/// informational.
pub fn decode_config<R: Read>(r: R) -> Result<Header, DecodeError> {
    decode_config_with_limits(r, &Limits::default())
}

/// Reads only the header of a QOI image from `r`, rejecting it if it exceeds `limits`.
pub fn decode_config_with_limits<R: Read>(
    mut r: R,
    limits: &Limits,
) -> Result<Header, DecodeError> {
    Header::read_from(&mut r, limits)
}
