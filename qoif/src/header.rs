use crate::{
    consts::{QOI_HEADER_SIZE, QOI_MAGIC},
    decode::{decode_error, DecodeError},
    limits::Limits,
    utils,
};
use byteorder::{BigEndian, ByteOrder};
use snafu::{ensure, OptionExt};
use std::io::{self, Read};

/// Number of color channels an image was encoded from.
///
/// Purely informational: decoding always produces RGBA pixels.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channels {
    Rgb = 3,
    #[default]
    Rgba = 4,
}

impl Channels {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Colorspace tag of an image. Purely informational, the pixel data is never converted.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// sRGB color channels with a linear alpha channel.
    #[default]
    Srgb = 0,
    /// All channels linear.
    Linear = 1,
}

impl ColorSpace {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Srgb),
            1 => Some(Self::Linear),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// The fixed 14-byte header at the start of every QOI file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    pub colorspace: ColorSpace,
}

impl Header {
    pub const fn new(width: u32, height: u32, channels: Channels, colorspace: ColorSpace) -> Self {
        Self {
            width,
            height,
            channels,
            colorspace,
        }
    }

    /// Number of pixels described by this header, if they fit into an addressable buffer.
    pub fn pixel_count(&self) -> Option<usize> {
        utils::pixel_count(self.width, self.height)
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; QOI_HEADER_SIZE] {
        let mut bytes = [0; QOI_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&QOI_MAGIC);
        BigEndian::write_u32(&mut bytes[4..8], self.width);
        BigEndian::write_u32(&mut bytes[8..12], self.height);
        bytes[12] = self.channels.as_u8();
        bytes[13] = self.colorspace.as_u8();
        bytes
    }

    /// Parses and validates a header.
    ///
    /// Besides the format fields, this rejects empty images and images larger than `limits` or
    /// than what could be allocated on this platform.
    pub fn from_bytes(
        bytes: &[u8; QOI_HEADER_SIZE],
        limits: &Limits,
    ) -> Result<Self, DecodeError> {
        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        ensure!(magic == QOI_MAGIC, decode_error::InvalidMagicSnafu { magic });

        let width = BigEndian::read_u32(&bytes[4..8]);
        let height = BigEndian::read_u32(&bytes[8..12]);

        let channels = Channels::from_u8(bytes[12]).context(decode_error::InvalidChannelsSnafu {
            channels: bytes[12],
        })?;
        let colorspace =
            ColorSpace::from_u8(bytes[13]).context(decode_error::InvalidColorSpaceSnafu {
                colorspace: bytes[13],
            })?;

        ensure!(
            width != 0 && height != 0,
            decode_error::InvalidDimensionsSnafu { width, height }
        );
        ensure!(
            limits.allows(width, height),
            decode_error::TooManyPixelsSnafu {
                width,
                height,
                max_pixels: limits.max_pixels
            }
        );
        ensure!(
            utils::pixel_count(width, height).is_some(),
            decode_error::TooManyPixelsSnafu {
                width,
                height,
                max_pixels: utils::max_addressable_pixels()
            }
        );

        Ok(Self {
            width,
            height,
            channels,
            colorspace,
        })
    }

    /// Reads and validates a header from the start of `r`.
    ///
    /// A reader that is already exhausted yields [`DecodeError::EndOfStream`], a reader that ends
    /// within the header yields [`DecodeError::UnexpectedEof`].
    pub fn read_from<R: Read + ?Sized>(r: &mut R, limits: &Limits) -> Result<Self, DecodeError> {
        let mut bytes = [0; QOI_HEADER_SIZE];
        let mut filled = 0;

        while filled < bytes.len() {
            match r.read(&mut bytes[filled..]) {
                Ok(0) if filled == 0 => return decode_error::EndOfStreamSnafu.fail(),
                Ok(0) => return decode_error::UnexpectedEofSnafu.fail(),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(source) => return Err(DecodeError::Io { source }),
            }
        }

        Self::from_bytes(&bytes, limits)
    }
}
