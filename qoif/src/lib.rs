//! Encoder and decoder for the [QOI Image format](https://qoiformat.org/).
//!
//! QOI is a lossless, byte-oriented format for 8-bit RGB/RGBA images. Pixels are stored in raster
//! order as a stream of self-delimiting chunks, each either repeating the previous pixel, pointing
//! into a 64-slot array of recently seen colors, storing a small difference to the previous pixel,
//! or storing the pixel verbatim.
//!
//! # File layout
//!
//! - 14-byte header (see [`Header`]):
//!   - 4-byte magic: `qoif`
//!   - u32be width (non-zero)
//!   - u32be height (non-zero)
//!   - u8 channels: `3` (RGB) or `4` (RGBA), informational only
//!   - u8 colorspace: `0` (sRGB with linear alpha) or `1` (all channels linear), informational only
//! - the chunk stream (see [consts] for the different operation types)
//! - 8-byte end marker: seven `0x00` bytes followed by `0x01`
//!
//! # Color array
//!
//! Encoder and decoder both keep a zero-initialized array of 64 previously seen pixels. Every
//! pixel that was produced by a chunk other than [`QOI_OP_RUN`](consts::QOI_OP_RUN) is stored at
//! `(r * 3 + g * 5 + b * 7 + a * 11) % 64`. The stream starts with a previous pixel of
//! `(0, 0, 0, 255)`.
//!
//! # Usage
//!
//! ```
//! use qoif::{decode, encode, EncodeOptions};
//! use imgref::ImgVec;
//! use rgb::RGBA8;
//!
//! let image = ImgVec::new(vec![RGBA8::new(255, 0, 0, 255); 6], 3, 2);
//!
//! let mut file = Vec::new();
//! encode(&mut file, image.as_ref(), EncodeOptions::default()).unwrap();
//!
//! let decoded = decode(&file[..]).unwrap();
//! assert_eq!(decoded.buf(), image.buf());
//! ```
//!
//! The readers and writers are used unbuffered, chunk by chunk. Wrap files and sockets in a
//! [`BufReader`](std::io::BufReader) / [`BufWriter`](std::io::BufWriter).

pub mod decode;
pub mod encode;
pub mod header;
pub mod limits;
pub mod registry;
pub mod utils;

pub use decode::{
    decode, decode_config, decode_config_with_limits, decode_with_limits, DecodeError, ErrorKind,
    QoiDecodeContext,
};
pub use encode::{
    encode, encode_slice, BufferPool, EncodeError, EncodeOptions, Encoder, QoiEncodeContext,
};
pub use header::{Channels, ColorSpace, Header};
pub use limits::Limits;
pub use registry::{register, FormatDescriptor, Registry, RegistryError};

/// A single non-premultiplied RGBA pixel.
pub type Pixel = rgb::RGBA8;

pub mod consts {
    /// The magic bytes every QOI file starts with.
    pub const QOI_MAGIC: [u8; 4] = *b"qoif";

    /// Size of the fixed header, in bytes.
    pub const QOI_HEADER_SIZE: usize = 14;

    /// Marks the end of the stream.
    ///
    /// ```plain
    /// .- QOI_END_MARKER ----------------------------------.
    /// | Byte[0] | Byte[1] | ... | Byte[6] |    Byte[7]    |
    /// |---------+---------+-----+---------+---------------|
    /// |  0x00   |  0x00   | ... |  0x00   |     0x01      |
    /// `---------------------------------------------------`
    /// ```
    pub const QOI_END_MARKER: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

    /// The pixel every stream implicitly starts from.
    pub const QOI_START_PIXEL: crate::Pixel = crate::Pixel {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    /// Mask selecting the 2-bit tag of the short operations.
    pub const QOI_MASK_2: u8 = 0b1100_0000;

    /// Re-emit a pixel from the color array.
    ///
    /// ```plain
    /// .- QOI_OP_INDEX ----------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------|
    /// |  0  0 |     index       |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b00
    /// - 6-bit index into the color array: 0..63
    /// - A valid encoder must not issue 2 or more consecutive QOI_OP_INDEX chunks to the same
    ///   index. QOI_OP_RUN should be used instead.
    pub const QOI_OP_INDEX: u8 = 0b0000_0000;

    /// Calculate a pixel based on a 2-bit difference from the previous pixel.
    ///
    /// ```plain
    /// .- QOI_OP_DIFF -----------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----+-----+-----|
    /// |  0  1 |  dr |  dg |  db |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b01
    /// - 2-bit   red channel difference from the previous pixel between -2..1, bias of 2
    /// - 2-bit green channel difference from the previous pixel between -2..1, bias of 2
    /// - 2-bit  blue channel difference from the previous pixel between -2..1, bias of 2
    ///
    /// Differences wrap around, so `255 + 1 == 0`. Alpha stays unchanged.
    pub const QOI_OP_DIFF: u8 = 0b0100_0000;

    /// Calculate a pixel based on a 6-bit green-channel difference from the previous pixel, and
    /// differences to the green-channel difference for red and blue.
    ///
    ///  ```plain
    /// .- QOI_OP_LUMA -------------------------------------.
    /// |         Byte[0]         |         Byte[1]         |
    /// |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------+-------------+-----------|
    /// |  1  0 |  green diff     |   dr - dg   |  db - dg  |
    /// `---------------------------------------------------`
    /// ```
    ///
    /// - 2-bit tag b10
    /// - 6-bit green channel difference from the previous pixel (`-32..31`), bias of 32
    /// - 4-bit red channel difference minus green channel difference (`-8..7`), bias of 8
    /// - 4-bit blue channel difference minus green channel difference (`-8..7`), bias of 8
    ///
    /// Differences wrap around. Alpha stays unchanged.
    pub const QOI_OP_LUMA: u8 = 0b1000_0000;

    /// Repeats the last pixel.
    ///
    /// ```plain
    /// .- QOI_OP_RUN ------------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------+-----------------|
    /// |  1  1 |       run       |
    /// `-------------------------`
    /// ```
    ///
    /// - 2-bit tag b11
    /// - 6-bit run-length repeating the previous pixel: 1..62
    /// - The run-length is stored with a bias of -1. Note that the run-lengths 63 and 64 (`b111110`
    ///   and `b111111`) are illegal as they are occupied by the QOI_OP_RGB and QOI_OP_RGBA tag.
    pub const QOI_OP_RUN: u8 = 0b1100_0000;

    /// Longest run a single QOI_OP_RUN chunk can describe.
    pub const QOI_MAX_RUN: u8 = 62;

    /// Emits the RGB channels of a raw pixel, keeping the previous alpha.
    ///
    /// ```plain
    /// .- QOI_OP_RGB ------------------------------------------.
    /// |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] |
    /// |  7  6  5  4  3  2  1  0 | 7 .. 0  | 7 .. 0  | 7 .. 0  |
    /// |-------------------------+---------+---------+---------|
    /// |  1  1  1  1  1  1  1  0 |   red   |  green  |  blue   |
    /// `-------------------------------------------------------`
    /// ```
    pub const QOI_OP_RGB: u8 = 0b1111_1110;

    /// Emits a full raw pixel.
    ///
    /// ```plain
    /// .- QOI_OP_RGBA -------------------------------------------------.
    /// |         Byte[0]         | Byte[1] | Byte[2] | Byte[3] | Byte[4] |
    /// |  7  6  5  4  3  2  1  0 | 7 .. 0  | 7 .. 0  | 7 .. 0  | 7 .. 0  |
    /// |-------------------------+---------+---------+---------+---------|
    /// |  1  1  1  1  1  1  1  1 |   red   |  green  |  blue   |  alpha  |
    /// `-----------------------------------------------------------------`
    /// ```
    pub const QOI_OP_RGBA: u8 = 0b1111_1111;
}
