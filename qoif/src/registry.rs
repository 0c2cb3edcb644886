//! Explicit registration of image formats with a host application.
//!
//! Nothing is registered as a side effect of using this crate: the host creates a [`Registry`]
//! during its own startup and calls [`register`] (and the equivalents of other codecs) on it.
//!
//! ```
//! let mut registry = qoif::Registry::new();
//! qoif::register(&mut registry);
//!
//! assert_eq!(registry.sniff(b"qoif\0\0\0\x01").map(|f| f.name), Some("qoi"));
//! ```

use crate::{Header, Pixel};
use imgref::ImgVec;
use snafu::Snafu;
use std::{fmt, io::Read};

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Pixel layout a format decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColorModel {
    /// Non-premultiplied 8-bit RGBA, as [`Pixel`].
    Rgba8,
}

/// Dimensions and color model of an image, as reported without decoding its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
    pub color_model: ColorModel,
}

/// How a host recognizes and decodes one image format.
#[derive(Clone, Copy)]
pub struct FormatDescriptor {
    pub name: &'static str,
    /// Prefix every file of this format starts with.
    pub magic: &'static [u8],
    pub decode: fn(&mut dyn Read) -> Result<ImgVec<Pixel>, DynError>,
    pub decode_config: fn(&mut dyn Read) -> Result<ImageConfig, DynError>,
}

impl fmt::Debug for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatDescriptor")
            .field("name", &self.name)
            .field("magic", &self.magic)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Snafu)]
pub enum RegistryError {
    #[snafu(display("unknown image format"))]
    UnknownFormat,
    #[snafu(display("failed to decode {format} image"))]
    Decode {
        format: &'static str,
        source: DynError,
    },
}

/// The set of formats a host application knows about.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    formats: Vec<FormatDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a format, replacing an earlier registration with the same name.
    pub fn register(&mut self, format: FormatDescriptor) {
        match self.formats.iter_mut().find(|f| f.name == format.name) {
            Some(existing) => *existing = format,
            None => self.formats.push(format),
        }
    }

    pub fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    /// Finds the first registered format whose magic `data` starts with.
    pub fn sniff(&self, data: &[u8]) -> Option<&FormatDescriptor> {
        self.formats.iter().find(|f| data.starts_with(f.magic))
    }

    /// Decodes `data` with the format it is recognized as, returning the format's name.
    pub fn decode(&self, data: &[u8]) -> Result<(ImgVec<Pixel>, &'static str), RegistryError> {
        let format = self.sniff(data).ok_or(RegistryError::UnknownFormat)?;
        let mut r = data;
        let img = (format.decode)(&mut r).map_err(|source| RegistryError::Decode {
            format: format.name,
            source,
        })?;

        Ok((img, format.name))
    }

    /// Reads only the dimensions of `data`, returning the format's name.
    pub fn decode_config(&self, data: &[u8]) -> Result<(ImageConfig, &'static str), RegistryError> {
        let format = self.sniff(data).ok_or(RegistryError::UnknownFormat)?;
        let mut r = data;
        let config = (format.decode_config)(&mut r).map_err(|source| RegistryError::Decode {
            format: format.name,
            source,
        })?;

        Ok((config, format.name))
    }
}

fn decode_qoi(r: &mut dyn Read) -> Result<ImgVec<Pixel>, DynError> {
    Ok(crate::decode(r)?)
}

fn decode_qoi_config(r: &mut dyn Read) -> Result<ImageConfig, DynError> {
    let Header { width, height, .. } = crate::decode_config(r)?;
    // the header's channel tag is informational, pixels are always decoded as RGBA
    Ok(ImageConfig {
        width,
        height,
        color_model: ColorModel::Rgba8,
    })
}

/// The QOI format, as seen by a [`Registry`].
pub const QOI_FORMAT: FormatDescriptor = FormatDescriptor {
    name: "qoi",
    magic: &crate::consts::QOI_MAGIC,
    decode: decode_qoi,
    decode_config: decode_qoi_config,
};

/// Registers the QOI format with `registry`.
pub fn register(registry: &mut Registry) {
    registry.register(QOI_FORMAT);
}
