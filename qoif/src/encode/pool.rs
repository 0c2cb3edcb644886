use super::{EncodeError, EncodeOptions, QoiEncodeContext};
use crate::Pixel;
use imgref::ImgRef;
use std::io::Write;

/// A caller-provided source of reusable encoder state.
///
/// The encoder never depends on a pool: without one, every image gets a fresh context. A buffer
/// handed out by [`get`](BufferPool::get) is used by one encode call at a time and returned with
/// [`put`](BufferPool::put) afterwards. Sharing a pool between threads is up to the implementor.
pub trait BufferPool {
    fn get(&mut self) -> Option<Box<QoiEncodeContext>>;
    fn put(&mut self, buffer: Box<QoiEncodeContext>);
}

impl BufferPool for Vec<Box<QoiEncodeContext>> {
    fn get(&mut self) -> Option<Box<QoiEncodeContext>> {
        self.pop()
    }

    fn put(&mut self, buffer: Box<QoiEncodeContext>) {
        self.push(buffer);
    }
}

/// An encoder with fixed [`EncodeOptions`] and an optional [`BufferPool`].
#[derive(Default)]
pub struct Encoder<'p> {
    pub options: EncodeOptions,
    pub pool: Option<&'p mut dyn BufferPool>,
}

impl<'p> Encoder<'p> {
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            options,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: &'p mut dyn BufferPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Writes `img` to `w` as a QOI file.
    ///
    /// The context is taken from the pool if there is one, and put back even if encoding failed.
    pub fn encode<W: Write>(&mut self, w: W, img: ImgRef<'_, Pixel>) -> Result<(), EncodeError> {
        let mut ctx = self
            .pool
            .as_mut()
            .and_then(|pool| pool.get())
            .unwrap_or_default();

        let result = ctx.encode_with_state(img, self.options, w);

        if let Some(pool) = self.pool.as_mut() {
            pool.put(ctx);
        }

        result
    }
}
