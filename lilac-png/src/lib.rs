//! PNG [`RasterSink`](lilac_core::sink::RasterSink) adapter: the shipped
//! raster sink named in §4.H, encoding through the `png` crate.
//!
//! The core streams scanlines to [`PngSink`] one at a time via
//! `scanline_buffer`/`commit_scanline`, matching the engine's own
//! scanline-at-a-time read of its backing store. The `png` crate's
//! streaming writer borrows its encoder for the image's lifetime, which
//! doesn't fit this adapter's `open`-returns-an-owned-`Handle` shape
//! without a self-referential struct; instead each committed scanline is
//! appended to an in-memory RGBA buffer, and the whole image is handed to
//! the encoder in one call at `close`.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use png::{BitDepth, ColorType, Encoder};

use lilac_core::color::Color;
use lilac_core::error::LilacError;
use lilac_core::sink::RasterSink;

/// The shipped [`RasterSink`] implementation, writing 8-bit RGBA PNGs.
#[derive(Debug, Default)]
pub struct PngSink;

impl PngSink {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Per-image state: the destination path, declared dimensions, the
/// scanline scratch buffer exposed to the engine, and the accumulated RGBA
/// image bytes.
pub struct PngHandle {
    path: PathBuf,
    width: u32,
    height: u32,
    row: Vec<Color>,
    image: Vec<u8>,
}

fn encoding_error(err: impl std::error::Error + Send + Sync + 'static) -> LilacError {
    LilacError::Io(std::io::Error::other(err))
}

impl RasterSink for PngSink {
    type Handle = PngHandle;

    fn open(&mut self, path: &str, width: u32, height: u32) -> Result<Self::Handle, LilacError> {
        Ok(PngHandle {
            path: PathBuf::from(path),
            width,
            height,
            row: vec![Color::default(); width as usize],
            image: Vec::with_capacity(width as usize * height as usize * 4),
        })
    }

    fn scanline_buffer(&mut self, handle: &mut Self::Handle) -> &mut [Color] {
        &mut handle.row
    }

    fn commit_scanline(&mut self, handle: &mut Self::Handle) -> Result<(), LilacError> {
        for px in &handle.row {
            handle.image.push(px.red());
            handle.image.push(px.green());
            handle.image.push(px.blue());
            handle.image.push(px.alpha());
        }
        Ok(())
    }

    fn close(&mut self, handle: Self::Handle) -> Result<(), LilacError> {
        tracing::debug!(path = %handle.path.display(), width = handle.width, height = handle.height, "writing png");

        let file = File::create(&handle.path)?;
        let writer = BufWriter::new(file);

        let mut encoder = Encoder::new(writer, handle.width, handle.height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);

        let mut png_writer = encoder.write_header().map_err(encoding_error)?;
        png_writer
            .write_image_data(&handle.image)
            .map_err(encoding_error)?;
        Ok(())
    }
}
