//! Byte-addressable backing store for the finished pixel buffer (component
//! G). Backed by an anonymous temporary file so the process's resident set
//! doesn't scale with image size, matching the streaming-assembly intent
//! for very large renders.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::color::Color;
use crate::error::LilacError;

/// Allocates exactly `width * height * 4` bytes, scanline order, top to
/// bottom, machine byte order per packed pixel.
pub struct BackingStore {
    file: File,
    width: u32,
}

impl BackingStore {
    /// # Errors
    ///
    /// Returns [`LilacError::Io`] if the temporary file can't be created or
    /// sized.
    pub fn new(width: u32, height: u32) -> Result<Self, LilacError> {
        let file = tempfile::tempfile()?;
        file.set_len(u64::from(width) * u64::from(height) * 4)?;
        Ok(Self { file, width })
    }

    /// Writes one tile's live region, row by row, via random-access seeks
    /// into the store. `tile_buf` is the full `dim x dim` allocation; only
    /// the first `tile_w` columns of each of the first `tile_h` rows are
    /// read.
    ///
    /// # Errors
    ///
    /// Returns [`LilacError::Io`] on seek or write failure.
    pub fn write_tile(
        &mut self,
        tile_x: u32,
        tile_y: u32,
        tile_w: u32,
        tile_h: u32,
        dim: u32,
        tile_buf: &[Color],
    ) -> Result<(), LilacError> {
        let mut row_bytes = Vec::with_capacity(tile_w as usize * 4);
        for row in 0..tile_h {
            let offset = (u64::from(tile_y + row) * u64::from(self.width) + u64::from(tile_x)) * 4;
            self.file.seek(SeekFrom::Start(offset))?;

            row_bytes.clear();
            let row_start = (row * dim) as usize;
            for px in &tile_buf[row_start..row_start + tile_w as usize] {
                row_bytes.extend_from_slice(&px.0.to_ne_bytes());
            }
            self.file.write_all(&row_bytes)?;
        }
        Ok(())
    }

    /// Reads one full scanline (`width` packed pixels) at row `y` into
    /// `buf`. Intended to be called with `y` ascending from 0, matching the
    /// sequential read the sink expects, though each call seeks
    /// independently so out-of-order reads are also correct.
    ///
    /// # Errors
    ///
    /// Returns [`LilacError::Io`] on seek or read failure, or if `buf` is
    /// shorter than `width`.
    pub fn read_scanline(&mut self, y: u32, buf: &mut [Color]) -> Result<(), LilacError> {
        let offset = u64::from(y) * u64::from(self.width) * 4;
        self.file.seek(SeekFrom::Start(offset))?;

        let mut bytes = vec![0u8; self.width as usize * 4];
        self.file.read_exact(&mut bytes)?;

        for (slot, chunk) in buf.iter_mut().zip(bytes.chunks_exact(4)) {
            let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            *slot = Color(word);
        }
        Ok(())
    }
}
