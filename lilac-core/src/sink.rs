//! The contract an external raster sink must satisfy to receive a finished
//! image from `compile` (component H). `lilac-png` is the shipped
//! implementation; this trait lets `lilac-core` stay free of any
//! particular encoding crate.

use crate::color::Color;
use crate::error::LilacError;

/// Accepts a finished raster one scanline at a time. Implementations retain
/// no state across separate `open`/`close` pairs.
pub trait RasterSink {
    /// Per-image state returned by `open` and threaded through the rest of
    /// the calls (a file handle, an encoder writer, etc).
    type Handle;

    /// Opens `path` for writing a `width x height` image.
    ///
    /// # Errors
    ///
    /// Implementations should return an error for an unwritable path or an
    /// unsupported format.
    fn open(&mut self, path: &str, width: u32, height: u32) -> Result<Self::Handle, LilacError>;

    /// Returns a mutable view of exactly `width` packed pixels to fill with
    /// the next scanline.
    fn scanline_buffer(&mut self, handle: &mut Self::Handle) -> &mut [Color];

    /// Commits whatever `scanline_buffer` currently holds as the next row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row can't be encoded or written.
    fn commit_scanline(&mut self, handle: &mut Self::Handle) -> Result<(), LilacError>;

    /// Finalizes the image. A failure here is non-essential (see §7) and is
    /// reported as a warning rather than routed as fatal by the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization (e.g. flushing an encoder) fails.
    fn close(&mut self, handle: Self::Handle) -> Result<(), LilacError>;
}

/// Validates that `path` ends in a case-insensitive match of `.png`, per
/// the output-path constraint in §6.
///
/// # Errors
///
/// Returns [`LilacError::ParameterDomain`] otherwise.
pub fn validate_png_path(path: &str) -> Result<(), LilacError> {
    if path.to_ascii_lowercase().ends_with(".png") {
        Ok(())
    } else {
        Err(LilacError::parameter_domain(
            "path",
            "must end in a case-insensitive match of `.png`",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_mixed_case_extension() {
        assert!(validate_png_path("out.PNG").is_ok());
        assert!(validate_png_path("out.Png").is_ok());
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(validate_png_path("out.jpg").is_err());
        assert!(validate_png_path("out").is_err());
    }
}
