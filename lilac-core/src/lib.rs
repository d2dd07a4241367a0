//! Tile-based path rasterizer and compositor engine.
//!
//! An [`engine::Engine`] owns every buffer described in the data model: the
//! gamma table and blend cache (`gamma`, `blend`), the per-path
//! intersection buffer (`intersection`) and accumulator (`path`), the tile
//! fill algorithm (`raster`), the backing store (`store`), and the state
//! machine gating all of it (`engine`). `sink` defines the contract an
//! external encoder must satisfy to receive the finished image; `lilac-png`
//! is the shipped implementation.

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub(crate) mod bitwise;

pub mod blend;
pub mod color;
pub mod engine;
pub mod error;
pub mod gamma;
pub mod intersection;
pub mod path;
pub mod raster;
pub mod sink;
pub mod store;

pub use color::Color;
pub use engine::{Engine, EngineState, TileLock};
pub use error::{Diagnostics, ErrorHandler, LilacError, WarningHandler};
pub use sink::RasterSink;
