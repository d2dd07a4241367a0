//! The tile engine: the state machine that owns every buffer from `init`
//! through `compile` (component F).
//!
//! Every public operation is gated on [`EngineState`]. A gate violation, a
//! capacity overflow, or an I/O failure is routed through the installed
//! [`Diagnostics`] error handler, whose `-> !` return type makes "does not
//! return" a property the compiler checks rather than a convention callers
//! might ignore.

use crate::blend::Blender;
use crate::color::Color;
use crate::error::{Diagnostics, ErrorHandler, LilacError, WarningHandler};
use crate::gamma::GammaTable;
use crate::path::{PathAccumulator, TileGeometry};
use crate::raster;
use crate::sink::{self, RasterSink};
use crate::store::BackingStore;

/// One of the six states from the data model in §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No engine instance exists yet; present only for completeness of the
    /// documented state set. `Engine::init` constructs an instance already
    /// in [`EngineState::Init`].
    Ready,
    Init,
    Tile,
    Path,
    Lock,
    Closed,
}

/// The loan handed out by [`Engine::lock`]: a mutable view of the whole
/// `dim x dim` tile allocation plus the live-region geometry. Dropping it
/// (or calling [`Engine::unlock`] after it is dropped) ends the loan.
pub struct TileLock<'a> {
    pub data: &'a mut [Color],
    pub x: u32,
    pub y: u32,
    pub pitch: u32,
    pub w: u32,
    pub h: u32,
}

/// Owns every buffer in the data model and carries the state machine
/// variable. One instance renders exactly one image, from `init` through
/// `compile`.
pub struct Engine {
    state: EngineState,
    width: u32,
    height: u32,
    dim: u32,
    cols: u32,
    tile_count: u32,
    finished: u32,
    current: TileGeometry,
    current_color: Color,
    background: Color,
    blender: Blender,
    tile_buf: Vec<Color>,
    path: PathAccumulator,
    delta: Vec<i32>,
    store: BackingStore,
    diagnostics: Diagnostics,
}

impl Engine {
    /// Validates parameters, allocates the backing store, and constructs an
    /// engine already in [`EngineState::Init`].
    ///
    /// An in-range `dim` is shrunk further to `max(max(width, height), 64)`
    /// if the image is smaller than the requested tile side.
    ///
    /// Invalid `width`/`height`/`dim`, gamma-table integrity failure, or
    /// backing store allocation failure are fatal and routed through
    /// `on_error` (or the default handler, which logs via `tracing` and
    /// exits).
    #[must_use]
    pub fn init(
        width: u32,
        height: u32,
        dim: u32,
        background: Color,
        on_error: Option<ErrorHandler>,
        on_warning: Option<WarningHandler>,
    ) -> Self {
        let mut diagnostics = Diagnostics::new(on_error, on_warning);

        if !(1..=16384).contains(&width) {
            diagnostics.fatal(LilacError::parameter_domain("width", "must be in [1, 16384]"));
        }
        if !(1..=16384).contains(&height) {
            diagnostics.fatal(LilacError::parameter_domain("height", "must be in [1, 16384]"));
        }

        if !(64..=4096).contains(&dim) {
            diagnostics.fatal(LilacError::parameter_domain("dim", "must be in [64, 4096]"));
        }

        let mut dim = dim;
        let max_dim = width.max(height);
        if dim > max_dim {
            dim = max_dim.max(64);
        }

        let gamma = GammaTable::new();
        if let Err(err) = gamma.verify() {
            diagnostics.fatal(err);
        }

        let store = match BackingStore::new(width, height) {
            Ok(store) => store,
            Err(err) => diagnostics.fatal(err),
        };

        let cols = width.div_ceil(dim);
        let rows = height.div_ceil(dim);

        Self {
            state: EngineState::Init,
            width,
            height,
            dim,
            cols,
            tile_count: cols * rows,
            finished: 0,
            current: TileGeometry {
                tile_x: 0,
                tile_y: 0,
                tile_w: 0,
                tile_h: 0,
            },
            current_color: Color::from_argb(255, 0, 0, 0),
            background,
            blender: Blender::new(gamma),
            tile_buf: vec![background; (dim * dim) as usize],
            path: PathAccumulator::new(),
            delta: Vec::new(),
            store,
            diagnostics,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total tile count, `⌈width/dim⌉ x ⌈height/dim⌉`.
    #[must_use]
    pub fn tiles(&self) -> u32 {
        self.tile_count
    }

    /// Sets the current fill color, consulted only at `end_path`. Legal in
    /// every state except `Ready` and `Closed`.
    pub fn color(&mut self, col: Color) {
        match self.state {
            EngineState::Init | EngineState::Tile | EngineState::Path | EngineState::Lock => {
                self.current_color = col;
            }
            EngineState::Ready | EngineState::Closed => {
                self.diagnostics
                    .fatal(LilacError::state_misuse("color", self.state));
            }
        }
    }

    /// Utility: a pure function of its arguments, legal in any state.
    pub fn blend(&mut self, over: Color, under: Color) -> Color {
        self.blender.blend(over, under)
    }

    /// Opens the next tile in row-major order and resets its buffer to the
    /// background color. Fatal if not in `Init` or if every tile has
    /// already been rendered.
    pub fn begin_tile(&mut self) {
        if self.state != EngineState::Init {
            self.diagnostics
                .fatal(LilacError::state_misuse("begin_tile", self.state));
        }
        if self.finished == self.tile_count {
            self.diagnostics.fatal(LilacError::parameter_domain(
                "tile_index",
                "every tile has already been rendered",
            ));
        }

        let index = self.finished;
        let row = index / self.cols;
        let col = index % self.cols;
        let tile_x = col * self.dim;
        let tile_y = row * self.dim;

        self.current = TileGeometry {
            tile_x,
            tile_y,
            tile_w: self.dim.min(self.width - tile_x),
            tile_h: self.dim.min(self.height - tile_y),
        };

        for px in &mut self.tile_buf {
            *px = self.background;
        }
        self.state = EngineState::Tile;
    }

    /// Resets the path accumulator for the open tile. Fatal outside `Tile`.
    pub fn begin_path(&mut self) {
        if self.state != EngineState::Tile {
            self.diagnostics
                .fatal(LilacError::state_misuse("begin_path", self.state));
        }
        self.path.begin(self.current);
        self.state = EngineState::Path;
    }

    /// Adds a line segment to the open path. Fatal outside `Path`, or if the
    /// coordinates are non-finite, or on starting-count/buffer overflow.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        if self.state != EngineState::Path {
            self.diagnostics
                .fatal(LilacError::state_misuse("line", self.state));
        }
        if let Err(err) = self.path.line(x1, y1, x2, y2) {
            self.diagnostics.fatal(err);
        }
    }

    /// Adds a dot to the open path. Fatal outside `Path`, or on a
    /// non-finite/non-positive argument, or on overflow.
    pub fn dot(&mut self, cx: f64, cy: f64, r: f64) {
        if self.state != EngineState::Path {
            self.diagnostics
                .fatal(LilacError::state_misuse("dot", self.state));
        }
        if let Err(err) = self.path.dot(cx, cy, r) {
            self.diagnostics.fatal(err);
        }
    }

    /// Runs the tile rasterizer (§4.E) and returns to `Tile`. Fatal outside
    /// `Path`, or on fill-count/delta overflow.
    pub fn end_path(&mut self) {
        if self.state != EngineState::Path {
            self.diagnostics
                .fatal(LilacError::state_misuse("end_path", self.state));
        }
        let tile = self.current;
        if let Err(err) = raster::fill(
            &mut self.path,
            tile,
            self.dim,
            self.current_color,
            &mut self.blender,
            &mut self.tile_buf,
            &mut self.delta,
        ) {
            self.diagnostics.fatal(err);
        }
        self.state = EngineState::Tile;
    }

    /// Loans a mutable view of the tile buffer to the caller. Fatal outside
    /// `Tile`. The loan ends when the returned [`TileLock`] is dropped; call
    /// [`Engine::unlock`] afterward to return to `Tile`.
    pub fn lock(&mut self) -> TileLock<'_> {
        if self.state != EngineState::Tile {
            self.diagnostics
                .fatal(LilacError::state_misuse("lock", self.state));
        }
        let tile = self.current;
        self.state = EngineState::Lock;
        TileLock {
            data: &mut self.tile_buf,
            x: tile.tile_x,
            y: tile.tile_y,
            pitch: self.dim,
            w: tile.tile_w,
            h: tile.tile_h,
        }
    }

    /// Ends the loan from `lock`. Fatal outside `Lock`.
    pub fn unlock(&mut self) {
        if self.state != EngineState::Lock {
            self.diagnostics
                .fatal(LilacError::state_misuse("unlock", self.state));
        }
        self.state = EngineState::Tile;
    }

    /// Writes the tile's live region to the backing store and returns to
    /// `Init`. Fatal outside `Tile`, or on I/O failure.
    pub fn end_tile(&mut self) {
        if self.state != EngineState::Tile {
            self.diagnostics
                .fatal(LilacError::state_misuse("end_tile", self.state));
        }
        let tile = self.current;
        if let Err(err) = self.store.write_tile(
            tile.tile_x,
            tile.tile_y,
            tile.tile_w,
            tile.tile_h,
            self.dim,
            &self.tile_buf,
        ) {
            self.diagnostics.fatal(err);
        }
        self.finished += 1;
        self.state = EngineState::Init;
    }

    /// Streams the backing store to `sink` scanline by scanline and enters
    /// `Closed`. Fatal unless every tile has been rendered, or on a path
    /// that doesn't end in `.png`, or on essential sink I/O failure. A
    /// failure closing the sink is a warning, not fatal.
    pub fn compile<S: RasterSink>(&mut self, sink: &mut S, path: &str) {
        if self.state != EngineState::Init {
            self.diagnostics
                .fatal(LilacError::state_misuse("compile", self.state));
        }
        if self.finished != self.tile_count {
            self.diagnostics.fatal(LilacError::parameter_domain(
                "tiles",
                "not every tile has been rendered",
            ));
        }
        if let Err(err) = sink::validate_png_path(path) {
            self.diagnostics.fatal(err);
        }

        let mut handle = match sink.open(path, self.width, self.height) {
            Ok(handle) => handle,
            Err(err) => self.diagnostics.fatal(err),
        };

        let mut row = vec![Color::default(); self.width as usize];
        for y in 0..self.height {
            if let Err(err) = self.store.read_scanline(y, &mut row) {
                self.diagnostics.fatal(err);
            }
            sink.scanline_buffer(&mut handle).copy_from_slice(&row);
            if let Err(err) = sink.commit_scanline(&mut handle) {
                self.diagnostics.fatal(err);
            }
        }

        if let Err(err) = sink.close(handle) {
            self.diagnostics.warn(format!("sink close failed: {err}"));
        }

        self.state = EngineState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct RecordingSink {
        buf: Vec<Color>,
        rows: Vec<Vec<Color>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                buf: Vec::new(),
                rows: Vec::new(),
            }
        }
    }

    impl RasterSink for RecordingSink {
        type Handle = ();

        fn open(&mut self, _path: &str, width: u32, _height: u32) -> Result<(), LilacError> {
            self.buf = vec![Color::default(); width as usize];
            Ok(())
        }

        fn scanline_buffer(&mut self, (): &mut ()) -> &mut [Color] {
            &mut self.buf
        }

        fn commit_scanline(&mut self, (): &mut ()) -> Result<(), LilacError> {
            self.rows.push(self.buf.clone());
            Ok(())
        }

        fn close(&mut self, (): ()) -> Result<(), LilacError> {
            Ok(())
        }
    }

    #[test]
    fn blank_scene_fills_every_pixel_with_background() {
        let background = Color::from_argb(255, 0, 0, 255);
        let mut engine = Engine::init(10, 10, 64, background, None, None);
        assert_eq!(engine.tiles(), 1);

        engine.begin_tile();
        engine.end_tile();

        let mut sink = RecordingSink::new();
        engine.compile(&mut sink, "out.png");

        assert_eq!(sink.rows.len(), 10);
        for row in &sink.rows {
            assert_eq!(row.len(), 10);
            assert!(row.iter().all(|&c| c == background));
        }
    }

    #[test]
    fn rectangle_by_lines_across_a_single_tile() {
        let background = Color::from_argb(255, 255, 255, 255);
        let fill = Color::from_argb(255, 0, 0, 0);
        let mut engine = Engine::init(100, 100, 64, background, None, None);

        engine.begin_tile();
        engine.color(fill);
        engine.begin_path();
        engine.line(10.0, 10.0, 90.0, 10.0);
        engine.line(90.0, 10.0, 90.0, 90.0);
        engine.line(90.0, 90.0, 10.0, 90.0);
        engine.line(10.0, 90.0, 10.0, 10.0);
        engine.end_path();
        engine.end_tile();

        engine.begin_tile();
        engine.end_tile();
        engine.begin_tile();
        engine.end_tile();
        engine.begin_tile();
        engine.end_tile();

        let mut sink = RecordingSink::new();
        engine.compile(&mut sink, "rect.png");

        assert_eq!(sink.rows[50][89], fill);
        assert_eq!(sink.rows[50][90], background);
    }

    #[test]
    fn dim_auto_adjusts_down_to_image_size() {
        let mut engine = Engine::init(10, 10, 4096, Color::default(), None, None);
        engine.begin_tile();
        let handle = engine.lock();
        assert_eq!(handle.pitch, 64);
        assert_eq!(handle.w, 10);
        assert_eq!(handle.h, 10);
    }

    #[test]
    fn invalid_state_transition_is_fatal() {
        let on_error: ErrorHandler = Box::new(|err: &LilacError| panic!("fatal: {err}"));
        let mut engine = Engine::init(10, 10, 64, Color::default(), Some(on_error), None);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.end_path();
        }));
        assert!(result.is_err());
    }

    #[test]
    fn begin_tile_past_tile_count_is_fatal() {
        let on_error: ErrorHandler = Box::new(|err: &LilacError| panic!("fatal: {err}"));
        let mut engine = Engine::init(10, 10, 64, Color::default(), Some(on_error), None);
        engine.begin_tile();
        engine.end_tile();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.begin_tile();
        }));
        assert!(result.is_err());
    }
}
