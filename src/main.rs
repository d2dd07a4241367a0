//! Command-line demo driver for the Lilac tile rasterizer.
//!
//! ```text
//! lilac <scene> <output.png> [--log-file <path>]
//! ```
//!
//! Scenes: `blank`, `checker`, `dot`, `rect`, `donut` — the named scenarios
//! from the engine's testable-properties scenarios, exercised end-to-end
//! and written out for visual inspection.

use lilac_core::color::Color;
use lilac_core::engine::Engine;
use lilac_png::PngSink;

fn usage() -> ! {
    eprintln!("usage: lilac <scene> <output.png> [--log-file <path>]");
    eprintln!("scenes: blank, checker, dot, rect, donut");
    std::process::exit(1);
}

fn init_logging(log_file: Option<&str>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        let path = std::path::Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let file_name = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("lilac.log"));

        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}

fn dimensions_for(scene: &str) -> (u32, u32, u32) {
    match scene {
        "blank" => (640, 480, 64),
        "checker" => (600, 400, 64),
        "dot" => (600, 400, 64),
        "rect" => (100, 100, 64),
        "donut" => (200, 200, 64),
        _ => usage(),
    }
}

fn render(scene: &str, width: u32, height: u32, dim: u32) -> Engine {
    let background = match scene {
        "blank" => Color::from_argb(255, 0, 0, 255),
        "checker" => Color::from_argb(255, 0, 0, 0),
        "dot" | "rect" | "donut" => Color::from_argb(255, 255, 255, 255),
        _ => usage(),
    };

    let mut engine = Engine::init(width, height, dim, background, None, None);
    let cols = width.div_ceil(dim);

    let mut tile_index = 0u32;
    while tile_index < engine.tiles() {
        engine.begin_tile();

        match scene {
            "blank" => {}
            "checker" => {
                let row = tile_index / cols;
                let col = tile_index % cols;
                if (row ^ col) % 2 == 1 {
                    let handle = engine.lock();
                    for y in 0..handle.h {
                        for x in 0..handle.w {
                            let idx = (y * handle.pitch + x) as usize;
                            handle.data[idx] = Color::from_argb(255, 0, 255, 0);
                        }
                    }
                    engine.unlock();
                }
            }
            "dot" => {
                engine.color(Color::from_argb(255, 0, 0, 255));
                engine.begin_path();
                engine.dot(300.0, 200.0, 150.0);
                engine.end_path();
            }
            "rect" => {
                engine.color(Color::from_argb(255, 0, 0, 0));
                engine.begin_path();
                engine.line(10.0, 10.0, 90.0, 10.0);
                engine.line(90.0, 10.0, 90.0, 90.0);
                engine.line(90.0, 90.0, 10.0, 90.0);
                engine.line(10.0, 90.0, 10.0, 10.0);
                engine.end_path();
            }
            "donut" => {
                engine.color(Color::from_argb(255, 0, 0, 0));
                engine.begin_path();
                engine.line(20.0, 20.0, 180.0, 20.0);
                engine.line(180.0, 20.0, 180.0, 180.0);
                engine.line(180.0, 180.0, 20.0, 180.0);
                engine.line(20.0, 180.0, 20.0, 20.0);
                engine.line(70.0, 70.0, 70.0, 130.0);
                engine.line(70.0, 130.0, 130.0, 130.0);
                engine.line(130.0, 130.0, 130.0, 70.0);
                engine.line(130.0, 70.0, 70.0, 70.0);
                engine.end_path();
            }
            _ => usage(),
        }

        engine.end_tile();
        tile_index += 1;
    }

    engine
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut log_file: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--log-file" {
            log_file = Some(iter.next().unwrap_or_else(|| usage()));
        } else {
            positional.push(arg);
        }
    }

    let _guard = init_logging(log_file.as_deref());

    if positional.len() != 2 {
        usage();
    }
    let scene = positional[0].as_str();
    let output = &positional[1];
    let (width, height, dim) = dimensions_for(scene);

    tracing::info!(%scene, %output, width, height, dim, "rendering scene");

    let mut engine = render(scene, width, height, dim);

    let mut sink = PngSink::new();
    engine.compile(&mut sink, output);

    tracing::info!(%output, "wrote png");
}
