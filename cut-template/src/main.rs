use std::env;
use std::fs;

use jigsaw_core::{cut_template_svg, GridShape, OutlineCache, PieceMetrics, RngState};
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};

const USAGE: &str = "Usage: cut-template <nx> <ny> <seed> <output.(svg|png)> [px_per_unit]";

struct Args {
    grid: GridShape,
    seed: u64,
    output: String,
    px_per_unit: f64,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    if args.len() < 5 {
        return Err(USAGE.to_string());
    }
    let number = |i: usize, what: &str| -> Result<u64, String> {
        args[i]
            .parse()
            .map_err(|_| format!("{what} must be a whole number, got {:?}", args[i]))
    };
    let nx = number(1, "nx")? as usize;
    let ny = number(2, "ny")? as usize;
    if nx == 0 || ny == 0 {
        return Err(format!("grid must be at least 1x1, got {nx}x{ny}"));
    }
    let seed = number(3, "seed")?;
    let px_per_unit = match args.get(5) {
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("px_per_unit must be a positive number, got {s:?}"))?,
        None => 1.0,
    };
    Ok(Args {
        grid: GridShape::new(nx, ny),
        seed,
        output: args[4].clone(),
        px_per_unit,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let mut rng = RngState::from_seed(args.seed);
    let cache = OutlineCache::build(args.grid, &mut rng);
    let (svg, w_px, h_px) = cut_template_svg(&cache, PieceMetrics::default(), args.px_per_unit);

    if args.output.to_lowercase().ends_with(".svg") {
        fs::write(&args.output, svg)?;
        return Ok(());
    }
    if !args.output.to_lowercase().ends_with(".png") {
        eprintln!("warning: unknown extension on {}; writing PNG", args.output);
    }
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(&svg, &opt).map_err(|e| format!("SVG parse error: {e:?}"))?;
    let mut pixmap = tiny_skia::Pixmap::new(w_px, h_px).ok_or("pixmap alloc failed")?;
    let mut pm = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pm);
    encode_png_deterministic(&pixmap, &args.output)?;
    Ok(())
}

fn encode_png_deterministic(
    pixmap: &tiny_skia::Pixmap,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    let mut enc = Encoder::new(file, pixmap.width(), pixmap.height());
    enc.set_color(ColorType::Rgba);
    enc.set_depth(BitDepth::Eight);
    enc.set_filter(FilterType::NoFilter);
    enc.set_compression(Compression::Default);
    let mut writer = enc.write_header()?;
    writer.write_image_data(pixmap.data())?;
    Ok(())
}
