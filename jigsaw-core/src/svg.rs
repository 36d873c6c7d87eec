use std::fmt::Write;

use crate::edges::{OutlineCache, EDGE_LENGTH, TAB_REACH};
use crate::grid::PieceMetrics;

/// Printable cut template of the solved picture: one stroked outline per
/// piece on a white page. Returns the document with its pixel size.
pub fn cut_template_svg(
    cache: &OutlineCache,
    metrics: PieceMetrics,
    px_per_unit: f64,
) -> (String, u32, u32) {
    let grid = cache.grid();
    let pad = TAB_REACH * metrics.width.max(metrics.height);
    let total_w = grid.nx as f64 * metrics.width + 2.0 * pad;
    let total_h = grid.ny as f64 * metrics.height + 2.0 * pad;
    let w_px = (total_w * px_per_unit).ceil() as u32;
    let h_px = (total_h * px_per_unit).ceil() as u32;

    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        s,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w_px}\" height=\"{h_px}\" viewBox=\"0 0 {w_px} {h_px}\" stroke=\"#333\" fill=\"none\" stroke-width=\"1.8\" stroke-linejoin=\"round\">"
    );
    s.push_str("<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    let sx = metrics.width / EDGE_LENGTH;
    let sy = metrics.height / EDGE_LENGTH;
    for (piece, outline) in cache.outlines().iter().enumerate() {
        let origin = metrics.offset(grid, piece);
        let d = outline.path_with(|p| {
            (
                (pad + origin.x + p.x * sx) * px_per_unit,
                (pad + origin.y + p.y * sy) * px_per_unit,
            )
        });
        let _ = writeln!(s, "<path data-piece=\"{piece}\" d=\"{d}\"/>");
    }
    s.push_str("</svg>\n");
    (s, w_px, h_px)
}
