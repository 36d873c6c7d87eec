use jigsaw_core::edges::EDGE_LENGTH;
use jigsaw_core::{PieceOutline, Point};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Path2d};

// Non-deprecated helpers to set canvas styles via property assignment.
pub fn set_fill_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(color),
    );
}

pub fn set_stroke_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("strokeStyle"),
        &JsValue::from_str(color),
    );
}

/// Screen-space clip path of one piece whose top-left corner sits at `origin`
/// (board units) and whose size is `piece_w × piece_h`.
pub fn piece_path(
    outline: &PieceOutline,
    origin: Point,
    piece_w: f64,
    piece_h: f64,
    scale: f64,
    offset: (f64, f64),
) -> Result<Path2d, JsValue> {
    let sx = piece_w / EDGE_LENGTH;
    let sy = piece_h / EDGE_LENGTH;
    let d = outline.path_with(|p| {
        crate::utils::to_screen(
            Point::new(origin.x + p.x * sx, origin.y + p.y * sy),
            scale,
            offset,
        )
    });
    Path2d::new_with_path_string(&d)
}

pub fn set_line_dash(ctx: &CanvasRenderingContext2d, dash: &[f64]) {
    let segments = js_sys::Array::new();
    for d in dash {
        segments.push(&JsValue::from_f64(*d));
    }
    let _ = ctx.set_line_dash(&segments);
}
