use std::cell::RefCell;
use std::rc::Rc;

use jigsaw_core::Board;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, Window};

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub board: Board,
    /// Decoded picture, `None` until the first image has loaded.
    pub image: Option<HtmlImageElement>,
    /// Grid pinned by the page (`nx`/`ny` query parameters); otherwise the
    /// grid is chosen from the image size.
    pub fixed_grid: bool,
    pub scale: f64,
    pub offset: (f64, f64),
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
