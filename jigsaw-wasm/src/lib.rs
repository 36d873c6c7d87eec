use std::cell::RefCell;
use std::rc::Rc;

use jigsaw_core::edges::TAB_REACH;
use jigsaw_core::{
    cut_template_svg, layer_color, Board, BoxMode, InputEvent, InteractionState, Modifiers, Point,
    Selection, LAYER_COUNT,
};
use js_sys::Array;
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Blob, BlobPropertyBag, CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, KeyboardEvent, MouseEvent, Url,
};

mod canvas;
mod constants;
mod state;
mod upload;
mod utils;

use canvas::{piece_path, set_fill_style, set_line_dash, set_stroke_style};
use constants::*;
pub use state::{State, STATE};
use utils::{
    asset_url, config_from_query, console_log, fit_viewport, from_screen, get_query_param,
    init_logging, key_from_event, log_level_from_query, sync_canvas_size, to_screen,
};

/// Fit the scatter area (plus tab overhang) into the canvas.
fn update_viewport(state: &mut State) {
    let canvas_w = state.canvas.width() as f64;
    let canvas_h = state.canvas.height() as f64;
    let (w, h) = state.board.scatter_extent();
    let m = state.board.metrics();
    let pad = TAB_REACH * m.width.max(m.height);
    let (scale, offset) = fit_viewport(
        canvas_w,
        canvas_h,
        Point::new(-pad, -pad),
        Point::new(w + pad, h + pad),
        VIEW_MARGIN_PX,
    );
    state.scale = scale;
    state.offset = offset;
}

fn draw(state: &mut State) {
    sync_canvas_size(state);
    update_viewport(state);
    let width = state.canvas.width() as f64;
    let height = state.canvas.height() as f64;
    let ctx = &state.ctx;
    ctx.clear_rect(0.0, 0.0, width, height);

    let board = &state.board;
    let grid = board.grid();
    let m = board.metrics();
    let pad = TAB_REACH * m.width.max(m.height);
    let (scale, offset) = (state.scale, state.offset);

    for view in board.snapshot() {
        if !board.is_visible(view.visibility_group) {
            continue;
        }
        for &piece in &view.members {
            let Some(outline) = board.outlines().outline(piece) else {
                continue;
            };
            let home = m.offset(grid, piece);
            let origin = view.position + home;
            let Ok(path) = piece_path(outline, origin, m.width, m.height, scale, offset) else {
                continue;
            };
            ctx.save();
            ctx.clip_with_path_2d(&path);
            if let Some(img) = &state.image {
                // Board units are image pixels, so the source rect is the
                // piece's home cell grown by the tab overhang.
                let (dx, dy) = to_screen(origin - Point::new(pad, pad), scale, offset);
                let sw = m.width + 2.0 * pad;
                let sh = m.height + 2.0 * pad;
                let _ = ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    img,
                    home.x - pad,
                    home.y - pad,
                    sw,
                    sh,
                    dx,
                    dy,
                    sw * scale,
                    sh * scale,
                );
            } else {
                set_fill_style(ctx, PLACEHOLDER_FILL);
                ctx.fill_with_path_2d(&path);
            }
            ctx.restore();

            ctx.set_line_width(SEAM_WIDTH_PX);
            set_stroke_style(ctx, SEAM_COLOR);
            ctx.stroke_with_path(&path);
            if view.is_selected {
                ctx.set_line_width(SELECTED_WIDTH_PX);
                set_stroke_style(ctx, layer_color(view.visibility_group));
                ctx.stroke_with_path(&path);
            }
        }
    }
    draw_selection_box(ctx, board, scale, offset);
}

fn draw_selection_box(
    ctx: &CanvasRenderingContext2d,
    board: &Board,
    scale: f64,
    offset: (f64, f64),
) {
    let Some(b) = board.selection_box() else {
        return;
    };
    let (x0, y0) = to_screen(b.static_corner, scale, offset);
    let (x1, y1) = to_screen(b.moving_corner, scale, offset);
    let color = match b.mode {
        BoxMode::Normal => BOX_NORMAL_COLOR,
        BoxMode::Inverted => BOX_INVERTED_COLOR,
    };
    ctx.set_line_width(1.0);
    set_stroke_style(ctx, color);
    set_line_dash(ctx, &[6.0, 4.0]);
    ctx.stroke_rect(x0.min(x1), y0.min(y1), (x1 - x0).abs(), (y1 - y0).abs());
    set_line_dash(ctx, &[]);
}

fn update_status_dom(state: &State) {
    let Some(el) = state.document.get_element_by_id("status") else {
        return;
    };
    let board = &state.board;
    let groups = board.graph().len();
    let pieces = board.grid().piece_count();
    let mut text = if groups == 1 && pieces > 1 {
        format!("Solved! {pieces} pieces")
    } else {
        format!("{groups} groups / {pieces} pieces")
    };
    match board.selection() {
        Selection::Null => {}
        Selection::Single(id) => text.push_str(&format!(" · selected: group {id}")),
        Selection::Multiple => text.push_str(&format!(
            " · selected: {} groups",
            board.graph().selected_count()
        )),
    }
    let hidden: Vec<String> = (0..LAYER_COUNT)
        .filter(|l| !board.is_visible(*l))
        .map(|l| l.to_string())
        .collect();
    if !hidden.is_empty() {
        text.push_str(&format!(" · hidden layers: {}", hidden.join(",")));
    }
    el.set_text_content(Some(&text));
}

fn event_canvas_coords(e: &MouseEvent, cv: &HtmlCanvasElement) -> (f64, f64) {
    // Convert client coordinates into canvas internal pixel coordinates
    // so hit testing works even if CSS scales the canvas element.
    if let Some(el) = cv.dyn_ref::<web_sys::Element>() {
        let rect = el.get_bounding_client_rect();
        let x = (e.client_x() as f64 - rect.left()) * (cv.width() as f64) / rect.width().max(1.0);
        let y = (e.client_y() as f64 - rect.top()) * (cv.height() as f64) / rect.height().max(1.0);
        (x, y)
    } else {
        (e.offset_x() as f64, e.offset_y() as f64)
    }
}

fn save_text_as_file(
    document: &Document,
    filename: &str,
    text: &str,
    mime: &str,
) -> Result<(), JsValue> {
    let array = Array::new();
    array.push(&JsValue::from_str(text));
    let opts = BlobPropertyBag::new();
    opts.set_type(mime);
    let blob = Blob::new_with_str_sequence_and_options(&array, &opts)?;
    let url = Url::create_object_url_with_blob(&blob)?;
    let a = document.create_element("a")?.dyn_into::<HtmlElement>()?;
    a.set_attribute("href", &url)?;
    a.set_attribute("download", filename)?;
    a.click();
    Url::revoke_object_url(&url)?;
    Ok(())
}

/// Applies one event to the board and repaints.
fn dispatch(state: &mut State, event: InputEvent) {
    state.board.handle(event);
    update_status_dom(state);
    draw(state);
}

fn with_state<R>(f: impl FnOnce(&mut State) -> R) -> Option<R> {
    STATE.with(|st| st.borrow().as_ref().map(|rc| f(&mut rc.borrow_mut())))
}

fn cheat_steps(document: &Document) -> u32 {
    document
        .get_element_by_id("cheatCount")
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .and_then(|input| input.value().trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_CHEAT_STEPS)
}

fn export_template(state: &State) -> Result<(), JsValue> {
    let (svg, w, h) = cut_template_svg(
        state.board.outlines(),
        state.board.metrics(),
        TEMPLATE_PX_PER_UNIT,
    );
    info!("exporting cut template ({w}x{h} px)");
    save_text_as_file(&state.document, "jigsaw-template.svg", &svg, "image/svg+xml")
}

fn export_snapshot(state: &State) -> Result<(), JsValue> {
    let json = serde_json::to_string_pretty(&state.board.snapshot())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    save_text_as_file(&state.document, "jigsaw-board.json", &json, "application/json")
}

fn on_click<F>(document: &Document, id: &str, f: F) -> Result<(), JsValue>
where
    F: FnMut() + 'static,
{
    let Some(el) = document.get_element_by_id(id) else {
        debug!("no #{id} element; skipping");
        return Ok(());
    };
    let btn: HtmlElement = el.dyn_into()?;
    let onclick = Closure::<dyn FnMut()>::wrap(Box::new(f));
    btn.set_onclick(Some(onclick.as_ref().unchecked_ref()));
    onclick.forget();
    Ok(())
}

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    upload::attach_file_input(state.clone())?;

    let st = state.clone();
    on_click(&doc, "reshuffle", move || {
        dispatch(&mut st.borrow_mut(), InputEvent::Reshuffle);
    })?;
    let st = state.clone();
    on_click(&doc, "cheat", move || {
        let mut s = st.borrow_mut();
        let n = cheat_steps(&s.document);
        dispatch(&mut s, InputEvent::Cheat(n));
    })?;
    let st = state.clone();
    on_click(&doc, "exportSvg", move || {
        if let Err(e) = export_template(&st.borrow()) {
            warn!("template export failed: {e:?}");
        }
    })?;
    let st = state.clone();
    on_click(&doc, "exportState", move || {
        if let Err(e) = export_snapshot(&st.borrow()) {
            warn!("board export failed: {e:?}");
        }
    })?;

    // Mouse
    {
        let st = state.clone();
        let mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            let (x, y) = event_canvas_coords(&e, &s.canvas);
            let point = from_screen(x, y, s.scale, s.offset);
            let modifiers = Modifiers {
                ctrl: e.ctrl_key() || e.meta_key(),
                shift: e.shift_key(),
            };
            e.prevent_default();
            dispatch(&mut s, InputEvent::PointerDown { point, modifiers });
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }
    {
        let st = state.clone();
        let mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            if s.board.selection_machine().state() == InteractionState::Idle {
                return;
            }
            let (x, y) = event_canvas_coords(&e, &s.canvas);
            let point = from_screen(x, y, s.scale, s.offset);
            s.board.handle(InputEvent::PointerMove { point });
            draw(&mut s);
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }
    {
        let st = state.clone();
        let mouseup = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_e: MouseEvent| {
            let mut s = st.borrow_mut();
            if let Some(outcome) = s.board.pointer_up() {
                debug!("group {} joined {}", outcome.retired, outcome.survivor);
            }
            update_status_dom(&s);
            draw(&mut s);
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }

    // Keyboard: modifiers and digit hotkeys
    {
        let st = state.clone();
        let keydown =
            Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
                // Typing into the cheat count must not toggle layers.
                if e.repeat()
                    || e.target()
                        .is_some_and(|t| t.dyn_ref::<HtmlInputElement>().is_some())
                {
                    return;
                }
                let key = key_from_event(&e.key(), &e.code());
                dispatch(&mut st.borrow_mut(), InputEvent::KeyChanged { down: true, key });
            }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }
    {
        let st = state.clone();
        let keyup = Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
            let key = key_from_event(&e.key(), &e.code());
            st.borrow_mut()
                .board
                .handle(InputEvent::KeyChanged { down: false, key });
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref())?;
        keyup.forget();
    }

    {
        let st = state.clone();
        let onresize = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            draw(&mut st.borrow_mut());
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    Ok(())
}

fn init_canvas(
    document: &Document,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let cv = document
        .get_element_by_id("cv")
        .ok_or_else(|| JsValue::from_str("canvas #cv not found"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = cv
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((cv, ctx))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let search = window.location().search().unwrap_or_default();
    init_logging(log_level_from_query(&search));
    let (canvas, ctx) = init_canvas(&document)?;

    let (config, fixed_grid) = config_from_query(&search);
    let state = Rc::new(RefCell::new(State {
        window,
        document,
        canvas,
        ctx,
        board: Board::new(config),
        image: None,
        fixed_grid,
        scale: 1.0,
        offset: (0.0, 0.0),
    }));

    STATE.with(|st| st.replace(Some(state.clone())));
    attach_ui(state.clone())?;
    {
        let mut s = state.borrow_mut();
        update_status_dom(&s);
        draw(&mut s);
    }

    let img = get_query_param(&search, "img").unwrap_or_else(|| DEFAULT_IMAGE.to_string());
    upload::load_image(state, &asset_url(&img))?;
    console_log("jigsaw board ready");
    Ok(())
}

/// Script hook: reshuffle the board.
#[wasm_bindgen]
pub fn reshuffle() {
    with_state(|s| dispatch(s, InputEvent::Reshuffle));
}

/// Script hook: run `n` cheat steps.
#[wasm_bindgen]
pub fn cheat(n: u32) {
    with_state(|s| dispatch(s, InputEvent::Cheat(n)));
}

/// Script hook: live groups in paint order as JSON.
#[wasm_bindgen]
pub fn snapshot_json() -> Option<String> {
    with_state(|s| serde_json::to_string(&s.board.snapshot()).ok()).flatten()
}
