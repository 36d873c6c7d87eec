use std::cell::RefCell;
use std::rc::Rc;

use jigsaw_core::{best_grid_for_count, InputEvent};
use log::{info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, FileReader, HtmlImageElement, HtmlInputElement};

use crate::{draw, update_status_dom, State};

/// Starts loading `url` into a fresh image element. Once the browser has
/// decoded it the board is re-cut for its size and reshuffled.
pub fn load_image(state: Rc<RefCell<State>>, url: &str) -> Result<(), JsValue> {
    let img = HtmlImageElement::new()?;
    let img_for_closure = img.clone();
    let st = state.clone();
    let onload = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
        let mut s = st.borrow_mut();
        let (w, h) = (img_for_closure.natural_width(), img_for_closure.natural_height());
        if w == 0 || h == 0 {
            warn!("image decoded with zero size; keeping the current picture");
            return;
        }
        let grid = if s.fixed_grid {
            s.board.grid()
        } else {
            best_grid_for_count(w, h, s.board.config().target_pieces)
                .unwrap_or_else(|| s.board.grid())
        };
        info!("image loaded: {w}x{h}");
        s.image = Some(img_for_closure.clone());
        s.board.handle(InputEvent::ImageMetadataReady {
            width: f64::from(w),
            height: f64::from(h),
            grid,
        });
        update_status_dom(&s);
        draw(&mut s);
    }));
    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();

    let onerror = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
        warn!("image failed to load; pieces stay blank");
    }));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    img.set_src(url);
    Ok(())
}

// Wires up the file input handler for loading a picture from disk.
pub fn attach_file_input(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc: Document = state.borrow().document.clone();
    let Some(input) = doc.get_element_by_id("file") else {
        return Ok(());
    };
    let input: HtmlInputElement = input.dyn_into()?;
    let st = state.clone();
    let input_for_closure = input.clone();
    let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
        let Some(file) = input_for_closure.files().and_then(|files| files.item(0)) else {
            info!("no file selected");
            return;
        };
        let reader = match FileReader::new() {
            Ok(r) => r,
            Err(e) => {
                warn!("cannot create FileReader: {e:?}");
                return;
            }
        };
        let st2 = st.clone();
        let reader_for_closure = reader.clone();
        let onload = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_ev: Event| {
            let url = reader_for_closure
                .result()
                .ok()
                .and_then(|r| r.as_string())
                .unwrap_or_default();
            if url.is_empty() {
                warn!("selected file is empty or unreadable");
                return;
            }
            if let Err(e) = load_image(st2.clone(), &url) {
                warn!("cannot load selected image: {e:?}");
            }
        }));
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        if let Err(e) = reader.read_as_data_url(&file) {
            warn!("failed to read file: {e:?}");
        }
        onload.forget();
    }));
    input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
    onchange.forget();
    Ok(())
}
