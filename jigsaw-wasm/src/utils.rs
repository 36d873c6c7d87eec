use std::str::FromStr;

use jigsaw_core::{BoardConfig, GridShape, Key, Point};
use log::{Level, LevelFilter, Metadata, Record, warn};
use wasm_bindgen::{JsCast, JsValue};

use crate::state::State;

/// Log a message to the browser console.
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

/// Forwards `log` records to the matching console method.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            Level::Info => web_sys::console::info_1(&msg),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Installs the console logger once; later calls only adjust the level.
pub fn init_logging(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Ensure the canvas backing store matches the CSS size and device pixel ratio
/// to prevent non-uniform stretching.
pub fn sync_canvas_size(state: &mut State) {
    let dpr = state.window.device_pixel_ratio();
    let (css_w, css_h) = if let Some(el) = state.canvas.dyn_ref::<web_sys::Element>() {
        let rect = el.get_bounding_client_rect();
        (rect.width().max(1.0), rect.height().max(1.0))
    } else {
        (
            state.canvas.client_width() as f64,
            state.canvas.client_height() as f64,
        )
    };
    let target_w = (css_w * dpr).round().clamp(1.0, 10000.0) as u32;
    let target_h = (css_h * dpr).round().clamp(1.0, 10000.0) as u32;
    if state.canvas.width() != target_w {
        state.canvas.set_width(target_w);
    }
    if state.canvas.height() != target_h {
        state.canvas.set_height(target_h);
    }
}

/// Convert a board point to canvas pixels. Both spaces grow downwards.
pub fn to_screen(p: Point, scale: f64, offset: (f64, f64)) -> (f64, f64) {
    let (ox, oy) = offset;
    (p.x * scale + ox, p.y * scale + oy)
}

/// Convert canvas pixels back into board space.
pub fn from_screen(x: f64, y: f64, scale: f64, offset: (f64, f64)) -> Point {
    let (ox, oy) = offset;
    Point::new((x - ox) / scale, (y - oy) / scale)
}

/// Scale and offset that centre the board rectangle `min..max` on a canvas of
/// `canvas_w × canvas_h`, keeping `margin` pixels free on every side.
pub fn fit_viewport(canvas_w: f64, canvas_h: f64, min: Point, max: Point, margin: f64) -> (f64, (f64, f64)) {
    let w = (max.x - min.x).max(1.0);
    let h = (max.y - min.y).max(1.0);
    let scale_x = (canvas_w - 2.0 * margin) / w;
    let scale_y = (canvas_h - 2.0 * margin) / h;
    let scale = scale_x.min(scale_y).max(0.01);
    let ox = (canvas_w - w * scale) / 2.0 - min.x * scale;
    let oy = (canvas_h - h * scale) / 2.0 - min.y * scale;
    (scale, (ox, oy))
}

/// Build an absolute URL for an asset, taking into account the optional
/// `window.__BASE_URL` which is set by the host page.
pub fn asset_url(path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://")
        || p.starts_with("https://")
        || p.starts_with("data:")
        || p.starts_with("blob:")
    {
        return p.to_string();
    }
    let base = web_sys::window()
        .and_then(|w| {
            let v = js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok()?;
            v.as_string()
        })
        .unwrap_or_else(|| "/".to_string());
    join_url(&base, p)
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Simple query string parser used at start-up.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    for pair in s.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next()?;
        let v = it.next().unwrap_or("");
        if k == key {
            return Some(url_decode(v));
        }
    }
    None
}

fn url_decode(s: &str) -> String {
    percent_encoding::percent_decode_str(s)
        .decode_utf8()
        .unwrap_or_else(|_| s.into())
        .to_string()
}

fn query_value<T: FromStr>(search: &str, key: &str) -> Option<T> {
    get_query_param(search, key).and_then(|v| v.trim().parse().ok())
}

/// Board settings from the page URL. `cfg` carries inline JSON; `seed`,
/// `pieces`, `snap`, `nx` and `ny` override single fields. The flag is true
/// when the page pins the grid with both `nx` and `ny`.
pub fn config_from_query(search: &str) -> (BoardConfig, bool) {
    let mut config = match get_query_param(search, "cfg") {
        Some(text) => BoardConfig::from_json(&text).unwrap_or_else(|e| {
            warn!("ignoring cfg parameter: {e}");
            BoardConfig::default()
        }),
        None => BoardConfig::default(),
    };
    if let Some(seed) = query_value::<u64>(search, "seed") {
        config.seed = Some(seed);
    }
    if let Some(pieces) = query_value::<u32>(search, "pieces") {
        config.target_pieces = pieces.max(1);
    }
    if let Some(snap) = query_value::<f64>(search, "snap") {
        config.snap_distance = snap;
    }
    let fixed_grid = match (
        query_value::<usize>(search, "nx"),
        query_value::<usize>(search, "ny"),
    ) {
        (Some(nx), Some(ny)) if nx > 0 && ny > 0 => {
            config.grid = GridShape::new(nx, ny);
            true
        }
        _ => false,
    };
    if let Err(e) = config.validate() {
        warn!("invalid board settings ({e}); using defaults");
        config = BoardConfig {
            seed: config.seed,
            ..BoardConfig::default()
        };
        return (config, false);
    }
    (config, fixed_grid)
}

/// Log level from the `log` query parameter, `info` when absent or unknown.
pub fn log_level_from_query(search: &str) -> LevelFilter {
    query_value(search, "log").unwrap_or(LevelFilter::Info)
}

/// Maps a DOM keyboard event (`key`, `code`) onto a board key. Digits are read
/// from `code` so shifted digits still count.
pub fn key_from_event(key: &str, code: &str) -> Key {
    let digit = code
        .strip_prefix("Digit")
        .or_else(|| code.strip_prefix("Numpad"))
        .and_then(|d| d.parse::<u8>().ok());
    if let Some(d) = digit
        && d <= 9
    {
        return Key::Digit(d);
    }
    match key {
        "Control" | "Meta" => Key::Ctrl,
        "Shift" => Key::Shift,
        k => match k.parse::<u8>() {
            Ok(d) if d <= 9 => Key::Digit(d),
            _ => Key::Other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jigsaw_core::SnapPolicy;

    #[test]
    fn test_query_param() {
        let q = "?p=demo&img=images%2Fcat%20photo.jpg&flag";
        assert_eq!(get_query_param(q, "p").as_deref(), Some("demo"));
        assert_eq!(get_query_param(q, "img").as_deref(), Some("images/cat photo.jpg"));
        assert_eq!(get_query_param(q, "flag").as_deref(), Some(""));
        assert_eq!(get_query_param(q, "missing"), None);
    }

    #[test]
    fn test_screen_round_trip() {
        let p = Point::new(12.5, -40.0);
        let (x, y) = to_screen(p, 2.0, (10.0, 20.0));
        assert_eq!((x, y), (35.0, -60.0));
        assert_eq!(from_screen(x, y, 2.0, (10.0, 20.0)), p);
    }

    #[test]
    fn test_fit_viewport_centres_content() {
        let (scale, (ox, oy)) =
            fit_viewport(240.0, 140.0, Point::new(0.0, 0.0), Point::new(200.0, 100.0), 20.0);
        assert_eq!(scale, 1.0);
        assert_eq!((ox, oy), (20.0, 20.0));
        let (scale, (ox, _)) =
            fit_viewport(440.0, 140.0, Point::new(-50.0, 0.0), Point::new(150.0, 100.0), 20.0);
        assert_eq!(scale, 1.0);
        assert_eq!(ox, 170.0);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("/", "images/a.jpg"), "/images/a.jpg");
        assert_eq!(join_url("https://x.org/app/", "/images/a.jpg"), "https://x.org/app/images/a.jpg");
    }

    #[test]
    fn test_config_from_query() {
        let (c, fixed) = config_from_query("?seed=42&nx=5&ny=3&snap=12.5&pieces=40");
        assert!(fixed);
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.grid, GridShape::new(5, 3));
        assert_eq!(c.snap_distance, 12.5);
        assert_eq!(c.target_pieces, 40);

        let (c, fixed) = config_from_query("?nx=5");
        assert!(!fixed);
        assert_eq!(c.grid, GridShape::default());

        let (c, fixed) = config_from_query("?seed=7&snap=-3");
        assert!(!fixed);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.snap_distance, BoardConfig::default().snap_distance);
    }

    #[test]
    fn test_config_from_inline_json() {
        let q = "?cfg=%7B%22snap_policy%22%3A%22nearest%22%2C%22seed%22%3A3%7D&seed=9";
        let (c, _) = config_from_query(q);
        assert_eq!(c.snap_policy, SnapPolicy::Nearest);
        assert_eq!(c.seed, Some(9));

        let (c, _) = config_from_query("?cfg=not-json");
        assert_eq!(c, BoardConfig::default());
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_from_event("3", "Digit3"), Key::Digit(3));
        assert_eq!(key_from_event("#", "Digit3"), Key::Digit(3));
        assert_eq!(key_from_event("7", "Numpad7"), Key::Digit(7));
        assert_eq!(key_from_event("Control", "ControlLeft"), Key::Ctrl);
        assert_eq!(key_from_event("Meta", "MetaLeft"), Key::Ctrl);
        assert_eq!(key_from_event("Shift", "ShiftRight"), Key::Shift);
        assert_eq!(key_from_event("+", "NumpadAdd"), Key::Other);
        assert_eq!(key_from_event("a", "KeyA"), Key::Other);
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level_from_query("?log=debug"), LevelFilter::Debug);
        assert_eq!(log_level_from_query("?log=bogus"), LevelFilter::Info);
        assert_eq!(log_level_from_query(""), LevelFilter::Info);
    }
}
