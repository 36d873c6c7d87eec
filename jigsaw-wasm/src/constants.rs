/// Application-wide constants for the browser frontend.
/// Lengths are canvas pixels unless noted otherwise.
pub const VIEW_MARGIN_PX: f64 = 20.0;
/// Image shown before the player picks one (relative to `__BASE_URL`).
pub const DEFAULT_IMAGE: &str = "images/default.jpg";
/// Stroke width of piece seams.
pub const SEAM_WIDTH_PX: f64 = 1.0;
/// Stroke width of the highlight around selected pieces.
pub const SELECTED_WIDTH_PX: f64 = 3.0;
pub const SEAM_COLOR: &str = "rgba(0, 0, 0, 0.45)";
pub const PLACEHOLDER_FILL: &str = "#d8d2c4";
pub const BOX_NORMAL_COLOR: &str = "#1e90ff";
pub const BOX_INVERTED_COLOR: &str = "#ff8c00";
/// Cheat steps run by one press of the cheat button when no count is entered.
pub const DEFAULT_CHEAT_STEPS: u32 = 1;
/// Pixels per board unit in the downloaded cut template.
pub const TEMPLATE_PX_PER_UNIT: f64 = 1.0;
