pub mod board;
pub mod config;
pub mod edges;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod groups;
pub mod rng;
pub mod selection;
pub mod svg;
pub mod visibility;

pub use board::{cheat_step, Board, GroupView, InputEvent, Key};
pub use config::{BoardConfig, SnapPolicy, SnapSettings};
pub use edges::{OutlineCache, PieceOutline, Side};
pub use error::ConfigError;
pub use geometry::Point;
pub use grid::{best_grid_for_count, GridShape, PieceMetrics};
pub use groups::{GroupGraph, GroupId, MergeOutcome, PieceGroup, ALWAYS_VISIBLE};
pub use rng::RngState;
pub use selection::{BoxMode, InteractionState, Modifiers, Selection, SelectionBox};
pub use svg::cut_template_svg;
pub use visibility::{Visibility, LAYER_COUNT};

/// Highlight colour for groups on visibility layer `layer`.
pub fn layer_color(layer: i32) -> &'static str {
    // One hue per digit hotkey; the always-visible layer stays neutral.
    const PALETTE: [&str; 10] = [
        "red",            // 0
        "orange",         // 1
        "gold",           // 2
        "yellowgreen",    // 3
        "mediumseagreen", // 4
        "teal",           // 5
        "dodgerblue",     // 6
        "blueviolet",     // 7
        "fuchsia",        // 8
        "peru",           // 9
    ];
    match usize::try_from(layer) {
        Ok(i) => PALETTE[i % PALETTE.len()],
        Err(_) => "slategray",
    }
}
