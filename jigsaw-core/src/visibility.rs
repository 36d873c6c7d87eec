use std::collections::BTreeSet;

use log::debug;

use crate::groups::{GroupGraph, ALWAYS_VISIBLE};

/// Number of user layers reachable through the digit hotkeys.
pub const LAYER_COUNT: i32 = 10;

/// Set of layers currently shown. [`ALWAYS_VISIBLE`] can never be hidden.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Visibility {
    visible: BTreeSet<i32>,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility {
            visible: (ALWAYS_VISIBLE..LAYER_COUNT).collect(),
        }
    }
}

impl Visibility {
    pub fn is_visible(&self, layer: i32) -> bool {
        self.visible.contains(&layer)
    }

    pub fn layers(&self) -> impl Iterator<Item = i32> + '_ {
        self.visible.iter().copied()
    }

    /// Shows or hides `layer` and deselects anything that just went out of view.
    pub fn toggle(&mut self, graph: &mut GroupGraph, layer: i32) {
        if layer == ALWAYS_VISIBLE || !(0..LAYER_COUNT).contains(&layer) {
            return;
        }
        if !self.visible.remove(&layer) {
            self.visible.insert(layer);
        }
        debug!(
            "layer {layer} {}",
            if self.is_visible(layer) { "shown" } else { "hidden" }
        );
        self.deselect_hidden(graph);
    }

    /// Moves every selected group into `layer` and drops it from the selection.
    /// Returns how many groups moved.
    pub fn assign_selected(&self, graph: &mut GroupGraph, layer: i32) -> usize {
        if !(0..LAYER_COUNT).contains(&layer) {
            return 0;
        }
        let mut moved = 0;
        for g in graph.iter_mut() {
            if g.is_selected && g.visibility_group != layer {
                g.visibility_group = layer;
                g.is_selected = false;
                moved += 1;
            }
        }
        debug!("moved {moved} groups to layer {layer}");
        self.deselect_hidden(graph);
        moved
    }

    /// Hidden groups can never be selected.
    pub fn deselect_hidden(&self, graph: &mut GroupGraph) {
        for g in graph.iter_mut() {
            if !self.is_visible(g.visibility_group) {
                g.is_selected = false;
            }
        }
    }
}
