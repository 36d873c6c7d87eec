//! Board controller: owns the groups, the outlines, the selection machine and
//! the random state, and applies input events one at a time.

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::{BoardConfig, SnapSettings};
use crate::edges::OutlineCache;
use crate::geometry::Point;
use crate::grid::{GridShape, PieceMetrics};
use crate::groups::{GroupGraph, GroupId, MergeOutcome};
use crate::rng::RngState;
use crate::selection::{Modifiers, Selection, SelectionBox, SelectionMachine};
use crate::visibility::Visibility;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Ctrl,
    Shift,
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { point: Point, modifiers: Modifiers },
    PointerMove { point: Point },
    PointerUp,
    KeyChanged { down: bool, key: Key },
    Reshuffle,
    Cheat(u32),
    ImageMetadataReady { width: f64, height: f64, grid: GridShape },
}

/// Read-only view of one group for painting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupView {
    pub id: GroupId,
    pub members: Vec<usize>,
    pub position: Point,
    pub is_selected: bool,
    pub zlevel: i64,
    pub visibility_group: i32,
}

pub struct Board {
    config: BoardConfig,
    rng: RngState,
    graph: GroupGraph,
    outlines: OutlineCache,
    selection: SelectionMachine,
    visibility: Visibility,
    modifiers: Modifiers,
}

impl Board {
    /// Seeds from `config.seed`, or from entropy when it is unset.
    pub fn new(config: BoardConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => RngState::from_seed(seed),
            None => RngState::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: BoardConfig, mut rng: RngState) -> Self {
        let grid = config.grid;
        let outlines = OutlineCache::build(grid, &mut rng);
        let graph = GroupGraph::identity(grid, PieceMetrics::default());
        let mut board = Board {
            config,
            rng,
            graph,
            outlines,
            selection: SelectionMachine::default(),
            visibility: Visibility::default(),
            modifiers: Modifiers::default(),
        };
        board.reshuffle();
        board
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn grid(&self) -> GridShape {
        self.graph.grid()
    }

    pub fn metrics(&self) -> PieceMetrics {
        self.graph.metrics()
    }

    pub fn graph(&self) -> &GroupGraph {
        &self.graph
    }

    pub fn outlines(&self) -> &OutlineCache {
        &self.outlines
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn selection(&self) -> Selection {
        self.selection.selection()
    }

    pub fn selection_machine(&self) -> &SelectionMachine {
        &self.selection
    }

    pub fn selection_box(&self) -> Option<&SelectionBox> {
        self.selection.selection_box()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_visible(&self, layer: i32) -> bool {
        self.visibility.is_visible(layer)
    }

    pub fn visible_layers(&self) -> Vec<i32> {
        self.visibility.layers().collect()
    }

    /// Applies one input event to completion.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { point, modifiers } => self.pointer_down(point, modifiers),
            InputEvent::PointerMove { point } => self.pointer_move(point),
            InputEvent::PointerUp => {
                self.pointer_up();
            }
            InputEvent::KeyChanged { down, key } => self.key_changed(down, key),
            InputEvent::Reshuffle => self.reshuffle(),
            InputEvent::Cheat(n) => {
                self.cheat(n);
            }
            InputEvent::ImageMetadataReady {
                width,
                height,
                grid,
            } => self.image_metadata_ready(width, height, grid),
        }
    }

    pub fn pointer_down(&mut self, point: Point, modifiers: Modifiers) {
        self.selection
            .pointer_down(&mut self.graph, &self.visibility, point, modifiers);
    }

    pub fn pointer_move(&mut self, point: Point) {
        self.selection
            .pointer_move(&mut self.graph, &self.visibility, point);
    }

    pub fn pointer_up(&mut self) -> Option<MergeOutcome> {
        let outcome = self
            .selection
            .pointer_up(&mut self.graph, &self.visibility, self.config.snap());
        if self.graph.len() == 1 && outcome.is_some() {
            info!("puzzle complete");
        }
        outcome
    }

    /// Tracks held modifiers; digit key-downs drive the layer hotkeys.
    pub fn key_changed(&mut self, down: bool, key: Key) {
        match key {
            Key::Ctrl => self.modifiers.ctrl = down,
            Key::Shift => self.modifiers.shift = down,
            Key::Digit(d) if down && d <= 9 => self.layer_hotkey(i32::from(d)),
            Key::Digit(_) | Key::Other => {}
        }
    }

    /// With a modifier held, moves the selection to `layer`; otherwise shows or
    /// hides that layer.
    pub fn layer_hotkey(&mut self, layer: i32) {
        if self.modifiers.any() {
            self.visibility.assign_selected(&mut self.graph, layer);
        } else {
            self.visibility.toggle(&mut self.graph, layer);
        }
        self.selection.refresh(&self.graph);
    }

    /// Scatters every piece again as its own group with fresh positions and
    /// paint order. Outlines are kept.
    pub fn reshuffle(&mut self) {
        let grid = self.grid();
        let metrics = self.metrics();
        let n = grid.piece_count();
        let slots = self.rng.permutation(n);
        let zlevels = self.rng.permutation(n);
        self.graph = GroupGraph::new(grid, metrics, &slots, &zlevels, self.config.scatter_spacing);
        self.selection.reset(&self.graph);
        info!("board shuffled: {}x{} grid, {n} pieces", grid.nx, grid.ny);
    }

    /// New image: adopt its grid and piece size, regenerate edges, reshuffle.
    pub fn image_metadata_ready(&mut self, width: f64, height: f64, grid: GridShape) {
        if grid.is_empty() {
            warn!("ignoring image metadata with empty grid {}x{}", grid.nx, grid.ny);
            return;
        }
        let metrics = PieceMetrics::for_image(width, height, grid);
        info!(
            "image {width}x{height} cut into {}x{} pieces of {:.1}x{:.1}",
            grid.nx, grid.ny, metrics.width, metrics.height
        );
        self.config.grid = grid;
        if self.outlines.grid() != grid {
            self.outlines = OutlineCache::build(grid, &mut self.rng);
        }
        self.graph = GroupGraph::identity(grid, metrics);
        self.reshuffle();
    }

    /// Runs `n` cheat steps; returns how many of them merged something.
    pub fn cheat(&mut self, n: u32) -> usize {
        let snap = self.config.snap();
        let mut merges = 0;
        for _ in 0..n {
            if cheat_step(&mut self.graph, &mut self.rng, &self.visibility, snap).is_some() {
                merges += 1;
            }
        }
        self.selection.refresh(&self.graph);
        debug!("cheat x{n}: {merges} merges, {} groups left", self.graph.len());
        merges
    }

    /// Live groups in paint order (lowest z-level first).
    pub fn snapshot(&self) -> Vec<GroupView> {
        let mut views: Vec<GroupView> = self
            .graph
            .iter()
            .map(|g| GroupView {
                id: g.id,
                members: g.members.clone(),
                position: g.position,
                is_selected: g.is_selected,
                zlevel: g.zlevel,
                visibility_group: g.visibility_group,
            })
            .collect();
        views.sort_by_key(|v| v.zlevel);
        views
    }

    /// Width and height of the area pieces are scattered over.
    pub fn scatter_extent(&self) -> (f64, f64) {
        let grid = self.grid();
        let m = self.metrics();
        let s = self.config.scatter_spacing;
        (
            ((grid.nx as f64 - 1.0) * s + 1.0) * m.width,
            ((grid.ny as f64 - 1.0) * s + 1.0) * m.height,
        )
    }
}

/// Moves a random group onto a random neighbour's anchor and drops it there.
pub fn cheat_step(
    graph: &mut GroupGraph,
    rng: &mut RngState,
    visibility: &Visibility,
    snap: SnapSettings,
) -> Option<MergeOutcome> {
    if graph.len() <= 1 {
        return None;
    }
    let ids = graph.ids();
    let id = ids[rng.index(ids.len())?];
    let neighbours: Vec<GroupId> = graph.group(id).neighbours.iter().copied().collect();
    let target = neighbours[rng.index(neighbours.len())?];
    let target_pos = graph.get(target)?.position;
    if let Some(g) = graph.get_mut(id) {
        g.position = target_pos;
    }
    graph.snap(id, snap, visibility)
}
