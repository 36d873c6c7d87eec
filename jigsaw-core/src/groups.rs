//! Piece groups and the snap/merge engine.
//!
//! Groups live in an arena keyed by id. A merge keeps the neighbour's id,
//! retires the dragged group's id and rewrites that id in every neighbour set
//! on the board.

use std::collections::{BTreeMap, BTreeSet};

use geo_types::Rect;
use log::{debug, warn};
use serde::Serialize;

use crate::config::{SnapPolicy, SnapSettings};
use crate::geometry::{piece_rect, rect_contains, rects_overlap, Point};
use crate::grid::{GridShape, PieceMetrics};
use crate::visibility::Visibility;

pub type GroupId = i32;

/// Layer tag of groups that can never be hidden.
pub const ALWAYS_VISIBLE: i32 = -1;
pub const NULL_GROUP_ID: GroupId = -10;

static NULL_GROUP: PieceGroup = PieceGroup::null();

/// One connected cluster of fused pieces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PieceGroup {
    pub id: GroupId,
    /// Append order: surviving group's pieces first, absorbed pieces after.
    pub members: Vec<usize>,
    pub neighbours: BTreeSet<GroupId>,
    /// Anchor; member `i` renders at `position + offset(i)`.
    pub position: Point,
    pub is_selected: bool,
    pub zlevel: i64,
    pub visibility_group: i32,
}

impl PieceGroup {
    /// Sentinel returned for ids that are no longer on the board.
    pub const fn null() -> Self {
        PieceGroup {
            id: NULL_GROUP_ID,
            members: Vec::new(),
            neighbours: BTreeSet::new(),
            position: Point::ORIGIN,
            is_selected: false,
            zlevel: -1,
            visibility_group: ALWAYS_VISIBLE,
        }
    }

    pub fn is_null(&self) -> bool {
        self.id == NULL_GROUP_ID
    }
}

/// Result of fusing a dropped group into a neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    pub survivor: GroupId,
    pub retired: GroupId,
}

#[derive(Clone, Debug)]
pub struct GroupGraph {
    grid: GridShape,
    metrics: PieceMetrics,
    groups: BTreeMap<GroupId, PieceGroup>,
    max_zlevel: i64,
}

fn is_layout(list: &[usize], n: usize) -> bool {
    list.len() >= n && list[..n].iter().all(|&v| v < n)
}

impl GroupGraph {
    /// One group per piece. `slots[i]` is the scatter slot of piece `i` and
    /// `zlevels[i]` its paint order; lists that are too short or hold
    /// out-of-range entries fall back to the solved layout and identity order.
    pub fn new(
        grid: GridShape,
        metrics: PieceMetrics,
        slots: &[usize],
        zlevels: &[usize],
        scatter_spacing: f64,
    ) -> Self {
        let n = grid.piece_count();
        let scatter = is_layout(slots, n);
        let stacked = is_layout(zlevels, n);
        if !scatter || !stacked {
            warn!(
                "layout lists unusable for {n} pieces (positions: {}, z-levels: {}); using identity layout",
                slots.len(),
                zlevels.len()
            );
        }
        let mut groups = BTreeMap::new();
        for piece in 0..n {
            let home = metrics.offset(grid, piece);
            let pos = if scatter {
                metrics.scatter_slot(grid, slots[piece], scatter_spacing)
            } else {
                home
            };
            let zlevel = if stacked { zlevels[piece] } else { piece };
            let id = piece as GroupId;
            groups.insert(
                id,
                PieceGroup {
                    id,
                    members: vec![piece],
                    neighbours: grid
                        .neighbours(piece)
                        .into_iter()
                        .map(|p| p as GroupId)
                        .collect(),
                    position: pos - home,
                    is_selected: false,
                    zlevel: zlevel as i64,
                    visibility_group: ALWAYS_VISIBLE,
                },
            );
        }
        GroupGraph {
            grid,
            metrics,
            groups,
            max_zlevel: n as i64,
        }
    }

    /// Solved layout with identity paint order.
    pub fn identity(grid: GridShape, metrics: PieceMetrics) -> Self {
        Self::new(grid, metrics, &[], &[], 1.0)
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    pub fn metrics(&self) -> PieceMetrics {
        self.metrics
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn max_zlevel(&self) -> i64 {
        self.max_zlevel
    }

    pub fn get(&self, id: GroupId) -> Option<&PieceGroup> {
        self.groups.get(&id)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut PieceGroup> {
        self.groups.get_mut(&id)
    }

    /// Like [`get`](Self::get) but resolves stale ids to the null group.
    pub fn group(&self, id: GroupId) -> &PieceGroup {
        self.groups.get(&id).unwrap_or(&NULL_GROUP)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PieceGroup> {
        self.groups.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PieceGroup> {
        self.groups.values_mut()
    }

    pub fn ids(&self) -> Vec<GroupId> {
        self.groups.keys().copied().collect()
    }

    pub fn selected_ids(&self) -> BTreeSet<GroupId> {
        self.groups
            .values()
            .filter(|g| g.is_selected)
            .map(|g| g.id)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.groups.values().filter(|g| g.is_selected).count()
    }

    pub fn clear_selection(&mut self) {
        for g in self.groups.values_mut() {
            g.is_selected = false;
        }
    }

    /// Moves `id` to the front of the paint order.
    pub fn raise(&mut self, id: GroupId) {
        if let Some(g) = self.groups.get_mut(&id) {
            g.zlevel = self.max_zlevel;
            self.max_zlevel += 1;
        }
    }

    /// Where piece `piece` of a group anchored at `position` is drawn.
    pub fn piece_origin(&self, position: Point, piece: usize) -> Point {
        position + self.metrics.offset(self.grid, piece)
    }

    /// Bounding boxes of the members of `group`.
    pub fn member_rects<'a>(&'a self, group: &'a PieceGroup) -> impl Iterator<Item = Rect<f64>> + 'a {
        group.members.iter().map(move |&piece| {
            piece_rect(
                self.piece_origin(group.position, piece),
                self.metrics.width,
                self.metrics.height,
            )
        })
    }

    pub fn overlaps(&self, group: &PieceGroup, area: &Rect<f64>) -> bool {
        self.member_rects(group).any(|r| rects_overlap(&r, area))
    }

    /// Topmost visible group with a member under `point`. On equal z-levels the
    /// group iterated last (highest id) wins.
    pub fn hit_test(&self, point: Point, visibility: &Visibility) -> Option<GroupId> {
        let mut best: Option<&PieceGroup> = None;
        for g in self.groups.values() {
            if !visibility.is_visible(g.visibility_group) {
                continue;
            }
            if !self.member_rects(g).any(|r| rect_contains(&r, point)) {
                continue;
            }
            if best.is_none_or(|b| g.zlevel >= b.zlevel) {
                best = Some(g);
            }
        }
        best.map(|g| g.id)
    }

    /// Neighbour of `id` that a drop at its current position would fuse with.
    pub fn snap_target(
        &self,
        id: GroupId,
        snap: SnapSettings,
        visibility: &Visibility,
    ) -> Option<GroupId> {
        let selected = self.get(id)?;
        let mut candidates = selected
            .neighbours
            .iter()
            .filter_map(|n| self.get(*n))
            .filter(|n| visibility.is_visible(n.visibility_group))
            .map(|n| (n.id, selected.position.distance(n.position)))
            .filter(|(_, d)| *d < snap.distance);
        match snap.policy {
            SnapPolicy::First => candidates.next().map(|(n, _)| n),
            SnapPolicy::Nearest => candidates
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(n, _)| n),
        }
    }

    /// Drops `id` where it stands: fuses it with an eligible neighbour if one is
    /// in range and clears its selection either way.
    pub fn snap(
        &mut self,
        id: GroupId,
        snap: SnapSettings,
        visibility: &Visibility,
    ) -> Option<MergeOutcome> {
        let outcome = self
            .snap_target(id, snap, visibility)
            .and_then(|target| self.merge(id, target));
        if outcome.is_none()
            && let Some(g) = self.groups.get_mut(&id)
        {
            g.is_selected = false;
        }
        outcome
    }

    /// Fuses `dragged` into `target`. The result keeps `target`'s id and
    /// position, takes `dragged`'s z-level and is deselected.
    pub fn merge(&mut self, dragged: GroupId, target: GroupId) -> Option<MergeOutcome> {
        if dragged == target || !self.groups.contains_key(&target) {
            return None;
        }
        let a = self.groups.remove(&dragged)?;
        let Some(b) = self.groups.get_mut(&target) else {
            self.groups.insert(dragged, a);
            return None;
        };
        b.members.extend_from_slice(&a.members);
        b.neighbours.extend(a.neighbours.iter().copied());
        b.neighbours.remove(&dragged);
        b.neighbours.remove(&target);
        b.zlevel = a.zlevel;
        b.is_selected = false;

        for g in self.groups.values_mut() {
            if g.neighbours.remove(&dragged) && g.id != target {
                g.neighbours.insert(target);
            }
        }
        debug!(
            "merged group {dragged} into {target}; {} groups left",
            self.groups.len()
        );
        Some(MergeOutcome {
            survivor: target,
            retired: dragged,
        })
    }
}
