//! Pointer-driven selection: clicks, drags and rubber-band boxes.

use std::collections::BTreeSet;

use geo_types::Rect;
use serde::Serialize;

use crate::config::SnapSettings;
use crate::geometry::{rect_from_corners, Point};
use crate::groups::{GroupGraph, GroupId, MergeOutcome};
use crate::visibility::Visibility;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn any(self) -> bool {
        self.ctrl || self.shift
    }
}

/// Aggregate selection derived from the per-group flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Selection {
    #[default]
    Null,
    Single(GroupId),
    Multiple,
}

impl Selection {
    pub fn of(graph: &GroupGraph) -> Self {
        let mut selected = graph.iter().filter(|g| g.is_selected);
        match (selected.next(), selected.next()) {
            (None, _) => Selection::Null,
            (Some(g), None) => Selection::Single(g.id),
            (Some(_), Some(_)) => Selection::Multiple,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BoxMode {
    /// Groups touched by the box join the selection and stay in it.
    Normal,
    /// Groups under the box flip relative to the selection at box start.
    Inverted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionBox {
    pub mode: BoxMode,
    pub static_corner: Point,
    pub moving_corner: Point,
    /// Selection when the box was opened.
    pub selected_ids: BTreeSet<GroupId>,
}

impl SelectionBox {
    pub fn rect(&self) -> Rect<f64> {
        rect_from_corners(self.static_corner, self.moving_corner)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging {
        last: Point,
    },
    Boxing(SelectionBox),
}

/// Coarse state of the machine, handy for renderers and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Dragging,
    BoxNormal,
    BoxInverted,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionMachine {
    interaction: Interaction,
    selection: Selection,
}

impl SelectionMachine {
    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn state(&self) -> InteractionState {
        match &self.interaction {
            Interaction::Idle => InteractionState::Idle,
            Interaction::Dragging { .. } => InteractionState::Dragging,
            Interaction::Boxing(b) => match b.mode {
                BoxMode::Normal => InteractionState::BoxNormal,
                BoxMode::Inverted => InteractionState::BoxInverted,
            },
        }
    }

    pub fn selection_box(&self) -> Option<&SelectionBox> {
        match &self.interaction {
            Interaction::Boxing(b) => Some(b),
            _ => None,
        }
    }

    /// Drops any gesture in progress and re-reads the selection flags.
    pub fn reset(&mut self, graph: &GroupGraph) {
        self.interaction = Interaction::Idle;
        self.refresh(graph);
    }

    pub fn refresh(&mut self, graph: &GroupGraph) {
        self.selection = Selection::of(graph);
    }

    pub fn pointer_down(
        &mut self,
        graph: &mut GroupGraph,
        visibility: &Visibility,
        point: Point,
        mods: Modifiers,
    ) {
        let Some(clicked) = graph.hit_test(point, visibility) else {
            let selected_ids = if mods.ctrl || mods.shift {
                graph.selected_ids()
            } else {
                graph.clear_selection();
                BTreeSet::new()
            };
            let mode = if mods.ctrl {
                BoxMode::Inverted
            } else {
                BoxMode::Normal
            };
            self.interaction = Interaction::Boxing(SelectionBox {
                mode,
                static_corner: point,
                moving_corner: point,
                selected_ids,
            });
            self.refresh(graph);
            return;
        };

        let was_selected = graph.group(clicked).is_selected;
        if mods.ctrl {
            if let Some(g) = graph.get_mut(clicked) {
                g.is_selected = !g.is_selected;
            }
        } else if mods.shift {
            if let Some(g) = graph.get_mut(clicked) {
                g.is_selected = true;
            }
            graph.raise(clicked);
        } else if was_selected && self.selection == Selection::Multiple {
            graph.raise(clicked);
        } else {
            for g in graph.iter_mut() {
                g.is_selected = g.id == clicked;
            }
            graph.raise(clicked);
        }
        self.interaction = Interaction::Dragging { last: point };
        self.refresh(graph);
    }

    pub fn pointer_move(&mut self, graph: &mut GroupGraph, visibility: &Visibility, point: Point) {
        match &mut self.interaction {
            Interaction::Idle => {}
            Interaction::Dragging { last } => {
                let delta = point - *last;
                *last = point;
                for g in graph.iter_mut().filter(|g| g.is_selected) {
                    g.position += delta;
                }
            }
            Interaction::Boxing(b) => {
                b.moving_corner = point;
                let area = b.rect();
                let ids = graph.ids();
                for id in ids {
                    let group = graph.group(id);
                    if !visibility.is_visible(group.visibility_group) {
                        if let Some(g) = graph.get_mut(id) {
                            g.is_selected = false;
                        }
                        continue;
                    }
                    let inside = graph.overlaps(group, &area);
                    let was = b.selected_ids.contains(&id);
                    if let Some(g) = graph.get_mut(id) {
                        g.is_selected = match b.mode {
                            BoxMode::Normal => g.is_selected || was || inside,
                            BoxMode::Inverted => was ^ inside,
                        };
                    }
                }
            }
        }
        self.refresh(graph);
    }

    /// Ends the gesture. A single dragged group is offered to the snap engine
    /// and then deselected.
    pub fn pointer_up(
        &mut self,
        graph: &mut GroupGraph,
        visibility: &Visibility,
        snap: SnapSettings,
    ) -> Option<MergeOutcome> {
        let interaction = std::mem::take(&mut self.interaction);
        let outcome = match (interaction, self.selection) {
            (Interaction::Dragging { .. }, Selection::Single(id)) => {
                let outcome = graph.snap(id, snap, visibility);
                graph.clear_selection();
                outcome
            }
            _ => None,
        };
        self.refresh(graph);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridShape, PieceMetrics};

    const CTRL: Modifiers = Modifiers { ctrl: true, shift: false };
    const SHIFT: Modifiers = Modifiers { ctrl: false, shift: true };
    const NONE: Modifiers = Modifiers { ctrl: false, shift: false };

    // 3x1 in solved layout: pieces cover x = 0..100, 100..200, 200..300.
    fn setup() -> (GroupGraph, Visibility, SelectionMachine) {
        let graph = GroupGraph::identity(GridShape::new(3, 1), PieceMetrics::default());
        (graph, Visibility::default(), SelectionMachine::default())
    }

    fn center(piece: usize) -> Point {
        Point::new(piece as f64 * 100.0 + 50.0, 50.0)
    }

    #[test]
    fn test_plain_click_selects_only_target() {
        let (mut g, v, mut m) = setup();
        g.get_mut(2).unwrap().is_selected = true;
        m.refresh(&g);
        m.pointer_down(&mut g, &v, center(0), NONE);
        assert_eq!(m.selection(), Selection::Single(0));
        assert_eq!(m.state(), InteractionState::Dragging);
        assert!(!g.group(2).is_selected);
        assert_eq!(g.group(0).zlevel, 3);
    }

    #[test]
    fn test_ctrl_click_flips_without_raise() {
        let (mut g, v, mut m) = setup();
        m.pointer_down(&mut g, &v, center(1), CTRL);
        assert!(g.group(1).is_selected);
        assert_eq!(g.group(1).zlevel, 1);
        assert!(!g.group(0).is_selected);
        m.pointer_down(&mut g, &v, center(1), CTRL);
        assert!(!g.group(1).is_selected);
        assert_eq!(m.selection(), Selection::Null);
    }

    #[test]
    fn test_shift_click_extends() {
        let (mut g, v, mut m) = setup();
        m.pointer_down(&mut g, &v, center(0), NONE);
        m.pointer_down(&mut g, &v, center(2), SHIFT);
        assert_eq!(m.selection(), Selection::Multiple);
        assert_eq!(g.group(0).zlevel, 3);
        assert_eq!(g.group(2).zlevel, 4);
    }

    #[test]
    fn test_drag_multi_selection_moves_all() {
        let (mut g, v, mut m) = setup();
        g.get_mut(0).unwrap().is_selected = true;
        g.get_mut(1).unwrap().is_selected = true;
        m.refresh(&g);
        m.pointer_down(&mut g, &v, center(1), NONE);
        assert_eq!(m.selection(), Selection::Multiple);
        assert_eq!(g.group(1).zlevel, 3);
        assert_eq!(g.group(0).zlevel, 0);
        m.pointer_move(&mut g, &v, center(1) + Point::new(500.0, 40.0));
        assert_eq!(g.group(0).position, Point::new(500.0, 40.0));
        assert_eq!(g.group(1).position, Point::new(500.0, 40.0));
        assert_eq!(g.group(2).position, Point::ORIGIN);
        assert!(m.pointer_up(&mut g, &v, SnapSettings::default()).is_none());
        assert_eq!(m.selection(), Selection::Multiple);
        assert_eq!(m.state(), InteractionState::Idle);
    }

    #[test]
    fn test_background_click_clears() {
        let (mut g, v, mut m) = setup();
        g.get_mut(0).unwrap().is_selected = true;
        m.refresh(&g);
        m.pointer_down(&mut g, &v, Point::new(50.0, 500.0), NONE);
        assert_eq!(m.state(), InteractionState::BoxNormal);
        assert_eq!(m.selection(), Selection::Null);
        assert!(m.selection_box().unwrap().selected_ids.is_empty());
    }

    #[test]
    fn test_box_normal_is_monotonic() {
        let (mut g, v, mut m) = setup();
        m.pointer_down(&mut g, &v, Point::new(50.0, 150.0), NONE);
        m.pointer_move(&mut g, &v, Point::new(150.0, 90.0));
        assert!(g.group(0).is_selected);
        assert!(g.group(1).is_selected);
        // Shrink the box back below the pieces: both stay captured.
        m.pointer_move(&mut g, &v, Point::new(60.0, 140.0));
        assert!(g.group(0).is_selected);
        assert!(g.group(1).is_selected);
        assert!(!g.group(2).is_selected);
        m.pointer_up(&mut g, &v, SnapSettings::default());
        assert_eq!(m.selection(), Selection::Multiple);
        assert!(m.selection_box().is_none());
    }

    #[test]
    fn test_box_inverted_toggles_and_reverts() {
        let (mut g, v, mut m) = setup();
        g.get_mut(0).unwrap().is_selected = true;
        m.refresh(&g);
        m.pointer_down(&mut g, &v, Point::new(50.0, 150.0), CTRL);
        assert_eq!(m.state(), InteractionState::BoxInverted);
        m.pointer_move(&mut g, &v, Point::new(150.0, 90.0));
        assert!(!g.group(0).is_selected);
        assert!(g.group(1).is_selected);
        m.pointer_move(&mut g, &v, Point::new(60.0, 140.0));
        assert!(g.group(0).is_selected);
        assert!(!g.group(1).is_selected);
        m.pointer_up(&mut g, &v, SnapSettings::default());
        assert_eq!(m.selection(), Selection::Single(0));
    }

    #[test]
    fn test_box_skips_hidden_layers() {
        let (mut g, mut v, mut m) = setup();
        g.get_mut(1).unwrap().visibility_group = 5;
        v.toggle(&mut g, 5);
        m.pointer_down(&mut g, &v, Point::new(0.0, 150.0), NONE);
        m.pointer_move(&mut g, &v, Point::new(300.0, 0.0));
        assert!(g.group(0).is_selected);
        assert!(!g.group(1).is_selected);
        assert!(g.group(2).is_selected);
    }

    #[test]
    fn test_hidden_groups_are_not_hit() {
        let (mut g, mut v, mut m) = setup();
        g.get_mut(1).unwrap().visibility_group = 5;
        v.toggle(&mut g, 5);
        m.pointer_down(&mut g, &v, center(1), NONE);
        assert_eq!(m.state(), InteractionState::BoxNormal);
    }

    #[test]
    fn test_single_drop_snaps_and_clears() {
        let (mut g, v, mut m) = setup();
        g.get_mut(0).unwrap().position = Point::new(400.0, 0.0);
        m.pointer_down(&mut g, &v, Point::new(450.0, 50.0), NONE);
        m.pointer_move(&mut g, &v, Point::new(60.0, 45.0));
        let outcome = m.pointer_up(&mut g, &v, SnapSettings::default());
        assert_eq!(outcome, Some(MergeOutcome { survivor: 1, retired: 0 }));
        assert_eq!(m.selection(), Selection::Null);
        assert_eq!(g.len(), 2);
        assert_eq!(g.group(1).members, vec![1, 0]);
    }

    #[test]
    fn test_pointer_up_while_idle() {
        let (mut g, v, mut m) = setup();
        assert!(m.pointer_up(&mut g, &v, SnapSettings::default()).is_none());
        m.pointer_move(&mut g, &v, Point::new(10.0, 10.0));
        assert_eq!(m.state(), InteractionState::Idle);
    }
}
