use std::collections::BTreeSet;

use jigsaw_core::edges::edge_index;
use jigsaw_core::geometry::rect_from_corners;
use jigsaw_core::{
    Board, BoardConfig, GridShape, GroupGraph, InputEvent, Key, Modifiers, OutlineCache,
    PieceMetrics, Point, RngState, Selection, Side, Visibility,
};
use jigsaw_core::selection::SelectionMachine;
use proptest::prelude::*;

fn point_strategy() -> impl Strategy<Value = Point> {
    (-100.0f64..700.0, -100.0f64..600.0).prop_map(|(x, y)| Point::new(x, y))
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        (0u8..10).prop_map(Key::Digit),
        Just(Key::Ctrl),
        Just(Key::Shift),
        Just(Key::Other),
    ]
}

fn event_strategy() -> impl Strategy<Value = InputEvent> {
    prop_oneof![
        3 => (point_strategy(), any::<bool>(), any::<bool>()).prop_map(|(point, ctrl, shift)| {
            InputEvent::PointerDown {
                point,
                modifiers: Modifiers { ctrl, shift },
            }
        }),
        4 => point_strategy().prop_map(|point| InputEvent::PointerMove { point }),
        3 => Just(InputEvent::PointerUp),
        2 => (any::<bool>(), key_strategy()).prop_map(|(down, key)| InputEvent::KeyChanged { down, key }),
        1 => (0u32..3).prop_map(InputEvent::Cheat),
        1 => Just(InputEvent::Reshuffle),
    ]
}

fn assert_invariants(board: &Board) {
    let graph = board.graph();
    let n = graph.grid().piece_count();

    let mut members: Vec<usize> = graph.iter().flat_map(|g| g.members.iter().copied()).collect();
    members.sort_unstable();
    assert_eq!(members, (0..n).collect::<Vec<_>>(), "pieces must be partitioned");

    for a in graph.iter() {
        assert!(!a.neighbours.contains(&a.id), "group {} lists itself", a.id);
        for b in &a.neighbours {
            let b = graph.get(*b).unwrap_or_else(|| panic!("stale neighbour {b} in {}", a.id));
            assert!(b.neighbours.contains(&a.id), "{} -> {} is one-sided", a.id, b.id);
        }
        assert!(a.zlevel < graph.max_zlevel());
        if a.is_selected {
            assert!(board.is_visible(a.visibility_group), "hidden group {} selected", a.id);
        }
    }
    assert_eq!(board.selection(), Selection::of(graph));
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn event_sequences_keep_board_consistent(
        seed in any::<u64>(),
        nx in 1usize..5,
        ny in 1usize..4,
        events in prop::collection::vec(event_strategy(), 1..60),
    ) {
        let mut board = Board::new(BoardConfig {
            grid: GridShape::new(nx, ny),
            seed: Some(seed),
            ..BoardConfig::default()
        });
        for event in events {
            let before = board.graph().len();
            if let InputEvent::Cheat(k) = event {
                let merges = board.cheat(k);
                prop_assert_eq!(board.graph().len(), before - merges);
            } else if event == InputEvent::PointerUp {
                let merged = board.pointer_up().is_some();
                prop_assert_eq!(board.graph().len(), before - usize::from(merged));
            } else {
                board.handle(event);
            }
            assert_invariants(&board);
        }
    }

    #[test]
    fn shared_edges_line_up(seed in any::<u64>(), nx in 1usize..6, ny in 1usize..6) {
        let grid = GridShape::new(nx, ny);
        let cache = OutlineCache::build(grid, &mut RngState::from_seed(seed));
        let cell = |piece: usize| {
            Point::new(grid.col(piece) as f64 * 200.0, grid.row(piece) as f64 * 200.0)
        };
        let to_board = |piece: usize, side: Side| -> Vec<Point> {
            let origin = cell(piece);
            cache.outline(piece).map_or_else(Vec::new, |o| {
                o.side(side).iter().map(|p| *p + origin).collect()
            })
        };
        for p in 0..grid.piece_count() {
            if let Some(q) = grid.piece_at(grid.col(p) + 1, grid.row(p)) {
                prop_assert_eq!(edge_index(grid, Side::East, p), edge_index(grid, Side::West, q));
                let mut east = to_board(p, Side::East);
                east.reverse();
                prop_assert_eq!(east, to_board(q, Side::West));
            }
            if let Some(q) = grid.piece_at(grid.col(p), grid.row(p) + 1) {
                let mut south = to_board(p, Side::South);
                south.reverse();
                prop_assert_eq!(south, to_board(q, Side::North));
            }
        }
    }

    #[test]
    fn normal_box_never_drops_a_capture(
        start in (310.0f64..400.0, -50.0f64..350.0),
        path in prop::collection::vec((-50.0f64..350.0, -50.0f64..350.0), 1..12),
        seeded in prop::collection::vec(any::<bool>(), 9),
    ) {
        let mut graph = GroupGraph::identity(GridShape::new(3, 3), PieceMetrics::default());
        let vis = Visibility::default();
        for (id, on) in seeded.iter().enumerate() {
            if let Some(g) = graph.get_mut(id as i32) {
                g.is_selected = *on;
            }
        }
        let original = graph.selected_ids();
        let start = Point::new(start.0, start.1);
        let mut machine = SelectionMachine::default();
        machine.pointer_down(&mut graph, &vis, start, Modifiers { ctrl: false, shift: true });

        let mut expected: BTreeSet<i32> = original;
        for (x, y) in path {
            let corner = Point::new(x, y);
            machine.pointer_move(&mut graph, &vis, corner);
            let area = rect_from_corners(start, corner);
            for g in graph.iter() {
                if graph.overlaps(g, &area) {
                    expected.insert(g.id);
                }
            }
            prop_assert_eq!(graph.selected_ids(), expected.clone());
        }
        machine.pointer_up(&mut graph, &vis, Default::default());
        prop_assert_eq!(graph.selected_ids(), expected);
    }

    #[test]
    fn inverted_box_tracks_last_position(
        start in (310.0f64..400.0, -50.0f64..350.0),
        path in prop::collection::vec((-50.0f64..350.0, -50.0f64..350.0), 1..12),
        seeded in prop::collection::vec(any::<bool>(), 9),
    ) {
        let mut graph = GroupGraph::identity(GridShape::new(3, 3), PieceMetrics::default());
        let vis = Visibility::default();
        for (id, on) in seeded.iter().enumerate() {
            if let Some(g) = graph.get_mut(id as i32) {
                g.is_selected = *on;
            }
        }
        let original = graph.selected_ids();
        let start = Point::new(start.0, start.1);
        let mut machine = SelectionMachine::default();
        machine.pointer_down(&mut graph, &vis, start, Modifiers { ctrl: true, shift: false });

        let mut last = start;
        for (x, y) in path {
            last = Point::new(x, y);
            machine.pointer_move(&mut graph, &vis, last);
        }
        machine.pointer_up(&mut graph, &vis, Default::default());

        let area = rect_from_corners(start, last);
        for g in graph.iter() {
            let inside = graph.overlaps(g, &area);
            prop_assert_eq!(g.is_selected, original.contains(&g.id) ^ inside, "group {}", g.id);
        }
    }
}
