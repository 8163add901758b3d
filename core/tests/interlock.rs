use approx::assert_abs_diff_eq;
use jigsnap_core::{
    layout, GroupId, PieceId, PieceSpec, ReleaseOutcome, Table, TableConfig, TableEvent,
};

fn build_table(specs: &[PieceSpec], config: TableConfig) -> Table {
    let mut table = Table::new(config, specs).expect("build table");
    table.init_neighborhoods();
    table
}

fn row_specs(count: usize, size: f32) -> Vec<PieceSpec> {
    (0..count)
        .map(|index| PieceSpec::new((size, size), (index as f32, 0.0)))
        .collect()
}

fn tolerance_config() -> TableConfig {
    TableConfig {
        solve_tolerance: 0.25,
        ..TableConfig::default()
    }
}

/// Presses the piece at its centre, drags it to `point` and releases there.
fn drop_at(table: &mut Table, piece: PieceId, point: (f32, f32)) -> ReleaseOutcome {
    let start = table.world_pose(piece).expect("pose").position;
    table.begin_touch(piece, start).expect("press");
    table.drag(piece, point).expect("drag");
    table.finish_touch(piece, point).expect("release")
}

fn tap(table: &mut Table, piece: PieceId) {
    let point = table.world_pose(piece).expect("pose").position;
    table.begin_touch(piece, point).expect("press");
    let outcome = table.finish_touch(piece, point).expect("release");
    assert_eq!(outcome, ReleaseOutcome::StartedRotation);
}

fn settle(table: &mut Table, piece: PieceId) {
    for _ in 0..100 {
        let body = table.body_of(piece).expect("body");
        if !table.body_motion(body).expect("motion").is_rotating() {
            return;
        }
        table.fixed_update();
    }
    panic!("piece {piece} never settled");
}

#[test]
fn tolerance_boundary_is_inclusive_on_each_axis() {
    let accepted = [(1.25, 0.0), (0.75, 0.0), (1.0, 0.25), (1.0, -0.25)];
    for point in accepted {
        let mut table = build_table(&row_specs(2, 1.5), tolerance_config());
        table.place(PieceId(1), point, 0.0).expect("place");
        assert_eq!(drop_at(&mut table, PieceId(1), point), ReleaseOutcome::Dropped);
        assert_eq!(table.group_count(), 1, "offset {point:?} should interlock");
        assert_eq!(table.world_pose(PieceId(1)).expect("pose").position, (1.0, 0.0));
    }

    let epsilon = 1.0 / 64.0;
    let rejected = [
        (1.25 + epsilon, 0.0),
        (0.75 - epsilon, 0.0),
        (1.0, 0.25 + epsilon),
        (1.0, -0.25 - epsilon),
    ];
    for point in rejected {
        let mut table = build_table(&row_specs(2, 1.5), tolerance_config());
        table.place(PieceId(1), point, 0.0).expect("place");
        drop_at(&mut table, PieceId(1), point);
        assert_eq!(table.group_count(), 0, "offset {point:?} should not interlock");
        assert_eq!(table.world_pose(PieceId(1)).expect("pose").position, point);
    }
}

#[test]
fn rotation_mismatch_blocks_interlock() {
    let mut table = build_table(&row_specs(2, 1.0), TableConfig::default());
    table.place(PieceId(1), (1.0, 0.0), 90.0).expect("place");
    drop_at(&mut table, PieceId(1), (1.0, 0.0));
    assert_eq!(table.group_count(), 0);
}

#[test]
fn repeated_evaluation_is_idempotent() {
    let mut table = build_table(&row_specs(2, 1.0), TableConfig::default());
    table.place(PieceId(1), (1.005, 0.0), 0.0).expect("place");
    drop_at(&mut table, PieceId(1), (1.005, 0.0));
    assert_eq!(table.group_count(), 1);
    table.take_events();

    for _ in 0..3 {
        assert_eq!(table.check_solution_poses(PieceId(0)).expect("check"), 0);
        assert_eq!(table.check_solution_poses(PieceId(1)).expect("check"), 0);
    }
    drop_at(&mut table, PieceId(0), (0.0, 0.0));

    let group = table.group(GroupId(0)).expect("group");
    assert_eq!(group.members(), &[PieceId(1), PieceId(0)]);
    assert_eq!(table.group_count(), 1);
    assert!(table
        .take_events()
        .iter()
        .all(|event| !matches!(event, TableEvent::Interlocked { .. })));
}

#[test]
fn transitive_merge_is_order_independent() {
    for order in [[PieceId(0), PieceId(2)], [PieceId(2), PieceId(0)]] {
        let mut table = build_table(&row_specs(3, 1.0), TableConfig::default());
        table.place(PieceId(0), (0.0, 5.0), 0.0).expect("place");
        table.place(PieceId(2), (2.0, -5.0), 0.0).expect("place");
        for piece in order {
            drop_at(&mut table, piece, (piece.index() as f32, 0.0));
        }
        assert_eq!(table.group_count(), 1);
        let group = table.groups().next().expect("group");
        let mut members = group.members().to_vec();
        members.sort();
        assert_eq!(members, vec![PieceId(0), PieceId(1), PieceId(2)]);
        for index in 0..3 {
            let pose = table.world_pose(PieceId(index)).expect("pose");
            assert_abs_diff_eq!(pose.position.0, index as f32, epsilon = 1e-5);
            assert_abs_diff_eq!(pose.position.1, 0.0, epsilon = 1e-5);
        }
        assert!(table.is_complete());
    }
}

#[test]
fn equal_groups_merge_into_the_acting_group() {
    let mut table = build_table(&row_specs(4, 1.0), TableConfig::default());
    table.place(PieceId(0), (10.0, 0.0), 0.0).expect("place");
    table.place(PieceId(1), (11.0, 0.0), 0.0).expect("place");
    drop_at(&mut table, PieceId(1), (11.0, 0.0));
    drop_at(&mut table, PieceId(3), (3.0, 0.0));
    assert_eq!(table.group_count(), 2);
    table.take_events();

    drop_at(&mut table, PieceId(1), (1.0, 0.0));
    assert_eq!(table.group_count(), 1);
    assert_eq!(table.group(GroupId(0)).expect("group").len(), 4);
    assert!(table.group(GroupId(1)).is_err());
    assert!(table.take_events().contains(&TableEvent::GroupsMerged {
        into: GroupId(0),
        from: GroupId(1),
    }));
    for index in 0..4 {
        assert_eq!(table.group_of(PieceId(index)).expect("piece"), Some(GroupId(0)));
    }
}

#[test]
fn smaller_group_merges_into_larger() {
    let mut table = build_table(&row_specs(5, 1.0), TableConfig::default());
    table.place(PieceId(0), (10.0, 0.0), 0.0).expect("place");
    table.place(PieceId(1), (11.0, 0.0), 0.0).expect("place");
    drop_at(&mut table, PieceId(1), (11.0, 0.0));
    drop_at(&mut table, PieceId(3), (3.0, 0.0));
    assert_eq!(table.group(GroupId(1)).expect("group").len(), 3);

    drop_at(&mut table, PieceId(1), (1.0, 0.0));
    assert!(table.group(GroupId(0)).is_err());
    assert_eq!(table.group(GroupId(1)).expect("group").len(), 5);
    assert!(table.is_complete());
}

#[test]
fn grouped_pieces_move_with_the_group_and_ignore_siblings() {
    let mut table = build_table(&row_specs(2, 1.0), TableConfig::default());
    drop_at(&mut table, PieceId(0), (0.0, 0.0));
    assert_eq!(table.group_count(), 1);
    assert!(table.touching(PieceId(0)).expect("touching").is_empty());
    assert!(table.touching(PieceId(1)).expect("touching").is_empty());

    drop_at(&mut table, PieceId(0), (4.0, 3.0));
    assert_eq!(table.world_pose(PieceId(0)).expect("pose").position, (4.0, 3.0));
    assert_eq!(table.world_pose(PieceId(1)).expect("pose").position, (5.0, 3.0));

    tap(&mut table, PieceId(0));
    assert!(table.piece(PieceId(1)).expect("piece").motion().is_rotating());
    settle(&mut table, PieceId(0));
    assert!(!table.piece(PieceId(1)).expect("piece").motion().is_rotating());

    let pivot = table.world_pose(PieceId(0)).expect("pose");
    let other = table.world_pose(PieceId(1)).expect("pose");
    assert_abs_diff_eq!(pivot.position.0, 4.0, epsilon = 1e-4);
    assert_abs_diff_eq!(pivot.position.1, 3.0, epsilon = 1e-4);
    assert_abs_diff_eq!(other.position.0, 4.0, epsilon = 1e-4);
    assert_abs_diff_eq!(other.position.1, 4.0, epsilon = 1e-4);
    assert_abs_diff_eq!(other.rotation.rem_euclid(360.0), 90.0, epsilon = 1e-4);
}

#[test]
fn dragged_piece_stacks_one_thickness_in_front() {
    let specs = [
        PieceSpec::new((1.5, 1.5), (0.0, 0.0)),
        PieceSpec::new((1.5, 1.5), (1.0, 0.0)),
        PieceSpec::new((1.5, 1.5), (0.5, 0.5)),
    ];
    let config = TableConfig::default();
    let thickness = config.piece_thickness;
    let mut table = Table::new(config, &specs).expect("table");

    table.begin_touch(PieceId(0), (0.0, 0.0)).expect("press");
    table.drag(PieceId(0), (0.0, 0.0)).expect("drag");
    let dragged = table.stack_depth(PieceId(0)).expect("depth");
    assert_eq!(dragged, 0.0 - thickness);
    assert!(dragged < table.stack_depth(PieceId(1)).expect("depth"));
    assert!(dragged < table.stack_depth(PieceId(2)).expect("depth"));
    table.finish_touch(PieceId(0), (0.0, 0.0)).expect("release");

    table.begin_touch(PieceId(1), (1.0, 0.0)).expect("press");
    table.drag(PieceId(1), (1.0, 0.0)).expect("drag");
    assert_eq!(table.stack_depth(PieceId(1)).expect("depth"), dragged - thickness);

    table.update();
    assert_eq!(table.stack_depth(PieceId(1)).expect("depth"), dragged - thickness);
}

#[test]
fn drop_during_rotation_waits_for_settle() {
    let mut table = build_table(&row_specs(2, 1.0), TableConfig::default());
    table.place(PieceId(1), (4.0, 0.0), 270.0).expect("place");
    tap(&mut table, PieceId(1));
    assert_eq!(
        drop_at(&mut table, PieceId(1), (1.0, 0.0)),
        ReleaseOutcome::DroppedWhileRotating
    );
    assert_eq!(table.group_count(), 0);
    settle(&mut table, PieceId(1));
    assert_eq!(table.group_count(), 1);
}

fn assert_on_grid(table: &Table, piece: PieceId) {
    let rotation = table.world_pose(piece).expect("pose").rotation.rem_euclid(90.0);
    assert!(
        rotation < 1e-3 || rotation > 90.0 - 1e-3,
        "piece {piece} rests at {rotation} off the quarter-turn grid"
    );
}

fn assert_at(table: &Table, piece: PieceId, expected: (f32, f32)) {
    let position = table.world_pose(piece).expect("pose").position;
    assert_abs_diff_eq!(position.0, expected.0, epsilon = 1e-4);
    assert_abs_diff_eq!(position.1, expected.1, epsilon = 1e-4);
}

#[test]
fn turning_piece_does_not_interlock_before_it_settles() {
    let mut table = build_table(&row_specs(2, 1.0), TableConfig::default());
    table.place(PieceId(1), (1.0, 0.0), 270.0).expect("place");
    tap(&mut table, PieceId(1));
    table.fixed_update_by(89.95 / 450.0);
    assert!(table.body_motion(table.body_of(PieceId(1)).expect("body")).expect("motion").is_rotating());

    assert_eq!(table.check_solution_poses(PieceId(1)).expect("check"), 0);
    assert_eq!(table.check_solution_poses(PieceId(0)).expect("check"), 0);
    assert_eq!(table.group_count(), 0);

    settle(&mut table, PieceId(1));
    assert_eq!(table.group_count(), 1);
    assert_on_grid(&table, PieceId(1));
}

#[test]
fn drop_onto_turning_neighbor_waits_for_its_settle() {
    let mut table = build_table(&row_specs(2, 1.0), TableConfig::default());
    table.place(PieceId(0), (0.0, 0.0), 270.0).expect("place");
    table.place(PieceId(1), (3.0, 0.0), 0.0).expect("place");
    tap(&mut table, PieceId(0));
    table.fixed_update_by(89.95 / 450.0);

    assert_eq!(drop_at(&mut table, PieceId(1), (1.0, 0.0)), ReleaseOutcome::Dropped);
    assert_eq!(table.group_count(), 0);
    assert_eq!(table.world_pose(PieceId(1)).expect("pose").position, (1.0, 0.0));

    settle(&mut table, PieceId(0));
    assert_eq!(table.group_count(), 1);
    assert_on_grid(&table, PieceId(0));
}

#[test]
fn held_piece_is_not_absorbed_by_a_settling_neighbor() {
    let mut table = build_table(&row_specs(2, 1.0), TableConfig::default());
    table.place(PieceId(0), (0.0, 0.0), 270.0).expect("place");
    tap(&mut table, PieceId(0));
    table.begin_touch(PieceId(1), (1.0, 0.0)).expect("press");
    table.drag(PieceId(1), (1.0, 0.0)).expect("drag");

    settle(&mut table, PieceId(0));
    assert_eq!(table.group_count(), 0);
    assert!(table.body_motion(table.body_of(PieceId(1)).expect("body")).expect("motion").is_dragged());

    table.drag(PieceId(1), (1.02, 0.0)).expect("drag");
    assert_eq!(table.world_pose(PieceId(1)).expect("pose").position, (1.02, 0.0));
    assert_eq!(
        table.finish_touch(PieceId(1), (1.02, 0.0)).expect("release"),
        ReleaseOutcome::Dropped
    );
    assert_eq!(table.group_count(), 1);
    assert_at(&table, PieceId(1), (1.0, 0.0));
}

#[test]
fn snap_that_pulls_away_from_a_neighbor_skips_it() {
    let specs = [
        PieceSpec::new((1.0, 1.0), (0.0, 0.0)),
        PieceSpec::new((1.0, 1.0), (1.0, 0.0)),
        PieceSpec::new((1.0, 1.0), (1.0, 1.0)),
    ];
    let config = TableConfig {
        solve_tolerance: 0.5,
        ..TableConfig::default()
    };
    let mut table = build_table(&specs, config);
    table.place(PieceId(2), (1.3, 1.0), 0.0).expect("place");
    table.place(PieceId(1), (3.0, -2.0), 0.0).expect("place");

    // Touches piece 0 through the skin; the snap onto piece 2 then opens a gap.
    drop_at(&mut table, PieceId(1), (1.005, 0.0));
    assert_eq!(table.group_count(), 1);
    assert_eq!(table.group_of(PieceId(0)).expect("group"), None);
    assert_at(&table, PieceId(1), (1.3, 0.0));
    assert_at(&table, PieceId(0), (0.0, 0.0));
}

#[test]
fn play_area_keeps_dragged_piece_inside() {
    let config = TableConfig {
        play_area: Some(jigsnap_core::Rect::new((-2.0, -2.0), (2.0, 2.0))),
        ..TableConfig::default()
    };
    let mut table = build_table(&row_specs(1, 1.0), config);
    drop_at(&mut table, PieceId(0), (10.0, -7.0));
    assert_eq!(table.world_pose(PieceId(0)).expect("pose").position, (2.0, -2.0));
}

#[test]
fn rotation_scrambled_grid_solves_by_tapping() {
    let specs = layout::grid(2, 2, 1.0, 1.0, 0.0);
    let mut table = build_table(&specs, TableConfig::default());
    let rotations = [90.0, 180.0, 270.0, 0.0];
    for (index, rotation) in rotations.iter().enumerate() {
        let position = specs[index].solved_position;
        table.place(PieceId(index), position, *rotation).expect("place");
    }

    for (index, rotation) in rotations.iter().enumerate().rev() {
        let taps = ((360.0 - rotation) / 90.0) as usize % 4;
        for _ in 0..taps {
            tap(&mut table, PieceId(index));
            settle(&mut table, PieceId(index));
        }
        assert_eq!(
            table.world_pose(PieceId(index)).expect("pose").rotation.rem_euclid(360.0),
            0.0
        );
    }

    assert_eq!(table.group_count(), 1);
    assert_eq!(table.groups().next().expect("group").len(), 4);
    assert!(table.is_complete());
    for (index, spec) in specs.iter().enumerate() {
        let pose = table.world_pose(PieceId(index)).expect("pose");
        assert_abs_diff_eq!(pose.position.0, spec.solved_position.0, epsilon = 1e-4);
        assert_abs_diff_eq!(pose.position.1, spec.solved_position.1, epsilon = 1e-4);
    }
    let completed = table
        .take_events()
        .into_iter()
        .filter(|event| *event == TableEvent::Completed)
        .count();
    assert_eq!(completed, 1);
}
