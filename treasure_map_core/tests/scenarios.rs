use pretty_assertions::assert_eq;
use treasure_map_core::{
    Orientation, Position, TerrainError, parse, parse_result, simulate,
    terrain::{BlockReason, MoveOutcome},
};

const LARA: &str = "\
C - 3 - 4
M - 1 - 0
M - 2 - 1
T - 0 - 3 - 2
T - 1 - 3 - 3
A - Lara - 1 - 1 - S - AADADAGGA
";

#[test]
fn lara_collects_four_treasures() {
    assert_eq!(
        simulate(LARA).unwrap(),
        "C - 3 - 4\nM - 1 - 0\nM - 2 - 1\nT - 1 - 3 - 1\nA - Lara - 0 - 3 - S - 4\n"
    );
}

#[test]
fn lara_run_summary() {
    let mut terrain = parse(LARA).unwrap();
    let summary = terrain.run().unwrap();

    assert_eq!(summary.rounds, 9);
    assert_eq!(summary.moves, 5);
    assert_eq!(summary.turns, 4);
    assert_eq!(summary.blocked, 0);
    assert_eq!(summary.treasures_collected, 4);

    let lara = &terrain.adventurers()[0];
    assert_eq!(lara.position(), Position::new(0, 3));
    assert_eq!(lara.orientation(), Orientation::South);
    assert!(!terrain.has_adventurers_to_move());
}

#[test]
fn runs_are_deterministic() {
    let input = "\
C - 5 - 5
M - 2 - 2
T - 1 - 1 - 2
T - 3 - 3 - 1
A - Lara - 0 - 1 - E - AAADAAGA
A - Indy - 1 - 0 - S - AAAGAA
A - Nate - 4 - 4 - N - AAGAAA
";
    let first = simulate(input).unwrap();
    for _ in 0..5 {
        assert_eq!(simulate(input).unwrap(), first);
    }
}

#[test]
fn results_reload_identically() {
    let result = simulate(LARA).unwrap();
    let reloaded = parse_result(&result).unwrap();

    assert!(!reloaded.has_adventurers_to_move());
    assert_eq!(reloaded.adventurers()[0].treasures(), 4);
    assert_eq!(reloaded.to_result_string(), result);
}

#[test]
fn walking_off_the_west_edge_is_skipped() {
    let mut terrain = parse("C - 3 - 3\nA - Indy - 0 - 0 - O - A").unwrap();
    let report = terrain.play_round().unwrap();

    assert_eq!(
        report.turns[0].outcome,
        MoveOutcome::Blocked(BlockReason::OutOfBounds)
    );
    let indy = &terrain.adventurers()[0];
    assert_eq!(indy.position(), Position::new(0, 0));
    assert_eq!(indy.orientation(), Orientation::West);
    assert!(!indy.has_pending_actions());
    assert_eq!(terrain.to_result_string(), "C - 3 - 3\nA - Indy - 0 - 0 - O - 0\n");
}

#[test]
fn head_on_adventurers_cannot_swap() {
    let result = simulate("C - 2 - 1\nA - Lara - 0 - 0 - E - A\nA - Indy - 1 - 0 - O - A").unwrap();
    assert_eq!(
        result,
        "C - 2 - 1\nA - Lara - 0 - 0 - E - 0\nA - Indy - 1 - 0 - O - 0\n"
    );
}

#[test]
fn duplicate_dimensions() {
    assert_eq!(
        parse("C - 3 - 4\nC - 3 - 4"),
        Err(TerrainError::DuplicateDimensions)
    );
}

#[test]
fn duplicate_mountain() {
    assert_eq!(
        parse("C - 3 - 4\nM - 1 - 1\nM - 1 - 1"),
        Err(TerrainError::DuplicateMountain(Position::new(1, 1)))
    );
}

#[test]
fn treasure_on_mountain_in_both_orders() {
    let expected = Err(TerrainError::TreasureOnMountain(Position::new(1, 1)));
    assert_eq!(parse("C - 3 - 4\nM - 1 - 1\nT - 1 - 1 - 2"), expected);
    assert_eq!(parse("C - 3 - 4\nT - 1 - 1 - 2\nM - 1 - 1"), expected);
}

#[test]
fn adventurer_on_mountain() {
    let expected = Err(TerrainError::AdventurerOnMountain {
        name: "Lara".into(),
        position: Position::new(1, 1),
    });
    assert_eq!(parse("C - 3 - 4\nM - 1 - 1\nA - Lara - 1 - 1 - S - A"), expected);
    assert_eq!(parse("C - 3 - 4\nA - Lara - 1 - 1 - S - A\nM - 1 - 1"), expected);
}

#[test]
fn adventurer_out_of_bounds() {
    assert_eq!(
        parse("C - 3 - 4\nA - Lara - 3 - 1 - S - A"),
        Err(TerrainError::AdventurerOutOfBounds {
            name: "Lara".into(),
            x: 3,
            y: 1
        })
    );
    assert!(matches!(
        parse("C - 3 - 4\nA - Lara - 0 - 4 - S - A"),
        Err(TerrainError::AdventurerOutOfBounds { .. })
    ));
}

#[test]
fn unrecognized_line() {
    let err = parse("C - 3 - 4\nQ - 1 - 1").unwrap_err();
    assert_eq!(err, TerrainError::UnknownLine("Q - 1 - 1".into()));
    assert_eq!(err.to_string(), "Unable to parse terrain line: \"Q - 1 - 1\"");
}

#[test]
fn unknown_orientation_is_refused_not_read_as_west() {
    assert_eq!(
        parse("C - 3 - 4\nA - Lara - 1 - 1 - W - A"),
        Err(TerrainError::UnknownOrientation {
            name: "Lara".into(),
            code: "W".into()
        })
    );
}

#[test]
fn tiles_outside_the_grid_are_carried_to_the_result() {
    let result = simulate("C - 3 - 4\nM - 5 - 5\nT - 0 - 9 - 2\nA - Lara - 0 - 0 - S - A").unwrap();
    assert_eq!(
        result,
        "C - 3 - 4\nM - 5 - 5\nT - 0 - 9 - 2\nA - Lara - 0 - 1 - S - 0\n"
    );
    assert_eq!(parse_result(&result).unwrap().to_result_string(), result);
}

#[test]
fn large_sparse_terrain() {
    let result = simulate("C - 100000 - 100000\nA - Lara - 0 - 0 - S - A").unwrap();
    assert_eq!(result, "C - 100000 - 100000\nA - Lara - 0 - 1 - S - 0\n");
}
