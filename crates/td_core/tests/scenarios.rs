//! Worked scenarios with exact expected numbers.

use td_core::commands::CommandOutcome;
use td_core::components::{BuildingKind, EnemyKind, TurretVariant};
use td_core::data::{GameConfig, WavePlan};
use td_core::economy::{Cost, Resources};
use td_core::error::GameError;
use td_core::grid::{GridPos, TileKind};
use td_core::pathfinding::{find_path, is_valid_path, Traversal};
use td_core::simulation::Simulation;
use td_test_utils::fixtures::{corridor_grid, lane_level, run_ticks, LANE_STONE, LANE_TURRET_SITE};

#[test]
fn test_corridor_route_has_eighteen_steps() {
    let grid = corridor_grid(10);
    let start = GridPos::new(0, 0);
    let end = GridPos::new(9, 9);
    let route = find_path(&grid, start, end, Traversal::Route).unwrap();

    assert_eq!(route.len(), 19);
    assert_eq!(route.first(), Some(&start));
    assert_eq!(route.last(), Some(&end));
    assert!(route.windows(2).all(|w| w[0].manhattan(w[1]) == 1));
    assert!(is_valid_path(&grid, &route, start, end, Traversal::Route));
}

#[test]
fn test_quarry_without_enough_stone_is_rejected() {
    let config = GameConfig::default().with_resources(40, 0);
    let mut sim = Simulation::new(lane_level(), config).unwrap();
    let result = sim.build_building(LANE_STONE, BuildingKind::Quarry);

    assert!(matches!(result, Err(GameError::InsufficientResources { .. })));
    assert_eq!(sim.resources(), Resources::new(40, 0));
    assert!(sim.jobs().is_empty());
    assert_eq!(sim.grid().get(LANE_STONE), Some(TileKind::ResourceStone));
}

#[test]
fn test_sell_after_one_upgrade_refunds_half_of_investment() {
    let mut config = GameConfig::default();
    config.waves.preparation_ms = 120_000;
    let mut sim = Simulation::new(lane_level(), config).unwrap();

    sim.build_turret(LANE_TURRET_SITE, TurretVariant::Standard).unwrap();
    for _ in 0..1800 {
        if sim.turret_at(LANE_TURRET_SITE).is_some() {
            break;
        }
        sim.tick();
    }
    assert!(sim.turret_at(LANE_TURRET_SITE).is_some(), "worker never finished the turret");
    assert_eq!(sim.grid().get(LANE_TURRET_SITE), Some(TileKind::Turret));

    sim.upgrade_turret(LANE_TURRET_SITE).unwrap();
    assert_eq!(sim.resources().metal, 150 - 50 - 75);

    let outcome = sim.sell_turret(LANE_TURRET_SITE).unwrap();
    let CommandOutcome::Sold { refund, change } = outcome else {
        panic!("expected a sale, got {outcome:?}");
    };
    assert_eq!(refund, Cost::metal(62));
    assert_eq!(change.kind, TileKind::Empty);
    assert_eq!(sim.resources().metal, 25 + 62);
    assert!(sim.turret_at(LANE_TURRET_SITE).is_none());
    assert_eq!(sim.grid().get(LANE_TURRET_SITE), Some(TileKind::Empty));
}

#[test]
fn test_first_wave_spawns_five_standard_enemies() {
    let mut config = GameConfig::default().without_hero();
    config.waves.scripted = vec![WavePlan {
        count: 5,
        interval_ms: 1500,
        types: vec![EnemyKind::Standard],
        health_pct: 100,
    }];
    // Long enough that nobody reaches the base during the test.
    let mut sim = Simulation::new(corridor_grid(20), config).unwrap();

    sim.skip_countdown().unwrap();
    sim.tick();
    assert!(sim.enemies().is_empty());

    // 468 more ticks is 7488 ms of spawning: one interval short.
    run_ticks(&mut sim, 468);
    assert_eq!(sim.enemies().len(), 4);

    sim.tick();
    assert_eq!(sim.enemies().len(), 5);
    assert!(sim.enemies().values().all(|e| e.kind == EnemyKind::Standard));
    assert_eq!(sim.waves().remaining_to_spawn(), 0);
    assert_eq!(sim.lives(), 20);
}
