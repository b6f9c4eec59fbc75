//! Replay and save/load determinism across whole matches.

use td_core::commands::PlayerCommand;
use td_core::components::{BuildingKind, Facing, TurretVariant};
use td_core::data::GameConfig;
use td_core::simulation::Simulation;
use td_test_utils::determinism::{
    find_first_divergence, replay_script, run_parallel_simulations, verify_determinism,
    verify_serialization_determinism,
};
use td_test_utils::fixtures::{
    corridor_grid, lane_simulation, run_ticks, LANE_METAL, LANE_STONE, LANE_TURRET_SITE,
};

fn busy_script() -> Vec<(u64, PlayerCommand)> {
    vec![
        (
            0,
            PlayerCommand::BuildTurret {
                x: LANE_TURRET_SITE.x,
                y: LANE_TURRET_SITE.y,
                variant: TurretVariant::Standard,
            },
        ),
        (
            1,
            PlayerCommand::BuildBuilding {
                x: LANE_STONE.x,
                y: LANE_STONE.y,
                kind: BuildingKind::Quarry,
            },
        ),
        (
            2,
            PlayerCommand::BuildBuilding {
                x: LANE_METAL.x,
                y: LANE_METAL.y,
                kind: BuildingKind::Forge,
            },
        ),
        (
            5,
            PlayerCommand::SetHeroHeading {
                heading: Some(Facing::Left),
            },
        ),
        (40, PlayerCommand::SetHeroHeading { heading: None }),
        (120, PlayerCommand::SkipCountdown),
    ]
}

/// Lane match with the busy script applied, after `ticks` ticks.
fn scripted_match(ticks: u64) -> Simulation {
    let script = busy_script();
    let mut sim = lane_simulation(1234);
    for tick in 0..ticks {
        for (_, command) in script.iter().filter(|(at, _)| *at == tick) {
            let _ = sim.apply_command(command);
        }
        sim.tick();
    }
    sim
}

#[test]
fn test_scripted_match_replays_identically() {
    let result = verify_determinism(
        3,
        1500,
        || lane_simulation(77),
        |sim| {
            sim.tick();
        },
        |sim| sim.state_hash(),
    );
    result.assert_deterministic();

    let script = busy_script();
    let a = replay_script(lane_simulation(77), &script, 1500);
    let b = replay_script(lane_simulation(77), &script, 1500);
    assert_eq!(a, b);
}

#[test]
fn test_no_divergence_mid_combat() {
    assert_eq!(find_first_divergence(|| scripted_match(700), 600), None);
}

#[test]
fn test_save_load_mid_match() {
    assert!(verify_serialization_determinism(|| scripted_match(400), 500));
}

#[test]
fn test_parallel_matches_agree() {
    let result = run_parallel_simulations(|| scripted_match(200), 4, 400);
    result.assert_deterministic();
}

#[test]
fn test_snapshots_match_between_runs() {
    let mut config = GameConfig::default().with_seed(99);
    config.waves.preparation_ms = 500;
    let run = || {
        let mut sim = Simulation::new(corridor_grid(12), config.clone()).unwrap();
        run_ticks(&mut sim, 900);
        sim.snapshot()
    };
    assert_eq!(run(), run());
}
