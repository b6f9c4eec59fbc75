//! Proptest strategies for player input.
//!
//! Coordinates are drawn one tile past the grid edge so out-of-bounds
//! rejections get exercised too.

use proptest::prelude::*;
use td_core::commands::PlayerCommand;
use td_core::components::{BuildingKind, Facing, TurretVariant};
use td_core::grid::GridPos;

/// Tile position in `0..=width` x `0..=height`.
pub fn arb_grid_pos(width: u32, height: u32) -> impl Strategy<Value = GridPos> {
    (0..=width, 0..=height).prop_map(|(x, y)| GridPos::new(x, y))
}

/// Either turret variant.
pub fn arb_turret_variant() -> impl Strategy<Value = TurretVariant> {
    prop_oneof![Just(TurretVariant::Standard), Just(TurretVariant::Sniper)]
}

/// Any building kind.
pub fn arb_building_kind() -> impl Strategy<Value = BuildingKind> {
    prop_oneof![
        Just(BuildingKind::Quarry),
        Just(BuildingKind::Forge),
        Just(BuildingKind::DroneFactory),
        Just(BuildingKind::MaintenanceHub),
    ]
}

/// A hero heading, including "stop".
pub fn arb_heading() -> impl Strategy<Value = Option<Facing>> {
    prop_oneof![
        Just(None),
        Just(Some(Facing::Up)),
        Just(Some(Facing::Down)),
        Just(Some(Facing::Left)),
        Just(Some(Facing::Right)),
    ]
}

/// Any player command aimed somewhere on (or just off) the grid.
pub fn arb_player_command(width: u32, height: u32) -> impl Strategy<Value = PlayerCommand> {
    let pos = move || arb_grid_pos(width, height);
    prop_oneof![
        3 => (pos(), arb_turret_variant()).prop_map(|(p, variant)| PlayerCommand::BuildTurret {
            x: p.x,
            y: p.y,
            variant,
        }),
        2 => (pos(), arb_building_kind()).prop_map(|(p, kind)| PlayerCommand::BuildBuilding {
            x: p.x,
            y: p.y,
            kind,
        }),
        1 => pos().prop_map(|p| PlayerCommand::UpgradeTurret { x: p.x, y: p.y }),
        1 => pos().prop_map(|p| PlayerCommand::RepairTurret { x: p.x, y: p.y }),
        1 => pos().prop_map(|p| PlayerCommand::SellTurret { x: p.x, y: p.y }),
        1 => pos().prop_map(|p| PlayerCommand::RepairBuilding { x: p.x, y: p.y }),
        1 => pos().prop_map(|p| PlayerCommand::ClearRubble { x: p.x, y: p.y }),
        1 => arb_heading().prop_map(|heading| PlayerCommand::SetHeroHeading { heading }),
        1 => Just(PlayerCommand::SkipCountdown),
    ]
}

/// A sequence of up to `max_len` commands.
pub fn arb_command_sequence(
    width: u32,
    height: u32,
    max_len: usize,
) -> impl Strategy<Value = Vec<PlayerCommand>> {
    prop::collection::vec(arb_player_command(width, height), 0..=max_len)
}

/// Commands paired with the tick they are issued on.
pub fn arb_timed_script(
    width: u32,
    height: u32,
    max_tick: u64,
    max_len: usize,
) -> impl Strategy<Value = Vec<(u64, PlayerCommand)>> {
    prop::collection::vec((0..max_tick, arb_player_command(width, height)), 0..=max_len)
}
