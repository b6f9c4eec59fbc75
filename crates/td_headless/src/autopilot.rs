//! Scripted player policies for batch runs.
//!
//! A policy looks at the simulation every [`DECISION_INTERVAL_TICKS`] and
//! issues at most one build command plus a hero heading. Decisions only
//! read simulation state, so a batch run stays reproducible per seed.

use serde::{Deserialize, Serialize};

use td_core::commands::CommandOutcome;
use td_core::components::{BuildingKind, Facing, TurretVariant};
use td_core::grid::{GridPos, TileKind};
use td_core::simulation::Simulation;

/// Ticks between decisions (one per second of game time).
pub const DECISION_INTERVAL_TICKS: u64 = 60;

/// How the autopilot plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Autopilot {
    /// Issue no commands.
    Passive,
    /// Line the route with turrets, nearest the base first.
    #[default]
    Defend,
    /// Claim deposits, defend, then walk the hero to an extraction point
    /// once the third wave is reached.
    Extract,
}

impl Autopilot {
    /// Run one decision if this tick is a decision tick.
    ///
    /// Rejected commands are ignored; the policy simply tries again later.
    pub fn step(self, sim: &mut Simulation) -> Option<CommandOutcome> {
        if self == Self::Passive
            || sim.status().is_over()
            || sim.tick_count() % DECISION_INTERVAL_TICKS != 0
        {
            return None;
        }

        if self == Self::Extract {
            let heading = if sim.waves().wave() >= 3 {
                extraction_heading(sim)
            } else {
                None
            };
            let _ = sim.set_hero_heading(heading);
            if let Some(outcome) = claim_deposit(sim) {
                return Some(outcome);
            }
        }

        let site = turret_sites(sim).into_iter().next()?;
        sim.build_turret(site, TurretVariant::Standard)
            .ok()
            .map(|job| CommandOutcome::Queued { job })
    }
}

/// Visible empty tiles beside a route, nearest the base first.
pub fn turret_sites(sim: &Simulation) -> Vec<GridPos> {
    let grid = sim.grid();
    let base = sim.base();
    let mut sites: Vec<GridPos> = grid
        .iter()
        .filter(|&(pos, kind)| {
            kind == TileKind::Empty
                && sim.fog().is_visible(pos)
                && sim.job_at(pos).is_none()
                && [(0, -1), (0, 1), (-1, 0), (1, 0)].iter().any(|&(dx, dy)| {
                    pos.offset(dx, dy)
                        .and_then(|n| grid.get(n))
                        .is_some_and(TileKind::is_route)
                })
        })
        .map(|(pos, _)| pos)
        .collect();
    sites.sort_by_key(|pos| (pos.manhattan(base), pos.y, pos.x));
    sites
}

fn claim_deposit(sim: &mut Simulation) -> Option<CommandOutcome> {
    for (deposit, kind) in [
        (TileKind::ResourceStone, BuildingKind::Quarry),
        (TileKind::ResourceMetal, BuildingKind::Forge),
    ] {
        let site = sim
            .grid()
            .positions_of(deposit)
            .into_iter()
            .find(|&pos| sim.fog().is_visible(pos) && sim.job_at(pos).is_none());
        if let Some(site) = site {
            if let Ok(job) = sim.build_building(site, kind) {
                return Some(CommandOutcome::Queued { job });
            }
        }
    }
    None
}

/// Heading that brings the hero next to the nearest extraction point.
fn extraction_heading(sim: &Simulation) -> Option<Facing> {
    let hero = sim.hero()?.position.to_grid()?;
    let target = sim
        .extraction_points()
        .iter()
        .copied()
        .min_by_key(|p| (p.manhattan(hero), p.y, p.x))?;
    if target.manhattan(hero) <= 1 {
        return None;
    }

    let dx = i64::from(target.x) - i64::from(hero.x);
    let dy = i64::from(target.y) - i64::from(hero.y);
    let heading = if dx.abs() >= dy.abs() {
        if dx > 0 {
            Facing::Right
        } else {
            Facing::Left
        }
    } else if dy > 0 {
        Facing::Down
    } else {
        Facing::Up
    };
    Some(heading)
}
