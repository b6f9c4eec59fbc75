//! Read-only view of a simulation, built after each tick.
//!
//! A [`Snapshot`] owns copies of everything a renderer needs. It is built
//! in one pass after the ordered systems have run, so readers never see a
//! half-updated tick.

use serde::{Deserialize, Serialize};

use crate::components::{
    Building, ConstructionJob, DamageNumber, Drone, Enemy, Hero, Particle, Projectile, Turret,
};
use crate::economy::Resources;
use crate::grid::{Grid, GridPos};
use crate::session::GamePhase;
use crate::simulation::{MatchStatus, Simulation};
use crate::visibility::FogGrid;
use crate::waves::WavePhase;

/// Wave director summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveInfo {
    /// Current wave, starting at 1.
    pub number: u32,
    /// Director phase.
    pub phase: WavePhase,
    /// Countdown left while preparing.
    pub countdown_ms: Option<u32>,
    /// Enemies spawned this wave.
    pub spawned: u32,
    /// Quota for this wave.
    pub total: u32,
}

/// Win-condition summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionInfo {
    /// Extraction point tiles.
    pub points: Vec<GridPos>,
    /// Time held so far.
    pub held_ms: u64,
    /// Progress percentage, 0 to 100.
    pub progress_pct: u32,
}

/// Everything observable about a match at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick the snapshot was taken after.
    pub tick: u64,
    /// Simulated time.
    pub elapsed_ms: u64,
    /// Session phase.
    pub phase: GamePhase,
    /// Match outcome so far.
    pub status: MatchStatus,
    /// Resource ledger.
    pub resources: Resources,
    /// Lives left.
    pub lives: u32,
    /// Wave state.
    pub wave: WaveInfo,
    /// Extraction state.
    pub extraction: ExtractionInfo,
    /// Grid including construction results.
    pub grid: Grid,
    /// Visibility mask.
    pub fog: FogGrid,
    /// The hero, if enabled.
    pub hero: Option<Hero>,
    /// Enemies.
    pub enemies: Vec<Enemy>,
    /// Turrets.
    pub turrets: Vec<Turret>,
    /// Buildings.
    pub buildings: Vec<Building>,
    /// Drones.
    pub drones: Vec<Drone>,
    /// Construction jobs.
    pub jobs: Vec<ConstructionJob>,
    /// Projectiles.
    pub projectiles: Vec<Projectile>,
    /// Particles.
    pub particles: Vec<Particle>,
    /// Damage popups.
    pub damage_numbers: Vec<DamageNumber>,
}

impl Snapshot {
    /// Turret at a tile, for range rings and health bars.
    #[must_use]
    pub fn turret_at(&self, pos: GridPos) -> Option<&Turret> {
        self.turrets.iter().find(|t| t.pos == pos)
    }
}

impl Simulation {
    /// Copy out the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let phase = match self.status {
            MatchStatus::Running => GamePhase::Playing,
            MatchStatus::Victory => GamePhase::Victory,
            MatchStatus::Defeat(_) => GamePhase::GameOver,
        };
        Snapshot {
            tick: self.tick,
            elapsed_ms: self.elapsed_ms,
            phase,
            status: self.status,
            resources: self.resources,
            lives: self.lives,
            wave: WaveInfo {
                number: self.waves.wave(),
                phase: self.waves.phase(),
                countdown_ms: self.waves.countdown_ms(),
                spawned: self.waves.spawned(),
                total: self.waves.plan().count,
            },
            extraction: ExtractionInfo {
                points: self.extraction_points.clone(),
                held_ms: self.extraction_ms,
                progress_pct: self.extraction_progress(),
            },
            grid: self.grid.clone(),
            fog: self.fog.clone(),
            hero: self.hero.clone(),
            enemies: self.enemies.to_vec(),
            turrets: self.turrets.to_vec(),
            buildings: self.buildings.to_vec(),
            drones: self.drones.to_vec(),
            jobs: self.jobs.to_vec(),
            projectiles: self.projectiles.to_vec(),
            particles: self.particles.to_vec(),
            damage_numbers: self.damage_numbers.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TurretVariant;
    use crate::data::GameConfig;
    use crate::grid::TileKind;

    fn field() -> Grid {
        let mut grid = Grid::new(6, 3);
        for x in 0..6 {
            grid.set(GridPos::new(x, 0), TileKind::Path);
        }
        grid.set(GridPos::new(0, 0), TileKind::Spawn);
        grid.set(GridPos::new(5, 0), TileKind::Base);
        grid.set(GridPos::new(4, 2), TileKind::Sniper);
        grid
    }

    #[test]
    fn test_snapshot_mirrors_state() {
        let mut sim = Simulation::new(field(), GameConfig::default()).unwrap();
        sim.tick();
        let snapshot = sim.snapshot();

        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.phase, GamePhase::Playing);
        assert_eq!(snapshot.resources, sim.resources());
        assert_eq!(snapshot.lives, 20);
        assert_eq!(snapshot.wave.number, 1);
        assert!(snapshot.wave.countdown_ms.is_some());
        assert_eq!(snapshot.drones.len(), sim.drones().len());
        assert_eq!(&snapshot.fog, sim.fog());
        let sniper = snapshot.turret_at(GridPos::new(4, 2)).unwrap();
        assert_eq!(sniper.variant, TurretVariant::Sniper);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut sim = Simulation::new(field(), GameConfig::default()).unwrap();
        let before = sim.snapshot();
        for _ in 0..5 {
            sim.tick();
        }
        assert_eq!(before.tick, 0);
        assert_ne!(sim.snapshot().tick, before.tick);
    }
}
