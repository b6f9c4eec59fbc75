//! Core simulation loop.
//!
//! The simulation runs at a fixed tick rate and owns all match state:
//! the grid, the resource ledger, every entity store and the wave
//! director. Systems are `impl Simulation` blocks spread across the
//! crate; this module wires them into a fixed per-tick order.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`crate::math::Fixed`])
//! - One seeded RNG per tick, derived from the config seed and tick number
//! - Entity stores iterate in ascending id order
//! - Same state plus same commands always produce the same next state
//!
//! # Example
//!
//! ```
//! use td_core::data::GameConfig;
//! use td_core::grid::{Grid, GridPos, TileKind};
//! use td_core::simulation::Simulation;
//!
//! let mut grid = Grid::new(5, 1);
//! for x in 0..5 {
//!     grid.set(GridPos::new(x, 0), TileKind::Path);
//! }
//! grid.set(GridPos::new(0, 0), TileKind::Spawn);
//! grid.set(GridPos::new(4, 0), TileKind::Base);
//!
//! let mut sim = Simulation::new(grid, GameConfig::default()).unwrap();
//! sim.tick();
//! assert_eq!(sim.tick_count(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::io;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::combat::CombatEvent;
use crate::components::{
    Building, BuildingCondition, BuildingKind, ConstructionJob, DamageNumber, Drone, DroneOwner,
    Enemy, Facing, Health, Hero, Particle, Projectile, Turret, TurretVariant,
};
use crate::data::GameConfig;
use crate::drones::DroneEvent;
use crate::economy::{production_system, EconomyEvent, Resources};
use crate::error::{GameError, Result};
use crate::grid::{Grid, GridPos, TileChange, TileKind};
use crate::level::{validate_playable, SpawnRoute};
use crate::math::Vec2Fixed;
use crate::store::{EntityStore, IdAllocator};
use crate::visibility::{FogGrid, VisionSource};
use crate::waves::{WaveDirector, WaveEvent};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 60;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Why a match was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeatReason {
    /// The hero's health reached zero.
    HeroDestroyed,
    /// Enemies reaching the base used up every life.
    LivesExhausted,
}

/// Outcome of the match so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Still being played.
    #[default]
    Running,
    /// The hero held an extraction point long enough.
    Victory,
    /// Lost.
    Defeat(DefeatReason),
}

impl MatchStatus {
    /// True once the match has been won or lost.
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Events generated during a simulation tick.
///
/// Adapters use these to drive notices, logs and effects; the simulation
/// never reads them back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickEvents {
    /// Tick these events belong to.
    pub tick: u64,
    /// Wave transitions.
    pub waves: Vec<WaveEvent>,
    /// Shots, hits, deaths and base breaches.
    pub combat: Vec<CombatEvent>,
    /// Production, deliveries and bounties.
    pub economy: Vec<EconomyEvent>,
    /// Drone task changes.
    pub drones: Vec<DroneEvent>,
    /// Grid edits to forward to the grid owner.
    pub tile_changes: Vec<TileChange>,
    /// Set when the match ended this tick.
    pub status: Option<MatchStatus>,
}

/// [`io::Write`] adapter feeding bytes into a hasher.
struct HashWriter(DefaultHasher);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The tower-defense match simulation.
///
/// # System Execution Order
///
/// Each tick, systems run in this order:
/// 1. **Waves** - countdown and spawning
/// 2. **Hero** - movement and auto-fire
/// 3. **Enemies** - retarget, move, attack
/// 4. **Turrets** - acquire and fire
/// 5. **Projectiles** - travel and impact
/// 6. **Production** - building output
/// 7. **Drones** - construction, repair, harvesting
/// 8. **Extraction** - win condition
/// 9. **Effects** - particle and damage-number decay
/// 10. **Fog** - visibility recomputation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub(crate) config: GameConfig,
    pub(crate) grid: Grid,
    pub(crate) tick: u64,
    pub(crate) elapsed_ms: u64,
    pub(crate) status: MatchStatus,
    pub(crate) resources: Resources,
    pub(crate) lives: u32,
    pub(crate) ids: IdAllocator,
    pub(crate) base: GridPos,
    pub(crate) routes: Vec<SpawnRoute>,
    pub(crate) extraction_points: Vec<GridPos>,
    pub(crate) extraction_ms: u64,
    pub(crate) spawn_cursor: usize,
    pub(crate) waves: WaveDirector,
    pub(crate) hero: Option<Hero>,
    pub(crate) enemies: EntityStore<Enemy>,
    pub(crate) turrets: EntityStore<Turret>,
    pub(crate) buildings: EntityStore<Building>,
    pub(crate) drones: EntityStore<Drone>,
    pub(crate) jobs: EntityStore<ConstructionJob>,
    pub(crate) projectiles: EntityStore<Projectile>,
    pub(crate) particles: EntityStore<Particle>,
    pub(crate) damage_numbers: EntityStore<DamageNumber>,
    pub(crate) fog: FogGrid,
}

impl Simulation {
    /// Start a match on `grid`.
    ///
    /// Validates that the base exists and at least one spawn reaches it,
    /// then creates pre-placed structures (with their drones), the base
    /// drones and the hero.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NoBase`], [`GameError::NoSpawn`] or
    /// [`GameError::NoRoute`] when the grid is not playable.
    pub fn new(grid: Grid, config: GameConfig) -> Result<Self> {
        let layout = validate_playable(&grid)?;
        let base_pos = Vec2Fixed::from_grid(layout.base);

        let hero = config.hero.enabled.then(|| Hero {
            position: base_pos,
            health: Health::new(config.hero.max_health),
            speed: config.hero.speed,
            damage: config.hero.damage,
            range: config.hero.range,
            cooldown_ms: config.hero.cooldown_ms,
            last_fired_ms: None,
            is_moving: false,
            facing: Facing::Up,
            heading: None,
        });

        let mut sim = Self {
            fog: FogGrid::new(grid.width(), grid.height()),
            waves: WaveDirector::new(&config.waves),
            resources: config.starting_resources,
            lives: config.starting_lives,
            config,
            grid,
            tick: 0,
            elapsed_ms: 0,
            status: MatchStatus::Running,
            ids: IdAllocator::new(),
            base: layout.base,
            routes: layout.routes,
            extraction_points: layout.extraction_points,
            extraction_ms: 0,
            spawn_cursor: 0,
            hero,
            enemies: EntityStore::new(),
            turrets: EntityStore::new(),
            buildings: EntityStore::new(),
            drones: EntityStore::new(),
            jobs: EntityStore::new(),
            projectiles: EntityStore::new(),
            particles: EntityStore::new(),
            damage_numbers: EntityStore::new(),
        };

        let complement = sim.config.drones.base_complement;
        sim.spawn_drones(DroneOwner::Base, complement, base_pos);
        sim.place_prebuilt_structures();
        sim.fog = sim.compute_fog();

        tracing::info!(
            width = sim.grid.width(),
            height = sim.grid.height(),
            routes = sim.routes.len(),
            turrets = sim.turrets.len(),
            buildings = sim.buildings.len(),
            seed = sim.config.seed,
            "Match started"
        );
        Ok(sim)
    }

    /// Turn structure tiles drawn in the editor into entities.
    fn place_prebuilt_structures(&mut self) {
        let tiles: Vec<(GridPos, TileKind)> = self.grid.iter().collect();
        for (pos, kind) in tiles {
            if let Some(variant) = TurretVariant::from_tile(kind) {
                let invested = self.config.structures.turret(variant).build_cost;
                self.create_turret(variant, pos, TileKind::Empty, invested);
            } else if let Some((building, abandoned)) = BuildingKind::from_tile(kind) {
                let condition = if abandoned {
                    BuildingCondition::Abandoned
                } else {
                    BuildingCondition::Active
                };
                self.create_building(building, pos, condition);
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Ticks run so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated time in milliseconds.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Match outcome so far.
    #[must_use]
    pub const fn status(&self) -> MatchStatus {
        self.status
    }

    /// Resource ledger.
    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.resources
    }

    /// Lives left.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Current grid, including tiles written by construction.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Configuration the match runs with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The hero, if enabled.
    #[must_use]
    pub const fn hero(&self) -> Option<&Hero> {
        self.hero.as_ref()
    }

    /// Live enemies.
    #[must_use]
    pub const fn enemies(&self) -> &EntityStore<Enemy> {
        &self.enemies
    }

    /// Turrets, including wreckage.
    #[must_use]
    pub const fn turrets(&self) -> &EntityStore<Turret> {
        &self.turrets
    }

    /// Buildings in every condition.
    #[must_use]
    pub const fn buildings(&self) -> &EntityStore<Building> {
        &self.buildings
    }

    /// Drones.
    #[must_use]
    pub const fn drones(&self) -> &EntityStore<Drone> {
        &self.drones
    }

    /// Queued and in-progress construction jobs.
    #[must_use]
    pub const fn jobs(&self) -> &EntityStore<ConstructionJob> {
        &self.jobs
    }

    /// Shots in flight.
    #[must_use]
    pub const fn projectiles(&self) -> &EntityStore<Projectile> {
        &self.projectiles
    }

    /// Live particles.
    #[must_use]
    pub const fn particles(&self) -> &EntityStore<Particle> {
        &self.particles
    }

    /// Live damage popups.
    #[must_use]
    pub const fn damage_numbers(&self) -> &EntityStore<DamageNumber> {
        &self.damage_numbers
    }

    /// Visibility computed at the end of the last tick.
    #[must_use]
    pub const fn fog(&self) -> &FogGrid {
        &self.fog
    }

    /// Wave director state.
    #[must_use]
    pub const fn waves(&self) -> &WaveDirector {
        &self.waves
    }

    /// Base tile.
    #[must_use]
    pub const fn base(&self) -> GridPos {
        self.base
    }

    /// Connected spawns and their routes.
    #[must_use]
    pub fn routes(&self) -> &[SpawnRoute] {
        &self.routes
    }

    /// Extraction point tiles.
    #[must_use]
    pub fn extraction_points(&self) -> &[GridPos] {
        &self.extraction_points
    }

    /// Time the hero has held an extraction point.
    #[must_use]
    pub const fn extraction_ms(&self) -> u64 {
        self.extraction_ms
    }

    /// Extraction progress as a percentage, 0 to 100.
    #[must_use]
    pub fn extraction_progress(&self) -> u32 {
        let duration = self.config.extraction.duration_ms.max(1);
        (self.extraction_ms.min(duration) * 100 / duration) as u32
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// RNG for the current tick.
    pub(crate) fn tick_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.config.seed ^ self.tick.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Settle the match. Only the first outcome sticks.
    pub(crate) fn end_match(&mut self, status: MatchStatus) {
        if self.status.is_over() || !status.is_over() {
            return;
        }
        tracing::info!(tick = self.tick, ?status, "Match over");
        self.status = status;
    }

    /// Advance the simulation by one tick.
    ///
    /// Does nothing once the match is over. Returns the events generated
    /// during the tick.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };
        if self.status.is_over() {
            return events;
        }

        self.tick += 1;
        self.elapsed_ms += u64::from(TICK_DURATION_MS);
        events.tick = self.tick;
        let dt = TICK_DURATION_MS;
        let mut rng = self.tick_rng();

        // 1. Waves
        self.run_wave_system(dt, &mut rng, &mut events);

        // 2. Hero
        self.run_hero_system(dt, &mut rng, &mut events);

        // 3. Enemies
        self.run_enemy_system(dt, &mut rng, &mut events);

        // 4. Turrets
        self.run_turret_system(&mut rng, &mut events);

        // 5. Projectiles
        self.run_projectile_system(dt, &mut rng, &mut events);

        // 6. Production
        let produced = production_system(
            self.buildings.values_mut(),
            self.elapsed_ms,
            &mut self.resources,
        );
        events.economy.extend(produced);

        // 7. Drones
        self.run_drone_system(dt, &mut events);

        // 8. Extraction
        self.run_extraction_system(dt);

        // 9. Effects
        self.run_effect_decay(dt);

        self.clamp_invariants();

        // 10. Fog
        self.fog = self.compute_fog();

        if self.status.is_over() {
            events.status = Some(self.status);
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    /// Accrue extraction time while the hero holds a point. Progress pauses
    /// when the hero steps away.
    fn run_extraction_system(&mut self, dt_ms: u32) {
        if self.status.is_over() {
            return;
        }
        let Some(hero) = self.hero.as_ref().filter(|h| !h.health.is_dead()) else {
            return;
        };
        let radius = self.config.extraction.radius;
        let holding = self
            .extraction_points
            .iter()
            .any(|p| hero.position.within(Vec2Fixed::from_grid(*p), radius));
        if !holding {
            return;
        }

        self.extraction_ms += u64::from(dt_ms);
        if self.extraction_ms >= self.config.extraction.duration_ms {
            self.end_match(MatchStatus::Victory);
        }
    }

    /// Keep every health pool within bounds.
    fn clamp_invariants(&mut self) {
        for enemy in self.enemies.values_mut() {
            enemy.health.clamp();
        }
        for turret in self.turrets.values_mut() {
            turret.health.clamp();
        }
        for building in self.buildings.values_mut() {
            building.health.clamp();
        }
        if let Some(hero) = self.hero.as_mut() {
            hero.health.clamp();
        }
    }

    // ========================================================================
    // Fog
    // ========================================================================

    /// Vision sources active right now.
    fn vision_sources(&self) -> Vec<VisionSource> {
        let fog = &self.config.fog;
        let mut sources = Vec::new();

        if let Some(hero) = self.hero.as_ref().filter(|h| !h.health.is_dead()) {
            if let Some(at) = hero.position.to_grid() {
                sources.push(VisionSource::Disc {
                    center: at,
                    radius: fog.hero_radius,
                });
                if fog.hero_cone_length > 0 {
                    sources.push(VisionSource::Cone {
                        origin: at,
                        facing: hero.facing,
                        length: fog.hero_cone_length,
                    });
                }
            }
        }

        sources.push(VisionSource::Disc {
            center: self.base,
            radius: fog.base_radius,
        });
        sources.extend(self.extraction_points.iter().map(|&center| VisionSource::Disc {
            center,
            radius: fog.extraction_radius,
        }));

        let catalog = &self.config.structures;
        sources.extend(self.turrets.values().filter(|t| t.is_active()).map(|t| {
            VisionSource::Disc {
                center: t.pos,
                radius: catalog.turret(t.variant).reveal_radius,
            }
        }));
        sources.extend(self.buildings.values().filter(|b| b.is_active()).map(|b| {
            VisionSource::Disc {
                center: b.pos,
                radius: catalog.building(b.kind).reveal_radius,
            }
        }));

        if fog.path_radius > 0 {
            sources.extend(
                self.grid
                    .iter()
                    .filter(|(_, kind)| *kind == TileKind::Path)
                    .map(|(center, _)| VisionSource::Disc {
                        center,
                        radius: fog.path_radius,
                    }),
            );
        }

        sources
    }

    /// Visibility mask for the current state.
    #[must_use]
    pub fn compute_fog(&self) -> FogGrid {
        FogGrid::compute(self.grid.width(), self.grid.height(), &self.vision_sources())
    }

    // ========================================================================
    // Hashing and persistence
    // ========================================================================

    /// Hash of the full simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut writer = HashWriter(DefaultHasher::new());
        if let Err(e) = bincode::serialize_into(&mut writer, self) {
            tracing::warn!(error = %e, "Failed to encode state for hashing");
        }
        writer.0.finish()
    }

    /// Serialize the simulation state for replay or inspection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Deserialize simulation state from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize simulation: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TargetRef;

    fn corridor(len: u32) -> Grid {
        let mut grid = Grid::new(len, 3);
        for x in 0..len {
            grid.set(GridPos::new(x, 1), TileKind::Path);
        }
        grid.set(GridPos::new(0, 1), TileKind::Spawn);
        grid.set(GridPos::new(len - 1, 1), TileKind::Base);
        grid
    }

    #[test]
    fn test_new_requires_playable_grid() {
        let err = Simulation::new(Grid::new(4, 4), GameConfig::default()).unwrap_err();
        assert_eq!(err, GameError::NoBase);
    }

    #[test]
    fn test_tick_increments() {
        let mut sim = Simulation::new(corridor(6), GameConfig::default()).unwrap();
        assert_eq!(sim.tick_count(), 0);
        let events = sim.tick();
        assert_eq!(events.tick, 1);
        assert_eq!(sim.tick_count(), 1);
        assert_eq!(sim.elapsed_ms(), u64::from(TICK_DURATION_MS));
    }

    #[test]
    fn test_starting_state() {
        let sim = Simulation::new(corridor(6), GameConfig::default()).unwrap();
        assert_eq!(sim.resources(), Resources::new(100, 150));
        assert_eq!(sim.lives(), 20);
        assert_eq!(sim.drones().len(), 1);
        let hero = sim.hero().unwrap();
        assert_eq!(hero.position, Vec2Fixed::from_grid(GridPos::new(5, 1)));
        assert!(sim.fog().is_visible(GridPos::new(5, 1)));
    }

    #[test]
    fn test_prebuilt_structures_are_created() {
        let mut grid = corridor(8);
        grid.set(GridPos::new(3, 0), TileKind::Turret);
        grid.set(GridPos::new(4, 0), TileKind::AbandonedQuarry);
        grid.set(GridPos::new(5, 2), TileKind::DroneFactory);
        let sim = Simulation::new(grid, GameConfig::default()).unwrap();

        assert_eq!(sim.turrets().len(), 1);
        assert_eq!(sim.buildings().len(), 2);
        let quarry = sim
            .buildings()
            .values()
            .find(|b| b.kind == BuildingKind::Quarry)
            .unwrap();
        assert_eq!(quarry.condition, BuildingCondition::Abandoned);
        assert_eq!(quarry.production_rate, 0);
        // base worker + factory complement
        assert_eq!(sim.drones().len(), 4);
    }

    #[test]
    fn test_deterministic_hash() {
        let config = GameConfig::default().with_seed(11);
        let mut a = Simulation::new(corridor(10), config.clone()).unwrap();
        let mut b = Simulation::new(corridor(10), config).unwrap();
        for _ in 0..900 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.state_hash(), b.state_hash());
        assert!(a.waves().wave() > 1 || a.waves().spawned() > 0);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut sim = Simulation::new(corridor(10), GameConfig::default()).unwrap();
        for _ in 0..700 {
            sim.tick();
        }
        let bytes = sim.serialize().unwrap();
        let mut restored = Simulation::deserialize(&bytes).unwrap();
        assert_eq!(restored.state_hash(), sim.state_hash());
        sim.tick();
        restored.tick();
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn test_hero_death_is_defeat_and_freezes() {
        let mut sim = Simulation::new(corridor(6), GameConfig::default()).unwrap();
        let mut rng = sim.tick_rng();
        let mut events = TickEvents::default();
        sim.damage_target(TargetRef::Hero, 10_000, &mut rng, &mut events);
        assert_eq!(
            sim.status(),
            MatchStatus::Defeat(DefeatReason::HeroDestroyed)
        );

        let tick = sim.tick_count();
        let events = sim.tick();
        assert_eq!(sim.tick_count(), tick);
        assert!(events.combat.is_empty());
    }

    #[test]
    fn test_extraction_victory() {
        let mut grid = corridor(6);
        grid.set(GridPos::new(5, 2), TileKind::ExtractionPoint);
        let mut config = GameConfig::default();
        config.extraction.duration_ms = 160;
        let mut sim = Simulation::new(grid, config).unwrap();

        let mut outcome = None;
        for _ in 0..20 {
            if let Some(status) = sim.tick().status {
                outcome = Some(status);
                break;
            }
        }
        assert_eq!(outcome, Some(MatchStatus::Victory));
        assert_eq!(sim.extraction_progress(), 100);
    }

    #[test]
    fn test_extraction_pauses_when_hero_leaves() {
        let mut grid = corridor(12);
        grid.set(GridPos::new(11, 2), TileKind::ExtractionPoint);
        let mut sim = Simulation::new(grid, GameConfig::default()).unwrap();
        for _ in 0..10 {
            sim.tick();
        }
        let held = sim.extraction_ms();
        assert_eq!(held, 10 * u64::from(TICK_DURATION_MS));

        if let Some(hero) = sim.hero.as_mut() {
            hero.position = Vec2Fixed::from_grid(GridPos::new(2, 0));
        }
        for _ in 0..10 {
            sim.tick();
        }
        assert_eq!(sim.extraction_ms(), held);
    }

    #[test]
    fn test_fog_goes_dark_without_sources() {
        let mut config = GameConfig::default();
        config.fog.path_radius = 0;
        let mut sim = Simulation::new(corridor(20), config).unwrap();
        let far = GridPos::new(2, 1);
        assert!(sim.fog().is_visible(GridPos::new(19, 1)));
        assert!(!sim.fog().is_visible(far));

        if let Some(hero) = sim.hero.as_mut() {
            hero.position = Vec2Fixed::from_grid(far);
        }
        sim.tick();
        assert!(sim.fog().is_visible(far));

        if let Some(hero) = sim.hero.as_mut() {
            hero.position = Vec2Fixed::from_grid(GridPos::new(17, 1));
        }
        sim.tick();
        assert!(!sim.fog().is_visible(far));
    }
}
