//! Entity definitions.
//!
//! Entities are plain data; behavior lives in the systems that update
//! them each tick. Every entity carries a unique [`EntityId`] allocated
//! from the simulation-wide counter.

use serde::{Deserialize, Serialize};

use crate::economy::{Cost, Resource};
use crate::grid::{GridPos, TileKind};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for entities.
pub type EntityId = u64;

// ============================================================================
// Shared
// ============================================================================

/// Health pool.
///
/// `current <= max` always holds; damage and healing saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if entity is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Check if entity is at full health.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Health still missing.
    #[must_use]
    pub const fn missing(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction to prevent underflow.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current = self.current.saturating_sub(actual);
        actual
    }

    /// Heal the entity, returning actual amount healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.missing());
        self.current = self.current.saturating_add(actual);
        actual
    }

    /// Re-establish `current <= max`.
    pub fn clamp(&mut self) {
        self.current = self.current.min(self.max);
    }

    /// Get health as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.max == 0 {
            0
        } else {
            ((u64::from(self.current) * 100) / u64::from(self.max)) as u32
        }
    }
}

/// Reference to anything that can be targeted or repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRef {
    /// An enemy.
    Enemy(EntityId),
    /// A turret.
    Turret(EntityId),
    /// A building.
    Building(EntityId),
    /// The hero singleton.
    Hero,
    /// The player base.
    Base,
}

impl TargetRef {
    /// True for turrets and buildings.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(self, Self::Turret(_) | Self::Building(_))
    }
}

/// Target categories enemies rank when choosing what to attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCategory {
    /// The hero, if within aggro radius.
    Hero,
    /// The nearest active turret or building within aggro radius.
    Structure,
    /// The base, reached along the pre-computed route.
    Base,
}

/// Cardinal facing / movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Toward row 0.
    Up,
    /// Toward the last row.
    #[default]
    Down,
    /// Toward column 0.
    Left,
    /// Toward the last column.
    Right,
}

impl Facing {
    /// Unit step in grid space.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Unit vector in world space.
    #[must_use]
    pub fn unit(self) -> Vec2Fixed {
        let (dx, dy) = self.delta();
        Vec2Fixed::new(Fixed::from_num(dx), Fixed::from_num(dy))
    }
}

// ============================================================================
// Enemies
// ============================================================================

/// Enemy archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline walker.
    Standard,
    /// Fast, fragile, never leaves the route.
    Scout,
    /// Slow, armored, fires at structures from range.
    Tank,
}

impl EnemyKind {
    /// Every enemy kind.
    pub const ALL: [Self; 3] = [Self::Standard, Self::Scout, Self::Tank];
}

/// How an enemy is currently moving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyMovement {
    /// Following a pre-computed spawn-to-base route.
    Route {
        /// Index into the simulation's route table.
        route: usize,
        /// Index of the next waypoint.
        index: usize,
    },
    /// Chasing a dynamic target along a recomputed path.
    Hunt {
        /// What is being chased.
        target: TargetRef,
        /// Current path toward the target (goal tile last).
        path: Vec<GridPos>,
        /// Index of the next waypoint.
        index: usize,
        /// Tick at which the path is recomputed.
        repath_tick: u64,
    },
}

/// A hostile unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enemy {
    /// Identity.
    pub id: EntityId,
    /// Archetype.
    pub kind: EnemyKind,
    /// World position.
    pub position: Vec2Fixed,
    /// Health pool (already scaled by the wave multiplier).
    pub health: Health,
    /// Movement speed in tiles per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Metal paid on death.
    pub reward: u32,
    /// Lives taken when it reaches the base.
    pub life_cost: u32,
    /// Damage per attack.
    pub damage: u32,
    /// Attack reach in tiles.
    #[serde(with = "fixed_serde")]
    pub attack_range: Fixed,
    /// Minimum time between attacks.
    pub attack_cooldown_ms: u32,
    /// Ranged attackers fire projectiles; others strike directly.
    pub ranged: bool,
    /// Radius within which it diverts to hunt structures or the hero.
    #[serde(with = "fixed_serde")]
    pub aggro_radius: Fixed,
    /// Simulation time of the last attack.
    pub last_attack_ms: Option<u64>,
    /// Current movement state.
    pub movement: EnemyMovement,
}

impl Enemy {
    /// Current target while hunting.
    #[must_use]
    pub fn hunt_target(&self) -> Option<TargetRef> {
        match self.movement {
            EnemyMovement::Hunt { target, .. } => Some(target),
            EnemyMovement::Route { .. } => None,
        }
    }

    /// True when off cooldown at `now_ms`.
    #[must_use]
    pub fn can_attack(&self, now_ms: u64) -> bool {
        self.last_attack_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= u64::from(self.attack_cooldown_ms))
    }
}

// ============================================================================
// Turrets
// ============================================================================

/// Turret variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurretVariant {
    /// Fast, short range.
    Standard,
    /// Slow, long range, high crit.
    Sniper,
}

impl TurretVariant {
    /// Tile kind this turret occupies.
    #[must_use]
    pub const fn tile_kind(self) -> TileKind {
        match self {
            Self::Standard => TileKind::Turret,
            Self::Sniper => TileKind::Sniper,
        }
    }

    /// Variant occupying a tile kind.
    #[must_use]
    pub const fn from_tile(kind: TileKind) -> Option<Self> {
        match kind {
            TileKind::Turret => Some(Self::Standard),
            TileKind::Sniper => Some(Self::Sniper),
            _ => None,
        }
    }
}

/// A player turret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turret {
    /// Identity.
    pub id: EntityId,
    /// Variant.
    pub variant: TurretVariant,
    /// Tile position.
    pub pos: GridPos,
    /// Firing range in tiles.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Damage per shot.
    pub damage: u32,
    /// Minimum time between shots.
    pub cooldown_ms: u32,
    /// Simulation time of the last shot.
    pub last_fired_ms: Option<u64>,
    /// Current target.
    pub target: Option<EntityId>,
    /// Upgrade level, starting at 1.
    pub level: u32,
    /// Health pool.
    pub health: Health,
    /// Reduced to zero health and waiting for repair.
    pub is_wreckage: bool,
    /// Tile restored when the turret is sold.
    pub replaced_tile: TileKind,
    /// Build cost plus every upgrade paid.
    pub invested: Cost,
}

impl Turret {
    /// World position of the turret.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::from_grid(self.pos)
    }

    /// Able to acquire targets and fire.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_wreckage
    }

    /// True when off cooldown at `now_ms`.
    #[must_use]
    pub fn ready_to_fire(&self, now_ms: u64) -> bool {
        self.last_fired_ms
            .map_or(true, |last| now_ms.saturating_sub(last) >= u64::from(self.cooldown_ms))
    }
}

// ============================================================================
// Buildings
// ============================================================================

/// Building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Produces stone.
    Quarry,
    /// Produces metal.
    Forge,
    /// Houses worker and harvester drones.
    DroneFactory,
    /// Houses repair drones.
    MaintenanceHub,
}

impl BuildingKind {
    /// Every building kind.
    pub const ALL: [Self; 4] = [
        Self::Quarry,
        Self::Forge,
        Self::DroneFactory,
        Self::MaintenanceHub,
    ];

    /// Tile kind of the active building.
    #[must_use]
    pub const fn tile_kind(self) -> TileKind {
        match self {
            Self::Quarry => TileKind::Quarry,
            Self::Forge => TileKind::Forge,
            Self::DroneFactory => TileKind::DroneFactory,
            Self::MaintenanceHub => TileKind::MaintenanceHub,
        }
    }

    /// Tile kind of the abandoned variant, if one exists.
    #[must_use]
    pub const fn abandoned_tile(self) -> Option<TileKind> {
        match self {
            Self::Quarry => Some(TileKind::AbandonedQuarry),
            Self::Forge => Some(TileKind::AbandonedForge),
            Self::DroneFactory => Some(TileKind::AbandonedDroneFactory),
            Self::MaintenanceHub => None,
        }
    }

    /// Building on a tile and whether it is abandoned.
    #[must_use]
    pub const fn from_tile(kind: TileKind) -> Option<(Self, bool)> {
        match kind {
            TileKind::Quarry => Some((Self::Quarry, false)),
            TileKind::Forge => Some((Self::Forge, false)),
            TileKind::DroneFactory => Some((Self::DroneFactory, false)),
            TileKind::MaintenanceHub => Some((Self::MaintenanceHub, false)),
            TileKind::AbandonedQuarry => Some((Self::Quarry, true)),
            TileKind::AbandonedForge => Some((Self::Forge, true)),
            TileKind::AbandonedDroneFactory => Some((Self::DroneFactory, true)),
            _ => None,
        }
    }

    /// Material this building produces.
    #[must_use]
    pub const fn resource(self) -> Option<Resource> {
        match self {
            Self::Quarry => Some(Resource::Stone),
            Self::Forge => Some(Resource::Metal),
            Self::DroneFactory | Self::MaintenanceHub => None,
        }
    }

    /// Tile the building must be placed on.
    #[must_use]
    pub const fn required_site(self) -> TileKind {
        match self {
            Self::Quarry => TileKind::ResourceStone,
            Self::Forge => TileKind::ResourceMetal,
            Self::DroneFactory | Self::MaintenanceHub => TileKind::Empty,
        }
    }
}

/// Operating condition of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCondition {
    /// Producing and housing drones.
    #[default]
    Active,
    /// Pre-placed ruin, restored by the repair-building command.
    Abandoned,
    /// Destroyed in play; repaired in place.
    Wrecked,
}

/// A player building.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Identity.
    pub id: EntityId,
    /// Type.
    pub kind: BuildingKind,
    /// Tile position.
    pub pos: GridPos,
    /// Health pool.
    pub health: Health,
    /// Resources per second while active.
    pub production_rate: u32,
    /// Simulation time production was last paid (or restarted).
    pub last_production_ms: u64,
    /// Active, abandoned or wrecked.
    pub condition: BuildingCondition,
}

impl Building {
    /// Create an active building at full health.
    #[must_use]
    pub const fn new(
        id: EntityId,
        kind: BuildingKind,
        pos: GridPos,
        max_health: u32,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            kind,
            pos,
            health: Health::new(max_health),
            production_rate: 0,
            last_production_ms: now_ms,
            condition: BuildingCondition::Active,
        }
    }

    /// World position of the building.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::from_grid(self.pos)
    }

    /// Producing and providing passive behavior.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.condition == BuildingCondition::Active
    }

    /// Material and rate paid per interval, when active.
    #[must_use]
    pub fn production(&self) -> Option<(Resource, u32)> {
        if !self.is_active() || self.production_rate == 0 {
            return None;
        }
        self.kind.resource().map(|r| (r, self.production_rate))
    }

    /// Tile kind reflecting the current condition.
    #[must_use]
    pub fn tile_kind(&self) -> TileKind {
        match self.condition {
            BuildingCondition::Abandoned => {
                self.kind.abandoned_tile().unwrap_or(self.kind.tile_kind())
            }
            BuildingCondition::Active | BuildingCondition::Wrecked => self.kind.tile_kind(),
        }
    }
}

// ============================================================================
// Drones
// ============================================================================

/// What a drone does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneRole {
    /// Builds construction jobs.
    Worker,
    /// Heals damaged or wrecked structures.
    Repair,
    /// Ferries raw resources to the base.
    Harvester,
}

/// Drone behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneState {
    /// Waiting for work.
    #[default]
    Idle,
    /// Travelling to its task.
    MovingToJob,
    /// Building, repairing or gathering on site.
    Working,
    /// Heading home to its rally point.
    Returning,
}

/// Who a drone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneOwner {
    /// The base's built-in complement.
    Base,
    /// A drone factory or maintenance hub.
    Building(EntityId),
}

/// The drone's current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneTask {
    /// Construction job being built.
    Build(EntityId),
    /// Structure being repaired.
    Repair(TargetRef),
    /// Deposit tile being harvested.
    Harvest(GridPos),
}

/// Resources a harvester is carrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cargo {
    /// Material.
    pub resource: Resource,
    /// Amount carried.
    pub amount: u32,
}

/// An autonomous helper unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Drone {
    /// Identity.
    pub id: EntityId,
    /// Role.
    pub role: DroneRole,
    /// Owning structure.
    pub owner: DroneOwner,
    /// World position.
    pub position: Vec2Fixed,
    /// Where it is heading, if anywhere.
    pub target_position: Option<Vec2Fixed>,
    /// Behavior state.
    pub state: DroneState,
    /// Current assignment.
    pub task: Option<DroneTask>,
    /// Movement speed in tiles per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Harvester load.
    pub cargo: Option<Cargo>,
    /// Work accumulator: gather time for harvesters, rate-weighted
    /// milliseconds for repairers.
    pub work_ms: u32,
    /// Repair points already paid for but not yet applied.
    pub paid_repair: u32,
}

impl Drone {
    /// Create an idle drone at a position.
    #[must_use]
    pub const fn new(
        id: EntityId,
        role: DroneRole,
        owner: DroneOwner,
        position: Vec2Fixed,
        speed: Fixed,
    ) -> Self {
        Self {
            id,
            role,
            owner,
            position,
            target_position: None,
            state: DroneState::Idle,
            task: None,
            speed,
            cargo: None,
            work_ms: 0,
            paid_repair: 0,
        }
    }

    /// Job id if the drone is assigned to construction.
    #[must_use]
    pub const fn job(&self) -> Option<EntityId> {
        match self.task {
            Some(DroneTask::Build(job)) => Some(job),
            _ => None,
        }
    }
}

// ============================================================================
// Construction
// ============================================================================

/// What a construction job builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Standard turret.
    BuildTurret,
    /// Sniper turret.
    BuildSniper,
    /// Quarry.
    BuildQuarry,
    /// Forge.
    BuildForge,
    /// Maintenance hub.
    BuildMaintenanceHub,
    /// Drone factory.
    BuildDroneFactory,
}

impl JobKind {
    /// Job building a turret variant.
    #[must_use]
    pub const fn for_turret(variant: TurretVariant) -> Self {
        match variant {
            TurretVariant::Standard => Self::BuildTurret,
            TurretVariant::Sniper => Self::BuildSniper,
        }
    }

    /// Job building a building kind.
    #[must_use]
    pub const fn for_building(kind: BuildingKind) -> Self {
        match kind {
            BuildingKind::Quarry => Self::BuildQuarry,
            BuildingKind::Forge => Self::BuildForge,
            BuildingKind::MaintenanceHub => Self::BuildMaintenanceHub,
            BuildingKind::DroneFactory => Self::BuildDroneFactory,
        }
    }

    /// Tile kind written to the grid on completion.
    #[must_use]
    pub const fn tile_kind(self) -> TileKind {
        match self {
            Self::BuildTurret => TileKind::Turret,
            Self::BuildSniper => TileKind::Sniper,
            Self::BuildQuarry => TileKind::Quarry,
            Self::BuildForge => TileKind::Forge,
            Self::BuildMaintenanceHub => TileKind::MaintenanceHub,
            Self::BuildDroneFactory => TileKind::DroneFactory,
        }
    }
}

/// Construction job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker.
    #[default]
    Pending,
    /// Claimed by a worker.
    InProgress,
    /// Finished; removed at the end of the tick it completed in.
    Completed,
}

/// A queued structure awaiting a worker drone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstructionJob {
    /// Identity. Lower ids are older.
    pub id: EntityId,
    /// Site.
    pub pos: GridPos,
    /// What gets built.
    pub kind: JobKind,
    /// Completion percentage, 0 to 100.
    #[serde(with = "fixed_serde")]
    pub progress: Fixed,
    /// Worker currently holding the job.
    pub assigned_drone: Option<EntityId>,
    /// Lifecycle.
    pub status: JobStatus,
    /// Cost charged when the job was queued.
    pub cost: Cost,
}

// ============================================================================
// Hero
// ============================================================================

/// The player-controlled hero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hero {
    /// World position.
    pub position: Vec2Fixed,
    /// Health pool.
    pub health: Health,
    /// Movement speed in tiles per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage per shot.
    pub damage: u32,
    /// Firing range in tiles.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Minimum time between shots.
    pub cooldown_ms: u32,
    /// Simulation time of the last shot.
    pub last_fired_ms: Option<u64>,
    /// Moved during the last tick.
    pub is_moving: bool,
    /// Direction last moved (drives the vision cone).
    pub facing: Facing,
    /// Direction currently held by the player.
    pub heading: Option<Facing>,
}

// ============================================================================
// Effects
// ============================================================================

/// Who fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileSource {
    /// A turret.
    Turret(EntityId),
    /// The hero.
    Hero,
    /// An enemy.
    Enemy(EntityId),
}

/// A shot in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Projectile {
    /// Identity.
    pub id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// What it is homing on.
    pub target: TargetRef,
    /// Tiles per second.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage on impact.
    pub damage: u32,
    /// Shooter category.
    pub source: ProjectileSource,
    /// Rolled a critical hit.
    pub is_critical: bool,
}

/// Particle flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    /// Ordinary hit.
    Impact,
    /// Critical hit.
    Critical,
    /// Enemy death or structure destruction.
    Explosion,
}

/// Short-lived visual particle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Particle {
    /// Identity.
    pub id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// Tiles per second.
    pub velocity: Vec2Fixed,
    /// Remaining life, 1 down to 0.
    #[serde(with = "fixed_serde")]
    pub life: Fixed,
    /// Total lifetime.
    pub lifetime_ms: u32,
    /// Flavor.
    pub kind: ParticleKind,
}

/// Floating damage popup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DamageNumber {
    /// Identity.
    pub id: EntityId,
    /// World position.
    pub position: Vec2Fixed,
    /// Damage shown.
    pub value: u32,
    /// Shown as a critical hit.
    pub is_critical: bool,
    /// Remaining life, 1 down to 0.
    #[serde(with = "fixed_serde")]
    pub life: Fixed,
    /// Total lifetime.
    pub lifetime_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_saturates() {
        let mut health = Health::new(100);
        assert_eq!(health.apply_damage(30), 30);
        assert_eq!(health.apply_damage(500), 70);
        assert!(health.is_dead());
        assert_eq!(health.current, 0);
    }

    #[test]
    fn test_health_heal_caps_at_max() {
        let mut health = Health::new(100);
        health.apply_damage(40);
        assert_eq!(health.missing(), 40);
        assert_eq!(health.heal(100), 40);
        assert!(health.is_full());
    }

    #[test]
    fn test_health_clamp() {
        let mut health = Health { current: 120, max: 100 };
        health.clamp();
        assert_eq!(health.current, 100);
    }

    #[test]
    fn test_building_tile_kind_follows_condition() {
        let mut b = Building::new(1, BuildingKind::Forge, GridPos::new(1, 1), 300, 0);
        assert_eq!(b.tile_kind(), TileKind::Forge);
        b.condition = BuildingCondition::Abandoned;
        assert_eq!(b.tile_kind(), TileKind::AbandonedForge);
        b.condition = BuildingCondition::Wrecked;
        assert_eq!(b.tile_kind(), TileKind::Forge);
    }

    #[test]
    fn test_building_production_requires_active() {
        let mut b = Building::new(1, BuildingKind::Quarry, GridPos::new(0, 0), 300, 0);
        b.production_rate = 2;
        assert_eq!(b.production(), Some((Resource::Stone, 2)));
        b.condition = BuildingCondition::Wrecked;
        assert_eq!(b.production(), None);

        let mut hub = Building::new(2, BuildingKind::MaintenanceHub, GridPos::new(0, 0), 400, 0);
        hub.production_rate = 5;
        assert_eq!(hub.production(), None);
    }

    #[test]
    fn test_tile_mappings_roundtrip() {
        for kind in BuildingKind::ALL {
            assert_eq!(BuildingKind::from_tile(kind.tile_kind()), Some((kind, false)));
            if let Some(ruin) = kind.abandoned_tile() {
                assert_eq!(BuildingKind::from_tile(ruin), Some((kind, true)));
                assert_eq!(ruin.restored(), Some(kind.tile_kind()));
            }
            assert_eq!(JobKind::for_building(kind).tile_kind(), kind.tile_kind());
        }
        for variant in [TurretVariant::Standard, TurretVariant::Sniper] {
            assert_eq!(TurretVariant::from_tile(variant.tile_kind()), Some(variant));
            assert_eq!(JobKind::for_turret(variant).tile_kind(), variant.tile_kind());
        }
    }

    #[test]
    fn test_facing_delta() {
        assert_eq!(Facing::Up.delta(), (0, -1));
        assert_eq!(Facing::Right.unit(), Vec2Fixed::new(Fixed::ONE, Fixed::ZERO));
    }
}
