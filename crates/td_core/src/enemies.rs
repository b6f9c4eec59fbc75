//! Enemy spawning, target selection, movement and attacks.
//!
//! Enemies walk their pre-computed spawn route until something in their
//! aggro radius outranks the base in the configured priority list. They
//! then hunt it along an A* path over open ground, attack it on cooldown
//! once in range, and fall back to the base when it is destroyed.

use rand::Rng;

use crate::combat::CombatEvent;
use crate::components::{
    Enemy, EnemyMovement, EntityId, Health, ProjectileSource, TargetCategory, TargetRef,
};
use crate::grid::GridPos;
use crate::math::{step_distance, Fixed, Vec2Fixed};
use crate::pathfinding::{find_path, Traversal};
use crate::simulation::{DefeatReason, MatchStatus, Simulation, TickEvents};
use crate::waves::SpawnOrder;

/// Scale base health by a wave multiplier; never below 1.
#[must_use]
pub fn scaled_health(base: u32, pct: u32) -> u32 {
    let scaled = u64::from(base) * u64::from(pct) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

enum Progress {
    Moving,
    ReachedBase,
}

impl Simulation {
    // ========================================================================
    // Spawning
    // ========================================================================

    /// Run the wave director and spawn whatever it orders.
    pub(crate) fn run_wave_system<R: Rng>(
        &mut self,
        dt_ms: u32,
        rng: &mut R,
        events: &mut TickEvents,
    ) {
        let orders = self.waves.tick(
            dt_ms,
            self.enemies.len(),
            &self.config.waves,
            rng,
            &mut events.waves,
        );
        for order in orders {
            self.spawn_enemy(order);
        }
    }

    /// Place an enemy on the next spawn route (round-robin).
    pub(crate) fn spawn_enemy(&mut self, order: SpawnOrder) -> Option<EntityId> {
        if self.routes.is_empty() {
            return None;
        }
        let route = self.spawn_cursor % self.routes.len();
        self.spawn_cursor = self.spawn_cursor.wrapping_add(1);
        let spawn = self.routes[route].spawn;

        let stats = self.config.enemies.get(order.kind);
        let id = self.ids.allocate();
        let enemy = Enemy {
            id,
            kind: order.kind,
            position: Vec2Fixed::from_grid(spawn),
            health: Health::new(scaled_health(stats.health, order.health_pct)),
            speed: stats.speed,
            reward: stats.reward,
            life_cost: stats.life_cost,
            damage: stats.damage,
            attack_range: stats.attack_range,
            attack_cooldown_ms: stats.attack_cooldown_ms,
            ranged: stats.ranged,
            aggro_radius: stats.aggro_radius,
            last_attack_ms: None,
            movement: EnemyMovement::Route { route, index: 1 },
        };
        tracing::debug!(enemy = id, kind = ?order.kind, %spawn, "Enemy spawned");
        self.enemies.insert(id, enemy);
        Some(id)
    }

    // ========================================================================
    // Targeting
    // ========================================================================

    /// Nearest active turret or building within `radius` of `from`.
    fn nearest_structure(&self, from: Vec2Fixed, radius: Fixed) -> Option<TargetRef> {
        if radius <= Fixed::ZERO {
            return None;
        }
        let turrets = self
            .turrets
            .values()
            .filter(|t| t.is_active())
            .map(|t| (from.distance_squared(t.position()), TargetRef::Turret(t.id)));
        let buildings = self
            .buildings
            .values()
            .filter(|b| b.is_active())
            .map(|b| (from.distance_squared(b.position()), TargetRef::Building(b.id)));

        let limit = radius.saturating_mul(radius);
        turrets
            .chain(buildings)
            .filter(|(d, _)| *d <= limit)
            .min()
            .map(|(_, target)| target)
    }

    /// Highest-ranked target currently available to `enemy`.
    fn choose_target(&self, enemy: &Enemy) -> TargetRef {
        for category in &self.config.target_priority {
            match category {
                TargetCategory::Hero => {
                    let in_reach = enemy.aggro_radius > Fixed::ZERO
                        && self
                            .attackable_position(TargetRef::Hero)
                            .is_some_and(|at| enemy.position.within(at, enemy.aggro_radius));
                    if in_reach {
                        return TargetRef::Hero;
                    }
                }
                TargetCategory::Structure => {
                    let nearest = self.nearest_structure(enemy.position, enemy.aggro_radius);
                    if let Some(target) = nearest {
                        return target;
                    }
                }
                TargetCategory::Base => return TargetRef::Base,
            }
        }
        TargetRef::Base
    }

    /// Tile an enemy paths toward to reach `target`.
    fn target_tile(&self, target: TargetRef) -> Option<GridPos> {
        match target {
            TargetRef::Enemy(_) => None,
            TargetRef::Turret(id) => self.turrets.get(id).map(|t| t.pos),
            TargetRef::Building(id) => self.buildings.get(id).map(|b| b.pos),
            TargetRef::Hero => self.hero.as_ref().and_then(|h| h.position.to_grid()),
            TargetRef::Base => Some(self.base),
        }
    }

    /// Switch `enemy` to hunting `target`. Returns false if no path exists.
    fn begin_hunt(&self, enemy: &mut Enemy, target: TargetRef) -> bool {
        let (Some(goal), Some(start)) = (self.target_tile(target), enemy.position.to_grid()) else {
            return false;
        };
        let Some(path) = find_path(&self.grid, start, goal, Traversal::Assault) else {
            tracing::debug!(enemy = enemy.id, ?target, "No assault path; keeping current movement");
            return false;
        };
        enemy.movement = EnemyMovement::Hunt {
            target,
            index: 1.min(path.len() - 1),
            path,
            repath_tick: self.tick + self.config.retarget_interval_ticks.max(1),
        };
        true
    }

    /// Re-rank targets and switch movement if the choice changed.
    fn retarget(&self, enemy: &mut Enemy) {
        let desired = self.choose_target(enemy);
        let keep = match &enemy.movement {
            EnemyMovement::Route { .. } => desired == TargetRef::Base,
            EnemyMovement::Hunt { target, .. } => *target == desired,
        };
        if !keep {
            self.begin_hunt(enemy, desired);
        }
    }

    // ========================================================================
    // Movement and attacks
    // ========================================================================

    /// Step toward a waypoint. Returns true on arrival.
    fn walk(enemy: &mut Enemy, waypoint: GridPos, dt_ms: u32) -> bool {
        let step = step_distance(enemy.speed, dt_ms);
        let (position, arrived) = enemy.position.move_towards(Vec2Fixed::from_grid(waypoint), step);
        enemy.position = position;
        arrived
    }

    fn attack<R: Rng>(
        &mut self,
        enemy: &mut Enemy,
        target: TargetRef,
        rng: &mut R,
        events: &mut TickEvents,
    ) {
        enemy.last_attack_ms = Some(self.elapsed_ms);
        if enemy.ranged {
            let speed = self.config.enemies.get(enemy.kind).projectile_speed;
            self.fire_projectile(
                enemy.position,
                target,
                speed,
                enemy.damage,
                ProjectileSource::Enemy(enemy.id),
                false,
                events,
            );
        } else {
            events.combat.push(CombatEvent::Struck {
                enemy: enemy.id,
                target,
                damage: enemy.damage,
            });
            self.damage_target(target, enemy.damage, rng, events);
        }
    }

    fn advance_enemy<R: Rng>(
        &mut self,
        enemy: &mut Enemy,
        dt_ms: u32,
        rng: &mut R,
        events: &mut TickEvents,
    ) -> Progress {
        match enemy.movement.clone() {
            EnemyMovement::Route { route, mut index } => {
                let waypoint = self
                    .routes
                    .get(route)
                    .and_then(|r| r.route.get(index))
                    .copied();
                let Some(waypoint) = waypoint else {
                    return Progress::ReachedBase;
                };
                if Self::walk(enemy, waypoint, dt_ms) {
                    index += 1;
                }
                enemy.movement = EnemyMovement::Route { route, index };
                let route_len = self.routes.get(route).map_or(0, |r| r.route.len());
                if index >= route_len {
                    Progress::ReachedBase
                } else {
                    Progress::Moving
                }
            }
            EnemyMovement::Hunt {
                target,
                mut path,
                mut index,
                mut repath_tick,
            } => {
                if target != TargetRef::Base {
                    if let Some(at) = self.attackable_position(target) {
                        if enemy.position.within(at, enemy.attack_range) {
                            if enemy.can_attack(self.elapsed_ms) {
                                self.attack(enemy, target, rng, events);
                            }
                            return Progress::Moving;
                        }
                    }
                    if repath_tick <= self.tick {
                        let ends = (self.target_tile(target), enemy.position.to_grid());
                        if let (Some(goal), Some(start)) = ends {
                            let fresh = find_path(&self.grid, start, goal, Traversal::Assault);
                            if let Some(fresh) = fresh {
                                index = 1.min(fresh.len() - 1);
                                path = fresh;
                            }
                        }
                        repath_tick = self.tick + self.config.retarget_interval_ticks.max(1);
                    }
                }

                let reached_end = match path.get(index).copied() {
                    Some(waypoint) => {
                        if Self::walk(enemy, waypoint, dt_ms) {
                            index += 1;
                        }
                        index >= path.len()
                    }
                    None => true,
                };

                if reached_end && target != TargetRef::Base {
                    // Target moved off the end of the path; recompute next tick.
                    repath_tick = self.tick;
                }
                enemy.movement = EnemyMovement::Hunt {
                    target,
                    path,
                    index,
                    repath_tick,
                };

                if reached_end && target == TargetRef::Base {
                    Progress::ReachedBase
                } else {
                    Progress::Moving
                }
            }
        }
    }

    fn enemy_reached_base(&mut self, enemy: &Enemy, events: &mut TickEvents) {
        self.lives = self.lives.saturating_sub(enemy.life_cost);
        events.combat.push(CombatEvent::EnemyReachedBase {
            enemy: enemy.id,
            life_cost: enemy.life_cost,
        });
        tracing::info!(enemy = enemy.id, lives = self.lives, "Enemy reached the base");
        if self.lives == 0 {
            self.end_match(MatchStatus::Defeat(DefeatReason::LivesExhausted));
        }
    }

    /// Retarget, move and attack with every enemy in id order.
    pub(crate) fn run_enemy_system<R: Rng>(
        &mut self,
        dt_ms: u32,
        rng: &mut R,
        events: &mut TickEvents,
    ) {
        let interval = self.config.retarget_interval_ticks.max(1);

        for id in self.enemies.ids() {
            if self.status.is_over() {
                break;
            }
            let Some(mut enemy) = self.enemies.remove(id) else {
                continue;
            };

            let target_lost = enemy
                .hunt_target()
                .is_some_and(|t| t != TargetRef::Base && self.attackable_position(t).is_none());
            if target_lost || (self.tick + id) % interval == 0 {
                self.retarget(&mut enemy);
                let still_lost = enemy
                    .hunt_target()
                    .is_some_and(|t| self.attackable_position(t).is_none());
                if target_lost && still_lost {
                    self.begin_hunt(&mut enemy, TargetRef::Base);
                }
            }

            match self.advance_enemy(&mut enemy, dt_ms, rng, events) {
                Progress::Moving => self.enemies.insert(id, enemy),
                Progress::ReachedBase => self.enemy_reached_base(&enemy, events),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingCondition, BuildingKind, EnemyKind, TurretVariant};
    use crate::data::GameConfig;
    use crate::economy::Cost;
    use crate::grid::{Grid, TileKind};

    /// Row 0 is the route spawn(0,0) -> base(9,0); rows 1-4 are open ground.
    fn field() -> Grid {
        let mut grid = Grid::new(10, 5);
        for x in 0..10 {
            grid.set(GridPos::new(x, 0), TileKind::Path);
        }
        grid.set(GridPos::new(0, 0), TileKind::Spawn);
        grid.set(GridPos::new(9, 0), TileKind::Base);
        grid
    }

    fn sim(config: GameConfig) -> Simulation {
        Simulation::new(field(), config.without_hero()).unwrap()
    }

    fn order(kind: EnemyKind) -> SpawnOrder {
        SpawnOrder { kind, health_pct: 100 }
    }

    #[test]
    fn test_scaled_health() {
        assert_eq!(scaled_health(100, 130), 130);
        assert_eq!(scaled_health(1, 10), 1);
    }

    #[test]
    fn test_route_enemy_reaches_base_and_costs_lives() {
        let mut sim = sim(GameConfig::default());
        sim.spawn_enemy(order(EnemyKind::Tank)).unwrap();

        let mut reached = false;
        for _ in 0..1000 {
            let events = sim.tick();
            if events
                .combat
                .iter()
                .any(|e| matches!(e, CombatEvent::EnemyReachedBase { life_cost: 2, .. }))
            {
                reached = true;
                break;
            }
        }
        assert!(reached);
        assert!(sim.enemies().is_empty());
        assert_eq!(sim.lives(), 18);
    }

    #[test]
    fn test_scout_ignores_structures() {
        let mut sim = sim(GameConfig::default());
        sim.create_turret(TurretVariant::Standard, GridPos::new(1, 1), TileKind::Empty, Cost::ZERO);
        let id = sim.spawn_enemy(order(EnemyKind::Scout)).unwrap();
        for _ in 0..30 {
            sim.tick();
        }
        let scout = sim.enemies().get(id).unwrap();
        assert!(matches!(scout.movement, EnemyMovement::Route { .. }));
    }

    #[test]
    fn test_standard_enemy_hunts_nearby_structure() {
        let mut sim = sim(GameConfig::default());
        let quarry = sim.create_building(
            BuildingKind::Quarry,
            GridPos::new(2, 1),
            BuildingCondition::Active,
        );
        let id = sim.spawn_enemy(order(EnemyKind::Standard)).unwrap();
        let mut hunted = false;
        for _ in 0..120 {
            sim.tick();
            if sim
                .enemies()
                .get(id)
                .and_then(Enemy::hunt_target)
                == Some(TargetRef::Building(quarry))
            {
                hunted = true;
                break;
            }
        }
        assert!(hunted);
    }

    #[test]
    fn test_destroyed_target_sends_enemy_back_to_base() {
        let mut config = GameConfig::default();
        config.structures.quarry.max_health = 1;
        let mut sim = sim(config);
        let quarry = sim.create_building(
            BuildingKind::Quarry,
            GridPos::new(1, 1),
            BuildingCondition::Active,
        );
        let id = sim.spawn_enemy(order(EnemyKind::Standard)).unwrap();

        for _ in 0..300 {
            sim.tick();
            if sim.buildings().get(quarry).is_some_and(|b| !b.is_active()) {
                break;
            }
        }
        assert_eq!(
            sim.buildings().get(quarry).map(|b| b.condition),
            Some(BuildingCondition::Wrecked)
        );

        sim.tick();
        let enemy = sim.enemies().get(id).unwrap();
        assert_ne!(enemy.hunt_target(), Some(TargetRef::Building(quarry)));
    }
}
