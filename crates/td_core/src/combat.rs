//! Combat resolution: target acquisition, firing, projectiles and damage.
//!
//! Damage is applied in exactly one place, [`Simulation::damage_target`],
//! which also handles the consequences: kill rewards for enemies,
//! wreckage for structures, defeat for the hero.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    BuildingCondition, EnemyKind, EntityId, Enemy, Projectile, ProjectileSource, TargetRef,
};
use crate::economy::{EconomyEvent, Resource};
use crate::grid::GridPos;
use crate::math::{step_distance, Fixed, Vec2Fixed};
use crate::simulation::{DefeatReason, MatchStatus, Simulation, TickEvents};
use crate::store::EntityStore;

/// A projectile this close to its target's live position has hit.
pub fn hit_threshold() -> Fixed {
    Fixed::from_num(0.3)
}

/// Combat event emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A projectile was launched.
    Fired {
        /// Shooter.
        source: ProjectileSource,
        /// Target.
        target: TargetRef,
    },
    /// A projectile connected.
    Hit {
        /// Target.
        target: TargetRef,
        /// Damage dealt.
        damage: u32,
        /// Critical hit.
        critical: bool,
    },
    /// An enemy struck its target directly.
    Struck {
        /// Attacker.
        enemy: EntityId,
        /// Target.
        target: TargetRef,
        /// Damage dealt.
        damage: u32,
    },
    /// An enemy died.
    EnemyKilled {
        /// Enemy id.
        enemy: EntityId,
        /// Archetype.
        kind: EnemyKind,
        /// Metal paid.
        reward: u32,
    },
    /// A turret or building was reduced to wreckage.
    StructureWrecked {
        /// The structure.
        target: TargetRef,
        /// Its tile.
        pos: GridPos,
    },
    /// The hero died.
    HeroDown,
    /// An enemy reached the base.
    EnemyReachedBase {
        /// Enemy id.
        enemy: EntityId,
        /// Lives lost.
        life_cost: u32,
    },
}

/// Roll for a critical hit.
///
/// Returns the (possibly multiplied) damage and whether it was critical.
pub fn roll_critical<R: Rng>(
    rng: &mut R,
    chance_pct: u32,
    multiplier: Fixed,
    damage: u32,
) -> (u32, bool) {
    let critical = rng.random_range(0..100) < chance_pct;
    if critical {
        let boosted = Fixed::saturating_from_num(damage).saturating_mul(multiplier);
        (boosted.saturating_to_num::<u32>(), true)
    } else {
        (damage, false)
    }
}

/// Nearest living enemy within `range` of `origin`.
///
/// With `prefer_ranged`, any ranged enemy in range beats every melee one.
/// Remaining ties break on distance, then id.
#[must_use]
pub fn acquire_target(
    origin: Vec2Fixed,
    range: Fixed,
    enemies: &EntityStore<Enemy>,
    prefer_ranged: bool,
) -> Option<EntityId> {
    enemies
        .values()
        .filter(|e| !e.health.is_dead() && origin.within(e.position, range))
        .min_by_key(|e| {
            (
                !(prefer_ranged && e.ranged),
                origin.distance_squared(e.position),
                e.id,
            )
        })
        .map(|e| e.id)
}

impl Simulation {
    /// World position of a target that can still take damage.
    ///
    /// `None` for removed entities, wreckage, abandoned buildings and a
    /// dead hero.
    #[must_use]
    pub fn attackable_position(&self, target: TargetRef) -> Option<Vec2Fixed> {
        match target {
            TargetRef::Enemy(id) => self
                .enemies
                .get(id)
                .filter(|e| !e.health.is_dead())
                .map(|e| e.position),
            TargetRef::Turret(id) => self
                .turrets
                .get(id)
                .filter(|t| t.is_active())
                .map(|t| t.position()),
            TargetRef::Building(id) => self
                .buildings
                .get(id)
                .filter(|b| b.is_active())
                .map(|b| b.position()),
            TargetRef::Hero => self
                .hero
                .as_ref()
                .filter(|h| !h.health.is_dead())
                .map(|h| h.position),
            TargetRef::Base => Some(Vec2Fixed::from_grid(self.base)),
        }
    }

    /// Launch a projectile.
    pub(crate) fn fire_projectile(
        &mut self,
        from: Vec2Fixed,
        target: TargetRef,
        speed: Fixed,
        damage: u32,
        source: ProjectileSource,
        is_critical: bool,
        events: &mut TickEvents,
    ) {
        let id = self.ids.allocate();
        self.projectiles.insert(
            id,
            Projectile {
                id,
                position: from,
                target,
                speed,
                damage,
                source,
                is_critical,
            },
        );
        events.combat.push(CombatEvent::Fired { source, target });
    }

    /// Apply damage to a target and resolve deaths.
    pub(crate) fn damage_target<R: Rng>(
        &mut self,
        target: TargetRef,
        amount: u32,
        rng: &mut R,
        events: &mut TickEvents,
    ) {
        match target {
            TargetRef::Enemy(id) => {
                let Some(enemy) = self.enemies.get_mut(id) else {
                    return;
                };
                enemy.health.apply_damage(amount);
                if !enemy.health.is_dead() {
                    return;
                }
                let Some(enemy) = self.enemies.remove(id) else {
                    return;
                };
                self.resources.deposit(Resource::Metal, enemy.reward);
                events.economy.push(EconomyEvent::Bounty {
                    enemy: id,
                    amount: enemy.reward,
                });
                events.combat.push(CombatEvent::EnemyKilled {
                    enemy: id,
                    kind: enemy.kind,
                    reward: enemy.reward,
                });
                self.spawn_explosion(enemy.position, rng);
            }
            TargetRef::Turret(id) => {
                let Some(turret) = self.turrets.get_mut(id) else {
                    return;
                };
                if turret.is_wreckage {
                    return;
                }
                turret.health.apply_damage(amount);
                if !turret.health.is_dead() {
                    return;
                }
                turret.is_wreckage = true;
                turret.target = None;
                let (pos, at) = (turret.pos, turret.position());
                tracing::info!(turret = id, %pos, "Turret wrecked");
                events.combat.push(CombatEvent::StructureWrecked { target, pos });
                self.spawn_explosion(at, rng);
            }
            TargetRef::Building(id) => {
                let Some(building) = self.buildings.get_mut(id) else {
                    return;
                };
                if !building.is_active() {
                    return;
                }
                building.health.apply_damage(amount);
                if !building.health.is_dead() {
                    return;
                }
                building.condition = BuildingCondition::Wrecked;
                let (pos, at) = (building.pos, building.position());
                tracing::info!(building = id, kind = ?building.kind, %pos, "Building wrecked");
                events.combat.push(CombatEvent::StructureWrecked { target, pos });
                self.spawn_explosion(at, rng);
            }
            TargetRef::Hero => {
                let Some(hero) = self.hero.as_mut() else {
                    return;
                };
                if hero.health.is_dead() {
                    return;
                }
                hero.health.apply_damage(amount);
                if hero.health.is_dead() {
                    hero.is_moving = false;
                    hero.heading = None;
                    let at = hero.position;
                    events.combat.push(CombatEvent::HeroDown);
                    self.spawn_explosion(at, rng);
                    self.end_match(MatchStatus::Defeat(DefeatReason::HeroDestroyed));
                }
            }
            // The base only loses lives to enemies that reach it.
            TargetRef::Base => {}
        }
    }

    /// Acquire targets and fire every active turret that is off cooldown.
    pub(crate) fn run_turret_system<R: Rng>(&mut self, rng: &mut R, events: &mut TickEvents) {
        let now = self.elapsed_ms;
        let prefer_ranged = self.config.turrets_prefer_ranged;

        for id in self.turrets.ids() {
            let Some(turret) = self.turrets.get(id) else {
                continue;
            };
            if !turret.is_active() {
                continue;
            }

            let origin = turret.position();
            let range = turret.range;
            let damage = turret.damage;
            let ready = turret.ready_to_fire(now);
            let stats = self.config.structures.turret(turret.variant);
            let (crit_chance, crit_multiplier, speed) =
                (stats.crit_chance_pct, stats.crit_multiplier, stats.projectile_speed);

            let kept = turret.target.filter(|enemy| {
                self.enemies
                    .get(*enemy)
                    .is_some_and(|e| origin.within(e.position, range))
            });
            let target =
                kept.or_else(|| acquire_target(origin, range, &self.enemies, prefer_ranged));

            if let Some(turret) = self.turrets.get_mut(id) {
                turret.target = target;
                if ready && target.is_some() {
                    turret.last_fired_ms = Some(now);
                }
            }

            let Some(enemy) = target else {
                continue;
            };
            if !ready {
                continue;
            }

            let (damage, critical) = roll_critical(rng, crit_chance, crit_multiplier, damage);
            self.fire_projectile(
                origin,
                TargetRef::Enemy(enemy),
                speed,
                damage,
                ProjectileSource::Turret(id),
                critical,
                events,
            );
        }
    }

    /// Move projectiles toward their targets and resolve hits.
    ///
    /// A projectile whose target is gone is discarded without effect.
    pub(crate) fn run_projectile_system<R: Rng>(
        &mut self,
        dt_ms: u32,
        rng: &mut R,
        events: &mut TickEvents,
    ) {
        let threshold = hit_threshold();

        for id in self.projectiles.ids() {
            let Some(projectile) = self.projectiles.get(id) else {
                continue;
            };
            let Some(target_pos) = self.attackable_position(projectile.target) else {
                self.projectiles.remove(id);
                continue;
            };

            let step = step_distance(projectile.speed, dt_ms);
            let (position, arrived) = projectile.position.move_towards(target_pos, step);
            if !arrived && !position.within(target_pos, threshold) {
                if let Some(projectile) = self.projectiles.get_mut(id) {
                    projectile.position = position;
                }
                continue;
            }

            let Some(projectile) = self.projectiles.remove(id) else {
                continue;
            };
            self.spawn_hit_effects(target_pos, projectile.damage, projectile.is_critical, rng);
            events.combat.push(CombatEvent::Hit {
                target: projectile.target,
                damage: projectile.damage,
                critical: projectile.is_critical,
            });
            self.damage_target(projectile.target, projectile.damage, rng, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EnemyMovement, Health};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn enemy(id: EntityId, x: i32, y: i32, ranged: bool) -> Enemy {
        Enemy {
            id,
            kind: if ranged { EnemyKind::Tank } else { EnemyKind::Standard },
            position: Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y)),
            health: Health::new(100),
            speed: Fixed::ONE,
            reward: 10,
            life_cost: 1,
            damage: 5,
            attack_range: Fixed::ONE,
            attack_cooldown_ms: 1000,
            ranged,
            aggro_radius: Fixed::ZERO,
            last_attack_ms: None,
            movement: EnemyMovement::Route { route: 0, index: 0 },
        }
    }

    #[test]
    fn test_acquire_nearest_in_range() {
        let mut enemies = EntityStore::new();
        enemies.insert(1, enemy(1, 3, 0, false));
        enemies.insert(2, enemy(2, 2, 0, false));
        enemies.insert(3, enemy(3, 9, 0, false));

        let origin = Vec2Fixed::ZERO;
        assert_eq!(acquire_target(origin, Fixed::from_num(3), &enemies, false), Some(2));
        assert_eq!(acquire_target(origin, Fixed::ONE, &enemies, false), None);
    }

    #[test]
    fn test_acquire_prefers_ranged_when_asked() {
        let mut enemies = EntityStore::new();
        enemies.insert(1, enemy(1, 1, 0, false));
        enemies.insert(2, enemy(2, 3, 0, true));

        let origin = Vec2Fixed::ZERO;
        let range = Fixed::from_num(4);
        assert_eq!(acquire_target(origin, range, &enemies, false), Some(1));
        assert_eq!(acquire_target(origin, range, &enemies, true), Some(2));
    }

    #[test]
    fn test_acquire_ties_break_on_id() {
        let mut enemies = EntityStore::new();
        enemies.insert(7, enemy(7, 0, 2, false));
        enemies.insert(4, enemy(4, 2, 0, false));
        assert_eq!(
            acquire_target(Vec2Fixed::ZERO, Fixed::from_num(3), &enemies, false),
            Some(4)
        );
    }

    #[test]
    fn test_critical_roll_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(roll_critical(&mut rng, 0, Fixed::from_num(2), 10), (10, false));
            assert_eq!(roll_critical(&mut rng, 100, Fixed::from_num(2), 10), (20, true));
        }
        assert_eq!(
            roll_critical(&mut rng, 100, Fixed::from_num(1.5), 25),
            (37, true)
        );
    }

    #[test]
    fn test_critical_rate_roughly_matches_chance() {
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        let crits = (0..10_000)
            .filter(|_| roll_critical(&mut rng, 35, Fixed::from_num(2.5), 60).1)
            .count();
        assert!((3000..4000).contains(&crits), "crits = {crits}");
    }
}
