//! Hero movement and auto-fire.

use rand::Rng;

use crate::combat::{acquire_target, roll_critical};
use crate::components::{Facing, ProjectileSource, TargetRef};
use crate::math::{step_distance, Vec2Fixed};
use crate::simulation::{Simulation, TickEvents};

impl Simulation {
    /// True when the hero may stand at `at`.
    fn hero_can_enter(&self, at: Vec2Fixed) -> bool {
        at.to_grid()
            .and_then(|pos| self.grid.get(pos))
            .is_some_and(|kind| !kind.blocks_hero())
    }

    /// Set the direction the hero walks in. `None` stops it.
    pub(crate) fn steer_hero(&mut self, heading: Option<Facing>) -> bool {
        match self.hero.as_mut().filter(|h| !h.health.is_dead()) {
            Some(hero) => {
                hero.heading = heading;
                true
            }
            None => false,
        }
    }

    /// Move the hero along its heading, then fire at the nearest enemy in
    /// range when off cooldown.
    pub(crate) fn run_hero_system<R: Rng>(
        &mut self,
        dt_ms: u32,
        rng: &mut R,
        events: &mut TickEvents,
    ) {
        let Some(hero) = self.hero.as_ref().filter(|h| !h.health.is_dead()) else {
            return;
        };

        let mut position = hero.position;
        let mut facing = hero.facing;
        let mut moved = false;
        if let Some(heading) = hero.heading {
            facing = heading;
            let next = position + heading.unit().scale(step_distance(hero.speed, dt_ms));
            if self.hero_can_enter(next) {
                position = next;
                moved = true;
            }
        }

        let now = self.elapsed_ms;
        let ready = hero
            .last_fired_ms
            .map_or(true, |last| now.saturating_sub(last) >= u64::from(hero.cooldown_ms));
        let target = if ready {
            acquire_target(position, hero.range, &self.enemies, false)
        } else {
            None
        };
        let damage = hero.damage;

        if let Some(hero) = self.hero.as_mut() {
            hero.position = position;
            hero.facing = facing;
            hero.is_moving = moved;
            if target.is_some() {
                hero.last_fired_ms = Some(now);
            }
        }

        let Some(enemy) = target else {
            return;
        };
        let stats = &self.config.hero;
        let (speed, chance, multiplier) =
            (stats.projectile_speed, stats.crit_chance_pct, stats.crit_multiplier);
        let (damage, critical) = roll_critical(rng, chance, multiplier, damage);
        self.fire_projectile(
            position,
            TargetRef::Enemy(enemy),
            speed,
            damage,
            ProjectileSource::Hero,
            critical,
            events,
        );
    }
}
