//! Ephemeral visual effects: particles and floating damage numbers.
//!
//! Effects are simulation state so snapshots carry them, but nothing in
//! the simulation reads them back.

use rand::Rng;

use crate::components::{DamageNumber, Particle, ParticleKind};
use crate::math::{step_distance, Fixed, Vec2Fixed};
use crate::simulation::Simulation;

/// Particle lifetime.
pub const PARTICLE_LIFETIME_MS: u32 = 500;

/// Damage number lifetime.
pub const DAMAGE_NUMBER_LIFETIME_MS: u32 = 800;

/// Particles per hit.
const IMPACT_PARTICLES: u32 = 4;

/// Particles per death or destruction.
const EXPLOSION_PARTICLES: u32 = 10;

/// Damage numbers float upward at this many tiles per second.
fn damage_number_rise() -> Fixed {
    Fixed::ONE
}

/// Random scatter velocity in `[-2, 2]` tiles per second on each axis.
fn scatter<R: Rng>(rng: &mut R) -> Vec2Fixed {
    let x = rng.random_range(-2000..=2000);
    let y = rng.random_range(-2000..=2000);
    Vec2Fixed::new(
        Fixed::from_num(x) / Fixed::from_num(1000),
        Fixed::from_num(y) / Fixed::from_num(1000),
    )
}

/// Remaining-life fraction after `dt_ms` of a `lifetime_ms` effect.
fn decay(life: Fixed, dt_ms: u32, lifetime_ms: u32) -> Fixed {
    life - Fixed::from_num(dt_ms) / Fixed::from_num(lifetime_ms.max(1))
}

impl Simulation {
    fn spawn_particles<R: Rng>(
        &mut self,
        at: Vec2Fixed,
        kind: ParticleKind,
        count: u32,
        rng: &mut R,
    ) {
        for _ in 0..count {
            let id = self.ids.allocate();
            let velocity = scatter(rng);
            self.particles.insert(
                id,
                Particle {
                    id,
                    position: at,
                    velocity,
                    life: Fixed::ONE,
                    lifetime_ms: PARTICLE_LIFETIME_MS,
                    kind,
                },
            );
        }
    }

    /// Damage popup plus an impact burst at `at`.
    pub(crate) fn spawn_hit_effects<R: Rng>(
        &mut self,
        at: Vec2Fixed,
        damage: u32,
        is_critical: bool,
        rng: &mut R,
    ) {
        let id = self.ids.allocate();
        self.damage_numbers.insert(
            id,
            DamageNumber {
                id,
                position: at,
                value: damage,
                is_critical,
                life: Fixed::ONE,
                lifetime_ms: DAMAGE_NUMBER_LIFETIME_MS,
            },
        );

        let kind = if is_critical {
            ParticleKind::Critical
        } else {
            ParticleKind::Impact
        };
        self.spawn_particles(at, kind, IMPACT_PARTICLES, rng);
    }

    /// Explosion burst for a death or a destroyed structure.
    pub(crate) fn spawn_explosion<R: Rng>(&mut self, at: Vec2Fixed, rng: &mut R) {
        self.spawn_particles(at, ParticleKind::Explosion, EXPLOSION_PARTICLES, rng);
    }

    /// Age every effect and drop the expired ones.
    pub(crate) fn run_effect_decay(&mut self, dt_ms: u32) {
        for particle in self.particles.values_mut() {
            particle.life = decay(particle.life, dt_ms, particle.lifetime_ms);
            let drift = particle.velocity.scale(step_distance(Fixed::ONE, dt_ms));
            particle.position = particle.position + drift;
        }
        self.particles.retain(|p| p.life > Fixed::ZERO);

        let rise = step_distance(damage_number_rise(), dt_ms);
        for number in self.damage_numbers.values_mut() {
            number.life = decay(number.life, dt_ms, number.lifetime_ms);
            number.position.y -= rise;
        }
        self.damage_numbers.retain(|n| n.life > Fixed::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_reaches_zero_after_lifetime() {
        let mut life = Fixed::ONE;
        for _ in 0..(PARTICLE_LIFETIME_MS / 100) {
            life = decay(life, 100, PARTICLE_LIFETIME_MS);
        }
        // Truncated division may leave a sliver; one more step always clears it.
        assert!(life < Fixed::from_num(0.001));
        assert!(decay(life, 16, PARTICLE_LIFETIME_MS) <= Fixed::ZERO);
    }

    #[test]
    fn test_scatter_is_bounded() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let v = scatter(&mut rng);
            assert!(v.x.abs() <= Fixed::from_num(2));
            assert!(v.y.abs() <= Fixed::from_num(2));
        }
    }
}
