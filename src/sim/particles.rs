//! Cosmetic particle subsystem
//!
//! Short-lived decorative entities with no gameplay effect. Spread uses a
//! tick-seeded hash rather than the gameplay RNG, so visual effects never
//! perturb the deterministic spawn/crit stream. The pool is bounded; the
//! oldest particle is evicted when full.

use glam::Vec2;

use super::state::Particle;
use crate::consts::MAX_PARTICLES;

/// Spawn a radial burst of `count` particles at `pos`
pub fn spawn_burst(
    particles: &mut Vec<Particle>,
    ticks: u64,
    pos: Vec2,
    color: u32,
    count: usize,
) {
    let seed = ticks as u32;
    for i in 0..count {
        if particles.len() >= MAX_PARTICLES {
            particles.remove(0);
        }
        // Deterministic "random" spread using hash
        let hash = seed
            .wrapping_mul(2654435761)
            .wrapping_add(i as u32 * 7919)
            .wrapping_add(color.wrapping_mul(31337));
        let angle = (hash % 1000) as f32 / 1000.0 * std::f32::consts::TAU;
        let speed = 90.0 + ((hash >> 10) % 150) as f32;
        let life = 0.4 + ((hash >> 20) % 400) as f32 / 1000.0;
        let size = 2.5 + ((hash >> 14) % 100) as f32 / 100.0 * 3.5;

        particles.push(Particle {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            life,
            max_life: life,
            color,
            size,
        });
    }
}

/// Advance all particles and drop those past their lifetime
pub fn update(particles: &mut Vec<Particle>, dt: f32) {
    for particle in particles.iter_mut() {
        particle.pos += particle.vel * dt;
        // Gentle gravity on debris
        particle.vel.y += 300.0 * dt;
        particle.vel *= 0.98;
        particle.life -= dt;
        particle.size *= 0.995;
    }
    particles.retain(|p| p.life > 0.0);
}
