//! Bounded particle pool

use std::f64::consts::TAU;
use std::sync::Mutex;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: DVec2,
    pub velocity: DVec2,
    /// RGBA; alpha fades with age
    pub color: [u8; 4],
    pub size: f64,
    pub lifetime: u32,
    pub age: u32,
}

#[derive(Debug)]
struct Inner {
    particles: Vec<Particle>,
    rng: Pcg32,
}

#[derive(Debug)]
pub struct ParticleSystem {
    inner: Mutex<Inner>,
    max_particles: usize,
    gravity: f64,
}

impl ParticleSystem {
    pub fn new(max_particles: usize, gravity: f64, seed: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                particles: Vec::with_capacity(max_particles),
                rng: Pcg32::seed_from_u64(seed),
            }),
            max_particles,
            gravity,
        }
    }

    /// Burst of up to `count` particles in random directions. Stops at capacity.
    pub fn emit(&self, position: DVec2, count: usize, color: [u8; 4]) -> usize {
        let mut inner = lock(&self.inner);
        let room = self.max_particles.saturating_sub(inner.particles.len());
        let count = count.min(room);

        for _ in 0..count {
            let angle = inner.rng.random::<f64>() * TAU;
            let speed = 2.0 + inner.rng.random::<f64>() * 4.0;
            let size = 2.0 + inner.rng.random::<f64>() * 4.0;
            let lifetime = 20 + inner.rng.random_range(0..20);
            inner.particles.push(Particle {
                position,
                velocity: DVec2::from_angle(angle) * speed,
                color,
                size,
                lifetime,
                age: 0,
            });
        }
        count
    }

    pub fn update(&self) {
        let gravity = self.gravity;
        lock(&self.inner).particles.retain_mut(|p| {
            p.age += 1;
            p.position += p.velocity;
            p.velocity.y += gravity;
            let remaining = p.lifetime.saturating_sub(p.age) as f64 / p.lifetime.max(1) as f64;
            p.color[3] = (255.0 * remaining) as u8;
            p.age < p.lifetime
        });
    }

    /// Copy of the live particles
    pub fn particles(&self) -> Vec<Particle> {
        lock(&self.inner).particles.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_particles
    }

    pub fn clear(&self) {
        lock(&self.inner).particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];

    #[test]
    fn test_emit_respects_capacity() {
        let particles = ParticleSystem::new(10, 0.2, 1);
        assert_eq!(particles.emit(DVec2::ZERO, 8, WHITE), 8);
        assert_eq!(particles.emit(DVec2::ZERO, 8, WHITE), 2);
        assert_eq!(particles.len(), 10);
        assert_eq!(particles.emit(DVec2::ZERO, 1, WHITE), 0);
    }

    #[test]
    fn test_spawn_ranges() {
        let particles = ParticleSystem::new(200, 0.2, 2);
        particles.emit(DVec2::new(100.0, 100.0), 200, WHITE);
        for p in particles.particles() {
            let speed = p.velocity.length();
            assert!((2.0..6.0 + 1e-9).contains(&speed));
            assert!((2.0..6.0).contains(&p.size));
            assert!((20..40).contains(&p.lifetime));
        }
    }

    #[test]
    fn test_fade_and_expire() {
        let particles = ParticleSystem::new(50, 0.2, 3);
        particles.emit(DVec2::ZERO, 50, WHITE);
        particles.update();
        let first = particles.particles()[0];
        assert!(first.color[3] < 255);
        assert_eq!(first.age, 1);

        for _ in 0..40 {
            particles.update();
        }
        assert!(particles.is_empty());
    }

    #[test]
    fn test_gravity_pulls_down() {
        let particles = ParticleSystem::new(1, 0.5, 4);
        particles.emit(DVec2::ZERO, 1, WHITE);
        let before = particles.particles()[0].velocity.y;
        particles.update();
        assert!((particles.particles()[0].velocity.y - before - 0.5).abs() < 1e-12);
    }
}
