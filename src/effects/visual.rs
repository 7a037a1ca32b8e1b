//! Short-lived sprite effects: sparks, slashes, impacts, explosions

use std::sync::Mutex;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    HitSpark,
    Slash,
    Impact,
    Explosion,
}

impl EffectKind {
    /// (size, lifetime in ticks, drift velocity)
    fn profile(self) -> (f64, u32, DVec2) {
        match self {
            EffectKind::HitSpark => (8.0, 8, DVec2::new(0.0, -2.0)),
            EffectKind::Slash => (30.0, 12, DVec2::ZERO),
            EffectKind::Impact => (15.0, 10, DVec2::ZERO),
            EffectKind::Explosion => (40.0, 15, DVec2::new(0.0, -1.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualEffect {
    pub kind: EffectKind,
    pub position: DVec2,
    pub velocity: DVec2,
    pub color: [u8; 4],
    pub size: f64,
    pub lifetime: u32,
    pub age: u32,
}

impl VisualEffect {
    /// 0 at spawn, 1 at expiry
    pub fn progress(&self) -> f64 {
        self.age as f64 / self.lifetime.max(1) as f64
    }
}

#[derive(Debug)]
pub struct EffectManager {
    effects: Mutex<Vec<VisualEffect>>,
    max_effects: usize,
}

impl EffectManager {
    pub fn new(max_effects: usize) -> Self {
        Self {
            effects: Mutex::new(Vec::with_capacity(max_effects)),
            max_effects,
        }
    }

    /// Returns false when the manager is full
    pub fn spawn(&self, kind: EffectKind, position: DVec2, color: [u8; 4]) -> bool {
        let mut effects = lock(&self.effects);
        if effects.len() >= self.max_effects {
            return false;
        }
        let (size, lifetime, velocity) = kind.profile();
        effects.push(VisualEffect {
            kind,
            position,
            velocity,
            color,
            size,
            lifetime,
            age: 0,
        });
        true
    }

    pub fn update(&self) {
        lock(&self.effects).retain_mut(|effect| {
            effect.age += 1;
            effect.position += effect.velocity;
            effect.age < effect.lifetime
        });
    }

    pub fn active_effects(&self) -> Vec<VisualEffect> {
        lock(&self.effects).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.effects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.effects).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 60, 60, 255];

    #[test]
    fn test_spawn_profiles() {
        let manager = EffectManager::new(10);
        assert!(manager.spawn(EffectKind::Explosion, DVec2::new(5.0, 5.0), RED));
        let effect = manager.active_effects()[0];
        assert_eq!(effect.size, 40.0);
        assert_eq!(effect.lifetime, 15);
        assert_eq!(effect.velocity, DVec2::new(0.0, -1.0));
    }

    #[test]
    fn test_capacity() {
        let manager = EffectManager::new(2);
        assert!(manager.spawn(EffectKind::Slash, DVec2::ZERO, RED));
        assert!(manager.spawn(EffectKind::Slash, DVec2::ZERO, RED));
        assert!(!manager.spawn(EffectKind::Slash, DVec2::ZERO, RED));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_expiry_and_drift() {
        let manager = EffectManager::new(4);
        manager.spawn(EffectKind::HitSpark, DVec2::new(0.0, 100.0), RED);
        manager.spawn(EffectKind::Slash, DVec2::ZERO, RED);

        for _ in 0..7 {
            manager.update();
        }
        let spark = manager.active_effects()[0];
        assert_eq!(spark.position.y, 86.0);
        assert!((spark.progress() - 7.0 / 8.0).abs() < 1e-12);

        manager.update();
        let left = manager.active_effects();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].kind, EffectKind::Slash);

        for _ in 0..4 {
            manager.update();
        }
        assert!(manager.is_empty());
    }
}
