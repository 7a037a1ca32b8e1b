//! Projectile threat detection for the boss
//!
//! A player projectile within range and heading toward the boss is tracked;
//! once it has been seen for the reaction time the boss is told which way to
//! sidestep.

use glam::DVec2;

use super::projectile::{Owner, Projectile};
use crate::settings::DodgeConfig;

/// Keep-out distance from the arena edges when choosing a sidestep
const EDGE_MARGIN: f64 = 80.0;
/// How many ticks ahead a sidestep is projected for the edge check
const LOOKAHEAD_TICKS: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct DodgeSystem {
    config: DodgeConfig,
    threat_ticks: u32,
    cooldown_left: u32,
}

impl DodgeSystem {
    pub fn new(config: &DodgeConfig) -> Self {
        Self {
            config: config.clone(),
            threat_ticks: 0,
            cooldown_left: 0,
        }
    }

    pub fn config(&self) -> &DodgeConfig {
        &self.config
    }

    /// Advance one tick. Returns a sidestep velocity when it is time to dodge.
    pub fn update(
        &mut self,
        boss_position: DVec2,
        arena_width: f64,
        projectiles: &[Projectile],
    ) -> Option<DVec2> {
        if self.cooldown_left > 0 {
            self.cooldown_left -= 1;
            self.threat_ticks = 0;
            return None;
        }

        let Some(threat) = self.find_threat(boss_position, projectiles) else {
            self.threat_ticks = 0;
            return None;
        };

        self.threat_ticks += 1;
        if self.threat_ticks < self.config.reaction_frames {
            return None;
        }

        self.threat_ticks = 0;
        Some(self.dodge_direction(boss_position, threat, arena_width))
    }

    /// Start the cooldown once the boss has actually moved
    pub fn commit(&mut self) {
        self.cooldown_left = self.config.cooldown;
    }

    pub fn find_threat<'a>(
        &self,
        boss_position: DVec2,
        projectiles: &'a [Projectile],
    ) -> Option<&'a Projectile> {
        projectiles
            .iter()
            .filter(|p| p.active && p.owner == Owner::Player)
            .find(|p| self.predict_impact(boss_position, p))
    }

    /// In range and travelling toward the boss
    pub fn predict_impact(&self, boss_position: DVec2, projectile: &Projectile) -> bool {
        let to_boss = boss_position - projectile.position;
        to_boss.length() <= self.config.detection_range
            && to_boss.dot(projectile.velocity.normalize_or_zero()) > 0.0
    }

    /// Perpendicular to the shot, flipped away from an arena edge
    pub fn dodge_direction(&self, boss_position: DVec2, projectile: &Projectile, arena_width: f64) -> DVec2 {
        let mut dodge = projectile.velocity.perp().normalize_or_zero() * self.config.speed;
        let future = boss_position + dodge * LOOKAHEAD_TICKS;
        if future.x > arena_width - EDGE_MARGIN {
            dodge.x = -dodge.x.abs();
        }
        if future.x < EDGE_MARGIN {
            dodge.x = dodge.x.abs();
        }
        dodge
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_left > 0
    }
}
