//! Decaying screen shake

use std::f64::consts::TAU;
use std::sync::Mutex;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::lock;

#[derive(Debug)]
struct ShakeState {
    intensity: f64,
    duration: u32,
    elapsed: u32,
    offset: DVec2,
    rng: Pcg32,
}

#[derive(Debug)]
pub struct ScreenShake {
    state: Mutex<ShakeState>,
    decay: f64,
}

impl ScreenShake {
    pub fn new(decay: f64, seed: u64) -> Self {
        Self {
            state: Mutex::new(ShakeState {
                intensity: 0.0,
                duration: 0,
                elapsed: 0,
                offset: DVec2::ZERO,
                rng: Pcg32::seed_from_u64(seed),
            }),
            decay,
        }
    }

    /// Restart the shake. A stronger shake already running is kept.
    pub fn start(&self, intensity: f64, duration: u32) {
        let mut state = lock(&self.state);
        let running = state.elapsed < state.duration;
        let current = state.intensity * self.decay.powi(state.elapsed as i32);
        if running && current > intensity {
            return;
        }
        state.intensity = intensity;
        state.duration = duration;
        state.elapsed = 0;
    }

    pub fn update(&self) {
        let mut state = lock(&self.state);
        if state.elapsed >= state.duration {
            state.offset = DVec2::ZERO;
            return;
        }
        state.elapsed += 1;
        let magnitude = state.intensity * self.decay.powi(state.elapsed as i32);
        let angle = state.rng.random::<f64>() * TAU;
        state.offset = DVec2::from_angle(angle) * magnitude;
    }

    pub fn offset(&self) -> DVec2 {
        lock(&self.state).offset
    }

    pub fn is_active(&self) -> bool {
        let state = lock(&self.state);
        state.elapsed < state.duration
    }

    pub fn stop(&self) {
        let mut state = lock(&self.state);
        state.duration = 0;
        state.elapsed = 0;
        state.offset = DVec2::ZERO;
    }
}
