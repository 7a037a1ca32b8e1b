//! Titan's Arena - a 2D boss-fight combat simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (arena, player, boss, projectiles, tick)
//! - `combat`: Damage math and the asynchronous combat event bus
//! - `effects`: Particles, hit sparks, screen shake and hit stop
//! - `audio`: Sound cues queued for the host to play
//! - `settings`: Data-driven tuning loaded from JSON

pub mod audio;
pub mod combat;
pub mod effects;
pub mod settings;
pub mod sim;

pub use settings::{ConfigError, GameConfig, QualityPreset};
pub use sim::{GameState, TickInput, tick};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate; every duration in the game is counted in ticks
    pub const SIM_TPS: u32 = 60;

    /// Logical screen size
    pub const SCREEN_WIDTH: f64 = 1280.0;
    pub const SCREEN_HEIGHT: f64 = 720.0;

    /// Top edge of the floor slab
    pub const FLOOR_TOP: f64 = 600.0;
    /// Reference line for the fall-out check
    pub const FLOOR_Y: f64 = 650.0;
    /// Side walls span WALL_TOP..FLOOR_TOP
    pub const WALL_TOP: f64 = 150.0;
    pub const WALL_THICKNESS: f64 = 50.0;
    /// How far past a body's side the wall probe reaches
    pub const WALL_PROBE: f64 = 8.0;
    /// Lateral clamp margin, also the absolute wall-contact threshold
    pub const WALL_MARGIN: f64 = 60.0;
    /// Horizontal inset of the arena bounds rectangle
    pub const BOUNDS_INSET: f64 = 110.0;

    /// Anything this far below FLOOR_Y is teleported back
    pub const FALL_RESET_DEPTH: f64 = 100.0;
    pub const RESPAWN_Y: f64 = 300.0;
}

/// Lock a mutex, recovering the data if another thread panicked while holding it.
#[inline]
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Convert a tick count to seconds at the fixed simulation rate
#[inline]
pub fn ticks_to_secs(ticks: u64) -> f64 {
    ticks as f64 / consts::SIM_TPS as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_recovers_from_poison() {
        let mutex = std::sync::Arc::new(Mutex::new(5));
        let cloned = std::sync::Arc::clone(&mutex);
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(mutex.is_poisoned());
        assert_eq!(*lock(&mutex), 5);
    }

    #[test]
    fn test_ticks_to_secs() {
        assert_eq!(ticks_to_secs(90), 1.5);
    }
}
