//! Hit stop: a few frozen ticks when a heavy hit lands

use std::sync::Mutex;

use crate::lock;

#[derive(Debug, Default)]
struct HitStopState {
    duration: u32,
    elapsed: u32,
}

#[derive(Debug, Default)]
pub struct HitStop {
    state: Mutex<HitStopState>,
}

impl HitStop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze for `ticks`. Extends, never shortens, a freeze in progress.
    pub fn start(&self, ticks: u32) {
        let mut state = lock(&self.state);
        let remaining = state.duration.saturating_sub(state.elapsed);
        if ticks > remaining {
            state.duration = ticks;
            state.elapsed = 0;
        }
    }

    /// Advance one tick, frozen or not
    pub fn update(&self) {
        let mut state = lock(&self.state);
        if state.elapsed < state.duration {
            state.elapsed += 1;
        }
    }

    pub fn should_freeze(&self) -> bool {
        let state = lock(&self.state);
        state.elapsed < state.duration
    }

    pub fn remaining(&self) -> u32 {
        let state = lock(&self.state);
        state.duration.saturating_sub(state.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freezes_for_duration() {
        let hit_stop = HitStop::new();
        assert!(!hit_stop.should_freeze());

        hit_stop.start(3);
        let mut frozen = 0;
        while hit_stop.should_freeze() {
            frozen += 1;
            hit_stop.update();
        }
        assert_eq!(frozen, 3);
    }

    #[test]
    fn test_start_extends_only() {
        let hit_stop = HitStop::new();
        hit_stop.start(6);
        hit_stop.update();
        hit_stop.start(2);
        assert_eq!(hit_stop.remaining(), 5);
        hit_stop.start(8);
        assert_eq!(hit_stop.remaining(), 8);
    }
}
