//! Sound cue queue
//!
//! Combat listeners queue cues from the event thread; the host drains them
//! once per frame and plays them however it likes.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::lock;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Melee or projectile hit lands
    Hit,
    /// Player swings
    Slash,
    /// Slam shockwave or charged shot impact
    Explosion,
    Jump,
    Dash,
    /// Boss roar
    BossRoar,
    /// Player takes damage
    PlayerHurt,
    /// Boss defeated
    Victory,
    /// Player died
    GameOver,
}

/// A cue waiting for the host, with the volume it should play at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueuedSound {
    pub effect: SoundEffect,
    pub volume: f64,
}

#[derive(Debug)]
struct AudioState {
    master_volume: f64,
    sfx_volume: f64,
    muted: bool,
    queue: Vec<QueuedSound>,
}

impl AudioState {
    fn effective_volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

/// Shared between the tick thread, event listeners and the host
#[derive(Debug)]
pub struct SoundQueue {
    state: Mutex<AudioState>,
}

impl Default for SoundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AudioState {
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
                queue: Vec::with_capacity(16),
            }),
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&self, volume: f64) {
        lock(&self.state).master_volume = volume.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&self, volume: f64) {
        lock(&self.state).sfx_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&self, muted: bool) {
        lock(&self.state).muted = muted;
    }

    pub fn toggle_mute(&self) {
        let mut state = lock(&self.state);
        state.muted = !state.muted;
    }

    pub fn is_muted(&self) -> bool {
        lock(&self.state).muted
    }

    pub fn effective_volume(&self) -> f64 {
        lock(&self.state).effective_volume()
    }

    /// Queue a cue. Silent while muted or at zero volume.
    pub fn play(&self, effect: SoundEffect) {
        let mut state = lock(&self.state);
        let volume = state.effective_volume();
        if volume <= 0.0 {
            return;
        }
        state.queue.push(QueuedSound { effect, volume });
    }

    /// Take everything queued since the last drain
    pub fn drain(&self) -> Vec<QueuedSound> {
        std::mem::take(&mut lock(&self.state).queue)
    }

    pub fn len(&self) -> usize {
        lock(&self.state).queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.state).queue.clear();
    }
}
