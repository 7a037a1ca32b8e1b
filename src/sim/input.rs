//! Input abstraction
//!
//! The host polls keyboard/gamepad and hands the simulation one `TickInput`
//! per tick. `Controller` turns that into normalized axes, just-pressed
//! edges, the jump buffer and coyote window, and collects haptic requests
//! for the host to play back.

use serde::{Deserialize, Serialize};

use crate::settings::InputConfig;

/// Raw per-tick input as polled by the host (held states, unfiltered axes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Left stick / arrow keys, -1 (left) to 1 (right)
    pub horizontal: f64,
    /// Left stick / arrow keys, -1 (up) to 1 (down)
    pub vertical: f64,
    pub jump: bool,
    pub attack: bool,
    pub dash: bool,
    pub special: bool,
    pub shoot: bool,
    pub pause: bool,
}

/// A countdown window measured in ticks.
///
/// Used both for the jump buffer (opened on press, consumed by a jump) and
/// for coyote time (opened when walking off a ledge).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameWindow {
    frames: u32,
    remaining: u32,
}

impl FrameWindow {
    pub fn new(frames: u32) -> Self {
        Self {
            frames,
            remaining: 0,
        }
    }

    pub fn open(&mut self) {
        self.remaining = self.frames;
    }

    /// Advance one tick
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_open(&self) -> bool {
        self.remaining > 0
    }

    /// Close the window, reporting whether it was open
    pub fn consume(&mut self) -> bool {
        let was_open = self.is_open();
        self.remaining = 0;
        was_open
    }

    pub fn close(&mut self) {
        self.remaining = 0;
    }

    pub fn frames_remaining(&self) -> u32 {
        self.remaining
    }
}

/// Rumble request, fire-and-forget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Haptic {
    pub duration_ms: u32,
    /// 0.0 - 1.0
    pub strength: f64,
}

/// Per-tick input state the entities read from
#[derive(Debug, Clone)]
pub struct Controller {
    deadzone: f64,
    current: TickInput,
    previous: TickInput,
    jump_buffer: FrameWindow,
    coyote: FrameWindow,
    haptics_enabled: bool,
    haptics: Vec<Haptic>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

impl Controller {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            deadzone: config.deadzone,
            current: TickInput::default(),
            previous: TickInput::default(),
            jump_buffer: FrameWindow::new(config.jump_buffer_frames),
            coyote: FrameWindow::new(config.coyote_frames),
            haptics_enabled: config.haptics,
            haptics: Vec::new(),
        }
    }

    /// Latch this tick's raw input. Call once per tick before any entity update.
    pub fn update(&mut self, raw: TickInput) {
        self.jump_buffer.tick();
        self.coyote.tick();

        self.previous = self.current;
        self.current = TickInput {
            horizontal: self.filter_axis(raw.horizontal),
            vertical: self.filter_axis(raw.vertical),
            ..raw
        };

        if self.is_jump_pressed() {
            self.jump_buffer.open();
        }
    }

    fn filter_axis(&self, value: f64) -> f64 {
        if value.abs() < self.deadzone {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.current.horizontal
    }

    pub fn vertical(&self) -> f64 {
        self.current.vertical
    }

    pub fn is_jump_held(&self) -> bool {
        self.current.jump
    }

    pub fn is_jump_pressed(&self) -> bool {
        self.current.jump && !self.previous.jump
    }

    pub fn is_attack_pressed(&self) -> bool {
        self.current.attack && !self.previous.attack
    }

    pub fn is_dash_pressed(&self) -> bool {
        self.current.dash && !self.previous.dash
    }

    pub fn is_special_pressed(&self) -> bool {
        self.current.special && !self.previous.special
    }

    pub fn is_shoot_pressed(&self) -> bool {
        self.current.shoot && !self.previous.shoot
    }

    pub fn is_pause_pressed(&self) -> bool {
        self.current.pause && !self.previous.pause
    }

    /// A jump press from the last few ticks that has not been spent yet
    pub fn jump_buffered(&self) -> bool {
        self.jump_buffer.is_open()
    }

    pub fn consume_jump_buffer(&mut self) -> bool {
        self.jump_buffer.consume()
    }

    pub fn jump_buffer(&self) -> &FrameWindow {
        &self.jump_buffer
    }

    pub fn start_coyote_time(&mut self) {
        self.coyote.open();
    }

    pub fn has_coyote_time(&self) -> bool {
        self.coyote.is_open()
    }

    pub fn clear_coyote_time(&mut self) {
        self.coyote.close();
    }

    pub fn coyote(&self) -> &FrameWindow {
        &self.coyote
    }

    pub fn vibrate(&mut self, duration_ms: u32, strength: f64) {
        if !self.haptics_enabled {
            return;
        }
        self.haptics.push(Haptic {
            duration_ms,
            strength: strength.clamp(0.0, 1.0),
        });
    }

    /// Take all haptic requests queued since the last drain
    pub fn drain_haptics(&mut self) -> Vec<Haptic> {
        std::mem::take(&mut self.haptics)
    }

    pub fn pending_haptics(&self) -> &[Haptic] {
        &self.haptics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_edges() {
        let mut c = Controller::default();
        let held = TickInput {
            jump: true,
            ..Default::default()
        };
        c.update(held);
        assert!(c.is_jump_pressed());
        c.update(held);
        assert!(!c.is_jump_pressed());
        assert!(c.is_jump_held());
        c.update(TickInput::default());
        c.update(held);
        assert!(c.is_jump_pressed());
    }

    #[test]
    fn test_deadzone() {
        let mut c = Controller::default();
        c.update(TickInput {
            horizontal: 0.15,
            vertical: -1.4,
            ..Default::default()
        });
        assert_eq!(c.horizontal(), 0.0);
        assert_eq!(c.vertical(), -1.0);
    }

    #[test]
    fn test_jump_buffer_expires() {
        let mut c = Controller::default();
        c.update(TickInput {
            jump: true,
            ..Default::default()
        });
        assert!(c.jump_buffered());
        for _ in 0..4 {
            c.update(TickInput::default());
        }
        assert!(c.jump_buffered());
        c.update(TickInput::default());
        assert!(!c.jump_buffered());
        assert!(!c.consume_jump_buffer());
    }

    #[test]
    fn test_coyote_window() {
        let mut c = Controller::default();
        c.start_coyote_time();
        assert_eq!(c.coyote().frames_remaining(), 6);
        c.update(TickInput::default());
        assert!(c.has_coyote_time());
        c.clear_coyote_time();
        assert!(!c.has_coyote_time());
    }

    #[test]
    fn test_haptics_drain() {
        let mut c = Controller::default();
        c.vibrate(50, 1.5);
        assert_eq!(c.pending_haptics()[0].strength, 1.0);
        assert_eq!(c.drain_haptics().len(), 1);
        assert!(c.drain_haptics().is_empty());
    }
}
