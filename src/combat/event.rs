//! Asynchronous combat event bus
//!
//! The tick thread emits events into a bounded channel and never waits.
//! One background consumer folds each event into `CombatStats` and then
//! runs the listeners registered for its kind, in registration order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lock;
use crate::sim::projectile::Owner;

#[derive(Debug, Error)]
pub enum EventSystemError {
    #[error("failed to spawn combat event consumer: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatEventKind {
    DamageDealt,
    DamageTaken,
    AttackLanded,
    AttackMissed,
    Kill,
    ComboIncreased,
    CriticalHit,
    Block,
    Parry,
    Dodge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    pub kind: CombatEventKind,
    /// Time since the event system was created, stamped on emit
    pub timestamp: Duration,
    pub damage: f64,
    pub position: DVec2,
    pub attacker: Owner,
    pub target: Owner,
    pub critical: bool,
    pub combo: u32,
}

impl CombatEvent {
    pub fn new(kind: CombatEventKind, attacker: Owner, target: Owner) -> Self {
        Self {
            kind,
            timestamp: Duration::ZERO,
            damage: 0.0,
            position: DVec2::ZERO,
            attacker,
            target,
            critical: false,
            combo: 0,
        }
    }

    pub fn with_damage(mut self, damage: f64) -> Self {
        self.damage = damage;
        self
    }

    pub fn at(mut self, position: DVec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn with_combo(mut self, combo: u32) -> Self {
        self.combo = combo;
        self
    }
}

/// Running fight totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub player_damage_dealt: f64,
    pub player_damage_taken: f64,
    pub boss_damage_dealt: f64,
    pub boss_damage_taken: f64,
    pub player_attacks_landed: u32,
    pub player_attacks_missed: u32,
    pub boss_attacks_landed: u32,
    pub boss_attacks_missed: u32,
    pub highest_combo: u32,
    pub total_hits: u32,
    pub critical_hits: u32,
    pub total_events: u64,
}

impl CombatStats {
    pub fn record(&mut self, event: &CombatEvent) {
        self.total_events += 1;

        match event.kind {
            CombatEventKind::DamageDealt => match event.attacker {
                Owner::Player => self.player_damage_dealt += event.damage,
                Owner::Boss => self.boss_damage_dealt += event.damage,
            },
            CombatEventKind::DamageTaken => match event.target {
                Owner::Player => self.player_damage_taken += event.damage,
                Owner::Boss => self.boss_damage_taken += event.damage,
            },
            CombatEventKind::AttackLanded => {
                self.total_hits += 1;
                match event.attacker {
                    Owner::Player => self.player_attacks_landed += 1,
                    Owner::Boss => self.boss_attacks_landed += 1,
                }
            }
            CombatEventKind::AttackMissed => match event.attacker {
                Owner::Player => self.player_attacks_missed += 1,
                Owner::Boss => self.boss_attacks_missed += 1,
            },
            CombatEventKind::ComboIncreased => {
                self.highest_combo = self.highest_combo.max(event.combo);
            }
            CombatEventKind::CriticalHit => self.critical_hits += 1,
            CombatEventKind::Kill
            | CombatEventKind::Block
            | CombatEventKind::Parry
            | CombatEventKind::Dodge => {}
        }
    }

    /// Landed / (landed + missed) for the player, zero before any attack
    pub fn player_accuracy(&self) -> f64 {
        let attempts = self.player_attacks_landed + self.player_attacks_missed;
        if attempts == 0 {
            0.0
        } else {
            self.player_attacks_landed as f64 / attempts as f64
        }
    }
}

pub type Listener = Box<dyn Fn(&CombatEvent) + Send + Sync + 'static>;
type ListenerMap = HashMap<CombatEventKind, Vec<Listener>>;

pub struct EventSystem {
    sender: Option<SyncSender<CombatEvent>>,
    receiver: Option<Receiver<CombatEvent>>,
    consumer: Option<JoinHandle<()>>,
    listeners: Arc<RwLock<ListenerMap>>,
    stats: Arc<Mutex<CombatStats>>,
    dropped: AtomicU64,
    epoch: Instant,
}

impl EventSystem {
    /// Create a stopped event system with room for `capacity` in-flight events.
    /// Events emitted before `start` wait in the buffer.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        Self {
            sender: Some(sender),
            receiver: Some(receiver),
            consumer: None,
            listeners: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(Mutex::new(CombatStats::default())),
            dropped: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// Launch the consumer thread. Starting twice is a no-op.
    pub fn start(&mut self) -> Result<(), EventSystemError> {
        let Some(receiver) = self.receiver.take() else {
            return Ok(());
        };

        let listeners = Arc::clone(&self.listeners);
        let stats = Arc::clone(&self.stats);
        let spawned = thread::Builder::new()
            .name("combat-events".into())
            .spawn(move || consume(receiver, &listeners, &stats));

        match spawned {
            Ok(handle) => {
                self.consumer = Some(handle);
                log::debug!("combat event system started");
                Ok(())
            }
            Err(err) => {
                self.sender = None;
                Err(err.into())
            }
        }
    }

    /// Close the channel and wait for the consumer to drain what is queued.
    /// Safe to call more than once; later emits are dropped.
    pub fn stop(&mut self) {
        self.sender = None;
        self.receiver = None;
        if let Some(handle) = self.consumer.take() {
            if handle.join().is_err() {
                log::warn!("combat event consumer panicked");
            }
            log::debug!("combat event system stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.consumer.is_some()
    }

    /// Register a listener for one event kind. Listeners run on the consumer
    /// thread and must not register further listeners.
    pub fn add_listener<F>(&self, kind: CombatEventKind, listener: F)
    where
        F: Fn(&CombatEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(Box::new(listener));
    }

    /// Stamp and enqueue without blocking. A full buffer drops the event.
    pub fn emit(&self, mut event: CombatEvent) {
        event.timestamp = self.epoch.elapsed();

        let Some(sender) = &self.sender else {
            self.record_drop(event.kind);
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) | Err(TrySendError::Disconnected(event)) => {
                self.record_drop(event.kind);
            }
        }
    }

    fn record_drop(&self, kind: CombatEventKind) {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if dropped == 1 || dropped % 100 == 0 {
            log::warn!("combat event buffer full, dropped {kind:?} ({dropped} total)");
        }
    }

    /// Copy of the current totals
    pub fn stats(&self) -> CombatStats {
        *lock(&self.stats)
    }

    pub fn reset_stats(&self) {
        *lock(&self.stats) = CombatStats::default();
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for EventSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

fn consume(
    receiver: Receiver<CombatEvent>,
    listeners: &RwLock<ListenerMap>,
    stats: &Mutex<CombatStats>,
) {
    for event in receiver {
        lock(stats).record(&event);

        let listeners = listeners.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(registered) = listeners.get(&event.kind) {
            for listener in registered {
                listener(&event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn hit(damage: f64) -> CombatEvent {
        CombatEvent::new(CombatEventKind::DamageDealt, Owner::Player, Owner::Boss).with_damage(damage)
    }

    #[test]
    fn test_stats_fold() {
        let mut stats = CombatStats::default();
        stats.record(&hit(12.0));
        stats.record(&CombatEvent::new(CombatEventKind::DamageTaken, Owner::Boss, Owner::Player).with_damage(15.0));
        stats.record(&CombatEvent::new(CombatEventKind::AttackLanded, Owner::Player, Owner::Boss));
        stats.record(&CombatEvent::new(CombatEventKind::AttackMissed, Owner::Player, Owner::Boss));
        stats.record(&CombatEvent::new(CombatEventKind::ComboIncreased, Owner::Player, Owner::Boss).with_combo(3));
        stats.record(&CombatEvent::new(CombatEventKind::ComboIncreased, Owner::Player, Owner::Boss).with_combo(2));

        assert_eq!(stats.player_damage_dealt, 12.0);
        assert_eq!(stats.player_damage_taken, 15.0);
        assert_eq!(stats.total_hits, 1);
        assert_eq!(stats.highest_combo, 3);
        assert_eq!(stats.player_accuracy(), 0.5);
        assert_eq!(stats.total_events, 6);
    }

    #[test]
    fn test_listeners_run_in_order_and_stop_drains() {
        let mut events = EventSystem::new(100);
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let order = Arc::clone(&order);
            events.add_listener(CombatEventKind::DamageDealt, move |_| lock(&order).push(tag));
        }
        let kills = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&kills);
        events.add_listener(CombatEventKind::Kill, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.start().unwrap();
        events.start().unwrap();
        events.emit(hit(10.0));
        events.emit(hit(5.0));
        events.stop();
        events.stop();

        assert_eq!(*lock(&order), vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(kills.load(Ordering::SeqCst), 0);
        let stats = events.stats();
        assert_eq!(stats.player_damage_dealt, 15.0);
        assert_eq!(stats.total_events, 2);
        assert!(!events.is_running());
    }

    #[test]
    fn test_overflow_drops_without_blocking() {
        // Not started: nothing drains the two-slot buffer
        let mut events = EventSystem::new(2);
        for _ in 0..10 {
            events.emit(hit(1.0));
        }
        assert_eq!(events.dropped_events(), 8);

        events.start().unwrap();
        events.stop();
        let stats = events.stats();
        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.player_damage_dealt, 2.0);

        events.emit(hit(1.0));
        assert_eq!(events.dropped_events(), 9);
    }

    #[test]
    fn test_timestamp_is_stamped_on_emit() {
        let mut events = EventSystem::new(4);
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        events.add_listener(CombatEventKind::Dodge, move |event| {
            *lock(&slot) = Some(event.timestamp);
        });
        events.start().unwrap();
        std::thread::sleep(Duration::from_millis(2));
        events.emit(CombatEvent::new(CombatEventKind::Dodge, Owner::Boss, Owner::Player));
        events.stop();
        assert!(lock(&seen).unwrap() >= Duration::from_millis(2));
    }

    #[test]
    fn test_reset_stats() {
        let mut events = EventSystem::new(4);
        events.start().unwrap();
        events.emit(hit(3.0));
        events.stop();
        events.reset_stats();
        assert_eq!(events.stats(), CombatStats::default());
    }
}
