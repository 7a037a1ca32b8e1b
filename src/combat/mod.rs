//! Combat resolution support: damage math and the event bus

pub mod damage;
pub mod event;

pub use damage::{DamageCalculator, DamageType};
pub use event::{CombatEvent, CombatEventKind, CombatStats, EventSystem, EventSystemError, Listener};
