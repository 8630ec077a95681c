//! Outbound notifications emitted by the simulation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::enums::{FighterKind, UnitKind};
use crate::types::{EmpireId, UnitId};

/// Receiver of battle occurrences. Every method defaults to doing nothing.
pub trait CombatListener {
    fn unit_placed(&mut self, _unit: UnitId, _kind: UnitKind, _owner: EmpireId) {}
    fn unit_fired(&mut self, _attacker: UnitId, _target: UnitId, _part: &str) {}
    fn unit_destroyed(&mut self, _unit: UnitId) {}
    fn ship_entered_starlane(&mut self, _ship: UnitId) {}
    fn fighter_launched(&mut self, _fighter: UnitId, _carrier: UnitId, _kind: FighterKind) {}
    fn fighter_fired(&mut self, _fighter: UnitId, _target: UnitId) {}
    fn fighter_destroyed(&mut self, _fighter: UnitId) {}
    fn fighter_docked(&mut self, _fighter: UnitId, _carrier: UnitId) {}
    fn missile_launched(&mut self, _missile: UnitId, _launcher: UnitId, _target: UnitId) {}
    fn missile_exploded(&mut self, _missile: UnitId, _target: UnitId) {}
    fn missile_removed(&mut self, _missile: UnitId) {}
}

/// Listener used when none is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl CombatListener for NullListener {}

/// Shared listener handle, so a caller can keep reading what the engine reports.
impl<L: CombatListener> CombatListener for Rc<RefCell<L>> {
    fn unit_placed(&mut self, unit: UnitId, kind: UnitKind, owner: EmpireId) {
        self.borrow_mut().unit_placed(unit, kind, owner);
    }
    fn unit_fired(&mut self, attacker: UnitId, target: UnitId, part: &str) {
        self.borrow_mut().unit_fired(attacker, target, part);
    }
    fn unit_destroyed(&mut self, unit: UnitId) {
        self.borrow_mut().unit_destroyed(unit);
    }
    fn ship_entered_starlane(&mut self, ship: UnitId) {
        self.borrow_mut().ship_entered_starlane(ship);
    }
    fn fighter_launched(&mut self, fighter: UnitId, carrier: UnitId, kind: FighterKind) {
        self.borrow_mut().fighter_launched(fighter, carrier, kind);
    }
    fn fighter_fired(&mut self, fighter: UnitId, target: UnitId) {
        self.borrow_mut().fighter_fired(fighter, target);
    }
    fn fighter_destroyed(&mut self, fighter: UnitId) {
        self.borrow_mut().fighter_destroyed(fighter);
    }
    fn fighter_docked(&mut self, fighter: UnitId, carrier: UnitId) {
        self.borrow_mut().fighter_docked(fighter, carrier);
    }
    fn missile_launched(&mut self, missile: UnitId, launcher: UnitId, target: UnitId) {
        self.borrow_mut().missile_launched(missile, launcher, target);
    }
    fn missile_exploded(&mut self, missile: UnitId, target: UnitId) {
        self.borrow_mut().missile_exploded(missile, target);
    }
    fn missile_removed(&mut self, missile: UnitId) {
        self.borrow_mut().missile_removed(missile);
    }
}

/// Recorded form of a listener notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type")]
#[strum(serialize_all = "snake_case")]
pub enum CombatEvent {
    UnitPlaced { unit: UnitId, kind: UnitKind, owner: EmpireId },
    UnitFired { attacker: UnitId, target: UnitId, part: String },
    UnitDestroyed { unit: UnitId },
    ShipEnteredStarlane { ship: UnitId },
    FighterLaunched { fighter: UnitId, carrier: UnitId, kind: FighterKind },
    FighterFired { fighter: UnitId, target: UnitId },
    FighterDestroyed { fighter: UnitId },
    FighterDocked { fighter: UnitId, carrier: UnitId },
    MissileLaunched { missile: UnitId, launcher: UnitId, target: UnitId },
    MissileExploded { missile: UnitId, target: UnitId },
    MissileRemoved { missile: UnitId },
}

/// Listener that records every notification in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<CombatEvent>,
}

impl EventLog {
    /// Occurrence count per event name.
    pub fn tally(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(<&'static str>::from(event)).or_insert(0) += 1;
        }
        counts
    }

    pub fn count(&self, predicate: impl Fn(&CombatEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl CombatListener for EventLog {
    fn unit_placed(&mut self, unit: UnitId, kind: UnitKind, owner: EmpireId) {
        self.events.push(CombatEvent::UnitPlaced { unit, kind, owner });
    }
    fn unit_fired(&mut self, attacker: UnitId, target: UnitId, part: &str) {
        self.events.push(CombatEvent::UnitFired {
            attacker,
            target,
            part: part.to_owned(),
        });
    }
    fn unit_destroyed(&mut self, unit: UnitId) {
        self.events.push(CombatEvent::UnitDestroyed { unit });
    }
    fn ship_entered_starlane(&mut self, ship: UnitId) {
        self.events.push(CombatEvent::ShipEnteredStarlane { ship });
    }
    fn fighter_launched(&mut self, fighter: UnitId, carrier: UnitId, kind: FighterKind) {
        self.events.push(CombatEvent::FighterLaunched {
            fighter,
            carrier,
            kind,
        });
    }
    fn fighter_fired(&mut self, fighter: UnitId, target: UnitId) {
        self.events.push(CombatEvent::FighterFired { fighter, target });
    }
    fn fighter_destroyed(&mut self, fighter: UnitId) {
        self.events.push(CombatEvent::FighterDestroyed { fighter });
    }
    fn fighter_docked(&mut self, fighter: UnitId, carrier: UnitId) {
        self.events.push(CombatEvent::FighterDocked { fighter, carrier });
    }
    fn missile_launched(&mut self, missile: UnitId, launcher: UnitId, target: UnitId) {
        self.events.push(CombatEvent::MissileLaunched {
            missile,
            launcher,
            target,
        });
    }
    fn missile_exploded(&mut self, missile: UnitId, target: UnitId) {
        self.events.push(CombatEvent::MissileExploded { missile, target });
    }
    fn missile_removed(&mut self, missile: UnitId) {
        self.events.push(CombatEvent::MissileRemoved { missile });
    }
}
