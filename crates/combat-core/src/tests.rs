#[cfg(test)]
mod tests {
    use crate::commands::{CombatOrder, OrderMission};
    use crate::enums::*;
    use crate::events::{CombatEvent, CombatListener, EventLog};
    use crate::missions::{FighterMission, MissionQueue, ShipMission};
    use crate::types::{EmpireId, SimTime, UnitId};
    use glam::Vec3;

    #[test]
    fn test_unit_kind_serde() {
        let variants = vec![
            UnitKind::Ship,
            UnitKind::Interceptor,
            UnitKind::Bomber,
            UnitKind::Missile,
        ];
        for v in variants {
            let json = serde_json::to_string(&v).unwrap();
            let back: UnitKind = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_ship_mission_serde_tagged() {
        let mission = ShipMission::AttackThisStandoff {
            target: UnitId::from_bits(42),
        };
        let json = serde_json::to_string(&mission).unwrap();
        assert!(
            json.contains("\"type\":\"AttackThisStandoff\""),
            "Mission should be internally tagged: {json}"
        );
        let back: ShipMission = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mission);
    }

    #[test]
    fn test_order_serde() {
        let order = CombatOrder::fighter(
            UnitId::from_bits(9),
            FighterMission::PatrolTo {
                destination: Vec3::new(10.0, 0.0, -5.0),
            },
            true,
        );
        let json = serde_json::to_string(&order).unwrap();
        let back: CombatOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
        assert!(matches!(back.mission, OrderMission::Fighter(_)));
    }

    #[test]
    fn test_mission_queue_serde_keeps_stack() {
        let mut queue = MissionQueue::with(ShipMission::AttackShipsWeakestFirst);
        queue.push(ShipMission::AttackThis {
            target: UnitId::from_bits(3),
        });
        let json = serde_json::to_string(&queue).unwrap();
        let back: MissionQueue<ShipMission> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, queue);
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn test_event_log_records_and_tallies() {
        let mut log = EventLog::default();
        let a = UnitId::from_bits(1);
        let b = UnitId::from_bits(2);
        log.unit_placed(a, UnitKind::Ship, EmpireId(0));
        log.unit_fired(a, b, "laser");
        log.unit_fired(a, b, "laser");
        log.missile_removed(b);

        assert_eq!(log.events.len(), 4);
        let tally = log.tally();
        assert_eq!(tally.get("unit_fired"), Some(&2));
        assert_eq!(tally.get("missile_removed"), Some(&1));
        assert_eq!(
            log.events[1],
            CombatEvent::UnitFired {
                attacker: a,
                target: b,
                part: "laser".into()
            }
        );
    }

    #[test]
    fn test_sim_time_mission_stagger() {
        let mut time = SimTime::default();
        let eligible: Vec<u64> = (0..10)
            .filter_map(|_| {
                let hit = time.is_mission_tick(7, 5);
                let tick = time.tick;
                time.advance();
                hit.then_some(tick)
            })
            .collect();
        assert_eq!(eligible, vec![2, 7]);
    }
}
