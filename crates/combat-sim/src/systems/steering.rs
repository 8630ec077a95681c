//! Steering primitives shared by ships, fighters and missiles.
//!
//! Each function returns a force in world space; callers weight, sum or
//! prioritize them and hand the result to `Kinematics::apply_steering_force`.

use glam::Vec3;

use combat_core::components::Kinematics;

/// Another vehicle as seen by neighborhood behaviors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
}

impl Neighbor {
    pub fn of(kinematics: &Kinematics) -> Self {
        Self {
            position: kinematics.position,
            velocity: kinematics.velocity(),
            radius: kinematics.radius,
        }
    }

    fn forward(&self) -> Vec3 {
        self.velocity.normalize_or_zero()
    }
}

/// Full-speed pursuit of `target`.
pub fn seek(vehicle: &Kinematics, target: Vec3) -> Vec3 {
    let desired = (target - vehicle.position).normalize_or_zero() * vehicle.max_speed;
    desired - vehicle.velocity()
}

/// Full-speed retreat from `threat`.
pub fn flee(vehicle: &Kinematics, threat: Vec3) -> Vec3 {
    let desired = (vehicle.position - threat).normalize_or_zero() * vehicle.max_speed;
    desired - vehicle.velocity()
}

/// Push away from neighbors, stronger the closer they are.
pub fn separation(vehicle: &Kinematics, neighbors: &[Neighbor]) -> Vec3 {
    let sum: Vec3 = neighbors
        .iter()
        .filter_map(|n| {
            let offset = n.position - vehicle.position;
            let d2 = offset.length_squared();
            (d2 > f32::EPSILON).then(|| -offset / d2)
        })
        .sum();
    sum.normalize_or_zero()
}

/// Match the neighbors' mean heading.
pub fn alignment(vehicle: &Kinematics, neighbors: &[Neighbor]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let heading: Vec3 = neighbors.iter().map(Neighbor::forward).sum();
    (heading - vehicle.forward * neighbors.len() as f32).normalize_or_zero()
}

/// Move toward the neighbors' center.
pub fn cohesion(vehicle: &Kinematics, neighbors: &[Neighbor]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let center: Vec3 = neighbors.iter().map(|n| n.position).sum::<Vec3>() / neighbors.len() as f32;
    (center - vehicle.position).normalize_or_zero()
}

/// Sum of unit pushes away from `threats`, each falling off with distance.
pub fn repulsion(vehicle: &Kinematics, threats: impl IntoIterator<Item = (Vec3, f32)>) -> Vec3 {
    threats
        .into_iter()
        .filter_map(|(position, strength)| {
            let offset = vehicle.position - position;
            let distance = offset.length();
            (distance > f32::EPSILON).then(|| offset / distance * (strength / distance))
        })
        .sum()
}

/// Side-step the neighbor whose closest approach within `horizon` seconds
/// would bring the two hulls into contact. Zero when nobody is on a
/// collision course.
pub fn avoid_neighbors(vehicle: &Kinematics, neighbors: &[Neighbor], horizon: f32) -> Vec3 {
    let velocity = vehicle.velocity();
    let mut threat: Option<(f32, Vec3, Vec3)> = None;

    for other in neighbors {
        let rel_position = other.position - vehicle.position;
        let rel_velocity = other.velocity - velocity;
        let rel_speed2 = rel_velocity.length_squared();
        if rel_speed2 < f32::EPSILON {
            continue;
        }
        let t = -rel_position.dot(rel_velocity) / rel_speed2;
        if !(0.0..horizon).contains(&t) {
            continue;
        }
        let mine = vehicle.position + velocity * t;
        let theirs = other.position + other.velocity * t;
        let clearance = vehicle.radius + other.radius;
        if mine.distance_squared(theirs) >= clearance * clearance {
            continue;
        }
        if threat.map_or(true, |(best, _, _)| t < best) {
            threat = Some((t, mine, theirs));
        }
    }

    let Some((_, mine, theirs)) = threat else {
        return Vec3::ZERO;
    };
    let away = mine - theirs;
    let lateral = away - vehicle.forward * away.dot(vehicle.forward);
    let lateral = lateral.try_normalize().unwrap_or(vehicle.side);
    lateral * vehicle.max_force
}

/// Logistic falloff used to slow followers as they reach their slot.
pub fn sigmoid(x: f32, steepness: f32, midpoint: f32) -> f32 {
    1.0 / (1.0 + (-steepness * (x - midpoint)).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle_at(position: Vec3, forward: Vec3, speed: f32) -> Kinematics {
        let mut k = Kinematics::new(position, forward, 10.0, 5.0, 1.0);
        k.speed = speed;
        k
    }

    #[test]
    fn test_seek_and_flee_oppose() {
        let v = vehicle_at(Vec3::ZERO, Vec3::X, 0.0);
        let s = seek(&v, Vec3::new(0.0, 10.0, 0.0));
        let f = flee(&v, Vec3::new(0.0, 10.0, 0.0));
        assert!((s - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-5);
        assert!((s + f).length() < 1e-5);
    }

    #[test]
    fn test_separation_points_away() {
        let v = vehicle_at(Vec3::ZERO, Vec3::X, 0.0);
        let n = [Neighbor {
            position: Vec3::new(1.0, 0.0, 0.0),
            velocity: Vec3::ZERO,
            radius: 1.0,
        }];
        assert!(separation(&v, &n).x < 0.0);
        assert!(cohesion(&v, &n).x > 0.0);
    }

    #[test]
    fn test_head_on_collision_sidesteps() {
        let v = vehicle_at(Vec3::ZERO, Vec3::X, 10.0);
        let oncoming = [Neighbor {
            position: Vec3::new(20.0, 0.5, 0.0),
            velocity: Vec3::new(-10.0, 0.0, 0.0),
            radius: 1.0,
        }];
        let force = avoid_neighbors(&v, &oncoming, 3.0);
        assert!((force.length() - 5.0).abs() < 1e-4);
        assert!(force.y < 0.0, "should dodge away from the oncoming offset");
    }

    #[test]
    fn test_no_collision_no_force() {
        let v = vehicle_at(Vec3::ZERO, Vec3::X, 10.0);
        let parallel = [Neighbor {
            position: Vec3::new(0.0, 50.0, 0.0),
            velocity: Vec3::new(10.0, 0.0, 0.0),
            radius: 1.0,
        }];
        assert_eq!(avoid_neighbors(&v, &parallel, 3.0), Vec3::ZERO);
    }

    #[test]
    fn test_sigmoid_midpoint() {
        assert!((sigmoid(3.0, 1.5, 3.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(0.0, 1.5, 3.0) < 0.05);
        assert!(sigmoid(10.0, 1.5, 3.0) > 0.99);
    }

    #[test]
    fn test_repulsion_falls_off() {
        let v = vehicle_at(Vec3::ZERO, Vec3::X, 0.0);
        let near = repulsion(&v, [(Vec3::new(2.0, 0.0, 0.0), 1.0)]);
        let far = repulsion(&v, [(Vec3::new(8.0, 0.0, 0.0), 1.0)]);
        assert!(near.x < far.x && far.x < 0.0);
    }
}
