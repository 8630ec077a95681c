//! Asteroid belt: a torus around the z axis, approximated for intersection.
//!
//! A true line/torus test needs a quartic solve. The belt is instead modeled
//! as the solid between two coaxial cylinders closed by two annular caps. The
//! half-thickness of that shell is the tube radius scaled by
//! [`TUBE_VOLUME_FACTOR`], which makes the shell's volume close to the torus.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::intersection::PathIntersection;

/// Shell half-thickness relative to the torus tube radius.
pub const TUBE_VOLUME_FACTOR: f32 = 0.8349;

const EPSILON: f32 = 1.0e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeltObstacle {
    pub center: Vec3,
    /// Radius of the belt's center circle.
    pub radius: f32,
    /// Radius of the torus tube.
    pub tube_radius: f32,
}

impl BeltObstacle {
    pub fn new(center: Vec3, radius: f32, tube_radius: f32) -> Self {
        Self {
            center,
            radius,
            tube_radius,
        }
    }

    /// Half-thickness of the approximating shell.
    pub fn half_thickness(&self) -> f32 {
        self.tube_radius * TUBE_VOLUME_FACTOR
    }

    pub fn inner_radius(&self) -> f32 {
        self.radius - self.half_thickness()
    }

    pub fn outer_radius(&self) -> f32 {
        self.radius + self.half_thickness()
    }

    /// Whether `point` lies strictly inside the approximating shell.
    pub fn contains(&self, point: Vec3) -> bool {
        let local = point - self.center;
        let radial = local.truncate().length();
        radial > self.inner_radius()
            && radial < self.outer_radius()
            && local.z.abs() < self.half_thickness()
    }

    pub fn find_intersection(&self, origin: Vec3, direction: Vec3) -> PathIntersection {
        // already colliding
        if self.contains(origin) {
            return PathIntersection::hit(0.0, origin, self.surface_normal(origin), false);
        }

        let local = origin - self.center;
        let k = self.half_thickness();
        let (inner, outer) = (self.inner_radius(), self.outer_radius());

        let mut roots: Vec<f32> = Vec::with_capacity(6);

        for wall in [inner, outer] {
            for t in cylinder_roots(local, direction, wall) {
                if (local.z + direction.z * t).abs() <= k + EPSILON {
                    roots.push(t);
                }
            }
        }

        if direction.z.abs() > EPSILON {
            for cap in [k, -k] {
                let t = (cap - local.z) / direction.z;
                let radial = (local + direction * t).truncate().length();
                if radial > inner && radial < outer {
                    roots.push(t);
                }
            }
        }

        match roots.into_iter().filter(|t| *t >= 0.0).reduce(f32::min) {
            Some(t) => {
                let point = origin + direction * t;
                PathIntersection::hit(t, point, self.surface_normal(point), true)
            }
            None => PathIntersection::miss(),
        }
    }

    /// Direction from the nearest point of the center circle toward `point`.
    fn surface_normal(&self, point: Vec3) -> Vec3 {
        let local = point - self.center;
        let theta = local.y.atan2(local.x);
        let on_circle = Vec3::new(theta.cos(), theta.sin(), 0.0) * self.radius;
        (local - on_circle).try_normalize().unwrap_or(Vec3::Z)
    }
}

/// Path parameters where the line meets the infinite z-axis cylinder of
/// radius `radius`.
fn cylinder_roots(origin: Vec3, direction: Vec3, radius: f32) -> Vec<f32> {
    let a = direction.x * direction.x + direction.y * direction.y;
    if a < EPSILON * EPSILON {
        // parallel to the axis: only the caps can be hit
        return Vec::new();
    }
    let b = 2.0 * (origin.x * direction.x + origin.y * direction.y);
    let c = origin.x * origin.x + origin.y * origin.y - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        Vec::new()
    } else if discriminant == 0.0 {
        vec![-b / (2.0 * a)]
    } else {
        let root = discriminant.sqrt();
        vec![(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn belt() -> BeltObstacle {
        BeltObstacle::new(Vec3::ZERO, 100.0, 10.0)
    }

    /// Distance from `point` to the belt's center circle.
    fn distance_to_center_circle(belt: &BeltObstacle, point: Vec3) -> f32 {
        let radial = point.truncate().length();
        Vec3::new(radial - belt.radius, 0.0, point.z).length()
    }

    #[test]
    fn test_radial_ray_hits_outer_wall() {
        let b = belt();
        let hit = b.find_intersection(Vec3::new(200.0, 0.0, 0.0), Vec3::NEG_X);
        assert!(hit.intersect);
        assert!(hit.vehicle_outside);
        assert!((hit.distance - (100.0 - b.half_thickness())).abs() < 1e-3);
        let d = distance_to_center_circle(&b, hit.surface_point);
        assert!(
            (d - b.tube_radius).abs() < 0.2 * b.tube_radius,
            "surface point {} from center circle, tube radius {}",
            d,
            b.tube_radius
        );
        assert!((hit.surface_normal - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_oblique_ray_hits_within_tube_tolerance() {
        let b = belt();
        let origin = Vec3::new(-150.0, -40.0, 3.0);
        let target = Vec3::new(0.0, 100.0, 0.0);
        let direction = (target - origin).normalize();
        let hit = b.find_intersection(origin, direction);
        assert!(hit.intersect);
        assert!(hit.distance >= 0.0);
        let d = distance_to_center_circle(&b, hit.surface_point);
        assert!(
            (d - b.tube_radius).abs() < 0.2 * b.tube_radius,
            "surface point {} from center circle",
            d
        );
    }

    #[test]
    fn test_ray_from_above_hits_cap() {
        let b = belt();
        let hit = b.find_intersection(Vec3::new(0.0, 100.0, 50.0), Vec3::NEG_Z);
        assert!(hit.intersect);
        assert!((hit.distance - (50.0 - b.half_thickness())).abs() < 1e-3);
        assert!((hit.surface_normal - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn test_axis_aligned_ray_is_tested() {
        let b = belt();
        let hit = b.find_intersection(Vec3::new(0.0, -200.0, 0.0), Vec3::Y);
        assert!(hit.intersect, "axis-aligned paths must still hit the belt");
        assert!((hit.distance - (100.0 - b.half_thickness())).abs() < 1e-3);
    }

    #[test]
    fn test_origin_inside_reports_zero_distance() {
        let b = belt();
        let hit = b.find_intersection(Vec3::new(100.0, 0.0, 0.0), Vec3::Y);
        assert!(hit.intersect);
        assert_eq!(hit.distance, 0.0);
        assert!(!hit.vehicle_outside);
    }

    #[test]
    fn test_ray_through_hole_misses() {
        let b = belt();
        let hit = b.find_intersection(Vec3::new(0.0, 0.0, 50.0), Vec3::NEG_Z);
        assert!(!hit.intersect);
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let b = belt();
        let hit = b.find_intersection(Vec3::new(200.0, 0.0, 0.0), Vec3::X);
        assert!(!hit.intersect);
    }

    #[test]
    fn test_ray_from_hole_hits_inner_wall() {
        let b = belt();
        let hit = b.find_intersection(Vec3::ZERO, Vec3::X);
        assert!(hit.intersect);
        assert!((hit.distance - b.inner_radius()).abs() < 1e-3);
        assert!((hit.surface_normal - Vec3::NEG_X).length() < 1e-4);
    }

    #[test]
    fn test_serde_roundtrip() {
        let b = belt();
        let json = serde_json::to_string(&b).unwrap();
        let back: BeltObstacle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
