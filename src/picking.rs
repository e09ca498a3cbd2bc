//! Ray casting against simple collision shapes.
//!
//! - [`Ray`]: a 3D ray with origin and direction
//! - [`Collider`]: box, sphere and cylinder shapes attached to scene nodes
//! - [`RayHit`]: where a ray struck a collider
//!
//! Colliders live in their node's local space. [`Collider::intersect_world`]
//! carries the ray into that space through the inverse world matrix, so
//! rotated, scaled and parented nodes are all tested exactly.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// A ray in 3D space, used for picking.
///
/// # Example
///
/// ```
/// use showroom::{Ray, Vec3};
///
/// let ray = Ray::new(Vec3::new(0.0, 6.0, 15.0), Vec3::new(0.0, 0.0, -1.0));
/// let ahead = ray.point_at(10.0);
/// assert_eq!(ahead, Vec3::new(0.0, 6.0, 5.0));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// The starting point of the ray.
    pub origin: Vec3,
    /// The direction of the ray, normalized unless produced by [`Ray::transformed`].
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Builds a picking ray through a point in normalized device coordinates.
    ///
    /// `inv_view_proj` is the inverse of `projection * view`. The ray starts on
    /// the near plane.
    pub fn from_ndc(ndc: Vec2, inv_view_proj: Mat4) -> Self {
        let near_world = inv_view_proj * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far_world = inv_view_proj * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        // Perspective divide
        let near_point = near_world.truncate() / near_world.w;
        let far_point = far_world.truncate() / far_world.w;

        Self::new(near_point, far_point - near_point)
    }

    /// Maps the ray through `matrix` without renormalizing.
    ///
    /// Keeping the direction's length means a hit at parameter `t` in the new
    /// space is the same `t` along the original ray.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab test against an axis-aligned box.
    ///
    /// Returns the ray parameter of the nearest hit in front of the origin.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for i in 0..3 {
            let origin = self.origin[i];
            let dir = self.direction[i];

            if dir.abs() < f32::EPSILON {
                // Parallel to this slab
                if origin < min[i] || origin > max[i] {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir;
                let mut t1 = (min[i] - origin) * inv_dir;
                let mut t2 = (max[i] - origin) * inv_dir;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }

                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        nearest_positive([t_min, t_max])
    }

    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if a < f32::EPSILON || discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        nearest_positive([(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)])
    }

    /// Intersection with a capped cylinder centered at the origin along Y.
    pub fn intersect_cylinder(&self, radius: f32, half_height: f32) -> Option<f32> {
        let (o, d) = (self.origin, self.direction);
        let mut candidates = [f32::NAN; 4];

        // Side wall, solved in the XZ plane
        let a = d.x * d.x + d.z * d.z;
        if a > f32::EPSILON {
            let b = 2.0 * (o.x * d.x + o.z * d.z);
            let c = o.x * o.x + o.z * o.z - radius * radius;
            let discriminant = b * b - 4.0 * a * c;
            if discriminant >= 0.0 {
                let sqrt_disc = discriminant.sqrt();
                for (slot, t) in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)]
                    .into_iter()
                    .enumerate()
                {
                    if (o.y + d.y * t).abs() <= half_height {
                        candidates[slot] = t;
                    }
                }
            }
        }

        // Caps
        if d.y.abs() > f32::EPSILON {
            for (slot, cap_y) in [(2, half_height), (3, -half_height)] {
                let t = (cap_y - o.y) / d.y;
                let p = self.point_at(t);
                if p.x * p.x + p.z * p.z <= radius * radius {
                    candidates[slot] = t;
                }
            }
        }

        nearest_positive(candidates)
    }
}

/// Smallest strictly positive parameter, skipping NaN entries.
fn nearest_positive(ts: impl IntoIterator<Item = f32>) -> Option<f32> {
    ts.into_iter()
        .filter(|t| *t > 0.0)
        .fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))))
}

/// A collision shape for picking, expressed in its node's local space.
///
/// ```
/// use showroom::{Collider, Vec3};
///
/// let button = Collider::cylinder(0.5, 0.2);
/// let base = Collider::box_collider(Vec3::new(1.0, 0.2, 1.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collider {
    /// Box centered at the origin. Half-extents `(1, 1, 1)` span `-1..1`.
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Capped cylinder along local Y.
    Cylinder { radius: f32, half_height: f32 },
}

impl Collider {
    /// Box collider from full dimensions.
    pub fn box_collider(size: Vec3) -> Self {
        Self::Box {
            half_extents: size * 0.5,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Cylinder collider from radius and full height.
    pub fn cylinder(radius: f32, height: f32) -> Self {
        Self::Cylinder {
            radius,
            half_height: height * 0.5,
        }
    }

    /// Tests a world-space ray against this collider placed by `world`.
    ///
    /// Returns the world-space distance along `ray` to the nearest hit.
    /// A singular matrix (zero scale) never hits.
    pub fn intersect_world(&self, ray: &Ray, world: Mat4) -> Option<f32> {
        if world.determinant().abs() < f32::EPSILON {
            return None;
        }
        let local = ray.transformed(world.inverse());

        match *self {
            Collider::Box { half_extents } => local.intersect_aabb(-half_extents, half_extents),
            Collider::Sphere { radius } => local.intersect_sphere(Vec3::ZERO, radius),
            Collider::Cylinder {
                radius,
                half_height,
            } => local.intersect_cylinder(radius, half_height),
        }
    }
}

/// Where a ray struck a collider.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// The entity that was hit.
    pub entity: hecs::Entity,
    /// Distance from ray origin to the hit point.
    pub distance: f32,
    /// World-space position of the hit point.
    pub point: Vec3,
}

/// Converts a pointer position in pixels to normalized device coordinates.
///
/// Pixel Y grows downward while NDC Y grows upward. The result is clamped to
/// `[-1, 1]` on both axes. Returns `None` for an empty viewport.
pub fn pointer_to_ndc(position: Vec2, viewport: Vec2) -> Option<Vec2> {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return None;
    }
    let x = position.x / viewport.x * 2.0 - 1.0;
    let y = -(position.y / viewport.y) * 2.0 + 1.0;
    Some(Vec2::new(x, y).clamp(Vec2::NEG_ONE, Vec2::ONE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn pointer_center_maps_to_origin() {
        let ndc = pointer_to_ndc(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0)).unwrap();
        assert!(ndc.abs_diff_eq(Vec2::ZERO, 1e-6));
    }

    #[test]
    fn pointer_y_is_flipped_and_clamped() {
        let viewport = Vec2::new(800.0, 600.0);
        let top_left = pointer_to_ndc(Vec2::ZERO, viewport).unwrap();
        assert_eq!(top_left, Vec2::new(-1.0, 1.0));

        let outside = pointer_to_ndc(Vec2::new(-50.0, 900.0), viewport).unwrap();
        assert_eq!(outside, Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn empty_viewport_has_no_ndc() {
        assert!(pointer_to_ndc(Vec2::new(1.0, 1.0), Vec2::new(0.0, 600.0)).is_none());
    }

    #[test]
    fn cylinder_hit_from_above_lands_on_cap() {
        let ray = Ray::new(Vec3::new(0.2, 5.0, 0.0), Vec3::NEG_Y);
        let t = ray.intersect_cylinder(0.5, 0.1).unwrap();
        assert!((t - 4.9).abs() < 1e-5);
    }

    #[test]
    fn cylinder_side_hit_respects_height() {
        let hit = Ray::new(Vec3::new(-5.0, 0.05, 0.0), Vec3::X);
        assert!((hit.intersect_cylinder(0.5, 0.1).unwrap() - 4.5).abs() < 1e-5);

        let above = Ray::new(Vec3::new(-5.0, 0.2, 0.0), Vec3::X);
        assert!(above.intersect_cylinder(0.5, 0.1).is_none());
    }

    #[test]
    fn ray_behind_origin_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(ray.intersect_sphere(Vec3::ZERO, 1.0).is_none());
        assert!(ray.intersect_aabb(Vec3::splat(-1.0), Vec3::ONE).is_none());
    }

    #[test]
    fn world_distance_survives_scaling() {
        let collider = Collider::sphere(1.0);
        let world = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -10.0),
        );
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = collider.intersect_world(&ray, world).unwrap();
        assert!((t - 8.0).abs() < 1e-4);
    }

    #[test]
    fn rotated_box_is_tested_in_local_space() {
        let collider = Collider::box_collider(Vec3::new(4.0, 0.2, 0.2));
        let world = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        // The long axis now lies along Z
        let along_z = Ray::new(Vec3::new(0.0, 0.0, 1.5) + Vec3::Y * 5.0, Vec3::NEG_Y);
        assert!(collider.intersect_world(&along_z, world).is_some());
        let along_x = Ray::new(Vec3::new(1.5, 5.0, 0.0), Vec3::NEG_Y);
        assert!(collider.intersect_world(&along_x, world).is_none());
    }

    #[test]
    fn zero_scale_never_hits() {
        let world = Mat4::from_scale(Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(Collider::sphere(1.0).intersect_world(&ray, world).is_none());
    }
}
