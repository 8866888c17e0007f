use bevy::math::Vec2;
use connectome_core::NodeId;

use crate::render::transform::ViewTransform;

/// Something hit-testable: a center in world space and a radius.
pub struct HitTarget<'a> {
    pub id: &'a NodeId,
    pub center: Vec2,
    pub radius: f32,
}

/// First target in render order whose circle contains the pointer.
pub fn hit_test<'a>(
    targets: impl IntoIterator<Item = HitTarget<'a>>,
    pointer: Vec2,
    transform: &ViewTransform,
) -> Option<&'a NodeId> {
    let world = transform.screen_to_world(pointer);
    targets
        .into_iter()
        .find(|t| t.center.is_finite() && t.center.distance_squared(world) <= t.radius * t.radius)
        .map(|t| t.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_in_render_order() {
        let a = NodeId::new("a");
        let b = NodeId::new("b");
        let t = ViewTransform {
            x: 0.0,
            y: 0.0,
            scale: 2.0,
        };
        let targets = || {
            vec![
                HitTarget {
                    id: &a,
                    center: Vec2::new(10.0, 10.0),
                    radius: 20.0,
                },
                HitTarget {
                    id: &b,
                    center: Vec2::new(12.0, 10.0),
                    radius: 20.0,
                },
            ]
        };
        assert_eq!(hit_test(targets(), Vec2::new(24.0, 20.0), &t), Some(&a));
        assert_eq!(hit_test(targets(), Vec2::new(500.0, 20.0), &t), None);
    }

    #[test]
    fn non_finite_centers_never_hit() {
        let a = NodeId::new("a");
        let targets = vec![HitTarget {
            id: &a,
            center: Vec2::new(f32::NAN, 0.0),
            radius: 1e9,
        }];
        assert_eq!(hit_test(targets, Vec2::ZERO, &ViewTransform::default()), None);
    }
}
