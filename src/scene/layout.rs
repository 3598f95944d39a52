/// Item placement for the three view modes
///
/// All layouts are pure and deterministic: the same inputs always give the
/// same positions, so re-layout on resize or on settings changes is
/// idempotent.
use cgmath::{InnerSpace, Vector3};
use std::f32::consts::PI;

use crate::state::settings::{LayoutConfig, ViewMode};

/// Card edge length in world units at media scale 1.0
pub const CARD_SIZE: f32 = 12.0;

/// Bounds for the effective sphere radius
pub const MIN_RADIUS: f32 = 24.0;
pub const MAX_RADIUS: f32 = 200.0;

/// The media scale never shrinks the radius below this multiplier
const MIN_SCALE_FACTOR: f32 = 0.6;

/// Distribute points over a sphere using the golden angle
///
/// Returns `max(count, 1)` positions. A single item sits at `(0, 0, radius)`.
pub fn sphere_layout(count: usize, radius: f32) -> Vec<Vector3<f32>> {
    if count <= 1 {
        return vec![Vector3::new(0.0, 0.0, radius)];
    }

    let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
    let last = (count - 1) as f32;

    (0..count)
        .map(|i| {
            let y = 1.0 - (i as f32 / last) * 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = i as f32 * golden_angle;
            Vector3::new(theta.cos() * r * radius, y * radius, theta.sin() * r * radius)
        })
        .collect()
}

/// Grows slowly with the item count to reduce crowding
pub fn density_factor(count: usize) -> f32 {
    1.0 + (1.0 + count as f32).ln() / 4.0
}

/// Radius actually used for the sphere
pub fn effective_radius(base: f32, count: usize, media_scale: f32) -> f32 {
    let scale_factor = if media_scale.is_finite() {
        media_scale.max(MIN_SCALE_FACTOR)
    } else {
        1.0
    };
    (base * density_factor(count) * scale_factor).clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Square-ish grid on the z = 0 plane, centred on the origin, filled row by row
/// from the top left
pub fn tile_layout(count: usize, card: f32, gap: f32) -> Vec<Vector3<f32>> {
    let count = count.max(1);
    let columns = (count as f32).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);
    let step = card + gap;

    let width = (columns - 1) as f32 * step;
    let height = (rows - 1) as f32 * step;

    (0..count)
        .map(|i| {
            let col = (i % columns) as f32;
            let row = (i / columns) as f32;
            Vector3::new(col * step - width / 2.0, height / 2.0 - row * step, 0.0)
        })
        .collect()
}

/// Ring on the XZ plane; item 0 faces the default camera
pub fn carousel_layout(count: usize, radius: f32) -> Vec<Vector3<f32>> {
    let count = count.max(1);
    let step = 2.0 * PI / count as f32;
    (0..count)
        .map(|i| {
            let angle = i as f32 * step;
            Vector3::new(angle.sin() * radius, 0.0, angle.cos() * radius)
        })
        .collect()
}

/// Ring radius that keeps neighbouring cards from overlapping
pub fn carousel_radius(count: usize, card: f32, gap: f32) -> f32 {
    let circumference = count.max(1) as f32 * (card + gap);
    (circumference / (2.0 * PI)).max(MIN_RADIUS)
}

/// Card edge length for a config
pub fn card_size(config: &LayoutConfig) -> f32 {
    CARD_SIZE * config.media_scale
}

/// Positions for `count` items under a layout config
pub fn positions_for(config: &LayoutConfig, count: usize) -> Vec<Vector3<f32>> {
    let card = card_size(config);
    match config.view_mode {
        ViewMode::Sphere => sphere_layout(
            count,
            effective_radius(config.sphere_base, count, config.media_scale),
        ),
        ViewMode::Tile => tile_layout(count, card, config.tile_gap),
        ViewMode::Carousel => {
            carousel_layout(count, carousel_radius(count, card, config.tile_gap))
        }
    }
}

/// Radius of the smallest origin-centred sphere containing every position
pub fn bounding_radius(positions: &[Vector3<f32>]) -> f32 {
    positions
        .iter()
        .map(|p| p.magnitude())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_single_item_sits_in_front() {
        assert_eq!(sphere_layout(1, 50.0), vec![Vector3::new(0.0, 0.0, 50.0)]);
        assert_eq!(sphere_layout(0, 50.0), vec![Vector3::new(0.0, 0.0, 50.0)]);
    }

    #[test]
    fn test_points_lie_on_sphere() {
        for count in [2, 3, 10, 57, 300] {
            let points = sphere_layout(count, 80.0);
            assert_eq!(points.len(), count);
            for p in &points {
                assert!((p.magnitude() - 80.0).abs() < EPS * 80.0, "{count}: {p:?}");
            }
        }
    }

    #[test]
    fn test_points_are_distinct() {
        let points = sphere_layout(200, 60.0);
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                assert!((points[i] - points[j]).magnitude() > 0.01, "{i} == {j}");
            }
        }
    }

    #[test]
    fn test_poles_and_determinism() {
        let points = sphere_layout(5, 10.0);
        assert!((points[0].y - 10.0).abs() < EPS);
        assert!((points[4].y + 10.0).abs() < EPS);
        assert_eq!(points, sphere_layout(5, 10.0));
    }

    #[test]
    fn test_effective_radius_clamps() {
        assert_eq!(effective_radius(1.0, 3, 1.0), MIN_RADIUS);
        assert_eq!(effective_radius(500.0, 3, 1.0), MAX_RADIUS);

        // scale factor never drops below 0.6
        assert_eq!(
            effective_radius(60.0, 10, 0.1),
            effective_radius(60.0, 10, 0.6)
        );

        // more items, bigger sphere
        assert!(effective_radius(40.0, 100, 1.0) > effective_radius(40.0, 5, 1.0));
    }

    #[test]
    fn test_tile_layout_grid() {
        let points = tile_layout(4, 10.0, 2.0);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Vector3::new(-6.0, 6.0, 0.0));
        assert_eq!(points[3], Vector3::new(6.0, -6.0, 0.0));

        let points = tile_layout(5, 10.0, 0.0);
        // 3 columns, 2 rows
        assert_eq!(points[3].x, points[0].x);
        assert!(points[3].y < points[0].y);
    }

    #[test]
    fn test_carousel_ring() {
        let points = carousel_layout(4, 30.0);
        assert!((points[0] - Vector3::new(0.0, 0.0, 30.0)).magnitude() < EPS);
        assert!((points[2] - Vector3::new(0.0, 0.0, -30.0)).magnitude() < EPS);
        for p in &points {
            assert!(p.y.abs() < EPS);
            assert!((p.magnitude() - 30.0).abs() < EPS);
        }
        assert!(carousel_radius(40, 12.0, 4.0) > carousel_radius(4, 12.0, 4.0));
    }

    #[test]
    fn test_positions_for_dispatches() {
        let mut config = LayoutConfig::default();
        let sphere = positions_for(&config, 12);
        assert_eq!(sphere.len(), 12);
        let r = effective_radius(config.sphere_base, 12, config.media_scale);
        assert!((bounding_radius(&sphere) - r).abs() < EPS * r);

        config.view_mode = ViewMode::Tile;
        assert!(positions_for(&config, 12).iter().all(|p| p.z == 0.0));
    }
}
