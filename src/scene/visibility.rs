/// Front-facing test and per-item runtime state
///
/// Items on the far side of the sphere are dropped from the render set
/// every tick rather than merely hidden, which bounds how many expensive
/// cards (playing video, embeds) are live at once. The test assumes items
/// sit on or near an origin-centred sphere: an item is in front when it is
/// closer to the camera than the centre is, plus a tolerance of
/// `tolerance * radius²` that damps flicker near the rim.
use cgmath::{InnerSpace, Point3, Vector3};

use crate::state::settings::ViewMode;

pub const DEFAULT_TOLERANCE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityPolicy {
    /// Multiplier on radius² added to the camera-to-centre distance
    pub tolerance: f32,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl VisibilityPolicy {
    pub fn new(tolerance: f32) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance >= 0.0 {
            tolerance
        } else {
            DEFAULT_TOLERANCE
        };
        Self { tolerance }
    }

    /// Tile mode is a flat wall facing the camera, nothing to cull
    pub fn applies_to(mode: ViewMode) -> bool {
        matches!(mode, ViewMode::Sphere | ViewMode::Carousel)
    }

    pub fn is_front_facing(&self, item: Vector3<f32>, camera: Point3<f32>, radius: f32) -> bool {
        let camera = Vector3::new(camera.x, camera.y, camera.z);
        let item_dist2 = (item - camera).magnitude2();
        let centre_dist2 = camera.magnitude2();
        item_dist2 < centre_dist2 + radius * radius * self.tolerance
    }

    /// Indices of the items that should render this tick
    pub fn cull(
        &self,
        mode: ViewMode,
        positions: &[Vector3<f32>],
        camera: Point3<f32>,
        radius: f32,
    ) -> Vec<usize> {
        if !Self::applies_to(mode) {
            return (0..positions.len()).collect();
        }
        positions
            .iter()
            .enumerate()
            .filter(|(_, p)| self.is_front_facing(**p, camera, radius))
            .map(|(i, _)| i)
            .collect()
    }
}

/// What the current device can afford
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceProfile {
    /// Low-power or touch device: no idle animation, no autoplay
    pub constrained: bool,
}

impl DeviceProfile {
    pub fn micro_animation(self) -> bool {
        !self.constrained
    }

    pub fn autoplay(self) -> bool {
        !self.constrained
    }
}

/// Runtime flags for one rendered item
///
/// Owned by whatever renders the item. `active` means the media is playing
/// (videos, embeds) and is only ever true while the item is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemRuntime {
    pub loaded: bool,
    pub failed: bool,
    pub visible: bool,
    pub hovered: bool,
    pub active: bool,
}

impl ItemRuntime {
    pub fn on_loaded(&mut self) {
        self.loaded = true;
        self.failed = false;
    }

    /// The card keeps its placeholder; the preview is not fetched again
    pub fn on_failed(&mut self) {
        self.failed = true;
        self.loaded = false;
    }

    /// Visible with no preview yet and no earlier failure
    pub fn needs_preview(&self) -> bool {
        self.visible && !self.loaded && !self.failed
    }

    pub fn on_visibility(&mut self, visible: bool, device: DeviceProfile) {
        self.visible = visible;
        if !visible {
            self.hovered = false;
        }
        self.refresh(device);
    }

    pub fn on_hover_start(&mut self, device: DeviceProfile) {
        self.hovered = true;
        self.refresh(device);
    }

    /// Pauses immediately unless autoplay keeps it running
    pub fn on_hover_end(&mut self, device: DeviceProfile) {
        self.hovered = false;
        self.refresh(device);
    }

    fn refresh(&mut self, device: DeviceProfile) {
        self.active = self.visible && (self.hovered || device.autoplay());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Point3<f32> {
        Point3::new(0.0, 0.0, 130.0)
    }

    #[test]
    fn test_opposite_item_is_culled() {
        let policy = VisibilityPolicy::default();
        assert!(!policy.is_front_facing(Vector3::new(0.0, 0.0, -50.0), camera(), 50.0));
    }

    #[test]
    fn test_item_between_camera_and_centre_is_front() {
        let policy = VisibilityPolicy::default();
        assert!(policy.is_front_facing(Vector3::new(0.0, 0.0, 50.0), camera(), 50.0));
        assert!(policy.is_front_facing(Vector3::new(0.0, 0.0, 0.0), camera(), 50.0));
    }

    #[test]
    fn test_tolerance_widens_the_rim() {
        // on the rim, exactly as far as the centre plus radius²
        let rim = Vector3::new(50.0, 0.0, 0.0);
        assert!(!VisibilityPolicy::new(0.0).is_front_facing(rim, camera(), 50.0));
        assert!(VisibilityPolicy::new(1.5).is_front_facing(rim, camera(), 50.0));
        assert_eq!(VisibilityPolicy::new(f32::NAN).tolerance, DEFAULT_TOLERANCE);
    }

    #[test]
    fn test_cull_keeps_roughly_half_the_sphere() {
        let positions = crate::scene::layout::sphere_layout(100, 50.0);
        let policy = VisibilityPolicy::default();
        let visible = policy.cull(ViewMode::Sphere, &positions, camera(), 50.0);
        assert!(visible.len() > 30 && visible.len() < 80, "{}", visible.len());

        let all = policy.cull(ViewMode::Tile, &positions, camera(), 50.0);
        assert_eq!(all.len(), 100);
    }

    #[test]
    fn test_constrained_device_needs_hover() {
        let device = DeviceProfile { constrained: true };
        let mut item = ItemRuntime::default();
        item.on_visibility(true, device);
        assert!(!item.active);

        item.on_hover_start(device);
        assert!(item.active);

        item.on_hover_end(device);
        assert!(!item.active);
    }

    #[test]
    fn test_autoplay_only_while_visible() {
        let device = DeviceProfile::default();
        let mut item = ItemRuntime::default();
        item.on_visibility(true, device);
        assert!(item.active);

        item.on_hover_start(device);
        item.on_visibility(false, device);
        assert!(!item.active);
        assert!(!item.hovered);
    }

    #[test]
    fn test_load_transitions() {
        let mut item = ItemRuntime::default();
        item.on_failed();
        assert!(item.failed && !item.loaded);
        item.on_loaded();
        assert!(item.loaded && !item.failed);
    }

    #[test]
    fn test_failed_preview_is_not_requested_again() {
        let device = DeviceProfile::default();
        let mut item = ItemRuntime::default();
        assert!(!item.needs_preview());

        item.on_visibility(true, device);
        assert!(item.needs_preview());

        item.on_failed();
        assert!(!item.needs_preview());
        item.on_visibility(false, device);
        item.on_visibility(true, device);
        assert!(!item.needs_preview());

        let mut loaded = ItemRuntime::default();
        loaded.on_visibility(true, device);
        loaded.on_loaded();
        assert!(!loaded.needs_preview());
    }
}
