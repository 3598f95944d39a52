/// Orbit camera around the scene origin
///
/// The camera always looks at the origin. Yaw/pitch place it on a sphere of
/// radius `distance`; yaw = pitch = 0 puts it on the +Z axis.
use cgmath::{perspective, Deg, EuclideanSpace, Matrix4, Point3, Rad, Vector3, Vector4};

/// Keep away from the poles so `look_at` stays well defined
const MAX_PITCH: f32 = 1.4;

/// Camera distance relative to the content radius
const FIT_DISTANCE: f32 = 2.6;
const MIN_DISTANCE: f32 = 1.25;
const MAX_DISTANCE: f32 = 6.0;

/// Radians per pixel of drag
const DRAG_SENSITIVITY: f32 = 0.005;

/// Radians per second of idle rotation
const AUTO_ROTATE_SPEED: f32 = 0.08;

const NEAR: f32 = 0.5;
const FAR: f32 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    /// Radius of the content being framed
    content_radius: f32,
}

/// A world point mapped into the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    /// Pixels per world unit at this depth
    pub scale: f32,
    /// Distance along the view direction
    pub depth: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 60.0 * FIT_DISTANCE,
            fov_y: 45.0,
            content_radius: 60.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move back far enough to see content of the given radius
    pub fn frame(&mut self, content_radius: f32) {
        let radius = content_radius.max(1.0);
        self.content_radius = radius;
        self.distance = radius * FIT_DISTANCE;
    }

    /// Face the scene head-on (used by tile mode)
    pub fn reset_orientation(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    pub fn eye(&self) -> Point3<f32> {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Point3::new(
            self.distance * cp * sy,
            self.distance * sp,
            self.distance * cp * cy,
        )
    }

    /// Drag by a pixel delta
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * DRAG_SENSITIVITY;
        self.pitch = (self.pitch + dy * DRAG_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Zoom by wheel lines; positive moves closer
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - lines * 0.1).clamp(0.5, 1.5);
        self.distance = (self.distance * factor).clamp(
            self.content_radius * MIN_DISTANCE,
            self.content_radius * MAX_DISTANCE,
        );
    }

    /// Idle spin
    pub fn auto_rotate(&mut self, dt_seconds: f32) {
        self.yaw += AUTO_ROTATE_SPEED * dt_seconds;
    }

    fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.eye(), Point3::origin(), Vector3::unit_y());
        let proj = perspective(Deg(self.fov_y), aspect.max(0.01), NEAR, FAR);
        proj * view
    }

    /// Project a world position into a viewport of `width` x `height` pixels
    ///
    /// Returns `None` for points behind the camera.
    pub fn project(&self, world: Vector3<f32>, width: f32, height: f32) -> Option<Projected> {
        let clip = self.view_projection(width / height.max(1.0)) * world.extend(1.0);
        project_clip(clip, self.fov_y, width, height)
    }
}

fn project_clip(clip: Vector4<f32>, fov_y: f32, width: f32, height: f32) -> Option<Projected> {
    // w is the view-space depth for a perspective matrix
    if clip.w <= NEAR {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let half_fov: Rad<f32> = Deg(fov_y / 2.0).into();
    let scale = (height / 2.0) / (half_fov.0.tan() * clip.w);

    Some(Projected {
        x: (ndc_x + 1.0) / 2.0 * width,
        y: (1.0 - ndc_y) / 2.0 * height,
        scale,
        depth: clip.w,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::MetricSpace;

    #[test]
    fn test_default_eye_on_positive_z() {
        let mut camera = OrbitCamera::new();
        camera.frame(10.0);
        let eye = camera.eye();
        assert!(eye.x.abs() < 1e-4);
        assert!(eye.y.abs() < 1e-4);
        assert!((eye.z - 26.0).abs() < 1e-4);
    }

    #[test]
    fn test_origin_projects_to_centre() {
        let camera = OrbitCamera::new();
        let p = camera.project(Vector3::new(0.0, 0.0, 0.0), 800.0, 600.0).unwrap();
        assert!((p.x - 400.0).abs() < 0.5);
        assert!((p.y - 300.0).abs() < 0.5);
        assert!((p.depth - camera.distance).abs() < 1e-2);
    }

    #[test]
    fn test_closer_points_are_bigger() {
        let camera = OrbitCamera::new();
        let near = camera.project(Vector3::new(0.0, 0.0, 30.0), 800.0, 600.0).unwrap();
        let far = camera.project(Vector3::new(0.0, 0.0, -30.0), 800.0, 600.0).unwrap();
        assert!(near.scale > far.scale);
        assert!(near.depth < far.depth);
    }

    #[test]
    fn test_points_behind_camera_are_dropped() {
        let camera = OrbitCamera::new();
        let behind = Vector3::new(0.0, 0.0, camera.distance + 10.0);
        assert!(camera.project(behind, 800.0, 600.0).is_none());
    }

    #[test]
    fn test_up_is_up_on_screen() {
        let camera = OrbitCamera::new();
        let p = camera.project(Vector3::new(0.0, 10.0, 0.0), 800.0, 600.0).unwrap();
        assert!(p.y < 300.0);
    }

    #[test]
    fn test_rotate_and_zoom_limits() {
        let mut camera = OrbitCamera::new();
        camera.frame(10.0);
        camera.rotate(0.0, 10_000.0);
        assert_eq!(camera.pitch, MAX_PITCH);

        for _ in 0..100 {
            camera.zoom(5.0);
        }
        assert!((camera.distance - 12.5).abs() < 1e-3);

        // orbiting keeps the distance
        let before = camera.eye().distance(Point3::origin());
        camera.rotate(250.0, 0.0);
        let after = camera.eye().distance(Point3::origin());
        assert!((before - after).abs() < 1e-3);
    }
}
