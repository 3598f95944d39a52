/// 3D scene math
///
/// - `layout.rs` - sphere, tile and carousel placement
/// - `camera.rs` - orbit camera and projection into the viewport
/// - `visibility.rs` - front-facing culling and per-item runtime flags
///
/// Nothing here touches iced; the canvas in `ui::gallery` drives it.

pub mod camera;
pub mod layout;
pub mod visibility;
