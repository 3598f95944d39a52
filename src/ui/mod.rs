/// Views
///
/// - `gallery.rs` - canvas program for the 3D scene (orbit, hover, click)
/// - `lightbox.rs` - full-size viewer state machine and overlay
/// - `builder.rs` - side panel for editing, saving and sharing

pub mod builder;
pub mod gallery;
pub mod lightbox;
