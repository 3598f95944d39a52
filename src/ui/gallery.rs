use cgmath::Vector3;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};
use std::collections::HashMap;

use crate::media::loader::LoadedAsset;
use crate::scene::camera::OrbitCamera;
use crate::scene::layout;
use crate::scene::visibility::ItemRuntime;
use crate::state::data::{MediaItem, MediaKind};
use crate::state::settings::LayoutConfig;
use crate::Message;

/// A press that moves less than this is a click, not a drag
const CLICK_SLOP: f32 = 4.0;

/// Canvas program drawing the gallery scene
///
/// Borrowed from the app for one frame. Only items in `visible` are drawn
/// or hit-tested; the app recomputes that list on every tick.
pub struct GalleryScene<'a> {
    pub items: &'a [MediaItem],
    pub positions: &'a [Vector3<f32>],
    pub visible: &'a [usize],
    pub layout: &'a LayoutConfig,
    pub camera: &'a OrbitCamera,
    pub runtime: &'a HashMap<String, ItemRuntime>,
    pub previews: &'a HashMap<String, LoadedAsset>,
}

/// A card placed on screen
#[derive(Debug, Clone, Copy)]
struct Card {
    index: usize,
    rect: Rectangle,
    depth: f32,
}

impl<'a> GalleryScene<'a> {
    /// Visible cards, far to near
    fn cards(&self, size: Size) -> Vec<Card> {
        let card_size = layout::card_size(self.layout);
        let mut cards: Vec<Card> = self
            .visible
            .iter()
            .filter_map(|&index| {
                let item = self.items.get(index)?;
                let position = *self.positions.get(index)?;
                let projected = self.camera.project(position, size.width, size.height)?;

                let aspect = item.display_aspect().sqrt();
                let width = card_size * aspect * projected.scale;
                let height = card_size / aspect * projected.scale;
                Some(Card {
                    index,
                    rect: Rectangle::new(
                        Point::new(projected.x - width / 2.0, projected.y - height / 2.0),
                        Size::new(width, height),
                    ),
                    depth: projected.depth,
                })
            })
            .collect();

        cards.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        cards
    }

    /// Nearest card under a point
    fn hit(&self, size: Size, point: Point) -> Option<usize> {
        self.cards(size)
            .into_iter()
            .rev()
            .find(|card| card.rect.contains(point))
            .map(|card| card.index)
    }

    fn draw_card(&self, frame: &mut canvas::Frame, card: &Card) {
        let item = &self.items[card.index];
        let state = self.runtime.get(&item.id).copied().unwrap_or_default();
        let rect = card.rect;

        // Drop shadow
        if self.layout.shadow_opacity > 0.0 {
            let offset = rect.height * 0.04;
            frame.fill_rectangle(
                Point::new(rect.x + offset, rect.y + offset * 2.0),
                rect.size(),
                Color::from_rgba(0.0, 0.0, 0.0, self.layout.shadow_opacity),
            );
        }

        match self.previews.get(&item.id) {
            Some(asset) => frame.draw_image(rect, &asset.handle),
            None => {
                frame.fill_rectangle(
                    rect.position(),
                    rect.size(),
                    placeholder_color(item.kind, state),
                );
                let glyph = match item.kind {
                    MediaKind::Image if state.failed => "⚠",
                    MediaKind::Image => "…",
                    MediaKind::Video | MediaKind::Embed => "▶",
                };
                frame.fill_text(canvas::Text {
                    content: glyph.to_string(),
                    position: rect.center(),
                    color: Color::WHITE,
                    size: Pixels((rect.height * 0.3).clamp(8.0, 48.0)),
                    horizontal_alignment: iced::alignment::Horizontal::Center,
                    vertical_alignment: iced::alignment::Vertical::Center,
                    ..canvas::Text::default()
                });
            }
        }

        if state.hovered || (state.active && item.kind != MediaKind::Image) {
            let border = canvas::Path::rectangle(rect.position(), rect.size());
            let color = if state.hovered {
                Color::WHITE
            } else {
                Color::from_rgb(0.35, 0.75, 1.0)
            };
            frame.stroke(
                &border,
                canvas::Stroke::default().with_color(color).with_width(2.0),
            );
        }

        if state.hovered && rect.width > 60.0 {
            frame.fill_text(canvas::Text {
                content: item.label(),
                position: Point::new(rect.x, rect.y + rect.height + 4.0),
                color: Color::WHITE,
                size: Pixels(13.0),
                ..canvas::Text::default()
            });
        }
    }
}

fn placeholder_color(kind: MediaKind, state: ItemRuntime) -> Color {
    if state.failed {
        return Color::from_rgb(0.35, 0.12, 0.12);
    }
    match kind {
        MediaKind::Image => Color::from_rgb(0.18, 0.18, 0.22),
        MediaKind::Video => Color::from_rgb(0.12, 0.2, 0.3),
        MediaKind::Embed => Color::from_rgb(0.3, 0.12, 0.16),
    }
}

impl<'a> Program<Message> for GalleryScene<'a> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let [r, g, b] = self.layout.bg_rgb();
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::from_rgb(r, g, b));

        if self.items.is_empty() {
            frame.fill_text(canvas::Text {
                content: "Add some links in the builder to get started".to_string(),
                position: frame.center(),
                color: Color::from_rgba(1.0, 1.0, 1.0, 0.6),
                size: Pixels(18.0),
                horizontal_alignment: iced::alignment::Horizontal::Center,
                vertical_alignment: iced::alignment::Vertical::Center,
                ..canvas::Text::default()
            });
            return vec![frame.into_geometry()];
        }

        for card in self.cards(bounds.size()) {
            self.draw_card(&mut frame, &card);
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    let lines = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y / 40.0,
                    };
                    return (canvas::event::Status::Captured, Some(Message::Zoom(lines)));
                }
            }

            // Mouse button press - start dragging
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.is_dragging = true;
                    state.press_position = Some(pos);
                    state.last_position = Some(pos);
                    state.moved = 0.0;
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - a short press is a click on a card
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let was_click = state.is_dragging && state.moved < CLICK_SLOP;
                let press = state.press_position;
                state.is_dragging = false;
                state.press_position = None;
                state.last_position = None;

                if was_click {
                    let message = press
                        .and_then(|p| self.hit(bounds.size(), p))
                        .map(|index| Message::OpenItem(self.items[index].id.clone()));
                    return (canvas::event::Status::Captured, message);
                }
                return (canvas::event::Status::Captured, Some(Message::OrbitEnded));
            }

            // Mouse move - orbit if dragging, otherwise track hover
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                let current = cursor.position_in(bounds);

                if state.is_dragging {
                    if let (Some(current_pos), Some(last_pos)) = (current, state.last_position) {
                        let dx = current_pos.x - last_pos.x;
                        let dy = current_pos.y - last_pos.y;
                        state.moved += dx.abs() + dy.abs();
                        state.last_position = Some(current_pos);
                        return (canvas::event::Status::Captured, Some(Message::Orbit(dx, dy)));
                    }
                }

                let hovered = current
                    .and_then(|p| self.hit(bounds.size(), p))
                    .map(|index| self.items[index].id.clone());
                if hovered != state.hovered {
                    state.hovered = hovered.clone();
                    return (canvas::event::Status::Captured, Some(Message::Hover(hovered)));
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorLeft) => {
                state.is_dragging = false;
                if state.hovered.take().is_some() {
                    return (canvas::event::Status::Captured, Some(Message::Hover(None)));
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging && state.moved >= CLICK_SLOP {
            mouse::Interaction::Grabbing
        } else if state.hovered.is_some() && cursor.is_over(bounds) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag and hover interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub press_position: Option<Point>,
    pub last_position: Option<Point>,
    /// Total pointer travel since the press, in pixels
    pub moved: f32,
    pub hovered: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::classify::classify;

    fn scene_parts(count: usize) -> (Vec<MediaItem>, Vec<Vector3<f32>>, LayoutConfig, OrbitCamera) {
        let items: Vec<MediaItem> = (0..count)
            .map(|i| classify(&format!("https://example.com/{i}.jpg")))
            .collect();
        let layout = LayoutConfig::default();
        let positions = layout::positions_for(&layout, count);
        let mut camera = OrbitCamera::new();
        camera.frame(layout::bounding_radius(&positions));
        (items, positions, layout, camera)
    }

    #[test]
    fn test_cards_are_sorted_far_to_near() {
        let (items, positions, layout, camera) = scene_parts(20);
        let visible: Vec<usize> = (0..items.len()).collect();
        let runtime = HashMap::new();
        let previews = HashMap::new();
        let scene = GalleryScene {
            items: &items,
            positions: &positions,
            visible: &visible,
            layout: &layout,
            camera: &camera,
            runtime: &runtime,
            previews: &previews,
        };

        let cards = scene.cards(Size::new(800.0, 600.0));
        assert_eq!(cards.len(), 20);
        assert!(cards.windows(2).all(|w| w[0].depth >= w[1].depth));
    }

    #[test]
    fn test_hit_only_considers_visible_items() {
        let (items, positions, layout, camera) = scene_parts(1);
        let runtime = HashMap::new();
        let previews = HashMap::new();
        let centre = Point::new(400.0, 300.0);

        let visible = vec![0];
        let scene = GalleryScene {
            items: &items,
            positions: &positions,
            visible: &visible,
            layout: &layout,
            camera: &camera,
            runtime: &runtime,
            previews: &previews,
        };
        assert_eq!(scene.hit(Size::new(800.0, 600.0), centre), Some(0));

        let hidden: Vec<usize> = Vec::new();
        let scene = GalleryScene {
            visible: &hidden,
            ..scene
        };
        assert_eq!(scene.hit(Size::new(800.0, 600.0), centre), None);
    }
}
