/// Lightbox: full-size viewer over the scene
///
/// State machine:
/// - Closed -> Opening on `select`
/// - Closed -> Poster on `select` of a video: nothing decodable to fetch,
///   the viewer shows a poster card with the link
/// - Opening -> Open when the full asset arrives
/// - Opening -> Error when it fails; the error state then shows the item's
///   fallback preview once that has loaded
/// - any -> Closed on `close` (background click, close button, Escape)
///
/// Only one item is ever in the viewer. Selecting another item while one is
/// open replaces it; every selection bumps a generation counter so a late
/// result for the replaced item is ignored.
use iced::widget::{button, column, container, image, mouse_area, row, text, Space};
use iced::{Alignment, Background, Color, Element, Length};

use crate::media::loader::LoadedAsset;
use crate::state::data::{MediaItem, MediaKind};
use crate::Message;

#[derive(Debug, Clone)]
pub enum LightboxState {
    Closed,
    Opening {
        item_id: String,
    },
    Poster {
        item_id: String,
    },
    Open {
        item_id: String,
        asset: LoadedAsset,
    },
    Error {
        item_id: String,
        fallback: Option<LoadedAsset>,
    },
}

/// Something the caller should fetch for the viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct Lightbox {
    state: LightboxState,
    generation: u64,
    /// URL the current request is for, so the fallback is not retried with it
    requested_url: Option<String>,
    fallback_url: Option<String>,
}

impl Default for Lightbox {
    fn default() -> Self {
        Self {
            state: LightboxState::Closed,
            generation: 0,
            requested_url: None,
            fallback_url: None,
        }
    }
}

/// The asset the viewer fetches for an item
///
/// There is no embedded player: embeds show their thumbnail and videos
/// fetch nothing.
pub fn viewer_url(item: &MediaItem) -> Option<&str> {
    match item.kind {
        MediaKind::Image => Some(&item.full_url),
        MediaKind::Embed => Some(&item.preview_url),
        MediaKind::Video => None,
    }
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LightboxState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, LightboxState::Closed)
    }

    /// Id of the item in the viewer, if any
    pub fn item_id(&self) -> Option<&str> {
        match &self.state {
            LightboxState::Closed => None,
            LightboxState::Opening { item_id }
            | LightboxState::Poster { item_id }
            | LightboxState::Open { item_id, .. }
            | LightboxState::Error { item_id, .. } => Some(item_id),
        }
    }

    /// Open (or replace) the viewer with an item. Returns what to fetch,
    /// or `None` when the item is shown without an asset.
    pub fn select(&mut self, item: &MediaItem) -> Option<LoadRequest> {
        self.generation += 1;
        let item_id = item.id.clone();
        let Some(url) = viewer_url(item) else {
            self.requested_url = None;
            self.fallback_url = None;
            self.state = LightboxState::Poster { item_id };
            return None;
        };

        let url = url.to_string();
        self.requested_url = Some(url.clone());
        self.fallback_url = Some(item.fallback_url().to_string());
        self.state = LightboxState::Opening { item_id };
        Some(LoadRequest {
            url,
            generation: self.generation,
        })
    }

    /// Full asset arrived; ignored unless it answers the current request
    pub fn loaded(&mut self, generation: u64, asset: LoadedAsset) {
        if generation != self.generation {
            return;
        }
        match std::mem::replace(&mut self.state, LightboxState::Closed) {
            LightboxState::Opening { item_id } => {
                self.state = LightboxState::Open { item_id, asset };
            }
            LightboxState::Error { item_id, .. } => {
                // Fallback preview for an errored item
                self.state = LightboxState::Error {
                    item_id,
                    fallback: Some(asset),
                };
            }
            other => self.state = other,
        }
    }

    /// Load failed. Returns a request for the fallback preview when there is
    /// one worth trying.
    pub fn failed(&mut self, generation: u64, reason: &str) -> Option<LoadRequest> {
        if generation != self.generation {
            return None;
        }
        match std::mem::replace(&mut self.state, LightboxState::Closed) {
            LightboxState::Opening { item_id } => {
                log::warn!("⚠️  Lightbox asset failed for {}: {}", item_id, reason);
                self.state = LightboxState::Error {
                    item_id,
                    fallback: None,
                };
                let fallback = self.fallback_url.take()?;
                if Some(&fallback) == self.requested_url.as_ref() {
                    return None;
                }
                self.requested_url = Some(fallback.clone());
                Some(LoadRequest {
                    url: fallback,
                    generation: self.generation,
                })
            }
            LightboxState::Error { item_id, .. } => {
                log::warn!("⚠️  Fallback preview failed for {}: {}", item_id, reason);
                self.state = LightboxState::Error {
                    item_id,
                    fallback: None,
                };
                None
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn close(&mut self) {
        self.generation += 1;
        self.requested_url = None;
        self.fallback_url = None;
        self.state = LightboxState::Closed;
    }
}

/// Overlay content; `None` while closed
pub fn view<'a>(
    lightbox: &'a Lightbox,
    item: Option<&'a MediaItem>,
) -> Option<Element<'a, Message>> {
    let item = item?;
    let body: Element<'a, Message> = match lightbox.state() {
        LightboxState::Closed => return None,
        LightboxState::Opening { .. } => text("Loading…").size(18).into(),
        LightboxState::Poster { .. } => container(
            column![text("▶").size(96), text(item.original_url.as_str()).size(14)]
                .spacing(12)
                .align_x(Alignment::Center),
        )
        .padding(48)
        .style(container::rounded_box)
        .into(),
        LightboxState::Open { asset, .. } => image(asset.handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        LightboxState::Error {
            fallback: Some(asset),
            ..
        } => image(asset.handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        LightboxState::Error { fallback: None, .. } => {
            text(format!("Could not load {}", item.label())).size(16).into()
        }
    };

    let mut caption = column![text(item.label()).size(20)].spacing(6);
    if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
        caption = caption.push(text(description).size(14));
    }
    if item.kind != MediaKind::Image {
        caption = caption.push(
            text(format!("{} · {}", item.kind.label(), item.full_url)).size(12),
        );
    }

    let header = row![
        Space::with_width(Length::Fill),
        button(text("✕").size(18)).on_press(Message::CloseLightbox).padding(8),
    ]
    .align_y(Alignment::Center);

    // Clicks on the content itself must not close the viewer
    let content = mouse_area(
        container(column![body, caption].spacing(12).align_x(Alignment::Center))
            .padding(16)
            .max_width(1200),
    )
    .on_press(Message::Noop);

    let backdrop = mouse_area(
        container(column![header, content].spacing(8))
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(24)
            .center_x(Length::Fill)
            .style(|_| container::Style {
                background: Some(Background::Color(Color::from_rgba(0.0, 0.0, 0.0, 0.85))),
                ..container::Style::default()
            }),
    )
    .on_press(Message::CloseLightbox);

    Some(backdrop.into())
}
