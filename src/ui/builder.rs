/// Builder panel
///
/// Side panel for editing the gallery: adding links, per-item titles and
/// descriptions, ordering, layout settings, owner details, and the
/// save / load / share controls. It only reads the session; every edit is a
/// `Message` handled in `main`.
use iced::widget::{
    button, column, container, horizontal_rule, pick_list, row, scrollable, slider, text,
    text_input, Column,
};
use iced::{Alignment, Element, Length};
use iced_aw::Wrap;

use crate::state::data::{GallerySummary, MediaItem};
use crate::state::session::Session;
use crate::state::settings::{ViewMode, MEDIA_SCALE_RANGE, SPHERE_BASE_RANGE, TILE_GAP_RANGE};
use crate::Message;

pub const PANEL_WIDTH: f32 = 400.0;
const ITEM_CARD_WIDTH: f32 = 178.0;

/// Text fields owned by the panel (not part of the gallery itself)
#[derive(Debug, Clone, Default)]
pub struct BuilderState {
    pub open: bool,
    pub url_input: String,
    pub bg_input: String,
    pub load_input: String,
    pub share_input: String,
    /// Last generated share link, shown for copying
    pub share_link: Option<String>,
}

impl BuilderState {
    pub fn new(bg_color: &str) -> Self {
        Self {
            open: true,
            bg_input: bg_color.to_string(),
            ..Self::default()
        }
    }
}

/// Everything the panel needs to render
pub struct BuilderView<'a> {
    pub state: &'a BuilderState,
    pub session: &'a Session,
    pub galleries: &'a [GallerySummary],
    pub persistence_available: bool,
}

fn section<'a>(title: &'a str) -> Element<'a, Message> {
    text(title).size(16).into()
}

fn item_card<'a>(index: usize, count: usize, item: &'a MediaItem) -> Element<'a, Message> {
    let id = item.id.clone();
    let title_id = item.id.clone();
    let description_id = item.id.clone();

    let mut up = button(text("↑").size(12)).padding([2, 6]);
    if index > 0 {
        up = up.on_press(Message::MoveItem(index, index - 1));
    }
    let mut down = button(text("↓").size(12)).padding([2, 6]);
    if index + 1 < count {
        down = down.on_press(Message::MoveItem(index, index + 1));
    }

    let controls = row![
        text(format!("{} · {}", index + 1, item.kind.label())).size(12).width(Length::Fill),
        up,
        down,
        button(text("✕").size(12))
            .padding([2, 6])
            .on_press(Message::RemoveItem(id)),
    ]
    .spacing(4)
    .align_y(Alignment::Center);

    let content = column![
        controls,
        text(item.label()).size(12),
        text_input("Title", item.title.as_deref().unwrap_or(""))
            .on_input(move |t| Message::TitleChanged(title_id.clone(), t))
            .size(12),
        text_input("Description", item.description.as_deref().unwrap_or(""))
            .on_input(move |d| Message::DescriptionChanged(description_id.clone(), d))
            .size(12),
    ]
    .spacing(4);

    container(content)
        .padding(6)
        .width(Length::Fixed(ITEM_CARD_WIDTH))
        .style(container::rounded_box)
        .into()
}

fn layout_controls<'a>(view: &BuilderView<'a>) -> Column<'a, Message> {
    let layout = view.session.layout();

    column![
        section("Layout"),
        row![
            text("View").width(Length::Fixed(110.0)),
            pick_list(ViewMode::ALL, Some(layout.view_mode), Message::ViewModeSelected),
        ]
        .align_y(Alignment::Center),
        row![
            text(format!("Media scale {:.2}", layout.media_scale)).width(Length::Fixed(110.0)),
            slider(
                MEDIA_SCALE_RANGE.0..=MEDIA_SCALE_RANGE.1,
                layout.media_scale,
                Message::MediaScaleChanged
            )
            .step(0.05),
        ]
        .align_y(Alignment::Center),
        row![
            text(format!("Sphere {:.0}", layout.sphere_base)).width(Length::Fixed(110.0)),
            slider(
                SPHERE_BASE_RANGE.0..=SPHERE_BASE_RANGE.1,
                layout.sphere_base,
                Message::SphereBaseChanged
            )
            .step(1.0),
        ]
        .align_y(Alignment::Center),
        row![
            text(format!("Tile gap {:.0}", layout.tile_gap)).width(Length::Fixed(110.0)),
            slider(
                TILE_GAP_RANGE.0..=TILE_GAP_RANGE.1,
                layout.tile_gap,
                Message::TileGapChanged
            )
            .step(1.0),
        ]
        .align_y(Alignment::Center),
        row![
            text(format!("Shadow {:.2}", layout.shadow_opacity)).width(Length::Fixed(110.0)),
            slider(0.0..=1.0, layout.shadow_opacity, Message::ShadowOpacityChanged).step(0.05),
        ]
        .align_y(Alignment::Center),
        row![
            text("Background").width(Length::Fixed(110.0)),
            text_input("#0b0b10", &view.state.bg_input).on_input(Message::BgColorChanged),
        ]
        .align_y(Alignment::Center),
    ]
    .spacing(8)
}

fn meta_controls<'a>(view: &BuilderView<'a>) -> Column<'a, Message> {
    let meta = view.session.meta();
    column![
        section("Details"),
        text_input("Display name", meta.display_name.as_deref().unwrap_or(""))
            .on_input(Message::DisplayNameChanged),
        text_input("WhatsApp", meta.whatsapp.as_deref().unwrap_or(""))
            .on_input(Message::WhatsappChanged),
        text_input("Email", meta.email.as_deref().unwrap_or("")).on_input(Message::EmailChanged),
    ]
    .spacing(8)
}

fn persistence_controls<'a>(view: &BuilderView<'a>) -> Column<'a, Message> {
    let mut col = column![section("Save & share")].spacing(8);

    let identity = match view.session.identity() {
        Some(identity) if view.session.is_dirty() => format!("{} (unsaved changes)", identity.slug),
        Some(identity) => identity.slug.clone(),
        None => "not saved yet".to_string(),
    };
    col = col.push(text(format!("Gallery: {identity}")).size(12));

    let available = view.persistence_available;
    let mut save = button("Save");
    let mut save_new = button("Save as new");
    if available && !view.session.items().is_empty() {
        save = save.on_press(Message::Save);
        save_new = save_new.on_press(Message::SaveAsNew);
    }
    col = col.push(
        row![
            save,
            save_new,
            button("Share link").on_press(Message::GenerateShareLink)
        ]
        .spacing(8),
    );

    if let Some(link) = &view.state.share_link {
        col = col.push(text_input("", link).size(12));
    }

    col = col.push(
        row![
            text_input("Paste a share link", &view.state.share_input)
                .on_input(Message::ShareInputChanged)
                .on_submit(Message::OpenShareLink),
            button("Open").on_press(Message::OpenShareLink),
        ]
        .spacing(8),
    );

    if available {
        col = col.push(
            row![
                text_input("Gallery slug", &view.state.load_input)
                    .on_input(Message::LoadInputChanged)
                    .on_submit(Message::LoadGallery(view.state.load_input.clone())),
                button("Load").on_press(Message::LoadGallery(view.state.load_input.clone())),
            ]
            .spacing(8),
        );

        col = col.push(
            row![
                text("My galleries").size(14).width(Length::Fill),
                button(text("Refresh").size(12)).on_press(Message::RefreshGalleries),
            ]
            .align_y(Alignment::Center),
        );
        for gallery in view.galleries {
            let name = gallery
                .display_name
                .clone()
                .unwrap_or_else(|| gallery.slug.clone());
            col = col.push(
                row![
                    button(text(format!("{name} · {} items", gallery.item_count)).size(12))
                        .width(Length::Fill)
                        .on_press(Message::LoadGallery(gallery.slug.clone())),
                    button(text("Delete").size(12))
                        .on_press(Message::DeleteGallery(gallery.id.clone())),
                ]
                .spacing(6),
            );
        }
    } else {
        col = col.push(text("Catalog unavailable: saving and loading are disabled").size(12));
    }

    col
}

pub fn view<'a>(panel: BuilderView<'a>) -> Element<'a, Message> {
    let items = panel.session.items();
    let count = items.len();

    let add = row![
        text_input("Paste image, video, YouTube, Vimeo or Drive links", &panel.state.url_input)
            .on_input(Message::UrlInputChanged)
            .on_submit(Message::AddUrls),
        button("Add").on_press(Message::AddUrls),
    ]
    .spacing(8);

    let cards: Vec<Element<'a, Message>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| item_card(index, count, item))
        .collect();

    let content = column![
        row![
            text("Builder").size(24).width(Length::Fill),
            button(text("Hide").size(12)).on_press(Message::ToggleBuilder),
        ]
        .align_y(Alignment::Center),
        section("Media"),
        add,
        row![
            button(text("Import folder").size(12)).on_press(Message::ImportFolder),
            button(text("Clear").size(12)).on_press(Message::ClearGallery),
        ]
        .spacing(8),
        Wrap::with_elements(cards).spacing(8.0).line_spacing(8.0),
        horizontal_rule(1),
        layout_controls(&panel),
        horizontal_rule(1),
        meta_controls(&panel),
        horizontal_rule(1),
        persistence_controls(&panel),
    ]
    .spacing(12)
    .padding(16);

    container(scrollable(content).height(Length::Fill))
        .width(Length::Fixed(PANEL_WIDTH))
        .height(Length::Fill)
        .style(container::bordered_box)
        .into()
}
