use cgmath::Vector3;
use iced::widget::{button, canvas, column, container, row, stack, text};
use iced::{keyboard, time, Element, Length, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod config;
mod error;
mod media;
mod scene;
mod state;
mod ui;

use config::AppConfig;
use media::import::{import_folder_async, ImportResult};
use media::loader::{self, LoadedAsset};
use scene::camera::OrbitCamera;
use scene::layout;
use scene::visibility::{DeviceProfile, ItemRuntime, VisibilityPolicy};
use state::data::{GalleryMeta, GallerySummary, MediaKind};
use state::library::{self as catalog, GalleryStore, Library, SaveMode};
use state::session::Session;
use state::settings::{parse_hex_color, ViewMode};
use state::share;
use ui::builder::{BuilderState, BuilderView};
use ui::gallery::GalleryScene;
use ui::lightbox::LoadRequest;

/// Frame interval for camera animation and visibility updates
const TICK: Duration = Duration::from_millis(16);

/// Main application state
struct MediaSphere {
    config: AppConfig,
    /// The gallery catalog; `None` when persistence is disabled or failed to open
    library: Option<Library>,
    /// Single owner of the gallery content
    session: Session,
    builder: BuilderState,
    galleries: Vec<GallerySummary>,
    cache_dir: PathBuf,

    camera: OrbitCamera,
    device: DeviceProfile,
    policy: VisibilityPolicy,
    positions: Vec<Vector3<f32>>,
    /// Radius of the layout sphere, for culling
    cull_radius: f32,
    /// Indices of the items in the render set this tick
    visible: Vec<usize>,

    /// Per-item runtime flags and preview textures, keyed by item id
    runtime: HashMap<String, ItemRuntime>,
    previews: HashMap<String, LoadedAsset>,
    pending: HashSet<String>,

    hovered: Option<String>,
    dragging: bool,
    last_tick: Option<Instant>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    Tick(Instant),
    Noop,

    // Scene
    Orbit(f32, f32),
    OrbitEnded,
    Zoom(f32),
    Hover(Option<String>),
    OpenItem(String),
    PreviewLoaded(String, Result<LoadedAsset, String>),

    // Lightbox
    LightboxLoaded(u64, Result<LoadedAsset, String>),
    CloseLightbox,

    // Builder: items
    ToggleBuilder,
    UrlInputChanged(String),
    AddUrls,
    RemoveItem(String),
    MoveItem(usize, usize),
    TitleChanged(String, String),
    DescriptionChanged(String, String),
    ClearGallery,
    ImportFolder,
    ImportComplete(ImportResult),

    // Builder: layout
    ViewModeSelected(ViewMode),
    MediaScaleChanged(f32),
    SphereBaseChanged(f32),
    TileGapChanged(f32),
    ShadowOpacityChanged(f32),
    BgColorChanged(String),

    // Builder: details
    DisplayNameChanged(String),
    WhatsappChanged(String),
    EmailChanged(String),

    // Builder: persistence and sharing
    Save,
    SaveAsNew,
    LoadInputChanged(String),
    LoadGallery(String),
    RefreshGalleries,
    DeleteGallery(String),
    GenerateShareLink,
    ShareInputChanged(String),
    OpenShareLink,
}

impl MediaSphere {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load();

        // The app works without a catalog; saving and loading are then refused
        let library = if config.persistence_enabled {
            match Library::open(&config.catalog_path()) {
                Ok(library) => Some(library),
                Err(e) => {
                    log::warn!("⚠️  Catalog unavailable: {}", e);
                    None
                }
            }
        } else {
            log::info!("Persistence disabled by configuration");
            None
        };

        let session = Session::new(config.owner_id.clone());
        let mut app = MediaSphere {
            builder: BuilderState::new(&session.layout().bg_color),
            cache_dir: config.asset_cache_dir(),
            device: DeviceProfile {
                constrained: config.constrained_device,
            },
            policy: VisibilityPolicy::new(config.visibility_tolerance),
            config,
            library,
            session,
            galleries: Vec::new(),
            camera: OrbitCamera::new(),
            positions: Vec::new(),
            cull_radius: 0.0,
            visible: Vec::new(),
            runtime: HashMap::new(),
            previews: HashMap::new(),
            pending: HashSet::new(),
            hovered: None,
            dragging: false,
            last_tick: None,
            status: String::new(),
        };

        // Optional first argument: a share link or a gallery slug
        if let Some(arg) = std::env::args().nth(1) {
            app.open_argument(&arg);
        }

        app.refresh_galleries();
        app.relayout();
        if app.status.is_empty() {
            app.status = match &app.library {
                Some(library) => format!(
                    "Ready. {} galleries in the catalog.",
                    library.gallery_count().unwrap_or(0)
                ),
                None => "Ready. Saving is unavailable.".to_string(),
            };
        }
        log::info!("🎨 Media Sphere initialized");

        let task = app.refresh_visibility();
        (app, task)
    }

    fn open_argument(&mut self, arg: &str) {
        let looks_like_slug =
            arg.len() == catalog::SLUG_LEN && arg.chars().all(|c| c.is_ascii_alphanumeric());
        if looks_like_slug && self.library.is_some() {
            self.load_gallery(arg);
        } else {
            let count = self.session.open_share(arg);
            self.status = format!("Opened shared gallery with {} items.", count);
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick(now) => {
                let dt = self
                    .last_tick
                    .map(|last| now.saturating_duration_since(last))
                    .unwrap_or_default()
                    .as_secs_f32()
                    .min(0.1);
                self.last_tick = Some(now);

                let idle = !self.dragging
                    && self.hovered.is_none()
                    && self.session.lightbox().is_closed()
                    && self.session.layout().view_mode != ViewMode::Tile;
                if idle && self.device.micro_animation() {
                    self.camera.auto_rotate(dt);
                }
                self.refresh_visibility()
            }
            Message::Noop => Task::none(),

            Message::Orbit(dx, dy) => {
                self.dragging = true;
                if self.session.layout().view_mode != ViewMode::Tile {
                    self.camera.rotate(dx, dy);
                }
                Task::none()
            }
            Message::OrbitEnded => {
                self.dragging = false;
                Task::none()
            }
            Message::Zoom(lines) => {
                self.camera.zoom(lines);
                Task::none()
            }
            Message::Hover(id) => {
                self.set_hovered(id);
                Task::none()
            }
            Message::OpenItem(id) => {
                self.dragging = false;
                match self.session.open_item(&id) {
                    Some(request) => self.lightbox_task(request),
                    None => Task::none(),
                }
            }
            Message::PreviewLoaded(id, result) => {
                self.on_preview_loaded(id, result);
                Task::none()
            }

            Message::LightboxLoaded(generation, result) => match result {
                Ok(asset) => {
                    self.session.lightbox_mut().loaded(generation, asset);
                    Task::none()
                }
                Err(e) => match self.session.lightbox_mut().failed(generation, &e) {
                    Some(request) => self.lightbox_task(request),
                    None => Task::none(),
                },
            },
            Message::CloseLightbox => {
                self.session.lightbox_mut().close();
                Task::none()
            }

            Message::ToggleBuilder => {
                self.builder.open = !self.builder.open;
                Task::none()
            }
            Message::UrlInputChanged(value) => {
                self.builder.url_input = value;
                Task::none()
            }
            Message::AddUrls => {
                let added = self.session.add_urls(&self.builder.url_input);
                self.builder.url_input.clear();
                self.status = match added.len() {
                    0 => "Nothing new to add.".to_string(),
                    n => format!("Added {} items.", n),
                };
                self.relayout();
                self.refresh_visibility()
            }
            Message::RemoveItem(id) => {
                if self.session.remove_item(&id) {
                    self.forget_item(&id);
                    self.relayout();
                }
                Task::none()
            }
            Message::MoveItem(from, to) => {
                if self.session.move_item(from, to) {
                    self.relayout();
                }
                Task::none()
            }
            Message::TitleChanged(id, title) => {
                self.session.set_title(&id, &title);
                Task::none()
            }
            Message::DescriptionChanged(id, description) => {
                self.session.set_description(&id, &description);
                Task::none()
            }
            Message::ClearGallery => {
                self.session.clear();
                self.reset_item_state();
                self.relayout();
                Task::none()
            }
            Message::ImportFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select a folder with photos and videos")
                    .pick_folder();

                match folder {
                    Some(folder_path) => {
                        self.status = format!("Importing from {}...", folder_path.display());
                        Task::perform(import_folder_async(folder_path), Message::ImportComplete)
                    }
                    None => Task::none(),
                }
            }
            Message::ImportComplete(result) => {
                let added = self.session.add_urls(&result.urls.join("\n"));
                self.status = format!(
                    "✅ Import complete! Added {} items, skipped {} other files.",
                    added.len(),
                    result.skipped_count
                );
                self.relayout();
                self.refresh_visibility()
            }

            Message::ViewModeSelected(mode) => {
                self.session.update_layout(|l| l.view_mode = mode);
                self.relayout();
                Task::none()
            }
            Message::MediaScaleChanged(value) => {
                self.session.update_layout(|l| l.media_scale = value);
                self.relayout();
                Task::none()
            }
            Message::SphereBaseChanged(value) => {
                self.session.update_layout(|l| l.sphere_base = value);
                self.relayout();
                Task::none()
            }
            Message::TileGapChanged(value) => {
                self.session.update_layout(|l| l.tile_gap = value);
                self.relayout();
                Task::none()
            }
            Message::ShadowOpacityChanged(value) => {
                self.session.update_layout(|l| l.shadow_opacity = value);
                Task::none()
            }
            Message::BgColorChanged(value) => {
                if parse_hex_color(&value).is_some() {
                    let color = value.trim().to_string();
                    self.session.update_layout(|l| l.bg_color = color);
                }
                self.builder.bg_input = value;
                Task::none()
            }

            Message::DisplayNameChanged(value) => {
                self.edit_meta(|meta| meta.display_name = optional(value));
                Task::none()
            }
            Message::WhatsappChanged(value) => {
                self.edit_meta(|meta| meta.whatsapp = optional(value));
                Task::none()
            }
            Message::EmailChanged(value) => {
                self.edit_meta(|meta| meta.email = optional(value));
                Task::none()
            }

            Message::Save => {
                self.save(SaveMode::Update);
                Task::none()
            }
            Message::SaveAsNew => {
                self.save(SaveMode::ForkAsNew);
                Task::none()
            }
            Message::LoadInputChanged(value) => {
                self.builder.load_input = value;
                Task::none()
            }
            Message::LoadGallery(slug) => {
                self.load_gallery(&slug);
                self.refresh_visibility()
            }
            Message::RefreshGalleries => {
                self.refresh_galleries();
                Task::none()
            }
            Message::DeleteGallery(id) => {
                if let Some(library) = &self.library {
                    match library.delete(&id) {
                        Ok(true) => self.status = "Gallery deleted.".to_string(),
                        Ok(false) => self.status = "That gallery no longer exists.".to_string(),
                        Err(e) => self.status = format!("❌ {}", e),
                    }
                }
                self.refresh_galleries();
                Task::none()
            }
            Message::GenerateShareLink => {
                let link =
                    share::share_link(&self.config.share_base_url, &self.session.share_param());
                self.status = format!("Share link ready ({} items).", self.session.items().len());
                self.builder.share_link = Some(link);
                Task::none()
            }
            Message::ShareInputChanged(value) => {
                self.builder.share_input = value;
                Task::none()
            }
            Message::OpenShareLink => {
                let count = self.session.open_share(&self.builder.share_input);
                self.builder.share_input.clear();
                self.builder.bg_input = self.session.layout().bg_color.clone();
                self.status = if count == 0 {
                    "That link did not contain a gallery.".to_string()
                } else {
                    format!("Opened shared gallery with {} items.", count)
                };
                self.reset_item_state();
                self.relayout();
                self.refresh_visibility()
            }
        }
    }

    fn save(&mut self, mode: SaveMode) {
        let store = self.library.as_ref().map(|l| l as &dyn GalleryStore);
        match self.session.save(store, mode) {
            Ok(slug) => {
                self.status = format!("💾 Saved as {}.", slug);
                self.builder.load_input = slug;
                self.refresh_galleries();
            }
            Err(e) => {
                log::warn!("⚠️  Save failed: {}", e);
                self.status = format!("❌ {}", e);
            }
        }
    }

    fn load_gallery(&mut self, slug: &str) {
        let store = self.library.as_ref().map(|l| l as &dyn GalleryStore);
        match self.session.load(store, slug) {
            Ok(()) => {
                self.builder.bg_input = self.session.layout().bg_color.clone();
                self.status = format!(
                    "📂 Loaded {} ({} items).",
                    slug.trim(),
                    self.session.items().len()
                );
                self.reset_item_state();
                self.relayout();
            }
            Err(e) => {
                log::warn!("⚠️  Load failed: {}", e);
                self.status = format!("❌ {}", e);
            }
        }
    }

    fn refresh_galleries(&mut self) {
        let Some(library) = &self.library else {
            self.galleries.clear();
            return;
        };
        match catalog::list_galleries(library, self.session.owner_id()) {
            Ok(galleries) => self.galleries = galleries,
            Err(e) => {
                log::warn!("⚠️  Could not list galleries: {}", e);
                self.status = format!("❌ {}", e);
            }
        }
    }

    fn edit_meta(&mut self, edit: impl FnOnce(&mut GalleryMeta)) {
        let mut meta = self.session.meta().clone();
        edit(&mut meta);
        self.session.set_meta(meta);
    }

    /// Recompute positions after the item list or layout changed
    fn relayout(&mut self) {
        let count = self.session.items().len();
        let config = self.session.layout();
        self.positions = if count == 0 {
            Vec::new()
        } else {
            layout::positions_for(config, count)
        };

        self.cull_radius = layout::bounding_radius(&self.positions);
        self.camera.frame(self.cull_radius + layout::card_size(config));
        if config.view_mode == ViewMode::Tile {
            self.camera.reset_orientation();
        }
    }

    /// Re-run culling for this tick and start loading newly visible previews
    fn refresh_visibility(&mut self) -> Task<Message> {
        let mode = self.session.layout().view_mode;
        self.visible = self
            .policy
            .cull(mode, &self.positions, self.camera.eye(), self.cull_radius);

        let mut in_view = vec![false; self.session.items().len()];
        for &index in &self.visible {
            if let Some(slot) = in_view.get_mut(index) {
                *slot = true;
            }
        }

        let mut requests = Vec::new();
        for (item, &visible) in self.session.items().iter().zip(in_view.iter()) {
            let runtime = self.runtime.entry(item.id.clone()).or_default();
            if runtime.visible != visible {
                runtime.on_visibility(visible, self.device);
            }

            let wants_preview = runtime.needs_preview()
                && item.kind != MediaKind::Video
                && !self.pending.contains(&item.id);
            if wants_preview {
                requests.push((item.id.clone(), item.preview_url.clone()));
            }
        }

        Task::batch(
            requests
                .into_iter()
                .map(|(id, url)| self.preview_task(id, url)),
        )
    }

    fn preview_task(&mut self, id: String, url: String) -> Task<Message> {
        self.pending.insert(id.clone());
        Task::perform(
            loader::load_asset(url, self.cache_dir.clone(), loader::PREVIEW_MAX_EDGE),
            move |result| Message::PreviewLoaded(id.clone(), result.map_err(|e| e.to_string())),
        )
    }

    fn lightbox_task(&self, request: LoadRequest) -> Task<Message> {
        let generation = request.generation;
        Task::perform(
            loader::load_asset(request.url, self.cache_dir.clone(), loader::FULL_MAX_EDGE),
            move |result| Message::LightboxLoaded(generation, result.map_err(|e| e.to_string())),
        )
    }

    fn on_preview_loaded(&mut self, id: String, result: Result<LoadedAsset, String>) {
        self.pending.remove(&id);
        let Some((kind, source)) = self
            .session
            .item(&id)
            .map(|item| (item.kind, item.original_url.clone()))
        else {
            // Removed while loading
            return;
        };

        match result {
            Ok(asset) => {
                if kind == MediaKind::Image {
                    self.session.set_aspect_ratio(&id, asset.aspect_ratio());
                }
                self.runtime.entry(id.clone()).or_default().on_loaded();
                self.previews.insert(id, asset);
            }
            Err(e) => {
                log::warn!("⚠️  Preview failed for {}: {}", source, e);
                self.runtime.entry(id).or_default().on_failed();
            }
        }
    }

    fn set_hovered(&mut self, id: Option<String>) {
        if self.hovered == id {
            return;
        }
        if let Some(previous) = self.hovered.take() {
            if let Some(runtime) = self.runtime.get_mut(&previous) {
                runtime.on_hover_end(self.device);
            }
        }
        if let Some(current) = &id {
            self.runtime
                .entry(current.clone())
                .or_default()
                .on_hover_start(self.device);
        }
        self.hovered = id;
    }

    fn forget_item(&mut self, id: &str) {
        self.runtime.remove(id);
        self.previews.remove(id);
        self.pending.remove(id);
        if self.hovered.as_deref() == Some(id) {
            self.hovered = None;
        }
    }

    fn reset_item_state(&mut self) {
        self.runtime.clear();
        self.previews.clear();
        self.pending.clear();
        self.hovered = None;
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let scene = canvas(GalleryScene {
            items: self.session.items(),
            positions: &self.positions,
            visible: &self.visible,
            layout: self.session.layout(),
            camera: &self.camera,
            runtime: &self.runtime,
            previews: &self.previews,
        })
        .width(Length::Fill)
        .height(Length::Fill);

        let scene_layer = stack![scene, container(self.header()).padding(16)];

        let mut main_row = row![scene_layer];
        if self.builder.open {
            main_row = main_row.push(ui::builder::view(BuilderView {
                state: &self.builder,
                session: &self.session,
                galleries: &self.galleries,
                persistence_available: self.library.is_some(),
            }));
        }

        match ui::lightbox::view(self.session.lightbox(), self.session.lightbox_item()) {
            Some(overlay) => stack![main_row, overlay].into(),
            None => main_row.into(),
        }
    }

    /// Owner details and status over the top-left of the scene
    fn header(&self) -> Element<'_, Message> {
        let meta = self.session.meta();
        let mut header = column![].spacing(4);

        if let Some(name) = meta.display_name.as_deref() {
            header = header.push(text(name).size(28));
        }
        let mut contacts = Vec::new();
        if let Some(link) = meta.whatsapp.as_deref().and_then(share::whatsapp_link) {
            contacts.push(link);
        }
        if let Some(email) = meta.email.as_deref() {
            contacts.push(email.to_string());
        }
        if !contacts.is_empty() {
            header = header.push(text(contacts.join("  ·  ")).size(14));
        }

        let visible = self.visible.len().min(self.session.items().len());
        header = header.push(
            text(format!(
                "{} · {} of {} items in view",
                self.status,
                visible,
                self.session.items().len()
            ))
            .size(12),
        );

        if !self.builder.open {
            header = header.push(button(text("Builder").size(12)).on_press(Message::ToggleBuilder));
        }

        header.into()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            time::every(TICK).map(Message::Tick),
            keyboard::on_key_press(|key, _modifiers| match key {
                keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::CloseLightbox),
                _ => None,
            }),
        ])
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Empty text fields clear the value
fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("media_sphere=info"))
        .init();

    iced::application("Media Sphere", MediaSphere::update, MediaSphere::view)
        .subscription(MediaSphere::subscription)
        .theme(MediaSphere::theme)
        .centered()
        .run_with(MediaSphere::new)
}
