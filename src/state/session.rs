/// The gallery session
///
/// Owns the item list, the layout config, the owner-facing meta and the
/// lightbox. It is the only writer of that state: views read it and send
/// messages, and `main` calls the mutation methods below in response.
use chrono::{DateTime, Utc};

use super::data::{GalleryMeta, GalleryRecord, GallerySnapshot, MediaItem};
use super::library::{self, GalleryStore, SaveMode};
use super::settings::LayoutConfig;
use super::share;
use crate::error::{GalleryError, Result};
use crate::media::classify;
use crate::ui::lightbox::{LoadRequest, Lightbox};

/// Identity of the catalog record the session was loaded from or saved as
#[derive(Debug, Clone, PartialEq)]
pub struct RecordIdentity {
    pub id: String,
    pub slug: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct Session {
    owner_id: String,
    items: Vec<MediaItem>,
    layout: LayoutConfig,
    meta: GalleryMeta,
    identity: Option<RecordIdentity>,
    lightbox: Lightbox,
    /// Changed since the last save or load
    dirty: bool,
}

impl Session {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            items: Vec::new(),
            layout: LayoutConfig::default(),
            meta: GalleryMeta::default(),
            identity: None,
            lightbox: Lightbox::new(),
            dirty: false,
        }
    }

    // ========== Read access ==========

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&MediaItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn meta(&self) -> &GalleryMeta {
        &self.meta
    }

    pub fn identity(&self) -> Option<&RecordIdentity> {
        self.identity.as_ref()
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    // ========== Items ==========

    /// Classify and append URLs from builder input, skipping ones already
    /// in the gallery. Returns the newly added items.
    pub fn add_urls(&mut self, text: &str) -> Vec<MediaItem> {
        let mut added = Vec::new();
        for item in classify::classify_all(text) {
            let duplicate = self
                .items
                .iter()
                .chain(added.iter())
                .any(|existing: &MediaItem| existing.original_url == item.original_url);
            if !duplicate {
                added.push(item);
            }
        }
        if !added.is_empty() {
            self.items.extend(added.iter().cloned());
            self.dirty = true;
        }
        added
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            if self.lightbox.item_id() == Some(id) {
                self.lightbox.close();
            }
            self.dirty = true;
        }
        removed
    }

    /// Move the item at `from` so it ends up at index `to`
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() || from == to {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.dirty = true;
        true
    }

    pub fn set_title(&mut self, id: &str, title: &str) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.title = non_empty(title);
            self.dirty = true;
        }
    }

    pub fn set_description(&mut self, id: &str, description: &str) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.description = non_empty(description);
            self.dirty = true;
        }
    }

    /// Record a discovered aspect ratio. Does not mark the session dirty:
    /// it is learned from the media, not edited by the user.
    pub fn set_aspect_ratio(&mut self, id: &str, ratio: f32) {
        if !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.aspect_ratio = Some(ratio);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.lightbox.close();
        self.dirty = true;
    }

    // ========== Layout & meta ==========

    pub fn update_layout(&mut self, edit: impl FnOnce(&mut LayoutConfig)) {
        let mut layout = self.layout.clone();
        edit(&mut layout);
        let layout = layout.sanitized();
        if layout != self.layout {
            self.layout = layout;
            self.dirty = true;
        }
    }

    pub fn set_meta(&mut self, meta: GalleryMeta) {
        if meta != self.meta {
            self.meta = meta;
            self.dirty = true;
        }
    }

    // ========== Lightbox ==========

    /// Show an item in the lightbox; returns the asset to fetch, if any
    pub fn open_item(&mut self, id: &str) -> Option<LoadRequest> {
        let item = self.items.iter().find(|item| item.id == id)?;
        self.lightbox.select(item)
    }

    pub fn lightbox_mut(&mut self) -> &mut Lightbox {
        &mut self.lightbox
    }

    /// The item currently in the lightbox
    pub fn lightbox_item(&self) -> Option<&MediaItem> {
        self.lightbox.item_id().and_then(|id| self.item(id))
    }

    // ========== Snapshots & records ==========

    pub fn snapshot(&self) -> GallerySnapshot {
        GallerySnapshot {
            items: self.items.clone(),
            layout: self.layout.clone(),
            meta: self.meta.clone(),
        }
    }

    /// Replace the gallery content with a snapshot; forgets the record
    /// identity, so the next save creates a new record
    pub fn rehydrate(&mut self, snapshot: GallerySnapshot) {
        self.items = snapshot.items.iter().map(classify::reclassify).collect();
        self.layout = snapshot.layout.sanitized();
        self.meta = snapshot.meta;
        self.identity = None;
        self.lightbox.close();
        self.dirty = false;
    }

    /// Adopt a record loaded from (or just written to) the catalog
    pub fn apply_record(&mut self, record: GalleryRecord) {
        self.identity = match (record.id, record.slug) {
            (Some(id), Some(slug)) => Some(RecordIdentity {
                id,
                slug,
                created_at: record.created_at,
            }),
            _ => None,
        };
        self.items = record.items;
        self.layout = record.layout;
        self.meta = record.meta;
        self.lightbox.close();
        self.dirty = false;
    }

    pub fn to_record(&self) -> GalleryRecord {
        let mut record = GalleryRecord::from_snapshot(&self.owner_id, self.snapshot());
        if let Some(identity) = &self.identity {
            record.id = Some(identity.id.clone());
            record.slug = Some(identity.slug.clone());
            record.created_at = identity.created_at;
        }
        record
    }

    // ========== Persistence ==========

    /// Save to the catalog
    ///
    /// `Update` needs a record identity; the very first save of a gallery is
    /// always a fork. Fails with `BackendUnconfigured` when there is no store.
    pub fn save(&mut self, store: Option<&dyn GalleryStore>, mode: SaveMode) -> Result<String> {
        let store = store.ok_or(GalleryError::BackendUnconfigured)?;
        let mode = if self.identity.is_none() {
            SaveMode::ForkAsNew
        } else {
            mode
        };
        let saved = library::save(store, &self.to_record(), mode)?;
        let slug = saved.slug.clone().unwrap_or_default();
        // Keep the lightbox and items as they are; only adopt the identity
        self.identity = match (saved.id, saved.slug) {
            (Some(id), Some(slug)) => Some(RecordIdentity {
                id,
                slug,
                created_at: saved.created_at,
            }),
            _ => None,
        };
        self.dirty = false;
        Ok(slug)
    }

    pub fn load(&mut self, store: Option<&dyn GalleryStore>, slug: &str) -> Result<()> {
        let store = store.ok_or(GalleryError::BackendUnconfigured)?;
        let record = library::load_by_slug(store, slug)?;
        log::info!("📂 Loaded gallery {} ({} items)", slug.trim(), record.items.len());
        self.apply_record(record);
        Ok(())
    }

    // ========== Sharing ==========

    /// Encoded share parameter for the current gallery
    pub fn share_param(&self) -> String {
        let urls: Vec<String> = self.items.iter().map(|i| i.original_url.clone()).collect();
        share::encode_share(&urls, &self.meta)
    }

    /// Rebuild from a share link or bare parameter. Malformed input gives an
    /// empty gallery. Layout is kept, since links do not carry it.
    pub fn open_share(&mut self, link: &str) -> usize {
        let shared = share::decode_share(&share::parse_share_link(link));
        let items = shared
            .urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(classify::classify)
            .collect();
        let snapshot = GallerySnapshot {
            items,
            layout: self.layout.clone(),
            meta: shared.meta(),
        };
        self.rehydrate(snapshot);
        self.items.len()
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::Library;
    use crate::state::settings::ViewMode;

    fn session_with(urls: &str) -> Session {
        let mut session = Session::new("owner-1");
        session.add_urls(urls);
        session
    }

    #[test]
    fn test_add_urls_dedups() {
        let mut session = session_with("https://a.com/1.jpg\nhttps://a.com/1.jpg");
        assert_eq!(session.items().len(), 1);
        assert!(session.is_dirty());

        let added = session.add_urls("https://a.com/1.jpg https://b.com/2.mp4");
        assert_eq!(added.len(), 1);
        assert_eq!(session.items().len(), 2);
    }

    #[test]
    fn test_move_and_remove() {
        let mut session = session_with("a.jpg b.jpg c.jpg");
        assert!(session.move_item(0, 2));
        let order: Vec<&str> = session.items().iter().map(|i| i.original_url.as_str()).collect();
        assert_eq!(order, ["b.jpg", "c.jpg", "a.jpg"]);
        assert!(!session.move_item(0, 3));

        let id = session.items()[0].id.clone();
        session.open_item(&id).unwrap();
        assert!(!session.lightbox().is_closed());
        assert!(session.remove_item(&id));
        assert!(session.lightbox().is_closed());
        assert!(!session.remove_item(&id));
    }

    #[test]
    fn test_opening_a_video_requests_nothing() {
        let mut session = session_with("https://cdn.example.com/big.mp4");
        let id = session.items()[0].id.clone();
        assert!(session.open_item(&id).is_none());
        assert_eq!(session.lightbox_item().map(|i| i.id.as_str()), Some(id.as_str()));
        assert!(session.open_item("missing").is_none());
    }

    #[test]
    fn test_annotations() {
        let mut session = session_with("a.jpg");
        let id = session.items()[0].id.clone();
        session.set_title(&id, "  Sunset ");
        session.set_description(&id, "");
        session.set_aspect_ratio(&id, 1.5);
        session.set_aspect_ratio(&id, -1.0);

        let item = session.item(&id).unwrap();
        assert_eq!(item.title.as_deref(), Some("Sunset"));
        assert_eq!(item.description, None);
        assert_eq!(item.aspect_ratio, Some(1.5));
    }

    #[test]
    fn test_update_layout_sanitizes() {
        let mut session = Session::new("o");
        session.update_layout(|l| {
            l.view_mode = ViewMode::Tile;
            l.media_scale = 99.0;
        });
        assert_eq!(session.layout().view_mode, ViewMode::Tile);
        assert_eq!(session.layout().media_scale, 3.0);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_save_without_backend_is_refused() {
        let mut session = session_with("a.jpg");
        let result = session.save(None, SaveMode::Update);
        assert!(matches!(result, Err(GalleryError::BackendUnconfigured)));
        assert!(matches!(
            session.load(None, "abcdefgh"),
            Err(GalleryError::BackendUnconfigured)
        ));
    }

    #[test]
    fn test_first_save_forks_then_updates_in_place() {
        let library = Library::open_in_memory().unwrap();
        let mut session = session_with("a.jpg https://youtu.be/dQw4w9WgXcQ");

        let slug = session.save(Some(&library), SaveMode::Update).unwrap();
        assert!(!session.is_dirty());
        let id = session.identity().unwrap().id.clone();

        session.add_urls("c.png");
        let again = session.save(Some(&library), SaveMode::Update).unwrap();
        assert_eq!(again, slug);
        assert_eq!(session.identity().unwrap().id, id);
        assert_eq!(library.gallery_count().unwrap(), 1);

        let forked = session.save(Some(&library), SaveMode::ForkAsNew).unwrap();
        assert_ne!(forked, slug);
        assert_eq!(library.gallery_count().unwrap(), 2);

        let mut other = Session::new("owner-1");
        other.load(Some(&library), &slug).unwrap();
        assert_eq!(other.items().len(), 3);
        assert_eq!(other.identity().unwrap().slug, slug);
    }

    #[test]
    fn test_share_round_trip() {
        let mut session = session_with("https://a.com/1.jpg https://vimeo.com/12345");
        session.set_meta(GalleryMeta {
            display_name: Some("Dana".into()),
            whatsapp: None,
            email: Some("d@e.com".into()),
        });
        let link = share::share_link("https://media-sphere.app/view", &session.share_param());

        let mut viewer = Session::new("someone-else");
        assert_eq!(viewer.open_share(&link), 2);
        let urls: Vec<&str> = viewer.items().iter().map(|i| i.original_url.as_str()).collect();
        assert_eq!(urls, ["https://a.com/1.jpg", "https://vimeo.com/12345"]);
        assert_eq!(viewer.meta(), session.meta());
        assert!(viewer.identity().is_none());

        assert_eq!(viewer.open_share("garbage"), 0);
    }
}
