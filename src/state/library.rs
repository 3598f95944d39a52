use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::data::{GalleryMeta, GalleryRecord, GallerySummary, MediaItem};
use super::settings::LayoutConfig;
use crate::error::{GalleryError, Result};
use crate::media::classify;

/// Length of public gallery slugs
pub const SLUG_LEN: usize = 8;
const SLUG_ALPHABET: &[u8] = b"abcdefghijkmnpqrstuvwxyz23456789";
const SLUG_ATTEMPTS: usize = 16;

/// A gallery exactly as the catalog stores it
///
/// Field names follow the backend record shape. Note `settings`: the
/// in-memory name is `layout`, and `to_backend` / `from_backend` are the only
/// places that translate between the two.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackendRow {
    pub id: String,
    pub slug: String,
    pub owner_id: String,
    pub display_name: Option<String>,
    pub contact_whatsapp: Option<String>,
    pub contact_email: Option<String>,
    pub items: serde_json::Value,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory record -> persisted row
///
/// The record must already carry an identity (see `save`).
pub fn to_backend(record: &GalleryRecord) -> Result<BackendRow> {
    let id = record.id.clone().ok_or(GalleryError::MissingRecord)?;
    let slug = record.slug.clone().ok_or(GalleryError::MissingRecord)?;
    let now = Utc::now();
    Ok(BackendRow {
        id,
        slug,
        owner_id: record.owner_id.clone(),
        display_name: record.meta.display_name.clone(),
        contact_whatsapp: record.meta.whatsapp.clone(),
        contact_email: record.meta.email.clone(),
        items: serde_json::to_value(&record.items)?,
        settings: serde_json::to_value(&record.layout)?,
        created_at: record.created_at.unwrap_or(now),
        updated_at: record.updated_at.unwrap_or(now),
    })
}

/// Persisted row -> in-memory record
///
/// Lenient: unreadable settings fall back to defaults, and items stored as
/// bare URL strings (older rows) are classified on the way in. Every item is
/// re-derived from its original URL so derived fields are never stale.
pub fn from_backend(row: BackendRow) -> GalleryRecord {
    let layout = match LayoutConfig::from_value(row.settings.clone()) {
        Ok(layout) => layout,
        Err(e) => {
            log::warn!(
                "⚠️  Gallery {} has unreadable settings ({}), using defaults",
                row.slug,
                e
            );
            LayoutConfig::default()
        }
    };

    GalleryRecord {
        items: items_from_value(&row.slug, row.items),
        layout,
        meta: GalleryMeta {
            display_name: row.display_name,
            whatsapp: row.contact_whatsapp,
            email: row.contact_email,
        },
        id: Some(row.id),
        slug: Some(row.slug),
        owner_id: row.owner_id,
        created_at: Some(row.created_at),
        updated_at: Some(row.updated_at),
    }
}

/// Either full item objects or bare URL strings
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredItem {
    Item(MediaItem),
    Url(String),
}

fn items_from_value(slug: &str, value: serde_json::Value) -> Vec<MediaItem> {
    let stored: Vec<StoredItem> = match serde_json::from_value(value) {
        Ok(stored) => stored,
        Err(e) => {
            log::warn!("⚠️  Gallery {} has unreadable items ({}), loading it empty", slug, e);
            return Vec::new();
        }
    };
    stored
        .into_iter()
        .filter_map(|s| match s {
            StoredItem::Item(item) => Some(classify::reclassify(&item)),
            StoredItem::Url(url) if !url.trim().is_empty() => Some(classify::classify(url.trim())),
            StoredItem::Url(_) => None,
        })
        .collect()
}

/// Storage operations the app needs from a catalog backend
pub trait GalleryStore {
    fn insert(&self, row: &BackendRow) -> Result<()>;
    /// Returns false when no row has that id
    fn update(&self, row: &BackendRow) -> Result<bool>;
    fn fetch_by_slug(&self, slug: &str) -> Result<Option<BackendRow>>;
    /// True for live slugs and for slugs of deleted galleries
    fn slug_exists(&self, slug: &str) -> Result<bool>;
    /// Newest first
    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<BackendRow>>;
    /// Returns false when no row has that id. The slug stays reserved.
    fn delete(&self, id: &str) -> Result<bool>;
}

/// How a save treats an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Overwrite the record the session was loaded from
    Update,
    /// Always create a new record with a fresh id and slug
    ForkAsNew,
}

/// Random slug from an unambiguous lowercase alphabet
pub fn generate_slug<R: Rng>(rng: &mut R) -> String {
    (0..SLUG_LEN)
        .map(|_| SLUG_ALPHABET[rng.gen_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

fn unique_slug(store: &dyn GalleryStore) -> Result<String> {
    let mut rng = rand::thread_rng();
    for _ in 0..SLUG_ATTEMPTS {
        let slug = generate_slug(&mut rng);
        if !store.slug_exists(&slug)? {
            return Ok(slug);
        }
    }
    Err(GalleryError::SlugExhausted(SLUG_ATTEMPTS))
}

/// Persist a record and return it with its stored identity and timestamps
pub fn save(
    store: &dyn GalleryStore,
    record: &GalleryRecord,
    mode: SaveMode,
) -> Result<GalleryRecord> {
    let now = Utc::now();
    match mode {
        SaveMode::Update => {
            if record.id.is_none() || record.slug.is_none() {
                return Err(GalleryError::MissingRecord);
            }
            let mut saved = record.clone();
            saved.updated_at = Some(now);
            let row = to_backend(&saved)?;
            if !store.update(&row)? {
                return Err(GalleryError::RecordNotFound(format!("id {}", row.id)));
            }
            log::info!("💾 Updated gallery {} ({} items)", row.slug, saved.items.len());
            Ok(saved)
        }
        SaveMode::ForkAsNew => {
            let mut saved = record.clone();
            saved.id = Some(Uuid::new_v4().to_string());
            saved.slug = Some(unique_slug(store)?);
            saved.created_at = Some(now);
            saved.updated_at = Some(now);
            let row = to_backend(&saved)?;
            store.insert(&row)?;
            log::info!("💾 Created gallery {} ({} items)", row.slug, saved.items.len());
            Ok(saved)
        }
    }
}

/// Load a record by its public slug
pub fn load_by_slug(store: &dyn GalleryStore, slug: &str) -> Result<GalleryRecord> {
    let row = store
        .fetch_by_slug(slug.trim())?
        .ok_or_else(|| GalleryError::RecordNotFound(format!("slug {}", slug.trim())))?;
    Ok(from_backend(row))
}

/// Summaries of an owner's galleries, newest first
pub fn list_galleries(store: &dyn GalleryStore, owner_id: &str) -> Result<Vec<GallerySummary>> {
    let rows = store.list_for_owner(owner_id)?;
    Ok(rows
        .into_iter()
        .map(|row| GallerySummary {
            item_count: row.items.as_array().map(Vec::len).unwrap_or(0),
            id: row.id,
            slug: row.slug,
            display_name: row.display_name,
            updated_at: Some(row.updated_at),
        })
        .collect())
}

/// The Library is the SQLite gallery catalog.
/// It stands in for the hosted backend: one row per gallery, with items and
/// settings stored as JSON text.
pub struct Library {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open (or create) the catalog at `db_path`.
    ///
    /// The default location is in the user's data directory:
    /// - Linux: ~/.local/share/media-sphere/catalog.db
    /// - macOS: ~/Library/Application Support/media-sphere/catalog.db
    /// - Windows: %APPDATA%\media-sphere\catalog.db
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        log::info!("📁 Catalog opened at: {}", db_path.display());

        let library = Library {
            conn,
            db_path: Some(db_path.to_path_buf()),
        };
        library.init_schema()?;
        Ok(library)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let library = Library {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Default catalog path
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir);

        path.push("media-sphere");
        path.push("catalog.db");
        path
    }

    /// Create tables and indexes if they don't exist
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS galleries (
                id                  TEXT PRIMARY KEY,
                slug                TEXT NOT NULL UNIQUE,
                owner_id            TEXT NOT NULL,
                display_name        TEXT,
                contact_whatsapp    TEXT,
                contact_email       TEXT,
                items               TEXT NOT NULL,
                settings            TEXT NOT NULL,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            )",
            [],
        )?;

        // Slugs of deleted galleries, never handed out again
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS retired_slugs (
                slug                TEXT PRIMARY KEY
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_galleries_owner
             ON galleries(owner_id, updated_at DESC)",
            [],
        )?;

        log::debug!("✅ Catalog schema initialized");
        Ok(())
    }

    /// Get a count of galleries in the catalog
    pub fn gallery_count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM galleries", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_backend(row: &Row<'_>) -> rusqlite::Result<BackendRow> {
        let items: String = row.get(6)?;
        let settings: String = row.get(7)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;
        Ok(BackendRow {
            id: row.get(0)?,
            slug: row.get(1)?,
            owner_id: row.get(2)?,
            display_name: row.get(3)?,
            contact_whatsapp: row.get(4)?,
            contact_email: row.get(5)?,
            items: serde_json::from_str(&items).unwrap_or(serde_json::Value::Null),
            settings: serde_json::from_str(&settings).unwrap_or(serde_json::Value::Null),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn select_one(&self, column: &str, value: &str) -> Result<Option<BackendRow>> {
        let sql = format!("SELECT {COLUMNS} FROM galleries WHERE {column} = ?1");
        let row = self
            .conn
            .query_row(&sql, [value], Self::row_to_backend)
            .optional()?;
        Ok(row)
    }
}

const COLUMNS: &str = "id, slug, owner_id, display_name, contact_whatsapp, contact_email, \
                       items, settings, created_at, updated_at";

fn parse_timestamp(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Fixed-width UTC so that text ordering matches time ordering
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl GalleryStore for Library {
    fn insert(&self, row: &BackendRow) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO galleries ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                row.id,
                row.slug,
                row.owner_id,
                row.display_name,
                row.contact_whatsapp,
                row.contact_email,
                row.items.to_string(),
                row.settings.to_string(),
                format_timestamp(&row.created_at),
                format_timestamp(&row.updated_at),
            ],
        )?;
        Ok(())
    }

    fn update(&self, row: &BackendRow) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE galleries SET display_name = ?2, contact_whatsapp = ?3, contact_email = ?4,
                items = ?5, settings = ?6, updated_at = ?7
             WHERE id = ?1",
            params![
                row.id,
                row.display_name,
                row.contact_whatsapp,
                row.contact_email,
                row.items.to_string(),
                row.settings.to_string(),
                format_timestamp(&row.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    fn fetch_by_slug(&self, slug: &str) -> Result<Option<BackendRow>> {
        self.select_one("slug", slug)
    }

    fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM galleries WHERE slug = ?1)
                  + (SELECT COUNT(*) FROM retired_slugs WHERE slug = ?1)",
            [slug],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_for_owner(&self, owner_id: &str) -> Result<Vec<BackendRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM galleries WHERE owner_id = ?1 ORDER BY updated_at DESC"
        ))?;

        let rows = stmt.query_map([owner_id], Self::row_to_backend)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO retired_slugs (slug)
             SELECT slug FROM galleries WHERE id = ?1",
            [id],
        )?;
        let changed = tx.execute("DELETE FROM galleries WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(changed > 0)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::settings::ViewMode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(owner: &str, urls: &[&str]) -> GalleryRecord {
        let mut layout = LayoutConfig::default();
        layout.view_mode = ViewMode::Carousel;
        GalleryRecord {
            id: None,
            slug: None,
            owner_id: owner.into(),
            items: urls.iter().map(|u| classify::classify(u)).collect(),
            layout,
            meta: GalleryMeta {
                display_name: Some("Studio".into()),
                whatsapp: Some("972501234567".into()),
                email: Some("a@b.co".into()),
            },
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_slug_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let slug = generate_slug(&mut rng);
        assert_eq!(slug.len(), SLUG_LEN);
        assert!(slug.bytes().all(|b| SLUG_ALPHABET.contains(&b)));
        assert_ne!(slug, generate_slug(&mut rng));
    }

    #[test]
    fn test_backend_mapping_renames_settings() {
        let mut rec = record("owner", &["https://a.com/1.jpg"]);
        rec.id = Some("id-1".into());
        rec.slug = Some("abcdefgh".into());

        let row = to_backend(&rec).unwrap();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["settings"]["viewMode"], "carousel");
        assert!(json.get("layout").is_none());
        assert_eq!(json["contact_whatsapp"], "972501234567");

        let back = from_backend(row);
        assert_eq!(back.layout, rec.layout);
        assert_eq!(back.items, rec.items);
        assert_eq!(back.meta, rec.meta);
    }

    #[test]
    fn test_to_backend_requires_identity() {
        let rec = record("owner", &[]);
        assert!(matches!(to_backend(&rec), Err(GalleryError::MissingRecord)));
    }

    #[test]
    fn test_from_backend_is_lenient() {
        let row = BackendRow {
            id: "x".into(),
            slug: "slugslug".into(),
            owner_id: "o".into(),
            display_name: None,
            contact_whatsapp: None,
            contact_email: None,
            items: serde_json::json!(["https://youtu.be/dQw4w9WgXcQ", "  "]),
            settings: serde_json::json!("garbage"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let rec = from_backend(row);
        assert_eq!(rec.items.len(), 1);
        assert_eq!(rec.items[0].kind, crate::state::data::MediaKind::Embed);
        assert_eq!(rec.layout, LayoutConfig::default());
    }

    #[test]
    fn test_fork_then_update_in_place() {
        let library = Library::open_in_memory().unwrap();
        let rec = record("owner", &["https://a.com/1.jpg", "https://b.com/2.mp4"]);

        let saved = save(&library, &rec, SaveMode::ForkAsNew).unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.slug.as_ref().unwrap().len(), SLUG_LEN);
        assert_eq!(library.gallery_count().unwrap(), 1);

        let mut edited = saved.clone();
        edited.meta.display_name = Some("Renamed".into());
        edited.items.pop();
        let updated = save(&library, &edited, SaveMode::Update).unwrap();
        assert_eq!(updated.id, saved.id);
        assert_eq!(library.gallery_count().unwrap(), 1);

        let loaded = load_by_slug(&library, saved.slug.as_deref().unwrap()).unwrap();
        assert_eq!(loaded.meta.display_name.as_deref(), Some("Renamed"));
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.created_at, saved.created_at);
    }

    #[test]
    fn test_fork_never_reuses_identity() {
        let library = Library::open_in_memory().unwrap();
        let first = save(&library, &record("owner", &[]), SaveMode::ForkAsNew).unwrap();
        let second = save(&library, &first, SaveMode::ForkAsNew).unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.slug, second.slug);
        assert_eq!(library.gallery_count().unwrap(), 2);
    }

    #[test]
    fn test_update_without_identity_is_refused() {
        let library = Library::open_in_memory().unwrap();
        let result = save(&library, &record("owner", &[]), SaveMode::Update);
        assert!(matches!(result, Err(GalleryError::MissingRecord)));

        let mut ghost = record("owner", &[]);
        ghost.id = Some("missing".into());
        ghost.slug = Some("missing1".into());
        let result = save(&library, &ghost, SaveMode::Update);
        assert!(matches!(result, Err(GalleryError::RecordNotFound(_))));
    }

    #[test]
    fn test_list_and_delete() {
        let library = Library::open_in_memory().unwrap();
        save(&library, &record("alice", &["https://a.com/1.jpg"]), SaveMode::ForkAsNew).unwrap();
        let second = save(&library, &record("alice", &[]), SaveMode::ForkAsNew).unwrap();
        save(&library, &record("bob", &[]), SaveMode::ForkAsNew).unwrap();

        let mine = list_galleries(&library, "alice").unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().any(|g| g.item_count == 1));

        assert!(library.delete(second.id.as_deref().unwrap()).unwrap());
        assert!(!library.delete("nope").unwrap());
        assert_eq!(list_galleries(&library, "alice").unwrap().len(), 1);

        // A deleted gallery's slug is never issued again
        let retired = second.slug.as_deref().unwrap();
        assert!(library.slug_exists(retired).unwrap());
        assert!(matches!(
            load_by_slug(&library, retired),
            Err(GalleryError::RecordNotFound(_))
        ));

        assert!(matches!(
            load_by_slug(&library, "zzzzzzzz"),
            Err(GalleryError::RecordNotFound(_))
        ));
    }
}
