//! In-memory slide store.
//!
//! Slides are opaque markup documents keyed by id. The store can be seeded
//! from a directory at startup: every regular file becomes a slide named by
//! its file stem.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use signage_common::{ApiFailure, ApiResult};
use tracing::{debug, info, warn};

/// Longest accepted slide id.
pub const MAX_SLIDE_ID_LEN: usize = 64;

/// Check that `id` is 1-64 characters of `[A-Za-z0-9_-]`.
pub fn validate_slide_id(id: &str) -> ApiResult<()> {
    if id.is_empty() {
        return Err(ApiFailure::argument("Slide id must not be empty."));
    }
    if id.len() > MAX_SLIDE_ID_LEN {
        return Err(ApiFailure::argument(format!(
            "Slide id longer than {MAX_SLIDE_ID_LEN} characters."
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiFailure::argument(format!("Invalid slide id '{id}'.")));
    }
    Ok(())
}

/// Slide storage shared by all request handlers.
pub struct SlideStore {
    slides: RwLock<BTreeMap<String, String>>,
    max_slides: usize,
}

impl SlideStore {
    pub fn new(max_slides: usize) -> Self {
        Self {
            slides: RwLock::new(BTreeMap::new()),
            max_slides,
        }
    }

    /// Insert or replace a slide.
    ///
    /// Adding a new id to a full store is rejected as a limit failure.
    pub fn insert(&self, id: &str, markup: impl Into<String>) -> ApiResult<()> {
        validate_slide_id(id)?;
        let mut slides = self.slides.write().unwrap_or_else(|e| e.into_inner());
        if !slides.contains_key(id) && slides.len() >= self.max_slides {
            return Err(ApiFailure::limit(format!(
                "Slide limit of {} reached.",
                self.max_slides
            )));
        }
        slides.insert(id.to_string(), markup.into());
        Ok(())
    }

    /// Markup of slide `id`.
    pub fn get(&self, id: &str) -> ApiResult<String> {
        validate_slide_id(id)?;
        let slides = self.slides.read().unwrap_or_else(|e| e.into_inner());
        slides
            .get(id)
            .cloned()
            .ok_or_else(|| ApiFailure::argument(format!("Slide '{id}' doesn't exist.")))
    }

    /// Delete slide `id`.
    pub fn remove(&self, id: &str) -> ApiResult<()> {
        validate_slide_id(id)?;
        let mut slides = self.slides.write().unwrap_or_else(|e| e.into_inner());
        match slides.remove(id) {
            Some(_) => {
                debug!(slide = id, "Removed slide");
                Ok(())
            }
            None => Err(ApiFailure::argument(format!("Slide '{id}' doesn't exist."))),
        }
    }

    /// All slide ids in order.
    pub fn ids(&self) -> Vec<String> {
        let slides = self.slides.read().unwrap_or_else(|e| e.into_inner());
        slides.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slides.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed the store from the regular files in `dir`.
    ///
    /// Returns the number of slides loaded.
    pub async fn load_dir(&self, dir: &Path) -> ApiResult<usize> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut loaded = 0;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Err(e) = validate_slide_id(id) {
                warn!("Skipping {:?}: {}", path, e);
                continue;
            }
            let markup = tokio::fs::read_to_string(&path).await?;
            self.insert(id, markup)?;
            loaded += 1;
        }

        info!("Loaded {} slides from {:?}", loaded, dir);
        Ok(loaded)
    }
}
