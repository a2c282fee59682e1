use chrono::{DateTime, Duration, Utc};

use folio_atoms::artworks::{self, Artwork, ArtworkPatch, ArtworkStore};
use folio_atoms::Clock;

/// How long a success notice stays up.
pub const NOTICE_SECONDS: i64 = 3;

/// Admin list of every artwork.
#[derive(Debug, Clone)]
pub struct AdminDashboard {
    artworks: Vec<Artwork>,
    loading: bool,
    error: Option<String>,
    pending_delete: Option<String>,
    deleting: bool,
    notice: Option<(String, DateTime<Utc>)>,
}

impl Default for AdminDashboard {
    fn default() -> Self {
        Self {
            artworks: Vec::new(),
            loading: true,
            error: None,
            pending_delete: None,
            deleting: false,
            notice: None,
        }
    }
}

impl AdminDashboard {
    pub async fn load(&mut self, store: &dyn ArtworkStore) {
        self.loading = true;
        match artworks::list_artworks(store).await {
            Ok(list) => {
                self.artworks = list;
                self.error = None;
            }
            Err(e) => {
                tracing::error!("dashboard load failed: {}", e);
                self.error = Some("Failed to load artworks. Please try again.".to_string());
            }
        }
        self.loading = false;
    }

    pub fn artworks(&self) -> &[Artwork] {
        &self.artworks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// The success notice, while it is still fresh at `now`.
    pub fn notice(&self, now: DateTime<Utc>) -> Option<&str> {
        match &self.notice {
            Some((text, shown_at)) if now - *shown_at < Duration::seconds(NOTICE_SECONDS) => {
                Some(text.as_str())
            }
            _ => None,
        }
    }

    /// Ask for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: &str) {
        self.pending_delete = Some(id.to_string());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the record awaiting confirmation. Its image stays in storage.
    pub async fn confirm_delete(&mut self, store: &dyn ArtworkStore, clock: &dyn Clock) {
        let Some(id) = self.pending_delete.clone() else {
            return;
        };

        self.deleting = true;
        match artworks::delete_artwork(store, &id).await {
            Ok(()) => {
                self.artworks.retain(|a| a.id != id);
                self.notice = Some(("Artwork deleted successfully".to_string(), clock.now()));
            }
            Err(e) => {
                tracing::error!(artwork_id = %id, "delete failed: {}", e);
                self.error = Some("Failed to delete artwork. Please try again.".to_string());
            }
        }
        self.deleting = false;
        self.pending_delete = None;
    }

    pub async fn toggle_featured(&mut self, store: &dyn ArtworkStore, clock: &dyn Clock, id: &str) {
        let Some(current) = self.artworks.iter().find(|a| a.id == id).map(|a| a.featured) else {
            return;
        };

        let patch = ArtworkPatch {
            featured: Some(!current),
            ..Default::default()
        };
        match artworks::update_artwork(store, clock, id, patch).await {
            Ok(updated) => {
                let text = if updated.featured {
                    "Artwork featured successfully"
                } else {
                    "Artwork unfeatured successfully"
                };
                if let Some(slot) = self.artworks.iter_mut().find(|a| a.id == id) {
                    *slot = updated;
                }
                self.notice = Some((text.to_string(), clock.now()));
            }
            Err(e) => {
                tracing::error!(artwork_id = %id, "toggle featured failed: {}", e);
                self.error = Some("Failed to update artwork. Please try again.".to_string());
            }
        }
    }
}
