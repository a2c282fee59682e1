use folio_atoms::artworks::{self, Artwork, ArtworkStore};

use crate::overlay::{DetailOverlay, OverlayKey};

/// Grid of artworks with the detail overlay on top.
#[derive(Debug, Clone)]
pub struct GalleryView {
    artworks: Vec<Artwork>,
    overlay: DetailOverlay,
    loading: bool,
    error: Option<String>,
}

impl Default for GalleryView {
    fn default() -> Self {
        Self {
            artworks: Vec::new(),
            overlay: DetailOverlay::new(0),
            loading: false,
            error: None,
        }
    }
}

impl GalleryView {
    pub fn with_artworks(artworks: Vec<Artwork>) -> Self {
        let overlay = DetailOverlay::new(artworks.len());
        Self {
            artworks,
            overlay,
            ..Default::default()
        }
    }

    /// Fetch the collection. The home page shows only featured work.
    pub async fn load(&mut self, store: &dyn ArtworkStore, featured_only: bool) {
        self.loading = true;
        self.error = None;

        let result = if featured_only {
            artworks::list_featured_artworks(store).await
        } else {
            artworks::list_artworks(store).await
        };

        match result {
            Ok(list) => {
                self.overlay.resize(list.len());
                self.artworks = list;
            }
            Err(e) => {
                tracing::error!("gallery load failed: {}", e);
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

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn overlay(&self) -> &DetailOverlay {
        &self.overlay
    }

    pub fn open(&mut self, index: usize) {
        self.overlay.open(index);
    }

    pub fn close(&mut self) {
        self.overlay.close();
    }

    pub fn next(&mut self) {
        self.overlay.next();
    }

    pub fn previous(&mut self) {
        self.overlay.previous();
    }

    pub fn handle_key(&mut self, key: OverlayKey) -> bool {
        self.overlay.handle_key(key)
    }

    /// The record shown in the overlay, if open.
    pub fn selected(&self) -> Option<&Artwork> {
        self.overlay.current().and_then(|i| self.artworks.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use folio_atoms::artworks::NewArtwork;
    use folio_atoms::memory::{InMemoryArtworkStore, ManualClock};

    async fn seeded() -> InMemoryArtworkStore {
        let store = InMemoryArtworkStore::default();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        for (title, featured) in [("Dunes", true), ("Kelp", false), ("Tide", true)] {
            let payload = NewArtwork {
                title: title.to_string(),
                image_url: format!("https://cdn.example/{}.jpg", title),
                featured,
                ..Default::default()
            };
            artworks::create_artwork(&store, &clock, payload).await.unwrap();
            clock.advance(Duration::hours(1));
        }
        store
    }

    #[tokio::test]
    async fn loads_newest_first_and_opens_by_index() {
        let store = seeded().await;
        let mut view = GalleryView::default();
        view.load(&store, false).await;

        let titles: Vec<&str> = view.artworks().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Tide", "Kelp", "Dunes"]);

        view.open(1);
        assert_eq!(view.selected().map(|a| a.title.as_str()), Some("Kelp"));
        view.next();
        view.next();
        assert_eq!(view.selected().map(|a| a.title.as_str()), Some("Dunes"));
        assert!(!view.overlay().has_next());
    }

    #[tokio::test]
    async fn home_page_shows_featured_only() {
        let store = seeded().await;
        let mut view = GalleryView::default();
        view.load(&store, true).await;

        assert_eq!(view.artworks().len(), 2);
        assert!(view.artworks().iter().all(|a| a.featured));
        assert!(!view.is_loading());
        assert!(view.error().is_none());
    }

    #[test]
    fn escape_closes_the_overlay() {
        let mut view = GalleryView::with_artworks(Vec::new());
        view.open(0);
        assert!(view.selected().is_none());
        assert!(!view.handle_key(OverlayKey::Escape));
    }
}
