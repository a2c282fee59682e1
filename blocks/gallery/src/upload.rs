use chrono::Datelike;
use futures::StreamExt;
use std::sync::Arc;

use folio_atoms::artworks::{self, ArtworkPatch, ArtworkStore, NewArtwork};
use folio_atoms::error::{DataError, ValidationError};
use folio_atoms::media::{self, check_image, BlobStore, UploadOptions, UploadProgress};
use folio_atoms::Clock;

pub const EARLIEST_YEAR: i32 = 1900;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

/// What the image box shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// The stored image of the record being edited.
    Remote(String),
    /// A file picked locally, not uploaded yet.
    Local(String),
}

/// A file the admin picked, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Add / edit artwork form.
#[derive(Debug, Clone)]
pub struct UploadForm {
    mode: FormMode,
    pub title: String,
    pub description: String,
    pub year: Option<i32>,
    pub medium: String,
    pub dimensions: String,
    pub featured: bool,
    image_url: String,
    file: Option<SelectedImage>,
    preview: Option<Preview>,
    progress: Option<UploadProgress>,
    loading: bool,
    error: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl UploadForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            description: String::new(),
            year: None,
            medium: String::new(),
            dimensions: String::new(),
            featured: false,
            image_url: String::new(),
            file: None,
            preview: None,
            progress: None,
            loading: false,
            error: None,
        }
    }

    /// Prefill the form from a stored record.
    pub async fn edit(store: &dyn ArtworkStore, id: &str) -> Result<Self, DataError> {
        let artwork = artworks::get_artwork(store, id).await?;
        Ok(Self {
            mode: FormMode::Edit(artwork.id),
            title: artwork.title,
            description: artwork.description,
            year: artwork.year,
            medium: artwork.medium.unwrap_or_default(),
            dimensions: artwork.dimensions.unwrap_or_default(),
            featured: artwork.featured,
            preview: Some(Preview::Remote(artwork.image_url.clone())),
            image_url: artwork.image_url,
            ..Self::create()
        })
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn selected_file(&self) -> Option<&SelectedImage> {
        self.file.as_ref()
    }

    pub fn progress(&self) -> Option<UploadProgress> {
        self.progress
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Take a picked file. A rejected file leaves the previous selection and
    /// preview in place.
    pub fn select_image(
        &mut self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ValidationError> {
        if let Err(e) = check_image(content_type, bytes.len() as u64) {
            self.error = Some(e.message.clone());
            return Err(e);
        }

        self.preview = Some(Preview::Local(file_name.to_string()));
        self.file = Some(SelectedImage {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        self.error = None;
        Ok(())
    }

    pub fn validate(&self, current_year: i32) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "Title is required"));
        }
        if let Some(year) = self.year {
            if !(EARLIEST_YEAR..=current_year).contains(&year) {
                return Err(ValidationError::new(
                    "year",
                    format!("Year must be between {} and {}", EARLIEST_YEAR, current_year),
                ));
            }
        }
        if self.mode == FormMode::Create && self.file.is_none() {
            return Err(ValidationError::new("image", "Please select an image"));
        }
        Ok(())
    }

    /// Upload the picked image (if any), then create or update the record.
    /// Returns the record id; on failure the message is in `error()`.
    pub async fn submit(
        &mut self,
        store: &dyn ArtworkStore,
        blobs: Arc<dyn BlobStore>,
        clock: &dyn Clock,
    ) -> Option<String> {
        self.error = None;

        if let Err(e) = self.validate(clock.now().year()) {
            self.error = Some(e.message);
            return None;
        }

        self.loading = true;
        let result = self.save(store, blobs, clock).await;
        self.loading = false;

        match result {
            Ok(id) => Some(id),
            Err(message) => {
                tracing::error!("saving artwork failed: {}", message);
                self.error = Some(message);
                None
            }
        }
    }

    async fn save(
        &mut self,
        store: &dyn ArtworkStore,
        blobs: Arc<dyn BlobStore>,
        clock: &dyn Clock,
    ) -> Result<String, String> {
        // Some(..) once a new image went up; its thumbnail may have failed
        let mut new_thumbnail: Option<Option<String>> = None;

        if let Some(file) = self.file.clone() {
            let path = media::storage_path(&file.file_name, clock.now());
            let mut handle = media::upload_image(
                blobs.clone(),
                file.bytes.clone(),
                path.clone(),
                file.content_type,
                UploadOptions::default(),
            );
            {
                let mut progress = handle.progress();
                while let Some(p) = progress.next().await {
                    self.progress = Some(p);
                }
            }
            self.image_url = handle.finish().await.map_err(|e| e.to_string())?;
            self.file = None;

            let thumbnail = media::store_thumbnail(blobs, file.bytes, &path).await;
            new_thumbnail = Some(thumbnail.map(|(_, url)| url));
        }

        match &self.mode {
            FormMode::Create => {
                let payload = NewArtwork {
                    title: self.title.trim().to_string(),
                    description: self.description.clone(),
                    image_url: self.image_url.clone(),
                    thumbnail: new_thumbnail.flatten(),
                    year: self.year,
                    medium: non_empty(&self.medium),
                    dimensions: non_empty(&self.dimensions),
                    featured: self.featured,
                };
                artworks::create_artwork(store, clock, payload)
                    .await
                    .map_err(|e| e.to_string())
            }
            FormMode::Edit(id) => {
                let patch = ArtworkPatch {
                    title: Some(self.title.trim().to_string()),
                    description: Some(self.description.clone()),
                    image_url: Some(self.image_url.clone()),
                    thumbnail: new_thumbnail,
                    year: self.year,
                    medium: Some(self.medium.trim().to_string()),
                    dimensions: Some(self.dimensions.trim().to_string()),
                    featured: Some(self.featured),
                };
                artworks::update_artwork(store, clock, id, patch)
                    .await
                    .map(|artwork| artwork.id)
                    .map_err(|e| e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use folio_atoms::memory::{InMemoryArtworkStore, InMemoryBlobStore, ManualClock};

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap())
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::ImageBuffer::from_pixel(width, height, image::Rgb([30u8, 90, 160]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageOutputFormat::Png)
            .unwrap();
        out
    }

    async fn record_with_thumbnail(store: &InMemoryArtworkStore, clock: &ManualClock) -> String {
        artworks::create_artwork(
            store,
            clock,
            NewArtwork {
                title: "Old".to_string(),
                image_url: "https://cdn.example/artworks/1_old.png".to_string(),
                thumbnail: Some("https://cdn.example/thumbnails/1_old.jpg".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn rejected_file_keeps_previous_preview() {
        let mut form = UploadForm::create();
        form.select_image("sea.png", "image/png", vec![1, 2, 3]).unwrap();

        let err = form
            .select_image("notes.pdf", "application/pdf", vec![1])
            .unwrap_err();
        assert_eq!(err.message, "Please select an image file");
        assert_eq!(form.error(), Some("Please select an image file"));
        assert_eq!(form.preview(), Some(&Preview::Local("sea.png".to_string())));

        let big = vec![0u8; media::MAX_IMAGE_BYTES as usize + 1];
        assert!(form.select_image("huge.jpg", "image/jpeg", big).is_err());
        assert_eq!(form.error(), Some("Image size should be less than 5MB"));
        assert_eq!(form.selected_file().map(|f| f.file_name.as_str()), Some("sea.png"));
    }

    #[test]
    fn year_must_be_in_range() {
        let mut form = UploadForm::create();
        form.title = "Lagoon".to_string();
        form.select_image("l.png", "image/png", vec![1]).unwrap();

        form.year = Some(1899);
        assert_eq!(form.validate(2025).unwrap_err().field, "year");
        form.year = Some(2026);
        assert_eq!(form.validate(2025).unwrap_err().field, "year");
        form.year = Some(1900);
        assert!(form.validate(2025).is_ok());
        form.year = None;
        assert!(form.validate(2025).is_ok());
    }

    #[tokio::test]
    async fn create_requires_an_image() {
        let store = InMemoryArtworkStore::default();
        let blobs = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let mut form = UploadForm::create();
        form.title = "Lagoon".to_string();

        assert!(form.submit(&store, blobs, &clock()).await.is_none());
        assert_eq!(form.error(), Some("Please select an image"));
        assert!(artworks::list_artworks(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_uploads_then_inserts() {
        let store = InMemoryArtworkStore::default();
        let blobs = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let clock = clock();

        let mut form = UploadForm::create();
        form.title = "Salt flats".to_string();
        form.year = Some(2024);
        form.select_image("salt flats.png", "image/png", vec![9; 32]).unwrap();

        let id = form.submit(&store, blobs.clone(), &clock).await.unwrap();
        let saved = artworks::get_artwork(&store, &id).await.unwrap();

        let expected_path = format!("artworks/{}_salt_flats.png", clock.now().timestamp_millis());
        assert_eq!(saved.image_url, format!("https://cdn.example/{}", expected_path));
        assert_eq!(blobs.object(&expected_path), Some(vec![9; 32]));
        assert_eq!(saved.year, Some(2024));
        assert_eq!(form.progress().map(|p| p.bytes_sent), Some(32));
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn edit_without_new_image_keeps_the_url() {
        let store = InMemoryArtworkStore::default();
        let blobs = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let clock = clock();

        let id = artworks::create_artwork(
            &store,
            &clock,
            NewArtwork {
                title: "Old".to_string(),
                image_url: "https://cdn.example/artworks/1_old.png".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mut form = UploadForm::edit(&store, &id).await.unwrap();
        assert_eq!(form.mode(), &FormMode::Edit(id.clone()));
        assert_eq!(
            form.preview(),
            Some(&Preview::Remote("https://cdn.example/artworks/1_old.png".to_string()))
        );

        form.title = "New".to_string();
        form.featured = true;
        assert_eq!(form.submit(&store, blobs.clone(), &clock).await, Some(id.clone()));

        let saved = artworks::get_artwork(&store, &id).await.unwrap();
        assert_eq!(saved.title, "New");
        assert!(saved.featured);
        assert_eq!(saved.image_url, "https://cdn.example/artworks/1_old.png");
        assert!(blobs.paths().is_empty());
    }

    #[tokio::test]
    async fn new_image_on_edit_replaces_the_thumbnail() {
        let store = InMemoryArtworkStore::default();
        let blobs = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let clock = clock();
        let id = record_with_thumbnail(&store, &clock).await;

        let mut form = UploadForm::edit(&store, &id).await.unwrap();
        form.select_image("new.png", "image/png", png(900, 600)).unwrap();
        assert_eq!(form.submit(&store, blobs.clone(), &clock).await, Some(id.clone()));

        let millis = clock.now().timestamp_millis();
        let saved = artworks::get_artwork(&store, &id).await.unwrap();
        assert_eq!(saved.image_url, format!("https://cdn.example/artworks/{}_new.png", millis));
        assert_eq!(
            saved.thumbnail,
            Some(format!("https://cdn.example/thumbnails/{}_new.jpg", millis))
        );
        assert!(blobs.object(&format!("thumbnails/{}_new.jpg", millis)).is_some());
    }

    #[tokio::test]
    async fn new_image_without_thumbnail_clears_the_old_one() {
        let store = InMemoryArtworkStore::default();
        let blobs = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let clock = clock();
        let id = record_with_thumbnail(&store, &clock).await;

        // Not decodable, so no thumbnail can be rendered
        let mut form = UploadForm::edit(&store, &id).await.unwrap();
        form.select_image("new.png", "image/png", vec![4; 16]).unwrap();
        assert_eq!(form.submit(&store, blobs, &clock).await, Some(id.clone()));

        let saved = artworks::get_artwork(&store, &id).await.unwrap();
        assert!(saved.image_url.ends_with("_new.png"));
        assert_eq!(saved.thumbnail, None);
    }

    #[tokio::test]
    async fn edit_without_new_image_keeps_the_thumbnail() {
        let store = InMemoryArtworkStore::default();
        let blobs = Arc::new(InMemoryBlobStore::new("https://cdn.example"));
        let clock = clock();
        let id = record_with_thumbnail(&store, &clock).await;

        let mut form = UploadForm::edit(&store, &id).await.unwrap();
        form.title = "Retitled".to_string();
        form.submit(&store, blobs, &clock).await.unwrap();

        let saved = artworks::get_artwork(&store, &id).await.unwrap();
        assert_eq!(saved.thumbnail.as_deref(), Some("https://cdn.example/thumbnails/1_old.jpg"));
    }

    #[tokio::test]
    async fn editing_unknown_record_fails() {
        let store = InMemoryArtworkStore::default();
        assert!(matches!(
            UploadForm::edit(&store, "nope").await,
            Err(DataError::NotFound(_))
        ));
    }
}
