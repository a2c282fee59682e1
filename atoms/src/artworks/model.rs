use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Artwork domain model - one piece in the portfolio
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image_url: String,
    pub thumbnail: Option<String>,
    pub year: Option<i32>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewArtwork {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image_url: String,
    pub thumbnail: Option<String>,
    pub year: Option<i32>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Absent stays `None`, an explicit `null` becomes `Some(None)`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. `id` and `createdAt` are deliberately absent.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// `None` leaves the thumbnail alone, `Some(None)` removes it.
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Option<String>>,
    pub year: Option<i32>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub featured: Option<bool>,
}

/// Which slice of the collection a listing wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtworkFilter {
    All,
    Featured,
}

impl NewArtwork {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "Title is required"));
        }
        if self.image_url.trim().is_empty() {
            return Err(ValidationError::new("imageUrl", "Please select an image"));
        }
        Ok(())
    }
}

impl ArtworkPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(ValidationError::new("title", "Title is required"));
        }
        if matches!(&self.image_url, Some(url) if url.trim().is_empty()) {
            return Err(ValidationError::new("imageUrl", "Image URL cannot be empty"));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == ArtworkPatch::default()
    }

    /// Apply the patch to an in-memory record. Timestamps are the caller's job.
    pub fn apply_to(&self, artwork: &mut Artwork) {
        if let Some(title) = &self.title {
            artwork.title = title.clone();
        }
        if let Some(description) = &self.description {
            artwork.description = description.clone();
        }
        if let Some(image_url) = &self.image_url {
            artwork.image_url = image_url.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            artwork.thumbnail = thumbnail.clone();
        }
        if let Some(year) = self.year {
            artwork.year = Some(year);
        }
        if let Some(medium) = &self.medium {
            artwork.medium = Some(medium.clone());
        }
        if let Some(dimensions) = &self.dimensions {
            artwork.dimensions = Some(dimensions.clone());
        }
        if let Some(featured) = self.featured {
            artwork.featured = featured;
        }
    }
}

impl ArtworkFilter {
    pub fn matches(&self, artwork: &Artwork) -> bool {
        match self {
            ArtworkFilter::All => true,
            ArtworkFilter::Featured => artwork.featured,
        }
    }
}
