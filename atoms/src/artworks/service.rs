use chrono::Duration;

use super::model::{Artwork, ArtworkFilter, ArtworkPatch, NewArtwork};
use super::store::ArtworkStore;
use crate::clock::Clock;
use crate::error::DataError;

/// Newest first; ties broken by id so listings are stable.
fn sort_newest_first(artworks: &mut [Artwork]) {
    artworks.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Every artwork, ordered by `created_at` descending.
pub async fn list_artworks(store: &dyn ArtworkStore) -> Result<Vec<Artwork>, DataError> {
    let mut artworks = store.list(ArtworkFilter::All).await?;
    sort_newest_first(&mut artworks);
    Ok(artworks)
}

/// Artworks flagged for the homepage, same ordering as `list_artworks`.
pub async fn list_featured_artworks(store: &dyn ArtworkStore) -> Result<Vec<Artwork>, DataError> {
    let mut artworks = store.list(ArtworkFilter::Featured).await?;
    // The store filter is trusted but not relied upon
    artworks.retain(|a| a.featured);
    sort_newest_first(&mut artworks);
    Ok(artworks)
}

pub async fn get_artwork(store: &dyn ArtworkStore, id: &str) -> Result<Artwork, DataError> {
    store
        .get(id)
        .await?
        .ok_or_else(|| DataError::NotFound(id.to_string()))
}

/// Insert a new artwork and return its id.
pub async fn create_artwork(
    store: &dyn ArtworkStore,
    clock: &dyn Clock,
    payload: NewArtwork,
) -> Result<String, DataError> {
    let now = clock.now();
    let artwork = Artwork {
        id: uuid::Uuid::new_v4().to_string(),
        title: payload.title,
        description: payload.description,
        image_url: payload.image_url,
        thumbnail: payload.thumbnail,
        year: payload.year,
        medium: payload.medium,
        dimensions: payload.dimensions,
        featured: payload.featured,
        created_at: now,
        updated_at: now,
    };

    store.insert(&artwork).await?;
    tracing::info!(artwork_id = %artwork.id, title = %artwork.title, "artwork created");

    Ok(artwork.id)
}

/// Merge `patch` into an existing artwork and refresh `updated_at`.
///
/// `updated_at` always moves forward, even when the clock has not. A new
/// `image_url` without a thumbnail of its own drops the stored thumbnail.
pub async fn update_artwork(
    store: &dyn ArtworkStore,
    clock: &dyn Clock,
    id: &str,
    mut patch: ArtworkPatch,
) -> Result<Artwork, DataError> {
    let existing = get_artwork(store, id).await?;

    let image_changed = matches!(&patch.image_url, Some(url) if *url != existing.image_url);
    if image_changed && patch.thumbnail.is_none() && existing.thumbnail.is_some() {
        patch.thumbnail = Some(None);
    }

    let mut updated_at = clock.now();
    if updated_at <= existing.updated_at {
        updated_at = existing.updated_at + Duration::microseconds(1);
    }

    store.update(id, &patch, updated_at).await?;
    tracing::info!(artwork_id = %id, "artwork updated");

    get_artwork(store, id).await
}

/// Remove the record. The image blob it points at is left in place.
pub async fn delete_artwork(store: &dyn ArtworkStore, id: &str) -> Result<(), DataError> {
    store.delete(id).await?;
    tracing::info!(artwork_id = %id, "artwork deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryArtworkStore, ManualClock};
    use chrono::{TimeZone, Utc};

    fn payload(title: &str, featured: bool) -> NewArtwork {
        NewArtwork {
            title: title.to_string(),
            image_url: format!("https://cdn.example/artworks/{}.jpg", title),
            featured,
            ..Default::default()
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn created_artwork_is_listed_with_equal_timestamps() {
        let store = InMemoryArtworkStore::default();
        let clock = clock();

        let id = create_artwork(&store, &clock, payload("Harbour", false)).await.unwrap();
        let listed = list_artworks(&store).await.unwrap();

        let found = listed.iter().find(|a| a.id == id).unwrap();
        assert_eq!(found.title, "Harbour");
        assert_eq!(found.image_url, "https://cdn.example/artworks/Harbour.jpg");
        assert_eq!(found.created_at, found.updated_at);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = InMemoryArtworkStore::default();
        let clock = clock();

        let first = create_artwork(&store, &clock, payload("one", false)).await.unwrap();
        clock.advance(Duration::minutes(1));
        let second = create_artwork(&store, &clock, payload("two", false)).await.unwrap();
        clock.advance(Duration::minutes(1));
        let third = create_artwork(&store, &clock, payload("three", false)).await.unwrap();

        let ids: Vec<String> = list_artworks(&store).await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![third, second, first]);
    }

    #[tokio::test]
    async fn toggling_featured_strictly_advances_updated_at() {
        let store = InMemoryArtworkStore::default();
        let clock = clock();

        let id = create_artwork(&store, &clock, payload("Reeds", false)).await.unwrap();
        let before = get_artwork(&store, &id).await.unwrap();

        // Clock frozen on purpose: the service must still move updated_at forward
        let patch = ArtworkPatch {
            featured: Some(!before.featured),
            ..Default::default()
        };
        let after = update_artwork(&store, &clock, &id, patch).await.unwrap();

        assert!(after.featured);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn replacing_the_image_drops_a_stale_thumbnail() {
        let store = InMemoryArtworkStore::default();
        let clock = clock();

        let id = create_artwork(
            &store,
            &clock,
            NewArtwork {
                thumbnail: Some("https://cdn.example/thumbnails/1_old.jpg".to_string()),
                ..payload("Old", false)
            },
        )
        .await
        .unwrap();

        // Same image: thumbnail survives
        let same = ArtworkPatch {
            image_url: Some("https://cdn.example/artworks/Old.jpg".to_string()),
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let after = update_artwork(&store, &clock, &id, same).await.unwrap();
        assert_eq!(after.thumbnail.as_deref(), Some("https://cdn.example/thumbnails/1_old.jpg"));

        let replaced = ArtworkPatch {
            image_url: Some("https://cdn.example/artworks/2_new.png".to_string()),
            ..Default::default()
        };
        let after = update_artwork(&store, &clock, &id, replaced).await.unwrap();
        assert_eq!(after.image_url, "https://cdn.example/artworks/2_new.png");
        assert_eq!(after.thumbnail, None);

        let with_thumb = ArtworkPatch {
            image_url: Some("https://cdn.example/artworks/3_next.png".to_string()),
            thumbnail: Some(Some("https://cdn.example/thumbnails/3_next.jpg".to_string())),
            ..Default::default()
        };
        let after = update_artwork(&store, &clock, &id, with_thumb).await.unwrap();
        assert_eq!(after.thumbnail.as_deref(), Some("https://cdn.example/thumbnails/3_next.jpg"));
    }

    #[tokio::test]
    async fn updating_unknown_id_is_not_found() {
        let store = InMemoryArtworkStore::default();
        let err = update_artwork(&store, &clock(), "missing", ArtworkPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, DataError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn deleted_artwork_is_never_listed() {
        let store = InMemoryArtworkStore::default();
        let clock = clock();

        let keep = create_artwork(&store, &clock, payload("keep", false)).await.unwrap();
        let gone = create_artwork(&store, &clock, payload("gone", true)).await.unwrap();

        delete_artwork(&store, &gone).await.unwrap();

        let ids: Vec<String> = list_artworks(&store).await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![keep]);
        assert!(matches!(
            delete_artwork(&store, &gone).await,
            Err(DataError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn featured_is_an_ordered_subset_of_all() {
        let store = InMemoryArtworkStore::default();
        let clock = clock();

        for (i, featured) in [true, false, true, true, false].into_iter().enumerate() {
            create_artwork(&store, &clock, payload(&format!("w{}", i), featured))
                .await
                .unwrap();
            clock.advance(Duration::seconds(30));
        }

        let all = list_artworks(&store).await.unwrap();
        let featured = list_featured_artworks(&store).await.unwrap();

        assert_eq!(featured.len(), 3);
        assert!(featured.iter().all(|a| a.featured));

        let expected: Vec<&Artwork> = all.iter().filter(|a| a.featured).collect();
        let got: Vec<&Artwork> = featured.iter().collect();
        assert_eq!(got, expected);
    }
}
