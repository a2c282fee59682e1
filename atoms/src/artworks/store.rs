use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;

use super::model::{Artwork, ArtworkFilter, ArtworkPatch};
use crate::error::DataError;

const ARTWORK_PK: &str = "ARTWORK";
const ARTWORK_SK_PREFIX: &str = "ARTWORK#";

/// The document collection holding artwork records.
///
/// Implementations only move records in and out; ordering, timestamps and id
/// assignment belong to the service layer.
#[async_trait]
pub trait ArtworkStore: Send + Sync {
    async fn insert(&self, artwork: &Artwork) -> Result<(), DataError>;

    async fn get(&self, id: &str) -> Result<Option<Artwork>, DataError>;

    /// Unordered listing of every record matching `filter`.
    async fn list(&self, filter: ArtworkFilter) -> Result<Vec<Artwork>, DataError>;

    /// Fails with `DataError::NotFound` when `id` does not exist.
    async fn update(
        &self,
        id: &str,
        patch: &ArtworkPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DataError>;

    /// Fails with `DataError::NotFound` when `id` does not exist.
    async fn delete(&self, id: &str) -> Result<(), DataError>;
}

/// DynamoDB single-table layout:
/// PK = "ARTWORK"
/// SK = "ARTWORK#{id}"
pub struct DynamoArtworkStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoArtworkStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, field: &str, raw: Option<&str>) -> Result<DateTime<Utc>, DataError> {
    let raw = raw.ok_or_else(|| DataError::Corrupt(format!("artwork {} has no {}", id, field)))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DataError::Corrupt(format!("artwork {} has bad {}: {}", id, field, e)))
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

fn artwork_from_item(id: &str, item: &HashMap<String, AttributeValue>) -> Result<Artwork, DataError> {
    Ok(Artwork {
        id: id.to_string(),
        title: string_attr(item, "title").unwrap_or_default(),
        description: string_attr(item, "description").unwrap_or_default(),
        image_url: string_attr(item, "image_url").unwrap_or_default(),
        thumbnail: string_attr(item, "thumbnail"),
        year: item.get("year").and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok()),
        medium: string_attr(item, "medium"),
        dimensions: string_attr(item, "dimensions"),
        featured: item.get("featured").and_then(|v| v.as_bool().ok()).copied().unwrap_or(false),
        created_at: parse_timestamp(id, "created_at", item.get("created_at").and_then(|v| v.as_s().ok()).map(|s| s.as_str()))?,
        updated_at: parse_timestamp(id, "updated_at", item.get("updated_at").and_then(|v| v.as_s().ok()).map(|s| s.as_str()))?,
    })
}

/// SET / REMOVE clauses for an `update_item` call.
struct UpdateExpression {
    set: Vec<&'static str>,
    remove: Vec<&'static str>,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    fn from_patch(patch: &ArtworkPatch, updated_at: &DateTime<Utc>) -> Self {
        let mut update = UpdateExpression {
            set: Vec::new(),
            remove: Vec::new(),
            names: HashMap::new(),
            values: HashMap::new(),
        };

        update.set_attr("#updated_at = :updated_at", "updated_at", AttributeValue::S(format_timestamp(updated_at)));

        if let Some(title) = &patch.title {
            update.set_attr("#title = :title", "title", AttributeValue::S(title.clone()));
        }
        if let Some(description) = &patch.description {
            update.set_attr("#description = :description", "description", AttributeValue::S(description.clone()));
        }
        if let Some(image_url) = &patch.image_url {
            update.set_attr("#image_url = :image_url", "image_url", AttributeValue::S(image_url.clone()));
        }
        match &patch.thumbnail {
            Some(Some(thumbnail)) => {
                update.set_attr("#thumbnail = :thumbnail", "thumbnail", AttributeValue::S(thumbnail.clone()))
            }
            Some(None) => {
                update.remove.push("#thumbnail");
                update.names.insert("#thumbnail".to_string(), "thumbnail".to_string());
            }
            None => {}
        }
        // "year" is a DynamoDB reserved word, hence the name placeholders throughout
        if let Some(year) = patch.year {
            update.set_attr("#year = :year", "year", AttributeValue::N(year.to_string()));
        }
        if let Some(medium) = &patch.medium {
            update.set_attr("#medium = :medium", "medium", AttributeValue::S(medium.clone()));
        }
        if let Some(dimensions) = &patch.dimensions {
            update.set_attr("#dimensions = :dimensions", "dimensions", AttributeValue::S(dimensions.clone()));
        }
        if let Some(featured) = patch.featured {
            update.set_attr("#featured = :featured", "featured", AttributeValue::Bool(featured));
        }

        update
    }

    fn set_attr(&mut self, clause: &'static str, attribute: &str, value: AttributeValue) {
        self.set.push(clause);
        self.names.insert(format!("#{}", attribute), attribute.to_string());
        self.values.insert(format!(":{}", attribute), value);
    }

    fn expression(&self) -> String {
        let mut expression = format!("SET {}", self.set.join(", "));
        if !self.remove.is_empty() {
            expression.push_str(" REMOVE ");
            expression.push_str(&self.remove.join(", "));
        }
        expression
    }
}

#[async_trait]
impl ArtworkStore for DynamoArtworkStore {
    async fn insert(&self, artwork: &Artwork) -> Result<(), DataError> {
        let mut builder = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(ARTWORK_PK.to_string()))
            .item("SK", AttributeValue::S(format!("{}{}", ARTWORK_SK_PREFIX, artwork.id)))
            .item("title", AttributeValue::S(artwork.title.clone()))
            .item("description", AttributeValue::S(artwork.description.clone()))
            .item("image_url", AttributeValue::S(artwork.image_url.clone()))
            .item("featured", AttributeValue::Bool(artwork.featured))
            .item("created_at", AttributeValue::S(format_timestamp(&artwork.created_at)))
            .item("updated_at", AttributeValue::S(format_timestamp(&artwork.updated_at)))
            .condition_expression("attribute_not_exists(SK)");

        // Optional attributes are left out rather than stored empty
        if let Some(thumbnail) = &artwork.thumbnail {
            builder = builder.item("thumbnail", AttributeValue::S(thumbnail.clone()));
        }
        if let Some(year) = artwork.year {
            builder = builder.item("year", AttributeValue::N(year.to_string()));
        }
        if let Some(medium) = &artwork.medium {
            builder = builder.item("medium", AttributeValue::S(medium.clone()));
        }
        if let Some(dimensions) = &artwork.dimensions {
            builder = builder.item("dimensions", AttributeValue::S(dimensions.clone()));
        }

        builder.send().await.map_err(|e| {
            DataError::Backend(format!("DynamoDB put_item error: {}", DisplayErrorContext(&e)))
        })?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Artwork>, DataError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(ARTWORK_PK.to_string()))
            .key("SK", AttributeValue::S(format!("{}{}", ARTWORK_SK_PREFIX, id)))
            .send()
            .await
            .map_err(|e| {
                DataError::Backend(format!("DynamoDB get_item error: {}", DisplayErrorContext(&e)))
            })?;

        result.item().map(|item| artwork_from_item(id, item)).transpose()
    }

    async fn list(&self, filter: ArtworkFilter) -> Result<Vec<Artwork>, DataError> {
        let mut artworks = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        // A query page tops out at 1 MB, keep following LastEvaluatedKey
        loop {
            let mut query = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", AttributeValue::S(ARTWORK_PK.to_string()))
                .expression_attribute_values(
                    ":sk_prefix",
                    AttributeValue::S(ARTWORK_SK_PREFIX.to_string()),
                )
                .set_exclusive_start_key(start_key.take());

            if filter == ArtworkFilter::Featured {
                query = query
                    .filter_expression("featured = :featured")
                    .expression_attribute_values(":featured", AttributeValue::Bool(true));
            }

            let page = query.send().await.map_err(|e| {
                DataError::Backend(format!("DynamoDB query error: {}", DisplayErrorContext(&e)))
            })?;

            for item in page.items() {
                if let Some(id) = item
                    .get("SK")
                    .and_then(|v| v.as_s().ok())
                    .and_then(|sk| sk.strip_prefix(ARTWORK_SK_PREFIX))
                {
                    artworks.push(artwork_from_item(id, item)?);
                }
            }

            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(artworks)
    }

    async fn update(
        &self,
        id: &str,
        patch: &ArtworkPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DataError> {
        let update = UpdateExpression::from_patch(patch, &updated_at);

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(ARTWORK_PK.to_string()))
            .key("SK", AttributeValue::S(format!("{}{}", ARTWORK_SK_PREFIX, id)))
            .update_expression(update.expression())
            .condition_expression("attribute_exists(SK)");

        for (k, v) in update.names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in update.values {
            builder = builder.expression_attribute_values(k, v);
        }

        builder.send().await.map_err(|e| {
            if e.as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false)
            {
                DataError::NotFound(id.to_string())
            } else {
                DataError::Backend(format!("DynamoDB update_item error: {}", DisplayErrorContext(&e)))
            }
        })?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DataError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(ARTWORK_PK.to_string()))
            .key("SK", AttributeValue::S(format!("{}{}", ARTWORK_SK_PREFIX, id)))
            .condition_expression("attribute_exists(SK)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false)
                {
                    DataError::NotFound(id.to_string())
                } else {
                    DataError::Backend(format!("DynamoDB delete_item error: {}", DisplayErrorContext(&e)))
                }
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, AttributeValue)]) -> HashMap<String, AttributeValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn item_round_trips_optional_fields() {
        let raw = item(&[
            ("title", AttributeValue::S("Night Field".to_string())),
            ("image_url", AttributeValue::S("https://cdn.example/a.jpg".to_string())),
            ("year", AttributeValue::N("2019".to_string())),
            ("featured", AttributeValue::Bool(true)),
            ("created_at", AttributeValue::S("2024-01-02T03:04:05.000006Z".to_string())),
            ("updated_at", AttributeValue::S("2024-01-02T03:04:05.000006Z".to_string())),
        ]);

        let artwork = artwork_from_item("n1", &raw).unwrap();
        assert_eq!(artwork.id, "n1");
        assert_eq!(artwork.year, Some(2019));
        assert!(artwork.featured);
        assert_eq!(artwork.medium, None);
        assert_eq!(artwork.description, "");
        assert_eq!(format_timestamp(&artwork.created_at), "2024-01-02T03:04:05.000006Z");
    }

    #[test]
    fn cleared_thumbnail_becomes_a_remove_clause() {
        let at = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z").unwrap().with_timezone(&Utc);
        let patch = ArtworkPatch {
            image_url: Some("https://cdn.example/artworks/2_new.png".to_string()),
            thumbnail: Some(None),
            ..Default::default()
        };

        let update = UpdateExpression::from_patch(&patch, &at);
        assert_eq!(
            update.expression(),
            "SET #updated_at = :updated_at, #image_url = :image_url REMOVE #thumbnail"
        );
        assert_eq!(update.names.get("#thumbnail").map(String::as_str), Some("thumbnail"));
        assert!(!update.values.contains_key(":thumbnail"));

        let untouched = UpdateExpression::from_patch(&ArtworkPatch::default(), &at);
        assert_eq!(untouched.expression(), "SET #updated_at = :updated_at");
        assert!(!untouched.names.contains_key("#thumbnail"));
    }

    #[test]
    fn missing_timestamp_is_corrupt() {
        let raw = item(&[("title", AttributeValue::S("No dates".to_string()))]);
        assert!(matches!(artwork_from_item("x", &raw), Err(DataError::Corrupt(_))));
    }
}
