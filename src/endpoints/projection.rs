//! Projection engine
//!
//! Maps a fetched entity into the declared output shape. A missing property,
//! field, reference or image only nulls its own alias; the rest of the row is
//! still rendered.

use crate::core::definition::{ImageSource, Multiplicity, ProjectionSpec, SourceRef};
use crate::core::entity::Entity;
use crate::core::service::ImageStyles;
use serde_json::{Map, Value};

/// Project one entity through a spec
///
/// The returned object keeps the declared alias order.
pub fn project(spec: &ProjectionSpec, entity: &dyn Entity, images: &dyn ImageStyles) -> Map<String, Value> {
    let mut row = Map::with_capacity(spec.len());

    for entry in spec.entries() {
        let value = match &entry.source {
            SourceRef::Property(name) => entity.property(name).map(|v| v.to_json()),
            SourceRef::Field(name) => entity.field(name).map(|v| v.primary().to_json()),
            SourceRef::Path => entity.path().map(Value::String),
            SourceRef::Image(image) => project_image(image, entity, images),
            SourceRef::Reference(reference) => {
                entity
                    .referenced(&reference.field)
                    .map(|targets| match reference.multiplicity {
                        Multiplicity::Many => Value::Array(
                            targets
                                .iter()
                                .map(|target| {
                                    Value::Object(project(&reference.projection, target.as_ref(), images))
                                })
                                .collect(),
                        ),
                        Multiplicity::Single => targets
                            .first()
                            .map(|target| {
                                Value::Object(project(&reference.projection, target.as_ref(), images))
                            })
                            .unwrap_or(Value::Null),
                    })
            }
            // Only meaningful on variable endpoints, which never project entities.
            SourceRef::Variable(_) => None,
        };

        let value = value.unwrap_or_else(|| {
            tracing::debug!(alias = %entry.alias, "Source missing on entity, rendering null");
            Value::Null
        });
        row.insert(entry.alias.clone(), value);
    }

    row
}

/// Derived style URLs followed by the configured sub-fields
fn project_image(source: &ImageSource, entity: &dyn Entity, images: &dyn ImageStyles) -> Option<Value> {
    let field = entity.field(&source.field)?;
    let image = field.primary().as_image()?;

    let mut object = Map::with_capacity(source.styles.len() + source.fields.len());
    for (alias, style) in &source.styles {
        let url = images.resolve(image, style).map(Value::String);
        if url.is_none() {
            tracing::debug!(style = %style, "Unknown image style, rendering null");
        }
        object.insert(alias.clone(), url.unwrap_or(Value::Null));
    }
    for (alias, sub_field) in &source.fields {
        let value = image
            .field(sub_field)
            .map(|v| v.to_json())
            .unwrap_or(Value::Null);
        object.insert(alias.clone(), value);
    }

    Some(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::definition::{ImageSource, ReferenceSource};
    use crate::core::field::ImageValue;
    use crate::storage::in_memory::{PrefixImageStyles, StoredEntity};
    use serde_json::json;
    use std::sync::Arc;

    fn images() -> PrefixImageStyles {
        PrefixImageStyles::new("https://cdn.example.com/files", ["thumbnail", "medium"])
    }

    fn teaser_spec() -> ProjectionSpec {
        ProjectionSpec::new().property("id", "nid").image(
            "teaser_image",
            ImageSource::new("field_teaser_image")
                .style("thumbnail", "thumbnail")
                .style("medium", "medium")
                .sub_field("alt", "field_file_image_alt_text"),
        )
    }

    #[test]
    fn test_properties_fields_and_path() {
        let entity = StoredEntity::new()
            .with_property("nid", 7)
            .with_property("title", "Climate")
            .with_property("path", "topics/climate")
            .with_field("field_short_title", "Clim.");
        let spec = ProjectionSpec::new()
            .property("id", "nid")
            .property("title", "title")
            .field("short_title", "field_short_title")
            .path("path");

        let row = project(&spec, &entity, &images());
        assert_eq!(
            Value::Object(row),
            json!({"id": 7, "title": "Climate", "short_title": "Clim.", "path": "topics/climate"})
        );
    }

    #[test]
    fn test_alias_order_is_declaration_order() {
        let entity = StoredEntity::new().with_property("nid", 1).with_property("title", "T");
        let spec = ProjectionSpec::new().property("title", "title").property("id", "nid");
        let keys: Vec<String> = project(&spec, &entity, &images()).keys().cloned().collect();
        assert_eq!(keys, vec!["title".to_string(), "id".to_string()]);
    }

    #[test]
    fn test_missing_field_nulls_only_its_alias() {
        let entity = StoredEntity::new().with_property("nid", 3).with_property("title", "Only title");
        let spec = ProjectionSpec::new()
            .property("id", "nid")
            .field("short_title", "field_short_title")
            .property("title", "title");

        let row = project(&spec, &entity, &images());
        assert_eq!(row["short_title"], Value::Null);
        assert_eq!(row["id"], json!(3));
        assert_eq!(row["title"], json!("Only title"));
    }

    #[test]
    fn test_image_without_field_is_null() {
        let entity = StoredEntity::new().with_property("nid", 9);
        let row = project(&teaser_spec(), &entity, &images());
        assert_eq!(Value::Object(row), json!({"id": 9, "teaser_image": null}));
    }

    #[test]
    fn test_image_styles_and_sub_fields() {
        let entity = StoredEntity::new().with_property("nid", 9).with_field(
            "field_teaser_image",
            ImageValue::new("public://topics/sea.jpg").with_field("field_file_image_alt_text", "The sea"),
        );
        let row = project(&teaser_spec(), &entity, &images());
        assert_eq!(
            row["teaser_image"],
            json!({
                "thumbnail": "https://cdn.example.com/files/styles/thumbnail/public/topics/sea.jpg",
                "medium": "https://cdn.example.com/files/styles/medium/public/topics/sea.jpg",
                "alt": "The sea"
            })
        );
    }

    #[test]
    fn test_references_project_recursively() {
        let asset = |id: i64, kind: &str| {
            Arc::new(
                StoredEntity::new()
                    .with_property("nid", id)
                    .with_property("title", format!("Asset {}", id))
                    .with_field("field_type", kind),
            ) as Arc<dyn Entity>
        };
        let entity = StoredEntity::new()
            .with_property("nid", 1)
            .with_references("field_asset_reference", vec![asset(10, "video"), asset(11, "pdf")]);

        let nested = ProjectionSpec::new().property("title", "title").field("type", "field_type");
        let spec = ProjectionSpec::new()
            .reference("assets", ReferenceSource::many("field_asset_reference", nested.clone()))
            .reference("lead_asset", ReferenceSource::single("field_asset_reference", nested));

        let row = project(&spec, &entity, &images());
        assert_eq!(
            row["assets"],
            json!([
                {"title": "Asset 10", "type": "video"},
                {"title": "Asset 11", "type": "pdf"}
            ])
        );
        assert_eq!(row["lead_asset"], json!({"title": "Asset 10", "type": "video"}));
    }

    #[test]
    fn test_empty_reference_list_is_empty_array() {
        let entity = StoredEntity::new().with_references("field_asset_reference", vec![]);
        let spec = ProjectionSpec::new()
            .reference("assets", ReferenceSource::many("field_asset_reference", ProjectionSpec::new()))
            .reference("lead", ReferenceSource::single("field_asset_reference", ProjectionSpec::new()))
            .reference("missing", ReferenceSource::many("field_other", ProjectionSpec::new()));

        let row = project(&spec, &entity, &images());
        assert_eq!(row["assets"], json!([]));
        assert_eq!(row["lead"], Value::Null);
        assert_eq!(row["missing"], Value::Null);
    }

    #[test]
    fn test_multi_valued_field_renders_primary_value() {
        let entity = StoredEntity::new().with_field(
            "field_tags",
            crate::core::field::FieldValue::List(vec!["climate".into(), "sea".into()]),
        );
        let row = project(&ProjectionSpec::new().field("tag", "field_tags"), &entity, &images());
        assert_eq!(row["tag"], json!("climate"));
    }
}
