//! Sample content for the demo

use expose::prelude::*;
use serde_json::json;
use std::sync::Arc;

const DAY: i64 = 86_400;
const FIRST_CREATED: i64 = 1_704_067_200;

fn asset(nid: i64, title: &str, kind: &str) -> EntityRef {
    Arc::new(
        StoredEntity::new()
            .with_property("nid", nid)
            .with_property("title", title)
            .with_property("path", format!("assets/{}", nid))
            .with_field("field_type", kind),
    )
}

pub fn populate(source: &InMemoryEntitySource, variables: &InMemoryVariableStore) {
    let topics = [
        (1, "Ocean acidification", "Oceans", "feature"),
        (2, "Coral bleaching", "Coral", "news"),
        (3, "Kelp forests", "Kelp", "feature"),
        (4, "Plastic in the deep sea", "Plastics", "news"),
    ];

    for (nid, title, short_title, kind) in topics {
        source.insert(
            "node",
            "topic",
            StoredEntity::new()
                .with_property("nid", nid)
                .with_property("title", title)
                .with_property("status", 1)
                .with_property("created", FIRST_CREATED + nid * DAY)
                .with_property("path", format!("topics/{}", title.to_lowercase().replace(' ', "-")))
                .with_field("field_short_title", short_title)
                .with_field("field_type", kind)
                .with_field(
                    "field_teaser_image",
                    ImageValue::new(format!("public://topics/{}.jpg", nid))
                        .with_field("field_file_image_alt_text", title)
                        .with_field("field_caption", format!("Photo for {}", short_title)),
                )
                .with_references(
                    "field_asset_reference",
                    vec![
                        asset(100 + nid, &format!("{} explained", short_title), "video"),
                        asset(200 + nid, &format!("{} fact sheet", short_title), "pdf"),
                    ],
                ),
        );
    }

    for (position, nid, title) in [(1, 3, "Kelp forests"), (2, 1, "Ocean acidification")] {
        source.insert(
            "nodequeue",
            "trending_topics",
            StoredEntity::new()
                .with_property("nid", nid)
                .with_property("title", title)
                .with_property("position", position)
                .with_property("path", format!("topics/{}", nid)),
        );
    }

    for (title, path, weight) in [("Home", "<front>", -50), ("Topics", "topics", 0), ("About", "about", 10)] {
        source.insert(
            "menu_link",
            "main-menu",
            StoredEntity::new()
                .with_property("link_title", title)
                .with_property("link_path", path)
                .with_property("weight", weight)
                .with_property("hidden", 0),
        );
    }

    variables.set("site_name", json!("Ocean Watch"));
    variables.set("site_slogan", json!("News from below the surface"));
}
