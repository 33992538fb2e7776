//! Query planner
//!
//! Combines an endpoint's base query with a request's [`FilterSet`] into the
//! [`FetchRequest`] handed to the entity source.

use crate::core::definition::{Category, EndpointDefinition, RangeTarget};
use crate::core::query::{
    BaseQuery, Condition, DEFAULT_RANGE, FetchRequest, MAX_RANGE, Operator, SortOrder,
};
use crate::endpoints::filters::FilterSet;
use crate::endpoints::registry::RegisteredEndpoint;

/// Entity type holding content nodes
pub const NODE_ENTITY_TYPE: &str = "node";

/// Entity type of curated list (nodequeue) members
pub const CURATED_LIST_ENTITY_TYPE: &str = "nodequeue";

/// Entity type of menu links
pub const MENU_LINK_ENTITY_TYPE: &str = "menu_link";

/// Base query implied by an endpoint's category
///
/// Custom-entity endpoints use their injected builder when one is registered.
pub fn base_query(endpoint: &RegisteredEndpoint) -> BaseQuery {
    if let Some(builder) = &endpoint.query_builder {
        return builder.build();
    }

    let definition = &endpoint.definition;
    match &definition.category {
        Category::ContentType { bundle } => BaseQuery::new(NODE_ENTITY_TYPE)
            .bundle(bundle)
            .condition(Condition::property("status", Operator::Equals("1".to_string())))
            .order_by(SortOrder::desc(definition.id_property())),
        Category::CuratedList { queue } => BaseQuery::new(CURATED_LIST_ENTITY_TYPE)
            .bundle(queue)
            .order_by(SortOrder::asc("position")),
        Category::Menu { menu } => BaseQuery::new(MENU_LINK_ENTITY_TYPE)
            .bundle(menu)
            .condition(Condition::property("hidden", Operator::Equals("0".to_string())))
            .order_by(SortOrder::asc("weight")),
        Category::CustomEntity { custom_query } => {
            BaseQuery::new(custom_query.entity_type.as_deref().unwrap_or(NODE_ENTITY_TYPE))
                .order_by(SortOrder::desc(definition.id_property()))
        }
        Category::Variables => BaseQuery::new(""),
    }
}

/// Plan the fetch for one request
///
/// Conditions are appended after the base conditions in a fixed order:
/// property filters, field filters, path filter, start/end range. The limit
/// never exceeds [`MAX_RANGE`].
pub fn plan(endpoint: &RegisteredEndpoint, filters: &FilterSet) -> FetchRequest {
    let definition: &EndpointDefinition = &endpoint.definition;
    let base = base_query(endpoint);
    let mut conditions = base.conditions;

    for filter in &filters.properties {
        // The path filter resolves to the identifier, so it replaces an id filter.
        if filters.path.is_some() && filter.property == definition.id_property() {
            tracing::debug!(
                endpoint = %definition.id,
                property = %filter.property,
                "Path filter overrides identifier filter"
            );
            continue;
        }
        conditions.push(Condition::property(&filter.property, operator_for(&filter.values)));
    }

    for filter in &filters.fields {
        conditions.push(Condition::field(
            &filter.field,
            &filter.column,
            operator_for(&filter.values),
        ));
    }

    if let Some(alias) = &filters.path {
        conditions.push(Condition::path(alias));
    }

    if let Some(range) = &filters.start_end {
        let operator = match (range.start, range.end) {
            (Some(start), Some(end)) => Some(Operator::Between(start, end)),
            (Some(start), None) => Some(Operator::AtLeast(start)),
            (None, Some(end)) => Some(Operator::AtMost(end)),
            (None, None) => None,
        };
        if let Some(operator) = operator {
            conditions.push(match &range.target {
                RangeTarget::Property(property) => Condition::property(property, operator),
                RangeTarget::Field { field, column } => Condition::field(field, column, operator),
            });
        }
    }

    let order = if definition.order.is_empty() {
        base.order
    } else {
        definition.order.clone()
    };

    let limit = match filters.range {
        Some(requested) if requested > MAX_RANGE => {
            tracing::warn!(
                endpoint = %definition.id,
                requested,
                "Range capped at {}",
                MAX_RANGE
            );
            MAX_RANGE
        }
        Some(requested) => requested,
        None => DEFAULT_RANGE,
    };

    let request = FetchRequest {
        entity_type: base.entity_type,
        bundle: base.bundle,
        conditions,
        order,
        limit,
        offset: filters.offset.unwrap_or(0),
    };

    tracing::debug!(endpoint = %definition.id, ?request, "Planned fetch");
    request
}

fn operator_for(values: &[String]) -> Operator {
    match values {
        [single] => Operator::Equals(single.clone()),
        many => Operator::In(many.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::definition::{CustomQuerySpec, FilterSpec};
    use crate::core::query::{ConditionTarget, QueryBuilder};
    use crate::endpoints::filters::{FieldFilterValue, PropertyFilterValue, RangeFilterValue};
    use std::sync::Arc;

    fn registered(definition: EndpointDefinition) -> RegisteredEndpoint {
        RegisteredEndpoint {
            definition: Arc::new(definition),
            query_builder: None,
        }
    }

    fn topics() -> RegisteredEndpoint {
        registered(
            EndpointDefinition::content_type("topic")
                .version("1.0")
                .path("topics.json")
                .wrapper("topics")
                .row("topic")
                .filters(FilterSpec::new().range("count").offset("offset")),
        )
    }

    #[test]
    fn test_content_type_base_query() {
        let request = plan(&topics(), &FilterSet::default());
        assert_eq!(request.entity_type, "node");
        assert_eq!(request.bundle.as_deref(), Some("topic"));
        assert_eq!(
            request.conditions,
            vec![Condition::property("status", Operator::Equals("1".to_string()))]
        );
        assert_eq!(request.order, vec![SortOrder::desc("nid")]);
        assert_eq!(request.limit, DEFAULT_RANGE);
        assert_eq!(request.offset, 0);
    }

    #[test]
    fn test_range_is_capped() {
        let filters = FilterSet {
            range: Some(500),
            ..Default::default()
        };
        assert_eq!(plan(&topics(), &filters).limit, 200);

        for requested in [0, 1, 199, 200, 201, u32::MAX] {
            let filters = FilterSet {
                range: Some(requested),
                offset: Some(10),
                ..Default::default()
            };
            let request = plan(&topics(), &filters);
            assert_eq!(request.limit, requested.min(MAX_RANGE));
            assert_eq!(request.offset, 10);
        }
    }

    #[test]
    fn test_conditions_follow_filter_order() {
        let filters = FilterSet {
            properties: vec![PropertyFilterValue {
                property: "uid".to_string(),
                values: vec!["1".to_string(), "2".to_string()],
            }],
            fields: vec![FieldFilterValue {
                field: "field_person".to_string(),
                column: "target_id".to_string(),
                values: vec!["12".to_string()],
            }],
            path: Some("topics/climate".to_string()),
            start_end: Some(RangeFilterValue {
                target: RangeTarget::Property("created".to_string()),
                start: Some(100),
                end: None,
            }),
            ..Default::default()
        };

        let request = plan(&topics(), &filters);
        let targets: Vec<&ConditionTarget> = request.conditions.iter().map(|c| &c.target).collect();
        assert_eq!(
            targets,
            vec![
                &ConditionTarget::Property("status".to_string()),
                &ConditionTarget::Property("uid".to_string()),
                &ConditionTarget::Field {
                    field: "field_person".to_string(),
                    column: "target_id".to_string()
                },
                &ConditionTarget::Path,
                &ConditionTarget::Property("created".to_string()),
            ]
        );
        assert_eq!(
            request.conditions[1].operator,
            Operator::In(vec!["1".to_string(), "2".to_string()])
        );
        assert_eq!(request.conditions[4].operator, Operator::AtLeast(100));
    }

    #[test]
    fn test_path_filter_replaces_identifier_filter() {
        let filters = FilterSet {
            properties: vec![PropertyFilterValue {
                property: "nid".to_string(),
                values: vec!["7".to_string()],
            }],
            path: Some("about".to_string()),
            ..Default::default()
        };
        let request = plan(&topics(), &filters);
        assert_eq!(request.conditions.len(), 2);
        assert_eq!(request.conditions[1], Condition::path("about"));
    }

    #[test]
    fn test_definition_order_overrides_default() {
        let endpoint = registered(
            EndpointDefinition::content_type("topic").order_by(SortOrder::asc("title")),
        );
        let request = plan(&endpoint, &FilterSet::default());
        assert_eq!(request.order, vec![SortOrder::asc("title")]);
    }

    #[test]
    fn test_curated_list_and_menu_base_queries() {
        let queue = plan(&registered(EndpointDefinition::curated_list("trending")), &FilterSet::default());
        assert_eq!(queue.entity_type, CURATED_LIST_ENTITY_TYPE);
        assert_eq!(queue.bundle.as_deref(), Some("trending"));
        assert_eq!(queue.order, vec![SortOrder::asc("position")]);

        let menu = plan(&registered(EndpointDefinition::menu("main-menu")), &FilterSet::default());
        assert_eq!(menu.entity_type, MENU_LINK_ENTITY_TYPE);
        assert_eq!(menu.order, vec![SortOrder::asc("weight")]);
    }

    #[test]
    fn test_custom_entity_uses_injected_builder() {
        let endpoint = RegisteredEndpoint {
            definition: Arc::new(EndpointDefinition::custom_entity(
                "topics",
                CustomQuerySpec::default(),
            )),
            query_builder: Some(QueryBuilder::new(|| {
                BaseQuery::new("node")
                    .bundle("topic")
                    .condition(Condition::property("promote", Operator::Equals("1".to_string())))
            })),
        };
        let filters = FilterSet {
            properties: vec![PropertyFilterValue {
                property: "uid".to_string(),
                values: vec!["4".to_string()],
            }],
            ..Default::default()
        };
        let request = plan(&endpoint, &filters);
        assert_eq!(request.bundle.as_deref(), Some("topic"));
        assert_eq!(request.conditions.len(), 2);
        assert!(request.order.is_empty());
    }

    #[test]
    fn test_custom_entity_falls_back_to_entity_type() {
        let endpoint = registered(EndpointDefinition::custom_entity(
            "people",
            CustomQuerySpec {
                entity_type: Some("user".to_string()),
                nid_alias: Some("uid".to_string()),
            },
        ));
        let request = plan(&endpoint, &FilterSet::default());
        assert_eq!(request.entity_type, "user");
        assert_eq!(request.order, vec![SortOrder::desc("uid")]);
    }
}
