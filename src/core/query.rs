//! Collaborator-facing fetch requests and their building blocks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Hard cap on the number of rows a single request may ask for
pub const MAX_RANGE: u32 = 200;

/// Number of rows returned when the request carries no range parameter
pub const DEFAULT_RANGE: u32 = 20;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort order on one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub property: String,
    #[serde(default = "default_direction")]
    pub direction: SortDirection,
}

fn default_direction() -> SortDirection {
    SortDirection::Desc
}

impl SortOrder {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// What a condition constrains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionTarget {
    /// A base property of the entity
    Property(String),
    /// A column of an attached field (`value`, `target_id`, ...)
    Field { field: String, column: String },
    /// The entity's URL alias
    Path,
}

/// How a condition constrains its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// Exact match on the raw value
    Equals(String),
    /// Match any of the raw values
    In(Vec<String>),
    /// Numeric lower bound, inclusive
    AtLeast(i64),
    /// Numeric upper bound, inclusive
    AtMost(i64),
    /// Numeric closed interval
    Between(i64, i64),
}

/// One constraint of a fetch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub target: ConditionTarget,
    pub operator: Operator,
}

impl Condition {
    pub fn property(name: impl Into<String>, operator: Operator) -> Self {
        Self {
            target: ConditionTarget::Property(name.into()),
            operator,
        }
    }

    pub fn field(field: impl Into<String>, column: impl Into<String>, operator: Operator) -> Self {
        Self {
            target: ConditionTarget::Field {
                field: field.into(),
                column: column.into(),
            },
            operator,
        }
    }

    pub fn path(alias: impl Into<String>) -> Self {
        Self {
            target: ConditionTarget::Path,
            operator: Operator::Equals(alias.into()),
        }
    }
}

/// Starting point of a plan: what to fetch before request filters apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseQuery {
    pub entity_type: String,
    pub bundle: Option<String>,
    pub conditions: Vec<Condition>,
    pub order: Vec<SortOrder>,
}

impl BaseQuery {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: None,
            conditions: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, order: SortOrder) -> Self {
        self.order.push(order);
        self
    }
}

/// Base-query strategy injected for custom-entity endpoints
#[derive(Clone)]
pub struct QueryBuilder(Arc<dyn Fn() -> BaseQuery + Send + Sync>);

impl QueryBuilder {
    pub fn new(build: impl Fn() -> BaseQuery + Send + Sync + 'static) -> Self {
        Self(Arc::new(build))
    }

    pub fn build(&self) -> BaseQuery {
        (self.0)()
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueryBuilder(..)")
    }
}

/// A fully planned fetch, produced fresh for every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub entity_type: String,
    pub bundle: Option<String>,
    pub conditions: Vec<Condition>,
    pub order: Vec<SortOrder>,
    pub limit: u32,
    pub offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_query_builder() {
        let base = BaseQuery::new("node")
            .bundle("topic")
            .condition(Condition::property("status", Operator::Equals("1".into())))
            .order_by(SortOrder::desc("nid"));

        assert_eq!(base.entity_type, "node");
        assert_eq!(base.bundle.as_deref(), Some("topic"));
        assert_eq!(base.conditions.len(), 1);
        assert_eq!(base.order, vec![SortOrder::desc("nid")]);
    }

    #[test]
    fn test_query_builder_runs_each_time() {
        let builder = QueryBuilder::new(|| BaseQuery::new("node").bundle("topic"));
        assert_eq!(builder.build(), builder.build());
        assert_eq!(format!("{:?}", builder), "QueryBuilder(..)");
    }

    #[test]
    fn test_sort_direction_defaults_to_desc() {
        let order: SortOrder = serde_yaml::from_str("property: created").unwrap();
        assert_eq!(order.direction, SortDirection::Desc);
    }
}
