//! In-memory collaborators for testing and development

use crate::core::entity::{Entity, EntityRef};
use crate::core::field::{FieldValue, ImageValue};
use crate::core::query::{
    Condition, ConditionTarget, FetchRequest, Operator, SortDirection, SortOrder,
};
use crate::core::service::{EntitySource, ImageStyles, VariableStore};
use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// A plain entity held in memory
#[derive(Debug, Clone, Default)]
pub struct StoredEntity {
    properties: IndexMap<String, FieldValue>,
    fields: IndexMap<String, FieldValue>,
    references: IndexMap<String, Vec<EntityRef>>,
}

impl StoredEntity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_references(mut self, field: impl Into<String>, targets: Vec<EntityRef>) -> Self {
        self.references.insert(field.into(), targets);
        self
    }
}

impl Entity for StoredEntity {
    fn property(&self, name: &str) -> Option<FieldValue> {
        self.properties.get(name).cloned()
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).cloned()
    }

    fn referenced(&self, field: &str) -> Option<Vec<EntityRef>> {
        self.references.get(field).cloned()
    }
}

#[derive(Debug, Clone)]
struct Record {
    entity_type: String,
    bundle: String,
    entity: EntityRef,
}

/// In-memory entity source
///
/// Evaluates conditions, ordering and the limit/offset window the way a
/// real store would. Field conditions compare the stored field value; the
/// column is not modelled. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryEntitySource {
    records: Arc<RwLock<Vec<Record>>>,
}

impl InMemoryEntitySource {
    /// Create a new empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entity under an entity type and bundle
    pub fn insert(
        &self,
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        entity: impl Entity + 'static,
    ) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.push(Record {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            entity: Arc::new(entity),
        });
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntitySource for InMemoryEntitySource {
    async fn fetch_entities(&self, request: &FetchRequest) -> Result<Vec<EntityRef>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);

        let mut matching: Vec<EntityRef> = records
            .iter()
            .filter(|record| {
                record.entity_type == request.entity_type
                    && request.bundle.as_ref().is_none_or(|b| &record.bundle == b)
                    && request
                        .conditions
                        .iter()
                        .all(|condition| matches_condition(record.entity.as_ref(), condition))
            })
            .map(|record| record.entity.clone())
            .collect();

        matching.sort_by(|a, b| compare_entities(a.as_ref(), b.as_ref(), &request.order));

        Ok(matching
            .into_iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .collect())
    }
}

fn target_value(entity: &dyn Entity, target: &ConditionTarget) -> Option<FieldValue> {
    match target {
        ConditionTarget::Property(name) => entity.property(name),
        ConditionTarget::Field { field, .. } => entity.field(field),
        ConditionTarget::Path => entity.path().map(FieldValue::String),
    }
}

fn matches_condition(entity: &dyn Entity, condition: &Condition) -> bool {
    let Some(value) = target_value(entity, &condition.target) else {
        return false;
    };

    match &condition.operator {
        Operator::Equals(raw) => value.matches_raw(raw),
        Operator::In(raws) => raws.iter().any(|raw| value.matches_raw(raw)),
        Operator::AtLeast(min) => value.as_integer().is_some_and(|v| v >= *min),
        Operator::AtMost(max) => value.as_integer().is_some_and(|v| v <= *max),
        Operator::Between(min, max) => value.as_integer().is_some_and(|v| v >= *min && v <= *max),
    }
}

fn compare_entities(a: &dyn Entity, b: &dyn Entity, order: &[SortOrder]) -> Ordering {
    for sort in order {
        let ordering = compare_values(a.property(&sort.property), b.property(&sort.property));
        let ordering = match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total order over sort values: null, booleans, numbers, strings, then
/// lists and images. Missing values sort after every present one.
fn compare_values(a: Option<FieldValue>, b: Option<FieldValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => sort_rank(&a).cmp(&sort_rank(&b)).then_with(|| match (&a, &b) {
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            _ => match (sort_number(&a), sort_number(&b)) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => Ordering::Equal,
            },
        }),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_rank(value: &FieldValue) -> u8 {
    match value {
        FieldValue::Null => 0,
        FieldValue::Boolean(_) => 1,
        FieldValue::Integer(_) | FieldValue::Float(_) | FieldValue::DateTime(_) => 2,
        FieldValue::String(_) => 3,
        FieldValue::List(_) | FieldValue::Image(_) => 4,
    }
}

fn sort_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Float(f) => Some(*f),
        FieldValue::DateTime(dt) => Some(dt.timestamp() as f64),
        _ => None,
    }
}

/// Image styles served from a static files prefix
///
/// `public://topics/a.jpg` in style `thumbnail` resolves to
/// `{base_url}/styles/thumbnail/public/topics/a.jpg`.
#[derive(Debug, Clone)]
pub struct PrefixImageStyles {
    base_url: String,
    styles: HashSet<String>,
}

impl PrefixImageStyles {
    pub fn new<I, S>(base_url: impl Into<String>, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            styles: styles.into_iter().map(Into::into).collect(),
        }
    }
}

impl ImageStyles for PrefixImageStyles {
    fn resolve(&self, image: &ImageValue, style: &str) -> Option<String> {
        if !self.styles.contains(style) {
            return None;
        }

        let location = match image.uri.split_once("://") {
            Some((scheme, path)) => format!("{}/{}", scheme, path),
            None => image.uri.trim_start_matches('/').to_string(),
        };
        Some(format!("{}/styles/{}/{}", self.base_url, style, location))
    }
}

/// In-memory variable store
#[derive(Clone, Default)]
pub struct InMemoryVariableStore {
    variables: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        let mut variables = self.variables.write().unwrap_or_else(PoisonError::into_inner);
        variables.insert(name.into(), value);
    }
}

#[async_trait]
impl VariableStore for InMemoryVariableStore {
    async fn variable(&self, name: &str) -> Result<Option<Value>> {
        let variables = self.variables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(variables.get(name).cloned())
    }
}
