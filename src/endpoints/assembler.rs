//! Response assembler and script whitelist

use crate::core::definition::EndpointDefinition;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Wrap projected rows in the endpoint's envelope
///
/// List endpoints render as `{wrapper: [{row: {...}}, ...]}`; zero rows give
/// an empty array under the wrapper. Variable endpoints render their single
/// row as a flat object.
pub fn assemble(definition: &EndpointDefinition, rows: Vec<Map<String, Value>>) -> Value {
    if !definition.category.is_list() {
        return Value::Object(rows.into_iter().next().unwrap_or_default());
    }

    let wrapper = definition.wrapper.clone().unwrap_or_default();
    let row_key = definition.row.clone().unwrap_or_default();

    let items = rows
        .into_iter()
        .map(|row| {
            let mut item = Map::with_capacity(1);
            item.insert(row_key.clone(), Value::Object(row));
            Value::Object(item)
        })
        .collect();

    let mut body = Map::with_capacity(1);
    body.insert(wrapper, Value::Array(items));
    Value::Object(body)
}

/// Script paths to inject into pages embedding generated widgets, per API
/// version
#[derive(Debug, Clone, Default)]
pub struct ScriptWhitelist {
    scripts: IndexMap<String, Vec<String>>,
}

impl ScriptWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add scripts for a version, keeping earlier entries and skipping repeats
    pub fn extend(&mut self, version: impl Into<String>, scripts: impl IntoIterator<Item = String>) {
        let entry = self.scripts.entry(version.into()).or_default();
        for script in scripts {
            if !entry.contains(&script) {
                entry.push(script);
            }
        }
    }

    /// Scripts for a version; empty for unknown versions
    pub fn scripts(&self, version: &str) -> &[String] {
        self.scripts.get(version).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::definition::ProjectionSpec;
    use serde_json::json;

    fn topics() -> EndpointDefinition {
        EndpointDefinition::content_type("topic")
            .version("1.0")
            .path("topics.json")
            .wrapper("topics")
            .row("topic")
    }

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_empty_result_is_empty_array_under_wrapper() {
        assert_eq!(assemble(&topics(), vec![]), json!({"topics": []}));
    }

    #[test]
    fn test_rows_are_wrapped_with_row_key() {
        let body = assemble(
            &topics(),
            vec![row(json!({"id": 1})), row(json!({"id": 2}))],
        );
        assert_eq!(
            body,
            json!({"topics": [{"topic": {"id": 1}}, {"topic": {"id": 2}}]})
        );
    }

    #[test]
    fn test_variables_are_flat() {
        let definition = EndpointDefinition::variables("site-information")
            .version("1.0")
            .path("site-information.json")
            .wrapper("variables")
            .projection(ProjectionSpec::new().variable("site_name", "site_name"));
        let body = assemble(&definition, vec![row(json!({"site_name": "Example"}))]);
        assert_eq!(body, json!({"site_name": "Example"}));
    }

    #[test]
    fn test_script_whitelist_fails_closed() {
        let mut whitelist = ScriptWhitelist::new();
        whitelist.extend("1.0", vec!["/js/embed.js".to_string(), "/js/embed.js".to_string()]);
        whitelist.extend("1.0", vec!["/js/widgets.js".to_string()]);

        assert_eq!(whitelist.scripts("1.0"), ["/js/embed.js", "/js/widgets.js"]);
        assert!(whitelist.scripts("9.9").is_empty());
        assert_eq!(whitelist.versions().collect::<Vec<_>>(), vec!["1.0"]);
    }
}
