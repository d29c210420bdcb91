//! The resolved request: one tree per requested root field, as a GraphQL server hands it over
//! after parsing, validation and variable coercion.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A requested field with its coerced arguments and its sub-selections, grouped by the type
/// condition they were selected under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveTree {
    pub name: String,
    /// The response key. Defaults to the field name.
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default)]
    pub fields_by_type_name: IndexMap<String, IndexMap<String, ResolveTree>>,
}

impl ResolveTree {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            alias: name.clone(),
            name,
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    /// Adds a sub-selection under the given type condition.
    pub fn field(mut self, type_name: impl Into<String>, field: ResolveTree) -> Self {
        self.fields_by_type_name
            .entry(type_name.into())
            .or_default()
            .insert(field.response_key().to_string(), field);
        self
    }

    pub fn response_key(&self) -> &str {
        match self.alias.is_empty() {
            true => &self.name,
            false => &self.alias,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.args.get(name).filter(|value| !value.is_null())
    }

    /// Sub-selections applying to any of the given type names, in request order. A response
    /// key selected under several type conditions is returned once.
    pub fn fields_for<'r>(&'r self, type_names: &[&str]) -> Vec<&'r ResolveTree> {
        let mut fields: IndexMap<&str, &ResolveTree> = IndexMap::new();

        for (type_name, selection) in &self.fields_by_type_name {
            if !type_names.contains(&type_name.as_str()) {
                continue;
            }

            for field in selection.values() {
                fields.entry(field.response_key()).or_insert(field);
            }
        }

        fields.into_values().collect()
    }

    /// Sub-selections of an object type that is not an entity, such as an edge or an
    /// aggregate selection, where the type condition carries no meaning.
    pub fn all_fields(&self) -> Vec<&ResolveTree> {
        let mut fields: IndexMap<&str, &ResolveTree> = IndexMap::new();

        for field in self.fields_by_type_name.values().flat_map(IndexMap::values) {
            fields.entry(field.response_key()).or_insert(field);
        }

        fields.into_values().collect()
    }

    /// Every sub-selection named `name`, whatever its alias.
    pub fn find_fields<'r>(&'r self, name: &str) -> Vec<&'r ResolveTree> {
        self.all_fields()
            .into_iter()
            .filter(|field| field.name == name)
            .collect()
    }
}

/// Claims of the caller, decoded and verified by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub is_authenticated: bool,
    #[serde(default)]
    pub jwt: Map<String, Value>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(jwt: Map<String, Value>) -> Self {
        Self {
            is_authenticated: true,
            jwt,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merges_type_conditions() {
        let tree = ResolveTree::new("productions")
            .field("Production", ResolveTree::new("title"))
            .field("Movie", ResolveTree::new("runtime"))
            .field("Movie", ResolveTree::new("title"))
            .field("Series", ResolveTree::new("episodes"));

        let names = |fields: Vec<&ResolveTree>| fields.into_iter().map(|field| field.name.clone()).collect::<Vec<_>>();

        assert_eq!(names(tree.fields_for(&["Movie", "Production"])), ["title", "runtime"]);
        assert_eq!(names(tree.all_fields()), ["title", "runtime", "episodes"]);
    }

    #[test]
    fn deserializes_camel_case() {
        let tree: ResolveTree = serde_json::from_value(json!({
            "name": "movies",
            "args": { "where": { "title": "Matrix" }, "options": null },
            "fieldsByTypeName": { "Movie": { "t": { "name": "title", "alias": "t" } } }
        }))
        .unwrap();

        assert_eq!(tree.response_key(), "movies");
        assert_eq!(tree.argument("where"), Some(&json!({ "title": "Matrix" })));
        assert_eq!(tree.argument("options"), None);
        assert_eq!(tree.fields_for(&["Movie"])[0].response_key(), "t");
    }
}
