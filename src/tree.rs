//! Override trees and the per-entity documents that hold them.
//!
//! Each field of an entity document is a tree. A node is either terminal,
//! `{ "value": <scalar> }`, or a branch keyed by values of the next dimension:
//!
//! ```json
//! {
//!   "Port": { "value": 8080 },
//!   "Host": {
//!     "development": { "value": "localhost" },
//!     "production": {
//!       "eastus": { "value": "east.example.com" },
//!       "westus": { "value": "west.example.com" }
//!     }
//!   }
//! }
//! ```
//!
//! A terminal may sit at any depth. Because `value` marks a terminal, no
//! dimension can use the literal value `value`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::HierfigError;
use crate::schema::EntitySchema;

const TERMINAL_KEY: &str = "value";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideNode {
    /// A value that applies to everything below this point.
    Terminal(String),
    /// Children keyed by the value of the next unconsumed dimension.
    Branch(BTreeMap<String, OverrideNode>),
}

impl OverrideNode {
    pub fn terminal(value: &str) -> Self {
        OverrideNode::Terminal(value.to_string())
    }

    pub fn branch<K: Into<String>>(children: impl IntoIterator<Item = (K, OverrideNode)>) -> Self {
        OverrideNode::Branch(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a node from its JSON form.
    ///
    /// `path` is the dotted location used in error messages (e.g. `Host.production`).
    fn from_json(value: Value, path: &str, strict: bool) -> Result<Self, String> {
        let mut object = match value {
            Value::Object(object) => object,
            other => return Err(format!("'{path}' must be an object, got {other}")),
        };

        if let Some(terminal) = object.remove(TERMINAL_KEY) {
            if !object.is_empty() {
                let ignored: Vec<&str> = object.keys().map(String::as_str).collect();
                if strict {
                    return Err(format!(
                        "'{path}' has keys next to 'value' that can never be reached: {}",
                        ignored.join(", ")
                    ));
                }
                warn!(
                    event = "hierfig.tree.unreachable_keys",
                    path = path,
                    keys = %ignored.join(", "),
                    message = "Keys next to 'value' are ignored"
                );
            }
            return scalar_text(terminal)
                .map(OverrideNode::Terminal)
                .ok_or_else(|| format!("'{path}.value' must be a string, number or boolean"));
        }

        let mut children = BTreeMap::new();
        for (key, child) in object {
            let child_path = format!("{path}.{key}");
            children.insert(key, OverrideNode::from_json(child, &child_path, strict)?);
        }
        Ok(OverrideNode::Branch(children))
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// All override trees of one entity, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideDocument {
    fields: BTreeMap<String, OverrideNode>,
}

impl OverrideDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: &str, tree: OverrideNode) -> Self {
        self.fields.insert(field.to_string(), tree);
        self
    }

    /// Parse an entity's override document.
    ///
    /// In strict mode, fields absent from `schema` and keys that sit next to a
    /// `value` are rejected. Otherwise they are dropped with a warning.
    pub fn from_json_str(
        content: &str,
        schema: &EntitySchema,
        strict: bool,
    ) -> Result<Self, HierfigError> {
        let entity = schema.name();
        let malformed = |reason: String| HierfigError::MalformedDocument {
            entity: entity.to_string(),
            reason,
        };

        let root: Map<String, Value> = serde_json::from_str(content)
            .map_err(|e| malformed(format!("not a JSON object: {e}")))?;

        let mut doc = OverrideDocument::new();
        for (field, value) in root {
            if schema.get(&field).is_none() {
                if strict {
                    return Err(malformed(format!("field '{field}' is not declared")));
                }
                warn!(
                    event = "hierfig.tree.undeclared_field",
                    entity = entity,
                    field = %field,
                    message = "Field is not declared in the schema and is ignored"
                );
                continue;
            }
            let node = OverrideNode::from_json(value, &field, strict).map_err(malformed)?;
            doc.fields.insert(field, node);
        }
        Ok(doc)
    }

    pub fn get(&self, field: &str) -> Option<&OverrideNode> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::server_schema;

    fn parse(content: &str, strict: bool) -> Result<OverrideDocument, HierfigError> {
        OverrideDocument::from_json_str(content, &server_schema(), strict)
    }

    #[test]
    fn root_terminal() {
        let doc = parse(r#"{ "Port": { "value": 8080 } }"#, true).unwrap();
        assert_eq!(doc.get("Port"), Some(&OverrideNode::terminal("8080")));
    }

    #[test]
    fn nested_branches() {
        let doc = parse(
            r#"{ "Host": {
                "dev": { "value": "localhost" },
                "prod": { "eastus": { "value": "east" }, "westus": { "value": "west" } }
            } }"#,
            true,
        )
        .unwrap();
        let expected = OverrideNode::branch([
            ("dev", OverrideNode::terminal("localhost")),
            (
                "prod",
                OverrideNode::branch([
                    ("eastus", OverrideNode::terminal("east")),
                    ("westus", OverrideNode::terminal("west")),
                ]),
            ),
        ]);
        assert_eq!(doc.get("Host"), Some(&expected));
    }

    #[test]
    fn scalar_terminals_become_text() {
        let doc = parse(
            r#"{ "Debug": { "value": true }, "Ratio": { "value": 0.25 } }"#,
            true,
        )
        .unwrap();
        assert_eq!(doc.get("Debug"), Some(&OverrideNode::terminal("true")));
        assert_eq!(doc.get("Ratio"), Some(&OverrideNode::terminal("0.25")));
    }

    #[test]
    fn numeric_terminals_keep_their_source_text() {
        let doc = parse(
            r#"{
                "Host": { "value": 1.10 },
                "Ratio": { "value": 1e2 },
                "Port": { "value": 99999999999999999999 }
            }"#,
            true,
        )
        .unwrap();
        assert_eq!(doc.get("Host"), Some(&OverrideNode::terminal("1.10")));
        assert_eq!(doc.get("Ratio"), Some(&OverrideNode::terminal("1e2")));
        assert_eq!(
            doc.get("Port"),
            Some(&OverrideNode::terminal("99999999999999999999"))
        );
    }

    #[test]
    fn empty_branch_is_allowed() {
        let doc = parse(r#"{ "Host": {} }"#, true).unwrap();
        assert_eq!(doc.get("Host"), Some(&OverrideNode::Branch(BTreeMap::new())));
    }

    #[test]
    fn non_object_node_rejected() {
        let result = parse(r#"{ "Host": { "dev": "localhost" } }"#, true);
        match result {
            Err(HierfigError::MalformedDocument { entity, reason }) => {
                assert_eq!(entity, "Server");
                assert!(reason.contains("Host.dev"));
            }
            other => panic!("Expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn null_terminal_rejected() {
        let result = parse(r#"{ "Host": { "value": null } }"#, true);
        assert!(matches!(result, Err(HierfigError::MalformedDocument { .. })));
    }

    #[test]
    fn array_terminal_rejected() {
        let result = parse(r#"{ "Host": { "value": [1, 2] } }"#, true);
        assert!(matches!(result, Err(HierfigError::MalformedDocument { .. })));
    }

    #[test]
    fn strict_rejects_undeclared_field() {
        let result = parse(r#"{ "Typo": { "value": 1 } }"#, true);
        match result {
            Err(HierfigError::MalformedDocument { reason, .. }) => assert!(reason.contains("Typo")),
            other => panic!("Expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn lenient_drops_undeclared_field() {
        let doc = parse(r#"{ "Typo": { "value": 1 }, "Port": { "value": 1 } }"#, false).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.get("Typo").is_none());
    }

    #[test]
    fn strict_rejects_keys_beside_value() {
        let result = parse(r#"{ "Host": { "value": "a", "dev": { "value": "b" } } }"#, true);
        assert!(matches!(result, Err(HierfigError::MalformedDocument { .. })));
    }

    #[test]
    fn lenient_value_wins_over_siblings() {
        let doc = parse(r#"{ "Host": { "value": "a", "dev": { "value": "b" } } }"#, false).unwrap();
        assert_eq!(doc.get("Host"), Some(&OverrideNode::terminal("a")));
    }

    #[test]
    fn top_level_must_be_object() {
        let result = parse("[1, 2]", true);
        assert!(matches!(result, Err(HierfigError::MalformedDocument { .. })));
    }
}
