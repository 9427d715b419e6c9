//! Entity mapping: resolve and coerce every declared field of one entity for
//! one combination.
//!
//! Fields the override document does not mention keep their declared default.
//! The first field that fails aborts the entity; a partially populated
//! instance is never returned.

use confique::Config;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::coerce::{self, FieldValue};
use crate::error::{FieldError, FieldResolutionError, HierfigError};
use crate::hierarchy::Combination;
use crate::resolver;
use crate::schema::EntitySchema;
use crate::tree::OverrideDocument;

#[derive(Debug, Clone, PartialEq)]
struct ResolvedField {
    name: String,
    value: FieldValue,
    /// `false` when the value is the declared default.
    overridden: bool,
}

/// One entity with a concrete value for every declared field, for one combination.
///
/// Serializes as a flat JSON object in field declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    name: String,
    fields: Vec<ResolvedField>,
}

impl ResolvedEntity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name == field)
            .map(|f| &f.value)
    }

    /// `(field, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|f| (f.name.as_str(), &f.value))
    }

    /// Whether `field` was set by an override rather than left at its default.
    pub fn is_overridden(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.name == field && f.overridden)
    }

    /// Materialize the entity as a typed confique struct.
    ///
    /// Only overridden fields are handed to confique, so `#[config(default)]`
    /// on the struct applies to everything the override document left out.
    pub fn to_config<C: Config>(&self) -> Result<C, HierfigError>
    where
        C::Layer: DeserializeOwned,
    {
        let invalid = |reason: String| HierfigError::InvalidValue {
            key: self.name.clone(),
            reason,
        };

        let mut object = Map::new();
        for field in self.fields.iter().filter(|f| f.overridden) {
            let value = serde_json::to_value(&field.value).map_err(|e| invalid(e.to_string()))?;
            object.insert(field.name.clone(), value);
        }

        let layer: C::Layer =
            serde_json::from_value(Value::Object(object)).map_err(|e| invalid(e.to_string()))?;

        C::builder()
            .preloaded(layer)
            .load()
            .map_err(HierfigError::from)
    }
}

impl Serialize for ResolvedEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

/// Build one entity instance for `combination`.
pub fn map_entity(
    schema: &EntitySchema,
    document: &OverrideDocument,
    dimensions: &[String],
    combination: &Combination,
) -> Result<ResolvedEntity, FieldResolutionError> {
    let mut fields = Vec::with_capacity(schema.fields().len());

    for spec in schema.fields() {
        let Some(tree) = document.get(&spec.name) else {
            fields.push(ResolvedField {
                name: spec.name.clone(),
                value: spec.default_value(),
                overridden: false,
            });
            continue;
        };

        let value = resolver::resolve(tree, dimensions, combination)
            .map_err(FieldError::from)
            .and_then(|raw| coerce::coerce(&spec.name, raw, &spec.kind))
            .map_err(|cause| FieldResolutionError {
                entity: schema.name().to_string(),
                field: spec.name.clone(),
                cause,
            })?;

        fields.push(ResolvedField {
            name: spec.name.clone(),
            value,
            overridden: true,
        });
    }

    Ok(ResolvedEntity {
        name: schema.name().to_string(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::fixtures::test::{ServerConfig, env_region_tree, server_schema};
    use crate::schema::{FieldKind, FieldSpec};
    use crate::tree::OverrideNode;

    fn dims() -> Vec<String> {
        vec!["env".into(), "region".into()]
    }

    fn prod_west() -> Combination {
        Combination::new().with("env", "prod").with("region", "westus")
    }

    #[test]
    fn unmentioned_fields_take_defaults() {
        let entity = map_entity(
            &server_schema(),
            &OverrideDocument::new(),
            &dims(),
            &prod_west(),
        )
        .unwrap();
        assert_eq!(entity.get("Port"), Some(&FieldValue::Integer(0)));
        assert_eq!(entity.get("Host"), Some(&FieldValue::String(String::new())));
        assert_eq!(entity.get("Mode"), Some(&FieldValue::Symbol("Fast".into())));
        assert!(!entity.is_overridden("Port"));
    }

    #[test]
    fn coercion_error_reports_the_written_number() {
        let doc = OverrideDocument::from_json_str(
            r#"{ "Port": { "value": 99999999999999999999 } }"#,
            &server_schema(),
            true,
        )
        .unwrap();
        let err = map_entity(&server_schema(), &doc, &dims(), &prod_west()).unwrap_err();
        assert!(matches!(
            err.cause,
            FieldError::TypeCoercion { ref raw, .. } if raw == "99999999999999999999"
        ));
    }

    #[test]
    fn explicit_default_used_when_unmentioned() {
        let schema = EntitySchema::new("Server")
            .field_spec(FieldSpec::new("Port", FieldKind::Integer).with_default("8080").unwrap());
        let entity =
            map_entity(&schema, &OverrideDocument::new(), &dims(), &prod_west()).unwrap();
        assert_eq!(entity.get("Port"), Some(&FieldValue::Integer(8080)));
    }

    #[test]
    fn resolves_and_coerces_each_field() {
        let doc = OverrideDocument::new()
            .with_field("Host", env_region_tree())
            .with_field("Port", OverrideNode::terminal("42"))
            .with_field("Debug", OverrideNode::terminal("true"));
        let entity = map_entity(&server_schema(), &doc, &dims(), &prod_west()).unwrap();
        assert_eq!(entity.name(), "Server");
        assert_eq!(entity.get("Host"), Some(&FieldValue::String("C".into())));
        assert_eq!(entity.get("Port"), Some(&FieldValue::Integer(42)));
        assert_eq!(entity.get("Debug"), Some(&FieldValue::Boolean(true)));
        assert!(entity.is_overridden("Port"));
    }

    #[test]
    fn coercion_failure_is_wrapped() {
        let doc = OverrideDocument::new().with_field("Port", OverrideNode::terminal("abc"));
        let err = map_entity(&server_schema(), &doc, &dims(), &prod_west()).unwrap_err();
        assert_eq!(err.entity, "Server");
        assert_eq!(err.field, "Port");
        assert!(matches!(
            err.cause,
            FieldError::TypeCoercion { ref raw, target: FieldKind::Integer, .. } if raw == "abc"
        ));
    }

    #[test]
    fn resolution_failure_is_wrapped() {
        let doc = OverrideDocument::new().with_field("Host", env_region_tree());
        let combination = Combination::new()
            .with("env", "prod")
            .with("region", "centralus");
        let err = map_entity(&server_schema(), &doc, &dims(), &combination).unwrap_err();
        assert_eq!(err.field, "Host");
        assert_eq!(
            err.cause,
            FieldError::Resolve(ResolveError::UnresolvedOverridePath {
                dimension: "region".into(),
                value: "centralus".into(),
            })
        );
    }

    #[test]
    fn first_failing_field_in_declaration_order_is_reported() {
        // Host is declared before Port in the fixture schema.
        let doc = OverrideDocument::new()
            .with_field("Port", OverrideNode::terminal("abc"))
            .with_field("Host", OverrideNode::branch(Vec::<(String, OverrideNode)>::new()));
        let err = map_entity(&server_schema(), &doc, &dims(), &prod_west()).unwrap_err();
        assert_eq!(err.field, "Host");
    }

    #[test]
    fn serializes_in_declaration_order() {
        let schema = EntitySchema::new("S")
            .field("Zeta", FieldKind::Integer)
            .field("Alpha", FieldKind::String);
        let doc = OverrideDocument::new().with_field("Zeta", OverrideNode::terminal("1"));
        let entity = map_entity(&schema, &doc, &dims(), &prod_west()).unwrap();
        let json = serde_json::to_string(&entity).unwrap();
        assert_eq!(json, r#"{"Zeta":1,"Alpha":""}"#);
    }

    #[test]
    fn to_config_applies_struct_defaults() {
        let schema = EntitySchema::new("ServerConfig")
            .field("host", FieldKind::String)
            .field("port", FieldKind::Integer);
        let doc = OverrideDocument::new().with_field("port", OverrideNode::terminal("3000"));
        let entity = map_entity(&schema, &doc, &dims(), &prod_west()).unwrap();

        let config: ServerConfig = entity.to_config().unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn to_config_rejects_out_of_range_value() {
        let schema = EntitySchema::new("ServerConfig").field("port", FieldKind::Integer);
        let doc = OverrideDocument::new().with_field("port", OverrideNode::terminal("70000"));
        let entity = map_entity(&schema, &doc, &dims(), &prod_west()).unwrap();

        let result: Result<ServerConfig, _> = entity.to_config();
        assert!(matches!(result, Err(HierfigError::InvalidValue { .. })));
    }
}
