//! Statically declared entity schemas.
//!
//! An entity is a named group of fields, each with a [`FieldKind`] that decides
//! how resolved text is coerced. Schemas are declared in code or read from a
//! TOML schema file; nothing is discovered at runtime.
//!
//! ```toml
//! [MyRuntimeConfiguration]
//! FirstProperty = "string"
//! Port = "integer"
//! Mode = { symbol = ["fast", "slow"] }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::coerce::{self, FieldValue};
use crate::error::{FieldError, HierfigError};

/// The declared type category of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    String,
    /// One of a closed set of names, matched exactly.
    Symbol(Vec<String>),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::String => write!(f, "string"),
            FieldKind::Symbol(variants) => write!(f, "symbol [{}]", variants.join(", ")),
        }
    }
}

impl FieldKind {
    /// Value used when an override document does not mention the field.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Integer => FieldValue::Integer(0),
            FieldKind::Float => FieldValue::Float(0.0),
            FieldKind::Boolean => FieldValue::Boolean(false),
            FieldKind::String => FieldValue::String(String::new()),
            FieldKind::Symbol(variants) => {
                FieldValue::Symbol(variants.first().cloned().unwrap_or_default())
            }
        }
    }
}

/// One declared field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: None,
        }
    }

    /// Replace the kind default with an explicit one, given as raw text and
    /// coerced with the same rules as resolved overrides.
    pub fn with_default(mut self, raw: &str) -> Result<Self, FieldError> {
        self.default = Some(coerce::coerce(&self.name, raw, &self.kind)?);
        Ok(self)
    }

    pub fn default_value(&self) -> FieldValue {
        self.default
            .clone()
            .unwrap_or_else(|| self.kind.default_value())
    }
}

/// The declared shape of one configuration entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl EntitySchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Declare a field with its kind default. A later declaration of the same
    /// name replaces the earlier one in place.
    pub fn field(self, name: &str, kind: FieldKind) -> Self {
        self.field_spec(FieldSpec::new(name, kind))
    }

    pub fn field_spec(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == field)
    }
}

/// Ordered list of entity schemas with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entities: Vec<EntitySchema>,
}

impl Registry {
    pub fn new(entities: Vec<EntitySchema>) -> Result<Self, HierfigError> {
        let mut seen = HashSet::new();
        for entity in &entities {
            if !seen.insert(entity.name()) {
                return Err(HierfigError::DuplicateEntity(entity.name().to_string()));
            }
        }
        Ok(Self { entities })
    }

    /// Parse a TOML schema document. Entity and field order follow the file.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, HierfigError> {
        let table: Table = toml::from_str(content).map_err(|e| HierfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let malformed = |reason: String| HierfigError::MalformedSchema {
            path: path.to_path_buf(),
            reason,
        };

        let mut entities = Vec::with_capacity(table.len());
        for (entity_name, fields) in table {
            let Value::Table(fields) = fields else {
                return Err(malformed(format!(
                    "entity '{entity_name}' must be a table of field kinds"
                )));
            };

            let mut schema = EntitySchema::new(&entity_name);
            for (field_name, kind) in fields {
                let kind: FieldKind = kind.try_into().map_err(|e: toml::de::Error| {
                    malformed(format!("{entity_name}.{field_name}: {}", e.message()))
                })?;
                if let FieldKind::Symbol(variants) = &kind
                    && variants.is_empty()
                {
                    return Err(malformed(format!(
                        "{entity_name}.{field_name}: symbol needs at least one variant"
                    )));
                }
                schema = schema.field(&field_name, kind);
            }
            entities.push(schema);
        }

        Self::new(entities)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.iter()
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
