//! File loading for hierarchy documents, schema files and override documents.
//!
//! Each entity's overrides live in `{input_dir}/{EntityName}.json`. Every
//! declared entity must have one; a missing document is an I/O error rather
//! than an empty set of overrides.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::HierfigError;
use crate::generate::EntityDefinition;
use crate::hierarchy::Hierarchy;
use crate::schema::{EntitySchema, Registry};
use crate::tree::OverrideDocument;

fn read(path: &Path) -> Result<String, HierfigError> {
    std::fs::read_to_string(path).map_err(|e| HierfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn load_hierarchy(path: &Path) -> Result<Hierarchy, HierfigError> {
    let hierarchy = Hierarchy::from_json_str(&read(path)?, path)?;
    debug!(
        event = "hierfig.loader.hierarchy_loaded",
        path = %path.display(),
        dimensions = hierarchy.dimensions().len(),
        combinations = hierarchy.combinations().len()
    );
    Ok(hierarchy)
}

pub fn load_registry(path: &Path) -> Result<Registry, HierfigError> {
    let registry = Registry::from_toml_str(&read(path)?, path)?;
    debug!(
        event = "hierfig.loader.schema_loaded",
        path = %path.display(),
        entities = registry.len()
    );
    Ok(registry)
}

/// Path of an entity's override document inside `input_dir`.
pub fn document_path(input_dir: &Path, entity: &str) -> PathBuf {
    input_dir.join(format!("{entity}.json"))
}

pub fn load_override_document(
    input_dir: &Path,
    schema: &EntitySchema,
    strict: bool,
) -> Result<OverrideDocument, HierfigError> {
    let path = document_path(input_dir, schema.name());
    let document = OverrideDocument::from_json_str(&read(&path)?, schema, strict)?;
    debug!(
        event = "hierfig.loader.document_loaded",
        entity = schema.name(),
        path = %path.display(),
        fields = document.len()
    );
    Ok(document)
}

/// Load the override document of every entity in `registry`, in registry order.
pub fn load_entities(
    input_dir: &Path,
    registry: &Registry,
    strict: bool,
) -> Result<Vec<EntityDefinition>, HierfigError> {
    registry
        .iter()
        .map(|schema| {
            let document = load_override_document(input_dir, schema, strict)?;
            Ok(EntityDefinition::new(schema.clone(), document))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;
    use crate::tree::OverrideNode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_hierarchy_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hierarchy.json");
        fs::write(
            &path,
            r#"{ "hierarchy": ["env"], "combinations": [ { "env": "dev" } ] }"#,
        )
        .unwrap();
        let h = load_hierarchy(&path).unwrap();
        assert_eq!(h.dimensions(), &["env".to_string()]);
    }

    #[test]
    fn missing_hierarchy_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = load_hierarchy(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(HierfigError::IoError { .. })));
    }

    #[test]
    fn loads_registry_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.toml");
        fs::write(&path, "[App]\nWorkers = \"integer\"\n").unwrap();
        let registry = load_registry(&path).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn loads_documents_for_each_entity() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("App.json"), r#"{ "Workers": { "value": 4 } }"#).unwrap();
        fs::write(dir.path().join("Cache.json"), "{}").unwrap();

        let registry = Registry::new(vec![
            EntitySchema::new("App").field("Workers", FieldKind::Integer),
            EntitySchema::new("Cache").field("Ttl", FieldKind::Integer),
        ])
        .unwrap();

        let defs = load_entities(dir.path(), &registry, true).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].schema.name(), "App");
        assert_eq!(
            defs[0].document.get("Workers"),
            Some(&OverrideNode::terminal("4"))
        );
        assert!(defs[1].document.is_empty());
    }

    #[test]
    fn missing_document_is_io_error() {
        let dir = TempDir::new().unwrap();
        let registry =
            Registry::new(vec![EntitySchema::new("App").field("Workers", FieldKind::Integer)])
                .unwrap();
        match load_entities(dir.path(), &registry, true) {
            Err(HierfigError::IoError { path, .. }) => assert!(path.ends_with("App.json")),
            other => panic!("Expected IoError, got {other:?}"),
        }
    }

    #[test]
    fn document_path_uses_entity_name() {
        assert_eq!(
            document_path(Path::new("cfg"), "MyRuntimeConfiguration"),
            Path::new("cfg").join("MyRuntimeConfiguration.json")
        );
    }
}
