use std::path::PathBuf;

use thiserror::Error;

use crate::schema::FieldKind;

/// Why a single override tree could not produce a value for a combination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("combination has no value for dimension '{0}'")]
    MissingCombinationKey(String),

    #[error("no override for {dimension} = '{value}'")]
    UnresolvedOverridePath { dimension: String, value: String },

    #[error("override path ended on a branch without a 'value'")]
    MissingTerminalValue,
}

/// A failure scoped to one field of one entity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot convert '{raw}' in field '{field}' to {target}")]
    TypeCoercion {
        field: String,
        raw: String,
        target: FieldKind,
    },
}

/// A field-level failure, tagged with the entity and field it came from.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to resolve {entity}.{field}: {cause}")]
pub struct FieldResolutionError {
    pub entity: String,
    pub field: String,
    #[source]
    pub cause: FieldError,
}

#[derive(Debug, Error)]
pub enum HierfigError {
    #[error("Malformed hierarchy: {0}")]
    MalformedHierarchy(String),

    #[error("Malformed override document for {entity}: {reason}")]
    MalformedDocument { entity: String, reason: String },

    #[error("Malformed schema in {path}: {reason}")]
    MalformedSchema { path: PathBuf, reason: String },

    #[error("Entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in settings file")]
    UnknownKeys(Vec<HierfigError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to access {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error(transparent)]
    FieldResolution(#[from] FieldResolutionError),

    #[error("Combination '{identifier}' failed: {source}")]
    CombinationFailed {
        identifier: String,
        source: FieldResolutionError,
    },
}
