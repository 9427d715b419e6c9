//! Run options for the generator itself, resolved in layers.
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Settings files        hierfig.toml in each search dir, then an explicit file
//!        ↑ overridden by
//! Environment vars      HIERFIG__KEY
//!        ↑ overridden by
//! Overrides             .cli_override()
//! ```
//!
//! Every layer is sparse. The settings are flat, so layers merge key by key.
//! Resolution itself ([`resolve_settings`]) works on pre-loaded data and does
//! no I/O; [`SettingsBuilder::load`] gathers the files and environment first.

use std::path::{Path, PathBuf};

use confique::Config;
use toml::{Table, Value};
use tracing::debug;

use crate::error::HierfigError;
use crate::generate::FailurePolicy;

pub const SETTINGS_FILE_NAME: &str = "hierfig.toml";
pub const ENV_PREFIX: &str = "HIERFIG";

#[derive(Config, Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    /// Directory holding one `<Entity>.json` override document per entity.
    #[config(default = "./src/configuration")]
    pub input_dir: PathBuf,

    /// Directory the generated settings files are written to.
    #[config(default = "./src/configuration/generated")]
    pub output_dir: PathBuf,

    /// Hierarchy document listing dimensions and combinations.
    #[config(default = "./src/configuration/hierarchy.json")]
    pub hierarchy_file: PathBuf,

    /// TOML file declaring every entity and the kind of each field.
    #[config(default = "./src/configuration/entities.toml")]
    pub schema_file: PathBuf,

    /// Generated files are named `<file_prefix>.<identifier>.json`.
    #[config(default = "appsettings")]
    pub file_prefix: String,

    /// What a failing entity does: `skip-combination` or `abort-run`.
    #[config(default = "skip-combination")]
    pub on_failure: FailurePolicy,

    /// Reject undeclared fields and unreachable keys in override documents.
    #[config(default = true)]
    pub strict: bool,
}

type Layer = <GeneratorSettings as Config>::Layer;

/// Everything [`resolve_settings`] needs. No I/O happens during resolution.
pub struct SettingsInput {
    /// File contents in precedence order: first = lowest priority.
    pub files: Vec<(PathBuf, String)>,
    /// Raw environment variable pairs.
    pub env_vars: Vec<(String, String)>,
    /// Env var prefix. `None` disables the environment layer.
    pub env_prefix: Option<String>,
    /// Highest-priority `(key, value)` pairs.
    pub overrides: Vec<(String, Value)>,
    /// Reject unknown keys in settings files.
    pub strict: bool,
}

pub fn resolve_settings(input: SettingsInput) -> Result<GeneratorSettings, HierfigError> {
    let mut merged = Table::new();

    for (path, content) in &input.files {
        if input.strict {
            validate_unknown_keys(content, path)?;
        }
        let table: Table = toml::from_str(content).map_err(|e| HierfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        merged.extend(table);
    }

    if let Some(prefix) = &input.env_prefix {
        merged.extend(env_to_table(prefix, input.env_vars));
    }

    merged.extend(input.overrides);

    let layer: Layer = Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| HierfigError::InvalidValue {
            key: "<settings>".into(),
            reason: e.to_string(),
        })?;

    GeneratorSettings::builder()
        .preloaded(layer)
        .load()
        .map_err(HierfigError::from)
}

/// Build a table from variables named `{prefix}__{KEY}`, with `KEY` lowercased.
///
/// `true`/`false` (any case) become booleans; everything else stays a string.
fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let value = if value.eq_ignore_ascii_case("true") {
            Value::Boolean(true)
        } else if value.eq_ignore_ascii_case("false") {
            Value::Boolean(false)
        } else {
            Value::String(value)
        };
        table.insert(rest.to_lowercase(), value);
    }

    table
}

/// Fail on keys the settings struct does not declare, with their line numbers.
fn validate_unknown_keys(content: &str, path: &Path) -> Result<(), HierfigError> {
    let mut unknown: Vec<String> = Vec::new();

    let deserializer = toml::Deserializer::new(content);
    let _layer: Layer = serde_ignored::deserialize(deserializer, |ignored| {
        unknown.push(ignored.to_string());
    })
    .map_err(|e| HierfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    if unknown.is_empty() {
        return Ok(());
    }

    let errors = unknown
        .into_iter()
        .map(|key| HierfigError::UnknownKey {
            line: find_key_line(content, &key),
            key,
            path: path.to_path_buf(),
        })
        .collect();

    Err(HierfigError::UnknownKeys(errors))
}

/// 1-indexed line of a top-level `key = ...` assignment, or 0 if not found.
fn find_key_line(content: &str, key: &str) -> usize {
    content
        .lines()
        .position(|line| {
            line.trim_start()
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        })
        .map_or(0, |i| i + 1)
}

/// Gathers settings files, environment and overrides, then resolves them.
pub struct SettingsBuilder {
    search_dirs: Vec<PathBuf>,
    file: Option<PathBuf>,
    env_prefix: Option<String>,
    strict: bool,
    overrides: Vec<(String, Value)>,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            search_dirs: vec![PathBuf::from(".")],
            file: None,
            env_prefix: Some(ENV_PREFIX.to_string()),
            strict: true,
            overrides: Vec::new(),
        }
    }

    /// Replace the directories searched for `hierfig.toml` (default: the
    /// working directory). Listed lowest priority first; missing files are skipped.
    pub fn search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Load this file on top of the searched ones. Unlike searched files it must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Override the environment variable prefix (default: `HIERFIG`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable the environment layer.
    pub fn no_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Enable or disable unknown-key checks on settings files (default: `true`).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Add a highest-priority override. `None` is ignored, which suits optional CLI args.
    pub fn cli_override<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.overrides.push((key.to_string(), v.into()));
        }
        self
    }

    fn read_files(&self) -> Result<Vec<(PathBuf, String)>, HierfigError> {
        let mut files = Vec::new();

        for dir in &self.search_dirs {
            let path = dir.join(SETTINGS_FILE_NAME);
            match std::fs::read_to_string(&path) {
                Ok(content) => files.push((path, content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(HierfigError::IoError { path, source: e }),
            }
        }

        if let Some(path) = &self.file {
            let content = std::fs::read_to_string(path).map_err(|e| HierfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            files.push((path.clone(), content));
        }

        Ok(files)
    }

    pub fn load(self) -> Result<GeneratorSettings, HierfigError> {
        let files = self.read_files()?;
        for (path, _) in &files {
            debug!(event = "hierfig.settings.file_found", path = %path.display());
        }

        let env_vars = match &self.env_prefix {
            Some(_) => std::env::vars().collect(),
            None => Vec::new(),
        };

        resolve_settings(SettingsInput {
            files,
            env_vars,
            env_prefix: self.env_prefix,
            overrides: self.overrides,
            strict: self.strict,
        })
    }
}
