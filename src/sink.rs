//! Output sinks for resolved bundles.
//!
//! [`JsonFileSink`] writes each bundle as an indented JSON object to
//! `{output_dir}/{prefix}.{identifier}.json`, creating the directory as
//! needed. A combination with an empty identifier writes `{prefix}.json`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::HierfigError;
use crate::generate::{Bundle, GeneratedBundle};

/// Receives one bundle per successful combination.
pub trait BundleSink {
    fn write(&mut self, identifier: &str, bundle: &Bundle) -> Result<(), HierfigError>;
}

/// Collects bundles in memory.
impl BundleSink for Vec<GeneratedBundle> {
    fn write(&mut self, identifier: &str, bundle: &Bundle) -> Result<(), HierfigError> {
        self.push(GeneratedBundle {
            identifier: identifier.to_string(),
            bundle: bundle.clone(),
        });
        Ok(())
    }
}

pub const DEFAULT_FILE_PREFIX: &str = "appsettings";

/// Writes `appsettings.<identifier>.json` files.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: PathBuf,
    file_prefix: String,
    written: Vec<PathBuf>,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            written: Vec::new(),
        }
    }

    pub fn file_prefix(mut self, prefix: &str) -> Self {
        self.file_prefix = prefix.to_string();
        self
    }

    /// File name for a bundle identifier.
    pub fn file_name(&self, identifier: &str) -> String {
        if identifier.is_empty() {
            format!("{}.json", self.file_prefix)
        } else {
            format!("{}.{identifier}.json", self.file_prefix)
        }
    }

    pub fn path_for(&self, identifier: &str) -> PathBuf {
        self.output_dir.join(self.file_name(identifier))
    }

    /// Paths written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl BundleSink for JsonFileSink {
    fn write(&mut self, identifier: &str, bundle: &Bundle) -> Result<(), HierfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(HierfigError::InvalidValue {
                key: "output_dir".into(),
                reason: "output directory cannot be empty".into(),
            });
        }
        if self.file_prefix.trim().is_empty() {
            return Err(HierfigError::InvalidValue {
                key: "file_prefix".into(),
                reason: "file prefix cannot be empty".into(),
            });
        }

        let content = render(bundle)?;
        let path = self.path_for(identifier);
        write_file(&self.output_dir, &path, &content)?;

        info!(
            event = "hierfig.sink.bundle_written",
            identifier = identifier,
            path = %path.display(),
            entities = bundle.len()
        );
        self.written.push(path);
        Ok(())
    }
}

/// Render a bundle as indented JSON with a trailing newline.
pub fn render(bundle: &Bundle) -> Result<String, HierfigError> {
    let mut json = serde_json::to_string_pretty(bundle).map_err(|e| HierfigError::InvalidValue {
        key: "<bundle>".into(),
        reason: e.to_string(),
    })?;
    json.push('\n');
    Ok(json)
}

fn write_file(dir: &Path, path: &Path, content: &str) -> Result<(), HierfigError> {
    std::fs::create_dir_all(dir).map_err(|e| HierfigError::IoError {
        path: dir.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, content).map_err(|e| HierfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}
