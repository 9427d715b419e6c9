//! Hierarchy model: the ordered dimension list and the combinations to generate.
//!
//! A hierarchy document looks like:
//!
//! ```json
//! {
//!   "hierarchy": ["environment", "region"],
//!   "combinations": [
//!     { "environment": "development", "region": "eastus" },
//!     { "environment": "production", "region": "westus" }
//!   ]
//! }
//! ```
//!
//! Combinations are data. Nothing here builds a cross-product, and a
//! combination may leave out dimensions that every override tree settles
//! before reaching them.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::HierfigError;

/// One assignment of values to dimensions, in the order it was written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combination {
    entries: Vec<(String, String)>,
}

impl Combination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `dimension` to `value`. Re-setting a dimension keeps its original position.
    pub fn with(mut self, dimension: &str, value: &str) -> Self {
        match self.entries.iter_mut().find(|(d, _)| d == dimension) {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .entries
                .push((dimension.to_string(), value.to_string())),
        }
        self
    }

    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(d, _)| d == dimension)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(d, v)| (d.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Output identifier: the values joined with `.` in combination order.
    ///
    /// Characters other than ASCII alphanumerics, `.`, `-` and `_` become `_`
    /// so the identifier can be used inside a file name.
    pub fn identifier(&self) -> String {
        self.entries
            .iter()
            .map(|(_, v)| sanitize(v))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn from_json(object: Map<String, Value>) -> Result<Self, HierfigError> {
        let mut combination = Combination::new();
        for (dimension, value) in object {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(HierfigError::MalformedHierarchy(format!(
                        "combination value for '{dimension}' must be a scalar, got {other}"
                    )));
                }
            };
            combination = combination.with(&dimension, &text);
        }
        Ok(combination)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Combination {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Combination::new(), |c, (k, v)| c.with(k.as_ref(), v.as_ref()))
    }
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Deserialize)]
struct HierarchyDocument {
    hierarchy: Vec<String>,
    #[serde(default)]
    combinations: Vec<Map<String, Value>>,
}

/// Validated, immutable hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    dimensions: Vec<String>,
    combinations: Vec<Combination>,
}

impl Hierarchy {
    /// Validate and build a hierarchy.
    ///
    /// Fails with [`HierfigError::MalformedHierarchy`] when the dimension list
    /// is empty or repeats a name. Whether a combination covers the dimensions
    /// an override tree actually consults is only known at resolution time.
    pub fn new(
        dimensions: Vec<String>,
        combinations: Vec<Combination>,
    ) -> Result<Self, HierfigError> {
        if dimensions.is_empty() {
            return Err(HierfigError::MalformedHierarchy(
                "dimension list is empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for dim in &dimensions {
            if !seen.insert(dim.as_str()) {
                return Err(HierfigError::MalformedHierarchy(format!(
                    "dimension '{dim}' is listed more than once"
                )));
            }
        }

        Ok(Self {
            dimensions,
            combinations,
        })
    }

    /// Parse a hierarchy document. `path` is only used in error messages.
    pub fn from_json_str(content: &str, path: &Path) -> Result<Self, HierfigError> {
        let doc: HierarchyDocument = serde_json::from_str(content).map_err(|e| {
            if e.is_data() {
                HierfigError::MalformedHierarchy(format!("{}: {e}", path.display()))
            } else {
                HierfigError::JsonError {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let combinations = doc
            .combinations
            .into_iter()
            .map(Combination::from_json)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(doc.hierarchy, combinations)
    }

    /// Dimension names in traversal order.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Combinations in document order.
    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }
}
