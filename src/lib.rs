//! Turn sparse, hierarchical configuration overrides into one flat settings
//! file per environment combination.
//!
//! A project declares a small set of **dimensions** (say `environment` and
//! `region`) and the **combinations** of them it deploys to. Each
//! configuration **entity** has a declared schema and an override document in
//! which every field is a tree keyed by dimension values. For every
//! combination, hierfig walks each field's tree, coerces the value it finds to
//! the declared kind, and writes the result:
//!
//! ```text
//! hierarchy.json       ["environment", "region"] × combinations
//! entities.toml        [Service] Url = "string", Retries = "integer"
//! Service.json         { "Url": { "production": { "eastus": { "value": "..." } } } }
//!        ↓
//! generated/appsettings.production.eastus.json
//! ```
//!
//! ```ignore
//! let registry = hierfig::loader::load_registry(Path::new("entities.toml"))?;
//! let hierarchy = hierfig::loader::load_hierarchy(Path::new("hierarchy.json"))?;
//! let entities = hierfig::loader::load_entities(Path::new("."), &registry, true)?;
//!
//! let report = Generator::new(&hierarchy, &entities)
//!     .run(&mut JsonFileSink::new("generated"))?;
//! ```
//!
//! # Resolution rule
//!
//! Starting at a field's root node, for each dimension in hierarchy order:
//!
//! - a node carrying `"value"` is **terminal**, and its value is the answer,
//!   even if later dimensions remain unvisited;
//! - otherwise the child keyed by the combination's value for that dimension
//!   is taken. A missing child is an error naming the dimension and value.
//!
//! After the last dimension the node reached must be terminal. Shared values
//! live as high in the tree as possible; only fields that actually differ
//! branch further down. See [`resolver::resolve`].
//!
//! # Fields and kinds
//!
//! Every field has a [`FieldKind`]: integer, float, boolean, string, or a
//! symbol drawn from a fixed set. Raw text found in the tree is coerced by
//! [`coerce::coerce`]. A field the document never mentions takes its
//! declared default, or the kind's zero value when none is declared.
//!
//! A resolved entity can be handed straight to a typed
//! [confique](https://docs.rs/confique) struct with
//! [`ResolvedEntity::to_config`], which also fills struct defaults.
//!
//! # Failures
//!
//! A field that cannot be resolved or coerced fails its entity, and an entity
//! failure fails the whole combination. [`FailurePolicy`] decides what
//! happens next: skip that combination and carry on (the default), or abort
//! the run. Every combination is resolved before any file is written, so an
//! aborted run leaves the output directory untouched.
//!
//! # Generator settings
//!
//! The tool's own options live in [`GeneratorSettings`]: compiled defaults,
//! then `hierfig.toml`, then `HIERFIG__*` environment variables, then CLI
//! flags. See the [`settings`] module.
//!
//! # Logging
//!
//! Library code emits [`tracing`](https://docs.rs/tracing) events with an
//! `event = "hierfig.<area>.<what>"` field and never installs a subscriber.
//! The binary calls [`logging::init_logging`]; `RUST_LOG` refines it.
//!
//! # Cargo features
//!
//! `clap` (default) enables the [`Cli`] adapter and the `hierfig` binary. The
//! library works without it:
//!
//! ```toml
//! hierfig = { version = "...", default-features = false }
//! ```

pub mod coerce;
pub mod error;
pub mod generate;
pub mod hierarchy;
pub mod loader;
pub mod logging;
pub mod mapper;
pub mod resolver;
pub mod schema;
pub mod settings;
pub mod sink;
pub mod tree;

#[cfg(feature = "clap")]
mod cli;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{Cli, RunOutcome};
pub use coerce::FieldValue;
pub use error::{FieldError, FieldResolutionError, HierfigError, ResolveError};
pub use generate::{
    Bundle, CombinationFailure, EntityDefinition, FailurePolicy, GeneratedBundle,
    GenerationReport, Generator,
};
pub use hierarchy::{Combination, Hierarchy};
pub use mapper::ResolvedEntity;
pub use schema::{EntitySchema, FieldKind, FieldSpec, Registry};
pub use settings::{GeneratorSettings, SettingsBuilder};
pub use sink::{BundleSink, JsonFileSink};
pub use tree::{OverrideDocument, OverrideNode};
