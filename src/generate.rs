//! Generation orchestrator: every combination × every entity.
//!
//! For each combination, in hierarchy order, every entity is mapped into a
//! [`Bundle`]. What happens when an entity fails is decided by the
//! [`FailurePolicy`]:
//!
//! - [`SkipCombination`](FailurePolicy::SkipCombination) (default): the
//!   combination is dropped from the output, recorded in
//!   [`GenerationReport::failures`] and logged. Other combinations proceed.
//! - [`AbortRun`](FailurePolicy::AbortRun): the first failure ends the run
//!   with [`HierfigError::CombinationFailed`].
//!
//! Resolution finishes before anything is handed to a sink, so an aborted run
//! writes nothing.

use std::collections::HashSet;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{FieldResolutionError, HierfigError};
use crate::hierarchy::{Combination, Hierarchy};
use crate::mapper::{self, ResolvedEntity};
use crate::schema::EntitySchema;
use crate::sink::BundleSink;
use crate::tree::OverrideDocument;

/// What a failing entity does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    #[default]
    SkipCombination,
    AbortRun,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::SkipCombination => "skip-combination",
            FailurePolicy::AbortRun => "abort-run",
        }
    }
}

/// An entity to resolve: its declared shape and its override document.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDefinition {
    pub schema: EntitySchema,
    pub document: OverrideDocument,
}

impl EntityDefinition {
    pub fn new(schema: EntitySchema, document: OverrideDocument) -> Self {
        Self { schema, document }
    }
}

/// All resolved entities of one combination, keyed by entity name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    entities: Vec<ResolvedEntity>,
}

impl Bundle {
    pub fn get(&self, entity: &str) -> Option<&ResolvedEntity> {
        self.entities.iter().find(|e| e.name() == entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Serialize for Bundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entities.len()))?;
        for entity in &self.entities {
            map.serialize_entry(entity.name(), entity)?;
        }
        map.end()
    }
}

/// A bundle together with the identifier it is written under.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBundle {
    pub identifier: String,
    pub bundle: Bundle,
}

/// A combination that produced no bundle, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationFailure {
    pub identifier: String,
    pub combination: Combination,
    pub error: FieldResolutionError,
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Successful bundles, in combination order.
    pub bundles: Vec<GeneratedBundle>,
    /// Combinations skipped under [`FailurePolicy::SkipCombination`].
    pub failures: Vec<CombinationFailure>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives resolution for a hierarchy and a set of entities.
pub struct Generator<'a> {
    hierarchy: &'a Hierarchy,
    entities: &'a [EntityDefinition],
    policy: FailurePolicy,
    identify: fn(&Combination) -> String,
}

impl<'a> Generator<'a> {
    pub fn new(hierarchy: &'a Hierarchy, entities: &'a [EntityDefinition]) -> Self {
        Self {
            hierarchy,
            entities,
            policy: FailurePolicy::default(),
            identify: Combination::identifier,
        }
    }

    /// Set the failure policy (default: [`FailurePolicy::SkipCombination`]).
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the identifier derivation (default: [`Combination::identifier`]).
    pub fn identifier_fn(mut self, identify: fn(&Combination) -> String) -> Self {
        self.identify = identify;
        self
    }

    /// Resolve every combination without writing anything.
    pub fn generate(&self) -> Result<GenerationReport, HierfigError> {
        self.check_entities()?;
        let identifiers = self.identifiers()?;

        info!(
            event = "hierfig.generate.started",
            combinations = self.hierarchy.combinations().len(),
            entities = self.entities.len()
        );

        let mut report = GenerationReport::default();

        for (combination, identifier) in self.hierarchy.combinations().iter().zip(identifiers) {
            match self.resolve_combination(combination) {
                Ok(bundle) => {
                    debug!(
                        event = "hierfig.generate.combination_resolved",
                        identifier = %identifier,
                        entities = bundle.len()
                    );
                    report.bundles.push(GeneratedBundle { identifier, bundle });
                }
                Err(err) => {
                    error!(
                        event = "hierfig.generate.combination_failed",
                        identifier = %identifier,
                        entity = %err.entity,
                        field = %err.field,
                        error = %err.cause
                    );
                    if self.policy == FailurePolicy::AbortRun {
                        return Err(HierfigError::CombinationFailed {
                            identifier,
                            source: err,
                        });
                    }
                    report.failures.push(CombinationFailure {
                        identifier,
                        combination: combination.clone(),
                        error: err,
                    });
                }
            }
        }

        info!(
            event = "hierfig.generate.completed",
            bundles = report.bundles.len(),
            failures = report.failures.len()
        );

        Ok(report)
    }

    /// Resolve every combination, then hand each bundle to `sink`.
    pub fn run<S: BundleSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<GenerationReport, HierfigError> {
        let report = self.generate()?;
        for generated in &report.bundles {
            sink.write(&generated.identifier, &generated.bundle)?;
        }
        Ok(report)
    }

    fn resolve_combination(&self, combination: &Combination) -> Result<Bundle, FieldResolutionError> {
        let dimensions = self.hierarchy.dimensions();
        let entities = self
            .entities
            .iter()
            .map(|def| mapper::map_entity(&def.schema, &def.document, dimensions, combination))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Bundle { entities })
    }

    fn check_entities(&self) -> Result<(), HierfigError> {
        let mut seen = HashSet::new();
        for def in self.entities {
            if !seen.insert(def.schema.name()) {
                return Err(HierfigError::DuplicateEntity(def.schema.name().to_string()));
            }
        }
        Ok(())
    }

    fn identifiers(&self) -> Result<Vec<String>, HierfigError> {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(self.hierarchy.combinations().len());
        for combination in self.hierarchy.combinations() {
            let id = (self.identify)(combination);
            if !seen.insert(id.clone()) {
                return Err(HierfigError::MalformedHierarchy(format!(
                    "more than one combination maps to identifier '{id}'"
                )));
            }
            ids.push(id);
        }
        Ok(ids)
    }
}
