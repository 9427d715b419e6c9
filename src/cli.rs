//! Clap adapter for the `hierfig` binary.
//!
//! Compiled only with the `clap` Cargo feature (on by default). Flags map onto
//! [`GeneratorSettings`](crate::settings::GeneratorSettings) keys as
//! highest-priority overrides; anything left unset falls through to the
//! environment, `hierfig.toml` and compiled defaults.
//!
//! [`Cli::execute`] is the whole pipeline: settings, schema, hierarchy,
//! override documents, generation, and writing. The binary only adds logging
//! and the exit code.

use std::path::PathBuf;

use clap::Parser;

use crate::error::HierfigError;
use crate::generate::{FailurePolicy, GenerationReport, Generator};
use crate::loader;
use crate::settings::SettingsBuilder;
use crate::sink::JsonFileSink;

/// Generate flat per-combination settings files from hierarchical overrides.
#[derive(Debug, Parser)]
#[command(name = "hierfig", version)]
pub struct Cli {
    /// Settings file loaded on top of ./hierfig.toml.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Directory holding one <Entity>.json override document per entity.
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory the generated files are written to.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Hierarchy document (dimensions and combinations).
    #[arg(long = "hierarchy", value_name = "FILE")]
    pub hierarchy_file: Option<PathBuf>,

    /// Entity schema file (TOML).
    #[arg(long = "schema", value_name = "FILE")]
    pub schema_file: Option<PathBuf>,

    /// Output file name prefix.
    #[arg(long, value_name = "PREFIX")]
    pub file_prefix: Option<String>,

    /// What a failing entity does to the run.
    #[arg(long, value_enum)]
    pub on_failure: Option<FailurePolicy>,

    /// Warn about undeclared fields in override documents instead of failing.
    #[arg(long)]
    pub lenient: bool,

    /// Resolve everything but write no files.
    #[arg(long)]
    pub dry_run: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// What a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: GenerationReport,
    /// Files written, or the files that would be written on a dry run.
    pub files: Vec<PathBuf>,
}

/// A path flag as a settings value. Non-UTF-8 paths cannot be represented.
fn path_value(key: &str, path: &Option<PathBuf>) -> Result<Option<String>, HierfigError> {
    path.as_ref()
        .map(|p| {
            p.to_str()
                .map(str::to_string)
                .ok_or_else(|| HierfigError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("path is not valid UTF-8: {}", p.display()),
                })
        })
        .transpose()
}

impl Cli {
    /// Settings builder with this invocation's flags applied as overrides.
    pub fn settings_builder(&self) -> Result<SettingsBuilder, HierfigError> {
        let mut builder = SettingsBuilder::new()
            .cli_override("input_dir", path_value("input_dir", &self.input_dir)?)
            .cli_override("output_dir", path_value("output_dir", &self.output_dir)?)
            .cli_override(
                "hierarchy_file",
                path_value("hierarchy_file", &self.hierarchy_file)?,
            )
            .cli_override("schema_file", path_value("schema_file", &self.schema_file)?)
            .cli_override("file_prefix", self.file_prefix.clone())
            .cli_override("on_failure", self.on_failure.map(|p| p.as_str()))
            .cli_override("strict", self.lenient.then_some(false));
        if let Some(path) = &self.settings {
            builder = builder.file(path.clone());
        }
        Ok(builder)
    }

    pub fn execute(&self) -> Result<RunOutcome, HierfigError> {
        self.execute_with(self.settings_builder()?)
    }

    /// Like [`execute`](Self::execute), with an explicit settings builder.
    pub fn execute_with(&self, settings: SettingsBuilder) -> Result<RunOutcome, HierfigError> {
        let settings = settings.load()?;

        let registry = loader::load_registry(&settings.schema_file)?;
        let hierarchy = loader::load_hierarchy(&settings.hierarchy_file)?;
        let entities = loader::load_entities(&settings.input_dir, &registry, settings.strict)?;

        let generator = Generator::new(&hierarchy, &entities).failure_policy(settings.on_failure);
        let mut sink = JsonFileSink::new(&settings.output_dir).file_prefix(&settings.file_prefix);

        if self.dry_run {
            let report = generator.generate()?;
            let files = report
                .bundles
                .iter()
                .map(|b| sink.path_for(&b.identifier))
                .collect();
            return Ok(RunOutcome { report, files });
        }

        let report = generator.run(&mut sink)?;
        Ok(RunOutcome {
            report,
            files: sink.written().to_vec(),
        })
    }
}
