//! Configuration loading from competition.toml
//!
//! Competition settings live in a `competition.toml` file in the project root.
//! The file is discovered by walking up from the current directory.

use crate::analysis::{Analyser, LimitAdjustment, LimitCheck};
use crate::annotation::{AnnotationWriter, NoopAnnotationWriter};
use rivalbench_core::{CompetitionLimit, CompetitionTarget, LimitBound, LimitError, RunRegistry};
use rivalbench_stats::{
    CalculatorKind, DEFAULT_ABSOLUTE_ACCURACY, DEFAULT_RELATIVE_ACCURACY, LogNormalCalculator,
    MetricCalculator, SingleValueCalculator,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name searched by [`CompetitionOptions::discover`]
pub const CONFIG_FILE_NAME: &str = "competition.toml";

/// Settings of a competition, as read from `competition.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompetitionOptions {
    /// Run loop settings
    #[serde(default)]
    pub run: RunOptions,
    /// Limit adjustment (annotation) pass
    #[serde(default)]
    pub adjustment: AdjustmentOptions,
    /// Limit check pass
    #[serde(default)]
    pub check: CheckOptions,
    /// Metric calculation strategy
    #[serde(default)]
    pub calculator: CalculatorOptions,
    /// Report output
    #[serde(default)]
    pub output: OutputOptions,
    /// Explicit limit records per benchmark
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetRecord>,
}

/// Run loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Hard cap on runs in one competition
    #[serde(default = "default_max_runs_allowed")]
    pub max_runs_allowed: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_runs_allowed: default_max_runs_allowed(),
        }
    }
}

fn default_max_runs_allowed() -> u32 {
    10
}

/// Limit adjustment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentOptions {
    /// Widen limits to cover observed ratios
    #[serde(default)]
    pub adjust_limits: bool,
    /// Extra margin applied to a widened limit, in percent
    #[serde(default = "default_loose_limits_percent")]
    pub loose_limits_percent: f64,
    /// Reruns requested after limits were widened
    #[serde(default = "default_reruns_if_annotations_updated")]
    pub additional_reruns_if_annotations_updated: u32,
}

impl Default for AdjustmentOptions {
    fn default() -> Self {
        Self {
            adjust_limits: false,
            loose_limits_percent: default_loose_limits_percent(),
            additional_reruns_if_annotations_updated: default_reruns_if_annotations_updated(),
        }
    }
}

fn default_loose_limits_percent() -> f64 {
    3.0
}
fn default_reruns_if_annotations_updated() -> u32 {
    2
}

/// Limit check settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOptions {
    /// Rerun instead of failing while runs remain
    #[serde(default)]
    pub rerun_if_limits_failed: bool,
    /// Reruns requested after a failed check
    #[serde(default = "default_reruns_if_limits_failed")]
    pub additional_reruns_if_limits_failed: u32,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            rerun_if_limits_failed: false,
            additional_reruns_if_limits_failed: default_reruns_if_limits_failed(),
        }
    }
}

fn default_reruns_if_limits_failed() -> u32 {
    3
}

/// Metric calculator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorOptions {
    /// "log-normal" or "single-value"
    #[serde(default)]
    pub kind: CalculatorKind,
    /// Envelope of the absolute limit range (log-normal only)
    #[serde(default = "default_absolute_accuracy")]
    pub absolute_accuracy: f64,
    /// Envelope of the relative limit range (log-normal only)
    #[serde(default = "default_relative_accuracy")]
    pub relative_accuracy: f64,
}

impl Default for CalculatorOptions {
    fn default() -> Self {
        Self {
            kind: CalculatorKind::default(),
            absolute_accuracy: default_absolute_accuracy(),
            relative_accuracy: default_relative_accuracy(),
        }
    }
}

fn default_absolute_accuracy() -> f64 {
    DEFAULT_ABSOLUTE_ACCURACY
}
fn default_relative_accuracy() -> f64 {
    DEFAULT_RELATIVE_ACCURACY
}

impl CalculatorOptions {
    /// Calculator built from these settings
    pub fn calculator(&self) -> MetricCalculator {
        match self.kind {
            CalculatorKind::SingleValue => MetricCalculator::SingleValue(SingleValueCalculator),
            CalculatorKind::LogNormal => MetricCalculator::LogNormal(LogNormalCalculator::new(
                self.absolute_accuracy,
                self.relative_accuracy,
            )),
        }
    }
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputOptions {
    /// Write the JSON report here after the competition
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

/// Explicit limit record of one benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Benchmark method
    pub name: String,
    /// Lower ratio bound
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper ratio bound
    #[serde(default)]
    pub max: Option<f64>,
    /// Never check the lower bound
    #[serde(default)]
    pub ignore_min: bool,
    /// Never check the upper bound
    #[serde(default)]
    pub ignore_max: bool,
    /// Unit of the bounds
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "ratio".to_string()
}

impl TargetRecord {
    /// Record with numeric bounds
    pub fn new(name: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            ignore_min: false,
            ignore_max: false,
            unit: default_unit(),
        }
    }

    /// Limit described by this record
    pub fn limit(&self) -> Result<CompetitionLimit, LimitError> {
        let bound = |ignore: bool, value: Option<f64>| match (ignore, value) {
            (true, _) => LimitBound::Ignored,
            (false, Some(v)) => LimitBound::Value(v),
            (false, None) => LimitBound::Empty,
        };
        CompetitionLimit::from_bounds(
            bound(self.ignore_min, self.min),
            bound(self.ignore_max, self.max),
        )
    }

    /// Competition target for this record
    pub fn to_target(&self) -> Result<CompetitionTarget, LimitError> {
        Ok(CompetitionTarget::new(self.name.as_str(), self.limit()?).with_external_annotation(true))
    }
}

impl CompetitionOptions {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let options: Self = toml::from_str(&content)?;
        options.validate()?;
        Ok(options)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(dir)
    }

    /// Walk up from `start` and load the first `competition.toml` found
    pub fn discover_from(start: impl Into<PathBuf>) -> Option<Self> {
        let mut dir = start.into();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(options) => Some(options),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), "Ignoring invalid config: {}", e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Reject values the competition cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.run.max_runs_allowed == 0 {
            anyhow::bail!("[run] max_runs_allowed must be at least 1");
        }
        let percent = self.adjustment.loose_limits_percent;
        if !percent.is_finite() || percent < 0.0 {
            anyhow::bail!("[adjustment] loose_limits_percent must be a non-negative number, got {}", percent);
        }
        for (key, accuracy) in [
            ("absolute_accuracy", self.calculator.absolute_accuracy),
            ("relative_accuracy", self.calculator.relative_accuracy),
        ] {
            if !(0.0..1.0).contains(&accuracy) {
                anyhow::bail!("[calculator] {} must be in [0, 1), got {}", key, accuracy);
            }
        }
        let mut seen = std::collections::BTreeSet::new();
        for record in &self.targets {
            if !seen.insert(record.name.as_str()) {
                anyhow::bail!("Duplicate [[target]] record: {}", record.name);
            }
            record
                .limit()
                .map_err(|e| anyhow::anyhow!("[[target]] {}: {}", record.name, e))?;
        }
        Ok(())
    }

    /// Explicit record for a benchmark
    pub fn target_record(&self, name: &str) -> Option<&TargetRecord> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# rivalbench competition configuration

[run]
# Hard cap on runs in one competition
max_runs_allowed = 10

[adjustment]
# Widen limits to cover observed ratios
adjust_limits = false
# Extra margin added to a widened limit, in percent
loose_limits_percent = 3.0
# Reruns requested after limits were widened
additional_reruns_if_annotations_updated = 2

[check]
# Rerun instead of failing while runs remain
rerun_if_limits_failed = false
# Reruns requested after a failed check
additional_reruns_if_limits_failed = 3

[calculator]
# "log-normal" or "single-value"
kind = "log-normal"
# Accuracy envelopes of the log-normal limit ranges
absolute_accuracy = 0.01
relative_accuracy = 0.02

[output]
# JSON report written after the competition (uncomment to enable)
# report_path = "target/rivalbench/report.json"

# Explicit limits, one record per benchmark (uncomment to enable)
# [[target]]
# name = "parse_json"
# min = 0.8
# max = 1.2
# ignore_min = false
# ignore_max = false
# unit = "ratio"
"#
        .to_string()
    }
}

/// Everything a competition run needs: options, run registry and collaborators
#[derive(Clone)]
pub struct CompetitionConfig {
    options: CompetitionOptions,
    registry: Option<Arc<RunRegistry>>,
    analysers: Vec<Arc<dyn Analyser>>,
    annotation_writer: Arc<dyn AnnotationWriter>,
}

impl CompetitionConfig {
    /// Bare configuration: no registry, no analysers, annotations discarded
    pub fn new(options: CompetitionOptions) -> Self {
        Self {
            options,
            registry: None,
            analysers: Vec::new(),
            annotation_writer: Arc::new(NoopAnnotationWriter),
        }
    }

    /// Configuration with a fresh registry and the default analysers
    pub fn from_options(options: CompetitionOptions) -> Self {
        Self::new(options)
            .with_registry(Arc::new(RunRegistry::new()))
            .with_default_analysers()
    }

    /// Use `registry` for session state
    pub fn with_registry(mut self, registry: Arc<RunRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Drop the registry
    pub fn without_registry(mut self) -> Self {
        self.registry = None;
        self
    }

    /// Append an analyser; analysers run in insertion order
    pub fn with_analyser(mut self, analyser: impl Analyser + 'static) -> Self {
        self.analysers.push(Arc::new(analyser));
        self
    }

    /// Limit adjustment (when enabled) followed by the limit check
    pub fn with_default_analysers(mut self) -> Self {
        if self.options.adjustment.adjust_limits {
            self.analysers.push(Arc::new(LimitAdjustment));
        }
        self.analysers.push(Arc::new(LimitCheck));
        self
    }

    /// Send widened limits to `writer`
    pub fn with_annotation_writer(mut self, writer: Arc<dyn AnnotationWriter>) -> Self {
        self.annotation_writer = writer;
        self
    }

    /// Competition options
    pub fn options(&self) -> &CompetitionOptions {
        &self.options
    }

    /// Run registry, if configured
    pub fn registry(&self) -> Option<&Arc<RunRegistry>> {
        self.registry.as_ref()
    }

    /// Analysers in execution order
    pub fn analysers(&self) -> &[Arc<dyn Analyser>] {
        &self.analysers
    }

    /// Annotation writer
    pub fn annotation_writer(&self) -> &dyn AnnotationWriter {
        self.annotation_writer.as_ref()
    }

    /// Metric calculator described by the options
    pub fn calculator(&self) -> MetricCalculator {
        self.options.calculator.calculator()
    }
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self::from_options(CompetitionOptions::default())
    }
}

impl std::fmt::Debug for CompetitionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let analysers: Vec<_> = self.analysers.iter().map(|a| a.name()).collect();
        f.debug_struct("CompetitionConfig")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("analysers", &analysers)
            .finish_non_exhaustive()
    }
}
