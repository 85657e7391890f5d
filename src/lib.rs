//! Tighten - rule-driven immutability and visibility narrowing for syntax trees
//!
//! Architecture: Clean Architecture - the library interface serves as the application layer
//! - Pure decision logic separated from tree mutation and reporting
//! - Clean boundaries between rules, traversal and output concerns
//! - The engine facade wires rules, observers and the inserter the way a compiler host would

pub mod config;
pub mod domain;
pub mod metrics;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod scanner;
pub mod tree;

// Re-export main types for convenient access
pub use domain::decision::{
    Decision, DecisionEvent, DecisionObserver, Diagnostic, ModifierKind, ScopeClass, ScopeKind,
    TightenError, TightenResult,
};

pub use domain::names::{PackageName, QualifiedName, SimpleName};

pub use config::{PackageFilter, SinkConfig, TightenConfig};

pub use metrics::{MetricsCollector, Percentage, RuleMetrics};

pub use report::{
    metrics_json, render_summary_table, DiagnosticSink, DiagnosticStyle, DiagnosticsReporter,
};

pub use rules::ModifierRule;

pub use scanner::TreeScanner;

pub use tree::{CompilationUnit, Declaration, ModifierInserter, TreeModifierInserter};

use std::sync::Arc;

/// Main engine tying rules, observers and the modifier inserter together
///
/// `process_unit` takes `&self`, so one engine can serve units from many
/// threads; every observer behind it synchronizes its own state.
pub struct TightenEngine {
    rules: Vec<ModifierRule>,
    filter: PackageFilter,
    style: DiagnosticStyle,
    metrics: Arc<MetricsCollector>,
    reporter: Arc<DiagnosticsReporter>,
    extras: Vec<Arc<dyn DecisionObserver>>,
    observers: Vec<Arc<dyn DecisionObserver>>,
    inserter: Box<dyn ModifierInserter>,
}

impl TightenEngine {
    /// Create an engine from a validated configuration
    pub fn with_config(config: TightenConfig) -> TightenResult<Self> {
        config.validate()?;
        let rules = config.enabled_rules()?;
        let filter = PackageFilter::from_config(&config.packages)?;
        let sink = match config.diagnostics.sink {
            SinkConfig::Stderr => DiagnosticSink::Stderr,
            SinkConfig::Log => DiagnosticSink::Tracing,
        };
        Ok(Self::assemble(rules, filter, config.diagnostics.style, sink))
    }

    /// Create an engine with the default configuration
    pub fn new() -> TightenResult<Self> {
        Self::with_config(TightenConfig::default())
    }

    /// Create an engine the way a compiler host hands arguments to its plugin
    pub fn from_plugin_args(args: &[String]) -> TightenResult<Self> {
        Self::with_config(TightenConfig::from_plugin_args(args)?)
    }

    fn assemble(
        rules: Vec<ModifierRule>,
        filter: PackageFilter,
        style: DiagnosticStyle,
        sink: DiagnosticSink,
    ) -> Self {
        let mut engine = Self {
            rules,
            filter,
            style,
            metrics: Arc::new(MetricsCollector::new()),
            reporter: Arc::new(DiagnosticsReporter::new(style, sink)),
            extras: Vec::new(),
            observers: Vec::new(),
            inserter: Box::new(TreeModifierInserter),
        };
        engine.rebuild_observers();
        engine
    }

    // metrics before diagnostics: counters must never miss an emitted warning
    fn rebuild_observers(&mut self) {
        let mut observers: Vec<Arc<dyn DecisionObserver>> =
            vec![self.metrics.clone(), self.reporter.clone()];
        observers.extend(self.extras.iter().cloned());
        self.observers = observers;
    }

    /// Redirect diagnostics; replaces the reporter, so call before processing
    pub fn with_diagnostic_sink(mut self, sink: DiagnosticSink) -> Self {
        self.reporter = Arc::new(DiagnosticsReporter::new(self.style, sink));
        self.rebuild_observers();
        self
    }

    /// Swap the modifier inserter, e.g. for a host tree that writes differently
    pub fn with_inserter(mut self, inserter: Box<dyn ModifierInserter>) -> Self {
        self.inserter = inserter;
        self
    }

    /// Register an additional observer behind the built-in ones
    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.extras.push(observer);
        self.rebuild_observers();
        self
    }

    /// One load line so hosts can see the engine was active
    pub fn announce(&self) {
        self.reporter.announce();
    }

    /// Run every enabled rule over one unit; returns whether it was processed
    pub fn process_unit(&self, unit: &mut CompilationUnit) -> bool {
        if !self.filter.is_included(unit.package.as_ref()) {
            tracing::debug!(unit = %unit.path.display(), "package excluded, unit skipped");
            return false;
        }
        TreeScanner::new(&self.rules, &self.observers, self.inserter.as_ref()).scan_unit(unit);
        true
    }

    /// Emit the end-of-run summary
    pub fn finish(&self) {
        self.reporter.summary(&self.metrics, &self.rules);
    }

    /// Modifiers inserted so far, across all rules
    pub fn added_total(&self) -> u64 {
        self.rules
            .iter()
            .filter_map(|&rule| self.metrics.snapshot(rule))
            .map(|metrics| metrics.added)
            .sum()
    }

    pub fn rules(&self) -> &[ModifierRule] {
        &self.rules
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn reporter(&self) -> &DiagnosticsReporter {
        &self.reporter
    }
}

/// Convenience function to run the default engine over a batch of units
pub fn tighten_units(units: &mut [CompilationUnit]) -> TightenResult<u64> {
    let engine = TightenEngine::new()?;
    engine.announce();
    for unit in units.iter_mut() {
        engine.process_unit(unit);
    }
    engine.finish();
    Ok(engine.added_total())
}
