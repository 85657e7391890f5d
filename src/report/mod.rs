//! Diagnostics reporting with parseable and human output styles
//!
//! Architecture: Anti-Corruption Layer - the reporter translates decision events to external text
//! - Decision events (domain) are rendered into sink lines and collected diagnostics
//! - Each style encapsulates the wording rules for its audience
//! - The sink abstracts where lines land so the engine never writes directly

use crate::domain::decision::{Decision, DecisionEvent, DecisionObserver, Diagnostic};
use crate::metrics::{MetricsCollector, RuleMetrics};
use crate::rules::ModifierRule;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};

/// Supported wording styles for per-declaration diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStyle {
    /// One machine-splittable line per diagnostic
    Parseable,
    /// Compiler-style warnings for people reading build logs
    Human,
}

impl DiagnosticStyle {
    /// Parse style from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "parseable" => Some(Self::Parseable),
            "human" => Some(Self::Human),
            _ => None,
        }
    }

    /// Get all available style names
    pub fn all_styles() -> &'static [&'static str] {
        &["parseable", "human"]
    }
}

/// Where rendered diagnostic lines go
#[derive(Debug, Clone)]
pub enum DiagnosticSink {
    /// Straight to the standard error stream
    Stderr,
    /// Through the logging pipeline
    Tracing,
    /// Into a shared buffer, one line per entry
    Buffer(Arc<Mutex<Vec<String>>>),
}

impl DiagnosticSink {
    /// A buffer sink together with its backing store
    pub fn buffer() -> (Self, Arc<Mutex<Vec<String>>>) {
        let store = Arc::new(Mutex::new(Vec::new()));
        (Self::Buffer(store.clone()), store)
    }

    fn warn(&self, line: &str) {
        match self {
            Self::Stderr => eprintln!("{line}"),
            Self::Tracing => tracing::warn!("{line}"),
            Self::Buffer(store) => {
                if let Ok(mut lines) = store.lock() {
                    lines.push(line.to_string());
                }
            }
        }
    }

    fn info(&self, line: &str) {
        match self {
            Self::Stderr => eprintln!("{line}"),
            Self::Tracing => tracing::info!("{line}"),
            Self::Buffer(store) => {
                if let Ok(mut lines) = store.lock() {
                    lines.push(line.to_string());
                }
            }
        }
    }
}

/// Renders decision events into diagnostic lines and keeps a copy of each one
pub struct DiagnosticsReporter {
    style: DiagnosticStyle,
    sink: DiagnosticSink,
    collected: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticsReporter {
    pub fn new(style: DiagnosticStyle, sink: DiagnosticSink) -> Self {
        Self {
            style,
            sink,
            collected: Mutex::new(Vec::new()),
        }
    }

    pub fn style(&self) -> DiagnosticStyle {
        self.style
    }

    /// One load line so build logs show the plugin was active
    pub fn announce(&self) {
        self.sink.info("tighten plugin loaded");
    }

    /// Emit the end-of-run summary table
    pub fn summary(&self, metrics: &MetricsCollector, rules: &[ModifierRule]) {
        self.sink.info("summary:");
        for line in render_summary_table(&metrics.snapshot_all(rules)) {
            self.sink.info(&line);
        }
    }

    /// Every diagnostic emitted so far, in emission order
    pub fn collected(&self) -> Vec<Diagnostic> {
        self.collected.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn emit(&self, event: &DecisionEvent<'_>, message: String) {
        self.sink.warn(&message);
        if let Ok(mut collected) = self.collected.lock() {
            collected.push(Diagnostic::new(event, message));
        }
    }

    fn render_already_present(&self, event: &DecisionEvent<'_>) -> String {
        match self.style {
            DiagnosticStyle::Parseable => format!(
                "{} {}:{} {}",
                event.rule.rule_id(),
                event.file.display(),
                event.line,
                event.decision.token()
            ),
            DiagnosticStyle::Human => match event.rule {
                ModifierRule::FieldAccess => format!(
                    "warning: {}:{} field {} already has private access",
                    event.file.display(),
                    event.line,
                    event.declaration
                ),
                ModifierRule::MethodAccess => format!(
                    "warning: {}:{} method {} already has explicit visibility",
                    event.file.display(),
                    event.line,
                    event.declaration
                ),
                _ => format!(
                    "warning: {}:{} variable {} has unnecessary final modifier",
                    event.file.display(),
                    event.line,
                    event.declaration
                ),
            },
        }
    }
}

impl DecisionObserver for DiagnosticsReporter {
    fn decision(&self, event: &DecisionEvent<'_>) {
        // additions and annotated skips are silent; redundancy is the finding
        if event.decision != Decision::AlreadyPresent {
            return;
        }
        let message = self.render_already_present(event);
        self.emit(event, message);
    }

    fn insertion_failed(&self, event: &DecisionEvent<'_>, message: &str) {
        let line = format!(
            "warning: {}:{} could not insert {} modifier on {}: {}",
            event.file.display(),
            event.line,
            event.modifier,
            event.declaration,
            message
        );
        self.emit(event, line);
    }
}

/// Fixed-width summary table; rules that inspected nothing get dash cells
pub fn render_summary_table(rows: &[(ModifierRule, Option<RuleMetrics>)]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!(
        "| {:<27} | {:<11} | {:<7} | {:<7} | {:<7} |",
        "rule", "inspected", "added", "present", "skipped"
    ));
    lines.push(format!(
        "|{}|{}|{}|{}|{}|",
        "-".repeat(29),
        "-".repeat(13),
        "-".repeat(9),
        "-".repeat(9),
        "-".repeat(9)
    ));
    for (rule, metrics) in rows {
        match metrics {
            Some(metrics) => lines.push(format!(
                "| {:<27} | {:>11} | {:>6}% | {:>6}% | {:>6}% |",
                rule.rule_id(),
                metrics.inspected,
                metrics.added_share(),
                metrics.already_present_share(),
                metrics.skipped_share()
            )),
            None => lines.push(format!(
                "| {:<27} | {:>11} | {:>7} | {:>7} | {:>7} |",
                rule.rule_id(),
                0,
                "-",
                "-",
                "-"
            )),
        }
    }
    lines
}

/// Per-rule counters as JSON rows for programmatic consumers
pub fn metrics_json(metrics: &MetricsCollector, rules: &[ModifierRule]) -> JsonValue {
    let rows: Vec<JsonValue> = metrics
        .snapshot_all(rules)
        .into_iter()
        .map(|(rule, metrics)| match metrics {
            Some(metrics) => serde_json::json!({
                "rule": rule.rule_id(),
                "inspected": metrics.inspected,
                "added": metrics.added,
                "already_present": metrics.already_present,
                "skipped": metrics.skipped,
                "added_pct": metrics.added_share().to_string(),
                "already_present_pct": metrics.already_present_share().to_string(),
                "skipped_pct": metrics.skipped_share().to_string(),
            }),
            None => serde_json::json!({
                "rule": rule.rule_id(),
                "inspected": 0,
            }),
        })
        .collect();
    JsonValue::Array(rows)
}
