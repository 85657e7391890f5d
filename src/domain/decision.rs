//! Decisions, scopes and the observer contract for rule outcomes
//!
//! Architecture: Rich Domain Models - decisions are the ubiquitous language of the engine
//! - Every rule outcome is one of four decisions; observers only ever see the first three
//! - Decision events are borrowed views, cheap to fan out to any number of observers
//! - The crate-wide error type lives next to the vocabulary it protects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::rules::ModifierRule;

/// Outcome of one rule applied to one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The modifier was missing and has been inserted
    AddModifier,
    /// The declaration already carries what the rule would insert
    AlreadyPresent,
    /// An explicit opt-out annotation suppressed the rule
    SkippedAnnotated,
    /// The declaration is outside the rule's scope or target kind
    NotApplicable,
}

impl Decision {
    /// Machine token used in parseable diagnostics
    pub fn token(self) -> &'static str {
        match self {
            Self::AddModifier => "MODIFIER_ADDED",
            Self::AlreadyPresent => "MODIFIER_ALREADY_PRESENT",
            Self::SkippedAnnotated => "MODIFIER_NOT_ADDED",
            Self::NotApplicable => "NOT_APPLICABLE",
        }
    }

    /// Convert to string for display and logging
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddModifier => "add_modifier",
            Self::AlreadyPresent => "already_present",
            Self::SkippedAnnotated => "skipped_annotated",
            Self::NotApplicable => "not_applicable",
        }
    }

    /// Whether observers should see this decision at all
    pub fn is_observable(self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The modifier a rule inserts when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKind {
    /// Immutability marker, the host language's `final` equivalent
    Final,
    /// Narrowing access modifier for fields
    Private,
    /// Widening access modifier for methods
    Public,
}

impl ModifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lexical context the walker is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Top level of a compilation unit
    Unit,
    /// Directly inside a type body (class, interface, enum)
    TypeDeclaration,
    /// Inside a method header, hosting its parameters
    Method,
    /// Inside a statement block
    Block,
    /// Inside the init clause of a `for` statement
    ForLoopHeader,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::TypeDeclaration => "type_declaration",
            Self::Method => "method",
            Self::Block => "block",
            Self::ForLoopHeader => "for_loop_header",
        }
    }
}

/// The single logical scope a rule reports metrics under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeClass {
    Field,
    Parameter,
    LocalVariable,
    Method,
}

impl ScopeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Parameter => "parameter",
            Self::LocalVariable => "local_variable",
            Self::Method => "method",
        }
    }
}

/// Borrowed view of one decision, handed to every observer in registration order
#[derive(Debug, Clone, Copy)]
pub struct DecisionEvent<'a> {
    pub rule: ModifierRule,
    pub scope_class: ScopeClass,
    pub decision: Decision,
    /// What the rule inserts when it fires
    pub modifier: ModifierKind,
    /// Name of the inspected declaration
    pub declaration: &'a str,
    /// File the declaration lives in
    pub file: &'a Path,
    /// 1-indexed line of the declaration
    pub line: u32,
}

/// Observer of rule decisions
///
/// Implementations must tolerate concurrent calls: hosts may process
/// compilation units from parallel threads against one engine.
pub trait DecisionObserver: Send + Sync {
    /// Called once per observable decision, in traversal order within a unit
    fn decision(&self, event: &DecisionEvent<'_>);

    /// Called after `decision` when a modifier insertion failed for the event's declaration
    fn insertion_failed(&self, _event: &DecisionEvent<'_>, _message: &str) {}
}

/// One collected diagnostic line, kept for machine-readable reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule that produced the diagnostic
    pub rule_id: String,
    /// File the diagnostic points into
    pub file_path: PathBuf,
    /// Line number (1-indexed)
    pub line_number: u32,
    /// Name of the declaration the diagnostic is about
    pub declaration: String,
    /// Decision that triggered the diagnostic
    pub decision: Decision,
    /// Rendered message, exactly as emitted to the sink
    pub message: String,
    /// When the diagnostic was produced
    pub detected_at: DateTime<Utc>,
}

impl Diagnostic {
    /// Capture an event together with its rendered message
    pub fn new(event: &DecisionEvent<'_>, message: impl Into<String>) -> Self {
        Self {
            rule_id: event.rule.rule_id().to_string(),
            file_path: event.file.to_path_buf(),
            line_number: event.line,
            declaration: event.declaration.to_string(),
            decision: event.decision,
            message: message.into(),
            detected_at: Utc::now(),
        }
    }
}

/// Error types for engine operations
#[derive(Debug, thiserror::Error)]
pub enum TightenError {
    /// Configuration could not be loaded, parsed or validated
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or written
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A serialized compilation unit could not be decoded
    #[error("Malformed compilation unit '{path}': {message}")]
    UnitFormat { path: String, message: String },

    /// The host failed to insert a modifier
    #[error("Could not insert modifier on '{declaration}': {message}")]
    Insertion { declaration: String, message: String },
}

impl TightenError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a unit format error
    pub fn unit_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnitFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an insertion error
    pub fn insertion(declaration: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Insertion {
            declaration: declaration.into(),
            message: message.into(),
        }
    }
}

/// Result type for engine operations
pub type TightenResult<T> = Result<T, TightenError>;
