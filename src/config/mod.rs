//! Configuration loading and management for the tighten engine
//!
//! Architecture: Anti-Corruption Layer - configuration translates external YAML and plugin args
//! - Raw YAML structures are converted to validated domain objects
//! - Default configuration is embedded here, not read from the environment
//! - Package patterns compile once at load time so scanning never re-parses them

use crate::domain::decision::{TightenError, TightenResult};
use crate::domain::names::PackageName;
use crate::report::DiagnosticStyle;
use crate::rules::ModifierRule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TightenConfig {
    /// Package gating configuration
    #[serde(default)]
    pub packages: PackageConfig,
    /// Rule identifiers to enable, in summary order
    #[serde(default = "default_rule_ids")]
    pub rules: Vec<String>,
    /// Diagnostic output configuration
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Package gating configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
    /// When non-empty, only packages matching one of these are processed
    #[serde(default)]
    pub include: Vec<String>,
    /// Packages to leave alone; later entries win, `!` prefix re-includes
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Diagnostic output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Wording style for per-declaration diagnostics
    #[serde(default = "default_style")]
    pub style: DiagnosticStyle,
    /// Where diagnostic lines are written
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Configured destination for diagnostic lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkConfig {
    /// Standard error stream
    Stderr,
    /// The logging pipeline
    Log,
}

fn default_rule_ids() -> Vec<String> {
    ModifierRule::ALL
        .iter()
        .map(|rule| rule.rule_id().to_string())
        .collect()
}

fn default_style() -> DiagnosticStyle {
    DiagnosticStyle::Parseable
}

impl Default for TightenConfig {
    fn default() -> Self {
        Self {
            packages: PackageConfig::default(),
            rules: default_rule_ids(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            style: default_style(),
            sink: SinkConfig::default(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Stderr
    }
}

impl TightenConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TightenResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            TightenError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            TightenError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load from a file that may legitimately not exist
    pub fn load_optional<P: AsRef<Path>>(path: P) -> TightenResult<Option<Self>> {
        if !path.as_ref().exists() {
            return Ok(None);
        }
        Self::from_file(path).map(Some)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> TightenResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| TightenError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration purely from host-plugin arguments
    pub fn from_plugin_args(args: &[String]) -> TightenResult<Self> {
        let mut config = Self::default();
        config.apply_plugin_args(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Fold host-plugin arguments over the current configuration
    pub fn apply_plugin_args(&mut self, args: &[String]) -> TightenResult<()> {
        for arg in args {
            if let Some(packages) = arg.strip_prefix("--ignore-packages=") {
                self.packages.exclude.extend(
                    packages
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                );
            } else if let Some(sink) = arg.strip_prefix("--output=") {
                self.diagnostics.sink = match sink {
                    "stderr" => SinkConfig::Stderr,
                    "log" => SinkConfig::Log,
                    other => {
                        return Err(TightenError::config(format!(
                            "Unrecognized output sink '{}' (expected 'stderr' or 'log')",
                            other
                        )))
                    }
                };
            } else if let Some(style) = arg.strip_prefix("--format=") {
                self.diagnostics.style = DiagnosticStyle::from_str(style).ok_or_else(|| {
                    TightenError::config(format!(
                        "Unrecognized diagnostic style '{}' (expected one of: {})",
                        style,
                        DiagnosticStyle::all_styles().join(", ")
                    ))
                })?;
            } else {
                return Err(TightenError::config(format!(
                    "Unrecognized plugin argument '{}'",
                    arg
                )));
            }
        }
        Ok(())
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> TightenResult<()> {
        for (index, id) in self.rules.iter().enumerate() {
            if ModifierRule::from_id(id).is_none() {
                return Err(TightenError::config(format!(
                    "Unknown rule '{}' in rules list",
                    id
                )));
            }
            if self.rules[..index].contains(id) {
                return Err(TightenError::config(format!(
                    "Duplicate rule '{}' in rules list",
                    id
                )));
            }
        }

        // compiling the filter surfaces malformed patterns at load time
        PackageFilter::from_config(&self.packages)?;
        Ok(())
    }

    /// Resolve the configured rule identifiers
    pub fn enabled_rules(&self) -> TightenResult<Vec<ModifierRule>> {
        self.rules
            .iter()
            .map(|id| {
                ModifierRule::from_id(id)
                    .ok_or_else(|| TightenError::config(format!("Unknown rule '{}'", id)))
            })
            .collect()
    }
}

/// One compiled include/exclude entry
#[derive(Debug, Clone)]
struct PackagePattern {
    pattern: glob::Pattern,
    original: String,
    is_reinclude: bool,
}

impl PackagePattern {
    fn compile(raw: &str) -> TightenResult<Self> {
        let (is_reinclude, body) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let pattern = glob::Pattern::new(body).map_err(|e| {
            TightenError::config(format!("Invalid package pattern '{}': {}", raw, e))
        })?;
        Ok(Self {
            pattern,
            original: body.to_string(),
            is_reinclude,
        })
    }

    fn matches(&self, package: &str) -> bool {
        if self.pattern.matches(package) {
            return true;
        }
        // a bare package name also covers its subpackages
        !self.original.contains(['*', '?', '['])
            && package.starts_with(&format!("{}.", self.original))
    }
}

/// Decides which packages the engine touches
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    include: Vec<PackagePattern>,
    exclude: Vec<PackagePattern>,
}

impl PackageFilter {
    pub fn from_config(config: &PackageConfig) -> TightenResult<Self> {
        let include = config
            .include
            .iter()
            .map(|raw| PackagePattern::compile(raw))
            .collect::<TightenResult<Vec<_>>>()?;
        let exclude = config
            .exclude
            .iter()
            .map(|raw| PackagePattern::compile(raw))
            .collect::<TightenResult<Vec<_>>>()?;
        Ok(Self { include, exclude })
    }

    /// `None` is the default package, matched as the empty name
    pub fn is_included(&self, package: Option<&PackageName>) -> bool {
        let name = package.map(|p| p.as_str()).unwrap_or("");

        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(name)) {
            return false;
        }

        let mut included = true;
        for pattern in &self.exclude {
            if pattern.matches(name) {
                included = pattern.is_reinclude;
            }
        }
        included
    }
}
