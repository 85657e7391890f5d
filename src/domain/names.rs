//! Nominal name value types for packages, types and annotations
//!
//! Architecture: Value Objects - names compare by value, never by reference
//! - QualifiedName, PackageName and SimpleName wrap the same string shape but stay distinct types
//! - A package name can qualify a simple name into a fully qualified one
//! - All three hash like their underlying value and serialize as plain strings

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dotted, fully qualified name such as `tighten.Mutable`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Create a qualified name from its dotted spelling
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Package part: everything before the last dot, if any
    pub fn package_name(&self) -> Option<PackageName> {
        self.0.rsplit_once('.').map(|(package, _)| PackageName::new(package))
    }

    /// Simple part: everything after the last dot, or the whole name
    pub fn simple_name(&self) -> SimpleName {
        match self.0.rsplit_once('.') {
            Some((_, simple)) => SimpleName::new(simple),
            None => SimpleName::new(self.0.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A dotted package name such as `tighten.internal`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Qualify a simple name into this package
    pub fn qualify(&self, simple: &SimpleName) -> QualifiedName {
        QualifiedName::new(format!("{}.{}", self.0, simple.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PackageName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An undotted name such as `Mutable`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimpleName(String);

impl SimpleName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SimpleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SimpleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
