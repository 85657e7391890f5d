//! The modifier rules and their decision logic
//!
//! Architecture: Closed Rule Set - the five rules are an enum, never a plugin registry
//! - Each rule decides from local lexical context only: scope, modifiers, markers
//! - Decision precedence everywhere: already present, then opted out, then add
//! - Rules never error; anything outside a rule's reach degenerates to not-applicable

use crate::domain::decision::{Decision, ModifierKind, ScopeClass, ScopeKind};
use crate::domain::names::QualifiedName;
use crate::resolver::AnnotationResolver;
use crate::tree::{Declaration, Visibility};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Canonical identity of the immutability opt-out marker
    pub static ref MUTABLE_MARKER: QualifiedName = QualifiedName::new("tighten.Mutable");
    /// Canonical identity of the visibility opt-out marker
    pub static ref PACKAGE_PRIVATE_MARKER: QualifiedName = QualifiedName::new("tighten.PackagePrivate");
}

/// One of the five modifier rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierRule {
    /// Fields declared directly in a type body gain `final`
    FieldImmutability,
    /// Method and constructor parameters gain `final`
    ParameterImmutability,
    /// Locals declared in blocks gain `final`; loop headers are exempt
    LocalVariableImmutability,
    /// Fields without a written access modifier become `private`
    FieldAccess,
    /// Methods without a written access modifier become `public`
    MethodAccess,
}

impl ModifierRule {
    /// Every rule, in summary-table order
    pub const ALL: [ModifierRule; 5] = [
        ModifierRule::FieldImmutability,
        ModifierRule::ParameterImmutability,
        ModifierRule::LocalVariableImmutability,
        ModifierRule::FieldAccess,
        ModifierRule::MethodAccess,
    ];

    /// Stable identifier used in diagnostics, metrics and configuration
    pub fn rule_id(self) -> &'static str {
        match self {
            Self::FieldImmutability => "field_immutability",
            Self::ParameterImmutability => "parameter_immutability",
            Self::LocalVariableImmutability => "local_variable_immutability",
            Self::FieldAccess => "field_access",
            Self::MethodAccess => "method_access",
        }
    }

    /// Look a rule up by its identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|rule| rule.rule_id() == id)
    }

    /// The single logical scope this rule reports metrics under
    pub fn scope_class(self) -> ScopeClass {
        match self {
            Self::FieldImmutability | Self::FieldAccess => ScopeClass::Field,
            Self::ParameterImmutability => ScopeClass::Parameter,
            Self::LocalVariableImmutability => ScopeClass::LocalVariable,
            Self::MethodAccess => ScopeClass::Method,
        }
    }

    /// What this rule inserts when it fires
    pub fn modifier(self) -> ModifierKind {
        match self {
            Self::FieldImmutability | Self::ParameterImmutability | Self::LocalVariableImmutability => {
                ModifierKind::Final
            }
            Self::FieldAccess => ModifierKind::Private,
            Self::MethodAccess => ModifierKind::Public,
        }
    }

    /// Canonical marker that opts a declaration out of this rule
    pub fn marker(self) -> &'static QualifiedName {
        match self {
            Self::FieldImmutability | Self::ParameterImmutability | Self::LocalVariableImmutability => {
                &MUTABLE_MARKER
            }
            Self::FieldAccess | Self::MethodAccess => &PACKAGE_PRIVATE_MARKER,
        }
    }

    /// Human-readable description for rule listings
    pub fn description(self) -> &'static str {
        match self {
            Self::FieldImmutability => {
                "Adds the final modifier to fields declared directly in a type body; \
                 volatile fields are left alone"
            }
            Self::ParameterImmutability => {
                "Adds the final modifier to method and constructor parameters"
            }
            Self::LocalVariableImmutability => {
                "Adds the final modifier to local variables declared in blocks; \
                 for-loop header variables stay mutable"
            }
            Self::FieldAccess => {
                "Narrows fields without a written access modifier to private"
            }
            Self::MethodAccess => {
                "Widens methods without a written access modifier to public"
            }
        }
    }

    /// Decide this rule for a variable-like declaration seen at `scope`
    pub fn decide_variable(
        self,
        decl: &Declaration,
        scope: ScopeKind,
        resolver: &AnnotationResolver,
    ) -> Decision {
        match self {
            Self::FieldImmutability => {
                if scope != ScopeKind::TypeDeclaration || decl.modifiers.volatile {
                    return Decision::NotApplicable;
                }
                self.decide_immutability(decl, resolver)
            }
            Self::ParameterImmutability => {
                if scope != ScopeKind::Method {
                    return Decision::NotApplicable;
                }
                self.decide_immutability(decl, resolver)
            }
            Self::LocalVariableImmutability => {
                // ForLoopHeader intentionally fails this check: loop indexes stay mutable
                if scope != ScopeKind::Block {
                    return Decision::NotApplicable;
                }
                self.decide_immutability(decl, resolver)
            }
            Self::FieldAccess => {
                if scope != ScopeKind::TypeDeclaration {
                    return Decision::NotApplicable;
                }
                if decl.modifiers.visibility == Visibility::Private {
                    return Decision::AlreadyPresent;
                }
                if decl.modifiers.visibility.is_explicit()
                    || resolver.is_marked_as(decl, &PACKAGE_PRIVATE_MARKER)
                {
                    return Decision::SkippedAnnotated;
                }
                Decision::AddModifier
            }
            // Methods only; see decide_method
            Self::MethodAccess => Decision::NotApplicable,
        }
    }

    /// Decide this rule for a method header seen at `scope`
    pub fn decide_method(
        self,
        method: &Declaration,
        scope: ScopeKind,
        resolver: &AnnotationResolver,
    ) -> Decision {
        match self {
            Self::MethodAccess => {
                if scope != ScopeKind::TypeDeclaration {
                    return Decision::NotApplicable;
                }
                // Any written visibility is an explicit access decision
                if method.modifiers.visibility.is_explicit() {
                    return Decision::AlreadyPresent;
                }
                if resolver.is_marked_as(method, &PACKAGE_PRIVATE_MARKER) {
                    return Decision::SkippedAnnotated;
                }
                Decision::AddModifier
            }
            _ => Decision::NotApplicable,
        }
    }

    fn decide_immutability(self, decl: &Declaration, resolver: &AnnotationResolver) -> Decision {
        if decl.modifiers.immutable {
            return Decision::AlreadyPresent;
        }
        if resolver.is_marked_as(decl, &MUTABLE_MARKER) {
            return Decision::SkippedAnnotated;
        }
        Decision::AddModifier
    }
}
