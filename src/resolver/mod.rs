//! Import-aware canonicalization of annotation names
//!
//! Architecture: Service Layer - one resolver per compilation unit, built from its imports
//! - Maps whatever the source wrote (simple, aliased, fully qualified) to canonical identity
//! - Wildcard imports contribute nothing; an unresolvable name is a negative match, never an error
//! - Lookup is total: unmapped raw names fall back to themselves

use crate::domain::names::QualifiedName;
use crate::tree::{Declaration, Import};
use std::collections::HashMap;

/// Resolves raw annotation names against one unit's import list
#[derive(Debug, Clone, Default)]
pub struct AnnotationResolver {
    /// Local spelling (simple name or alias) to canonical identity
    aliases: HashMap<String, QualifiedName>,
}

impl AnnotationResolver {
    /// Build a resolver by scanning the import list once
    pub fn from_imports(imports: &[Import]) -> Self {
        let mut aliases = HashMap::new();

        for import in imports {
            if import.wildcard {
                continue;
            }

            let canonical = QualifiedName::new(import.path.as_str());
            let local = match &import.alias {
                Some(alias) => alias.clone(),
                None => canonical.simple_name().as_str().to_string(),
            };
            aliases.insert(local, canonical);
        }

        Self { aliases }
    }

    /// Canonical identity for a raw name as written in the source
    ///
    /// A raw name that matches no import is already canonical from the
    /// unit's point of view: either fully qualified or same-package.
    pub fn resolve(&self, raw: &str) -> QualifiedName {
        match self.aliases.get(raw) {
            Some(canonical) => canonical.clone(),
            None => QualifiedName::new(raw),
        }
    }

    /// Whether any marker on the declaration canonicalizes to `canonical`
    pub fn is_marked_as(&self, decl: &Declaration, canonical: &QualifiedName) -> bool {
        decl.markers.iter().any(|raw| &self.resolve(raw) == canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mutable() -> QualifiedName {
        QualifiedName::new("tighten.Mutable")
    }

    #[rstest]
    #[case::simple_import(vec![Import::new("tighten.Mutable")], "Mutable", true)]
    #[case::aliased_import(vec![Import::new("tighten.Mutable").with_alias("Mut")], "Mut", true)]
    #[case::fully_qualified_no_imports(vec![], "tighten.Mutable", true)]
    #[case::alias_shadows_simple_name(
        vec![Import::new("tighten.Mutable").with_alias("Mut")],
        "Mutable",
        false
    )]
    #[case::wildcard_contributes_nothing(vec![Import::wildcard("tighten")], "Mutable", false)]
    #[case::unrelated_import_wins_the_simple_name(
        vec![Import::new("other.Mutable")],
        "Mutable",
        false
    )]
    fn test_marker_resolution(
        #[case] imports: Vec<Import>,
        #[case] raw_marker: &str,
        #[case] expected: bool,
    ) {
        let resolver = AnnotationResolver::from_imports(&imports);
        let decl = Declaration::new("field1").with_marker(raw_marker);

        assert_eq!(resolver.is_marked_as(&decl, &mutable()), expected);
    }

    #[test]
    fn test_resolve_falls_back_to_raw_name() {
        let resolver = AnnotationResolver::from_imports(&[]);

        assert_eq!(resolver.resolve("Mutable"), QualifiedName::new("Mutable"));
        assert_eq!(
            resolver.resolve("tighten.Mutable"),
            QualifiedName::new("tighten.Mutable")
        );
    }

    #[test]
    fn test_any_marker_matches() {
        let resolver = AnnotationResolver::from_imports(&[Import::new("tighten.Mutable")]);
        let decl = Declaration::new("field1")
            .with_marker("Deprecated")
            .with_marker("Mutable");

        assert!(resolver.is_marked_as(&decl, &mutable()));
    }

    #[test]
    fn test_unmarked_declaration_never_matches() {
        let resolver = AnnotationResolver::from_imports(&[Import::new("tighten.Mutable")]);
        let decl = Declaration::new("field1");

        assert!(!resolver.is_marked_as(&decl, &mutable()));
    }
}
