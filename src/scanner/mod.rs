//! Single shared traversal dispatching declarations to every enabled rule
//!
//! Architecture: Service Layer - one walk per unit, rules composed over it
//! - The walker threads the scope stack and owns no decision logic
//! - Add-modifier decisions route through the inserter seam before observers hear about them
//! - An insertion failure costs one declaration, never the unit or the run

pub mod scope;

use crate::domain::decision::{Decision, DecisionEvent, DecisionObserver, ScopeKind};
use crate::resolver::AnnotationResolver;
use crate::rules::ModifierRule;
use crate::scanner::scope::ScopeStack;
use crate::tree::{
    Block, CompilationUnit, Declaration, EnumConstant, ForStmt, Member, MethodDecl,
    ModifierInserter, Stmt, TypeDecl,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Walks one compilation unit and feeds every declaration to the rule set
pub struct TreeScanner<'a> {
    rules: &'a [ModifierRule],
    observers: &'a [Arc<dyn DecisionObserver>],
    inserter: &'a dyn ModifierInserter,
}

impl<'a> TreeScanner<'a> {
    pub fn new(
        rules: &'a [ModifierRule],
        observers: &'a [Arc<dyn DecisionObserver>],
        inserter: &'a dyn ModifierInserter,
    ) -> Self {
        Self {
            rules,
            observers,
            inserter,
        }
    }

    /// Run every rule over one unit; modifier insertions mutate the tree in place
    pub fn scan_unit(&self, unit: &mut CompilationUnit) {
        let mut pass = UnitPass {
            rules: self.rules,
            observers: self.observers,
            inserter: self.inserter,
            resolver: AnnotationResolver::from_imports(&unit.imports),
            file: unit.path.clone(),
            scopes: ScopeStack::new(),
        };

        let types = &mut unit.types;
        pass.scoped(ScopeKind::Unit, |pass| {
            for type_decl in types.iter_mut() {
                pass.visit_type(type_decl);
            }
        });
    }
}

/// Traversal state for one unit
struct UnitPass<'a> {
    rules: &'a [ModifierRule],
    observers: &'a [Arc<dyn DecisionObserver>],
    inserter: &'a dyn ModifierInserter,
    resolver: AnnotationResolver,
    file: PathBuf,
    scopes: ScopeStack,
}

impl UnitPass<'_> {
    /// Run `visit` inside `kind`; the scope is left on every exit path
    fn scoped(&mut self, kind: ScopeKind, visit: impl FnOnce(&mut Self)) {
        self.scopes.enter(kind);
        visit(self);
        self.scopes.leave();
    }

    fn visit_type(&mut self, type_decl: &mut TypeDecl) {
        let members = &mut type_decl.members;
        self.scoped(ScopeKind::TypeDeclaration, |pass| {
            for member in members.iter_mut() {
                pass.visit_member(member);
            }
        });
    }

    fn visit_member(&mut self, member: &mut Member) {
        match member {
            Member::Field(field) => self.inspect_variable(field),
            Member::Method(method) => self.visit_method(method),
            Member::Type(nested) => self.visit_type(nested),
            Member::EnumConstant(constant) => self.visit_enum_constant(constant),
            Member::Initializer(block) => self.visit_block(block),
        }
    }

    fn visit_method(&mut self, method: &mut MethodDecl) {
        // the header is a member of the surrounding type body
        self.inspect_method(&mut method.decl);

        let params = &mut method.params;
        let body = &mut method.body;
        self.scoped(ScopeKind::Method, |pass| {
            for param in params.iter_mut() {
                pass.inspect_variable(param);
            }
            if let Some(body) = body {
                pass.visit_block(body);
            }
        });
    }

    fn visit_enum_constant(&mut self, constant: &mut EnumConstant) {
        // the constant itself is host-final; only its body is walked
        let members = &mut constant.body;
        self.scoped(ScopeKind::TypeDeclaration, |pass| {
            for member in members.iter_mut() {
                pass.visit_member(member);
            }
        });
    }

    fn visit_block(&mut self, block: &mut Block) {
        let stmts = &mut block.stmts;
        self.scoped(ScopeKind::Block, |pass| {
            for stmt in stmts.iter_mut() {
                pass.visit_stmt(stmt);
            }
        });
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Local(local) => self.inspect_variable(local),
            Stmt::Block(block) => self.visit_block(block),
            Stmt::For(for_stmt) => self.visit_for(for_stmt),
        }
    }

    fn visit_for(&mut self, for_stmt: &mut ForStmt) {
        let init = &mut for_stmt.init;
        let body = &mut for_stmt.body;
        self.scoped(ScopeKind::ForLoopHeader, |pass| {
            for decl in init.iter_mut() {
                pass.inspect_variable(decl);
            }
            pass.visit_block(body);
        });
    }

    fn inspect_variable(&mut self, decl: &mut Declaration) {
        let scope = self.scopes.current();
        for &rule in self.rules {
            let decision = rule.decide_variable(decl, scope, &self.resolver);
            self.apply(rule, decision, decl);
        }
    }

    fn inspect_method(&mut self, decl: &mut Declaration) {
        let scope = self.scopes.current();
        for &rule in self.rules {
            let decision = rule.decide_method(decl, scope, &self.resolver);
            self.apply(rule, decision, decl);
        }
    }

    fn apply(&mut self, rule: ModifierRule, decision: Decision, decl: &mut Declaration) {
        if !decision.is_observable() {
            return;
        }

        tracing::debug!(
            rule = rule.rule_id(),
            declaration = %decl.name,
            decision = decision.as_str(),
            "rule decision"
        );

        let mut failure = None;
        if decision == Decision::AddModifier {
            if let Err(error) = self.inserter.insert_modifier(decl, rule.modifier()) {
                tracing::warn!(
                    rule = rule.rule_id(),
                    declaration = %decl.name,
                    error = %error,
                    "modifier insertion failed"
                );
                failure = Some(error.to_string());
            }
        }

        let event = DecisionEvent {
            rule,
            scope_class: rule.scope_class(),
            decision,
            modifier: rule.modifier(),
            declaration: &decl.name,
            file: &self.file,
            line: decl.line,
        };

        for observer in self.observers {
            observer.decision(&event);
        }
        if let Some(message) = failure {
            for observer in self.observers {
                observer.insertion_failed(&event, &message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::{ModifierKind, TightenError, TightenResult};
    use crate::tree::{Import, TreeModifierInserter, Visibility};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Mutex<Vec<(ModifierRule, Decision, String)>>,
        failures: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<(ModifierRule, Decision, String)> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }

        fn of_rule(&self, rule: ModifierRule) -> Vec<(Decision, String)> {
            self.events()
                .into_iter()
                .filter(|(r, _, _)| *r == rule)
                .map(|(_, d, n)| (d, n))
                .collect()
        }

        fn failures(&self) -> Vec<String> {
            self.failures.lock().map(|f| f.clone()).unwrap_or_default()
        }
    }

    impl DecisionObserver for Recorder {
        fn decision(&self, event: &DecisionEvent<'_>) {
            if let Ok(mut events) = self.events.lock() {
                events.push((event.rule, event.decision, event.declaration.to_string()));
            }
        }

        fn insertion_failed(&self, event: &DecisionEvent<'_>, _message: &str) {
            if let Ok(mut failures) = self.failures.lock() {
                failures.push(event.declaration.to_string());
            }
        }
    }

    struct FrozenTreeInserter;

    impl ModifierInserter for FrozenTreeInserter {
        fn insert_modifier(
            &self,
            target: &mut Declaration,
            _kind: ModifierKind,
        ) -> TightenResult<()> {
            Err(TightenError::insertion(target.name.clone(), "tree is frozen"))
        }
    }

    fn scan_with_recorder(unit: &mut CompilationUnit) -> Arc<Recorder> {
        let recorder = Arc::new(Recorder::default());
        let observers: Vec<Arc<dyn DecisionObserver>> = vec![recorder.clone()];
        let inserter = TreeModifierInserter;
        TreeScanner::new(&ModifierRule::ALL, &observers, &inserter).scan_unit(unit);
        recorder
    }

    fn sample_unit() -> CompilationUnit {
        CompilationUnit::new("src/Sample.java").with_type(
            TypeDecl::new("Sample")
                .with_field(Declaration::new("field1").at_line(3))
                .with_method(
                    MethodDecl::new("run")
                        .at_line(5)
                        .with_param(Declaration::new("input").at_line(5))
                        .with_body(Block::new().with_local(Declaration::new("local").at_line(6))),
                ),
        )
    }

    #[test]
    fn test_plain_unit_gains_all_modifiers() {
        let mut unit = sample_unit();
        let recorder = scan_with_recorder(&mut unit);

        let field = match &unit.types[0].members[0] {
            Member::Field(f) => f,
            other => panic!("expected field, got {other:?}"),
        };
        assert!(field.modifiers.immutable);
        assert_eq!(field.modifiers.visibility, Visibility::Private);

        let method = match &unit.types[0].members[1] {
            Member::Method(m) => m,
            other => panic!("expected method, got {other:?}"),
        };
        assert_eq!(method.decl.modifiers.visibility, Visibility::Public);
        assert!(method.params[0].modifiers.immutable);
        let local = match &method.body.as_ref().unwrap().stmts[0] {
            Stmt::Local(l) => l,
            other => panic!("expected local, got {other:?}"),
        };
        assert!(local.modifiers.immutable);

        for rule in ModifierRule::ALL {
            let events = recorder.of_rule(rule);
            assert_eq!(events.len(), 1, "{} should fire exactly once", rule.rule_id());
            assert_eq!(events[0].0, Decision::AddModifier);
        }
    }

    #[test]
    fn test_declarations_only_reach_their_hosting_rules() {
        let mut unit = sample_unit();
        let recorder = scan_with_recorder(&mut unit);

        assert_eq!(
            recorder.of_rule(ModifierRule::FieldImmutability),
            vec![(Decision::AddModifier, "field1".to_string())]
        );
        assert_eq!(
            recorder.of_rule(ModifierRule::ParameterImmutability),
            vec![(Decision::AddModifier, "input".to_string())]
        );
        assert_eq!(
            recorder.of_rule(ModifierRule::LocalVariableImmutability),
            vec![(Decision::AddModifier, "local".to_string())]
        );
        assert_eq!(
            recorder.of_rule(ModifierRule::MethodAccess),
            vec![(Decision::AddModifier, "run".to_string())]
        );
    }

    #[test]
    fn test_loop_header_locals_escape_at_any_nesting() {
        let inner_for = ForStmt::new()
            .with_init(Declaration::new("j").at_line(9))
            .with_body(Block::new().with_local(Declaration::new("inside").at_line(10)));
        let outer_for = ForStmt::new()
            .with_init(Declaration::new("i").at_line(8))
            .with_body(Block::new().with_stmt(Stmt::For(inner_for)));

        let mut unit = CompilationUnit::new("src/Loops.java").with_type(
            TypeDecl::new("Loops").with_method(
                MethodDecl::new("run")
                    .with_body(Block::new().with_stmt(Stmt::For(outer_for))),
            ),
        );

        let recorder = scan_with_recorder(&mut unit);
        let locals = recorder.of_rule(ModifierRule::LocalVariableImmutability);

        // only the body local is inspected; both loop indexes are exempt
        assert_eq!(locals, vec![(Decision::AddModifier, "inside".to_string())]);
    }

    #[test]
    fn test_enum_constant_body_walked_as_type_body() {
        let constant = EnumConstant::new("INSTANCE")
            .with_member(Member::Field(Declaration::new("state").at_line(4)));
        let mut unit = CompilationUnit::new("src/Singleton.java")
            .with_type(TypeDecl::new("Singleton").with_member(Member::EnumConstant(constant)));

        let recorder = scan_with_recorder(&mut unit);

        // the constant itself produces no events; its body field does
        assert_eq!(
            recorder.of_rule(ModifierRule::FieldImmutability),
            vec![(Decision::AddModifier, "state".to_string())]
        );
        assert!(recorder
            .events()
            .iter()
            .all(|(_, _, name)| name != "INSTANCE"));
    }

    #[test]
    fn test_marker_skips_one_rule_without_blocking_others() {
        let mut unit = CompilationUnit::new("src/Sample.java")
            .with_import(Import::new("tighten.Mutable"))
            .with_type(
                TypeDecl::new("Sample")
                    .with_field(Declaration::new("cache").at_line(4).with_marker("Mutable")),
            );

        let recorder = scan_with_recorder(&mut unit);

        assert_eq!(
            recorder.of_rule(ModifierRule::FieldImmutability),
            vec![(Decision::SkippedAnnotated, "cache".to_string())]
        );
        assert_eq!(
            recorder.of_rule(ModifierRule::FieldAccess),
            vec![(Decision::AddModifier, "cache".to_string())]
        );

        let field = match &unit.types[0].members[0] {
            Member::Field(f) => f,
            other => panic!("expected field, got {other:?}"),
        };
        assert!(!field.modifiers.immutable);
        assert_eq!(field.modifiers.visibility, Visibility::Private);
    }

    #[test]
    fn test_volatile_field_produces_no_immutability_event() {
        let mut unit = CompilationUnit::new("src/Sample.java").with_type(
            TypeDecl::new("Sample").with_field(Declaration::new("flag").volatile().at_line(2)),
        );

        let recorder = scan_with_recorder(&mut unit);

        assert!(recorder.of_rule(ModifierRule::FieldImmutability).is_empty());
        // visibility narrowing still applies
        assert_eq!(
            recorder.of_rule(ModifierRule::FieldAccess),
            vec![(Decision::AddModifier, "flag".to_string())]
        );
    }

    #[test]
    fn test_second_pass_reports_everything_already_present() {
        let mut unit = sample_unit();
        scan_with_recorder(&mut unit);

        let recorder = scan_with_recorder(&mut unit);
        let events = recorder.events();

        assert!(!events.is_empty());
        assert!(events.iter().all(|(_, decision, _)| *decision == Decision::AlreadyPresent));
    }

    #[test]
    fn test_insertion_failure_skips_nothing_else() {
        let mut unit = CompilationUnit::new("src/Sample.java").with_type(
            TypeDecl::new("Sample")
                .with_field(Declaration::new("first").at_line(2))
                .with_field(Declaration::new("second").at_line(3)),
        );

        let recorder = Arc::new(Recorder::default());
        let observers: Vec<Arc<dyn DecisionObserver>> = vec![recorder.clone()];
        let inserter = FrozenTreeInserter;
        TreeScanner::new(&ModifierRule::ALL, &observers, &inserter).scan_unit(&mut unit);

        // decisions stay add-modifier and both fields are still visited
        assert_eq!(
            recorder.of_rule(ModifierRule::FieldImmutability),
            vec![
                (Decision::AddModifier, "first".to_string()),
                (Decision::AddModifier, "second".to_string()),
            ]
        );
        // one failure per attempted insertion: two rules fire per field
        assert_eq!(recorder.failures().len(), 4);

        let field = match &unit.types[0].members[0] {
            Member::Field(f) => f,
            other => panic!("expected field, got {other:?}"),
        };
        assert!(!field.modifiers.immutable);
    }

    #[test]
    fn test_nested_type_fields_seen_at_type_scope() {
        let nested = TypeDecl::new("Inner").with_field(Declaration::new("innerField").at_line(8));
        let mut unit = CompilationUnit::new("src/Outer.java")
            .with_type(TypeDecl::new("Outer").with_member(Member::Type(nested)));

        let recorder = scan_with_recorder(&mut unit);

        assert_eq!(
            recorder.of_rule(ModifierRule::FieldImmutability),
            vec![(Decision::AddModifier, "innerField".to_string())]
        );
    }
}
