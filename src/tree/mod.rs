//! Syntax tree model supplied by the host compiler
//!
//! Architecture: Anti-Corruption Layer - the host's parse result arrives in these types
//! - A deliberately small tree: only the shapes the rules inspect, nothing semantic
//! - Builders keep test fixtures and host bridges readable
//! - The `ModifierInserter` seam is the single place tree mutation happens

use crate::domain::decision::{ModifierKind, TightenResult};
use crate::domain::names::PackageName;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One parsed source file handed over by the host after parsing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Path of the source file, used in every diagnostic position
    pub path: PathBuf,
    /// Package the unit declares, if any (`None` is the default package)
    #[serde(default)]
    pub package: Option<PackageName>,
    /// Imports in declaration order
    #[serde(default)]
    pub imports: Vec<Import>,
    /// Top-level type declarations
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(PackageName::new(package));
        self
    }

    pub fn with_import(mut self, import: Import) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_type(mut self, type_decl: TypeDecl) -> Self {
        self.types.push(type_decl);
        self
    }
}

/// One import statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    /// Dotted path as written, without any trailing `.*`
    pub path: String,
    /// Local alias, for host languages with `import ... as ...`
    #[serde(default)]
    pub alias: Option<String>,
    /// Whether this is a wildcard (on-demand) import
    #[serde(default)]
    pub wildcard: bool,
}

impl Import {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            wildcard: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// On-demand import of everything under `path`
    pub fn wildcard(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            wildcard: true,
        }
    }
}

/// A type declaration: class, interface or enum body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_field(self, field: Declaration) -> Self {
        self.with_member(Member::Field(field))
    }

    pub fn with_method(self, method: MethodDecl) -> Self {
        self.with_member(Member::Method(method))
    }
}

/// One member of a type body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Member {
    Field(Declaration),
    Method(MethodDecl),
    /// Nested type declaration
    Type(TypeDecl),
    /// Enum constant; the constant itself is host-final and never inspected
    EnumConstant(EnumConstant),
    /// Instance or static initializer block
    Initializer(Block),
}

/// An enum constant with an optional class body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    /// Body members, walked like a nested type body
    #[serde(default)]
    pub body: Vec<Member>,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.body.push(member);
        self
    }
}

/// A method or constructor declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    /// The method header itself (name, modifiers, markers, position)
    pub decl: Declaration,
    #[serde(default)]
    pub params: Vec<Declaration>,
    /// Body block; absent for abstract and interface methods
    #[serde(default)]
    pub body: Option<Block>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            decl: Declaration::new(name),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.decl.line = line;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.decl.modifiers.visibility = visibility;
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.decl.markers.push(marker.into());
        self
    }

    pub fn with_param(mut self, param: Declaration) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }
}

/// One variable-like binding or one method header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(default)]
    pub modifiers: ModifierSet,
    /// Raw annotation names as written: simple, aliased or fully qualified
    #[serde(default)]
    pub markers: Vec<String>,
    /// 1-indexed source line
    #[serde(default)]
    pub line: u32,
}

impl Declaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: ModifierSet::default(),
            markers: Vec::new(),
            line: 0,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.modifiers.immutable = true;
        self
    }

    pub fn volatile(mut self) -> Self {
        self.modifiers.volatile = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }
}

/// Modifiers the rules read and write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSet {
    /// The host language's `final` equivalent
    #[serde(default)]
    pub immutable: bool,
    /// Volatile fields must stay mutable for host memory semantics
    #[serde(default)]
    pub volatile: bool,
    #[serde(default)]
    pub visibility: Visibility,
}

/// Written access modifier on a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Nothing written in the source
    Default,
    Public,
    Protected,
    /// Explicit package-private modifier (host languages that have one)
    Package,
    Private,
}

impl Visibility {
    /// Whether the source spells out any access modifier
    pub fn is_explicit(self) -> bool {
        !matches!(self, Self::Default)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Package => "package",
            Self::Private => "private",
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Default
    }
}

/// A statement block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stmt(mut self, stmt: Stmt) -> Self {
        self.stmts.push(stmt);
        self
    }

    pub fn with_local(self, local: Declaration) -> Self {
        self.with_stmt(Stmt::Local(local))
    }
}

/// Statements the walker distinguishes; everything else is invisible to the rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Local variable declaration
    Local(Declaration),
    /// Nested block
    Block(Block),
    /// `for` statement with its own header scope
    For(ForStmt),
}

/// A `for` statement: init declarations live in the loop header scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForStmt {
    #[serde(default)]
    pub init: Vec<Declaration>,
    #[serde(default)]
    pub body: Block,
}

impl ForStmt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_init(mut self, decl: Declaration) -> Self {
        self.init.push(decl);
        self
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = body;
        self
    }
}

/// Host seam for the actual tree mutation
///
/// Called only from the add-modifier branch: rules check for an already
/// present modifier first, so implementations never need to be idempotent.
pub trait ModifierInserter: Send + Sync {
    fn insert_modifier(&self, target: &mut Declaration, kind: ModifierKind) -> TightenResult<()>;
}

/// Inserter for hosts that use this crate's tree types as their IR
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeModifierInserter;

impl ModifierInserter for TreeModifierInserter {
    fn insert_modifier(&self, target: &mut Declaration, kind: ModifierKind) -> TightenResult<()> {
        match kind {
            ModifierKind::Final => target.modifiers.immutable = true,
            ModifierKind::Private => target.modifiers.visibility = Visibility::Private,
            ModifierKind::Public => target.modifiers.visibility = Visibility::Public,
        }
        Ok(())
    }
}
