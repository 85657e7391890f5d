//! Scope tracking for the tree walk

use crate::domain::decision::ScopeKind;

/// Stack of lexical scopes mirroring the walker's descent
///
/// Pairing of `enter` and `leave` is guaranteed by the walker's scoped
/// closures, which pop on every exit from a subtree visit.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeKind>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn enter(&mut self, kind: ScopeKind) {
        self.frames.push(kind);
    }

    pub fn leave(&mut self) {
        debug_assert!(!self.frames.is_empty(), "leave without a matching enter");
        self.frames.pop();
    }

    /// Innermost scope on the traversal path
    ///
    /// The unit scope is entered before anything is visited, so reading an
    /// empty stack is a walker bug; release builds degrade to Unit.
    pub fn current(&self) -> ScopeKind {
        debug_assert!(!self.frames.is_empty(), "scope read before the unit scope was entered");
        self.frames.last().copied().unwrap_or(ScopeKind::Unit)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
