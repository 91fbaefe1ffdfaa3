//! Resolution context: the stack of abstracts currently being resolved.
//!
//! Every non-cached resolution pushes its abstract and pops it on every
//! exit path. A push of an abstract already on the stack is a cycle.

use crate::key::Identifier;

const INITIAL_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub struct ResolutionContext {
    stack: Vec<Identifier>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(INITIAL_DEPTH),
        }
    }

    /// Pushes `id`. Returns `false` and leaves the stack untouched if `id`
    /// is already being resolved.
    pub fn push(&mut self, id: &Identifier) -> bool {
        if self.contains(id) {
            return false;
        }
        self.stack.push(id.clone());
        true
    }

    pub fn pop(&mut self) -> Option<Identifier> {
        self.stack.pop()
    }

    /// `Identifier` equality compares the precomputed hash before the string.
    pub fn contains(&self, id: &Identifier) -> bool {
        self.stack.iter().any(|entry| entry == id)
    }

    /// The current stack followed by `rejected`, in push order.
    pub fn chain_with(&self, rejected: &Identifier) -> Vec<Identifier> {
        let mut chain = Vec::with_capacity(self.stack.len() + 1);
        chain.extend(self.stack.iter().cloned());
        chain.push(rejected.clone());
        chain
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}
