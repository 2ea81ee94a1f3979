//! Lexical scope stack.
//!
//! A stack of frames mapping names to entries. The analyzer stores symbols
//! in it; the code generator reuses it for frame slots. The base (global)
//! frame is created with the stack and is never popped.

use std::collections::HashMap;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Span,
};

/// Anything that can live in a scope frame.
pub trait ScopeEntry {
    /// Where the entry was declared, for two-position diagnostics.
    fn declared_at(&self) -> &Span;
}

#[derive(Debug)]
pub struct ScopeStack<E> {
    frames: Vec<HashMap<String, E>>,
}

impl<E: ScopeEntry> Default for ScopeStack<E> {
    fn default() -> Self {
        ScopeStack::new()
    }
}

impl<E: ScopeEntry> ScopeStack<E> {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops the innermost frame. The global frame stays.
    pub fn exit_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_global(&self) -> bool {
        self.frames.len() == 1
    }

    /// Adds `name` to the innermost frame.
    ///
    /// Fails with a redeclaration error pointing at both declarations when the
    /// innermost frame already holds the name. Outer frames are not checked,
    /// so shadowing is allowed.
    pub fn declare(&mut self, name: &str, entry: E, at: &Span) -> Result<(), Error> {
        let frame = self.top_mut();

        if let Some(existing) = frame.get(name) {
            return Err(Error::with_first_occurrence(
                ErrorImpl::Declared {
                    identifier: name.to_string(),
                },
                existing.declared_at().clone(),
                at.clone(),
            ));
        }

        frame.insert(name.to_string(), entry);
        Ok(())
    }

    /// Finds the nearest entry for `name`, innermost frame first.
    pub fn resolve(&self, name: &str, at: &Span) -> Result<&E, Error> {
        self.lookup(name).ok_or_else(|| undeclared(name, at))
    }

    pub fn resolve_mut(&mut self, name: &str, at: &Span) -> Result<&mut E, Error> {
        match self.lookup_mut(name) {
            Some(entry) => Ok(entry),
            None => Err(undeclared(name, at)),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&E> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut E> {
        self.frames.iter_mut().rev().find_map(|frame| frame.get_mut(name))
    }

    fn top_mut(&mut self) -> &mut HashMap<String, E> {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }
}

fn undeclared(name: &str, at: &Span) -> Error {
    Error::new(
        ErrorImpl::Undeclared {
            identifier: name.to_string(),
        },
        at.clone(),
    )
}
