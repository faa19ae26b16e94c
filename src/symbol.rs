//! Frame layout and scope bookkeeping.
//!
//! ```text
//!        sp --------------> + ------------------------ +
//!                            | temp in computing expr   |
//!        sp when enter stmt + ------------------------ +
//!                            | local vars (args first)  |
//!        fp --------------> + ------------------------ +
//!                            | fp                       |
//!                            + ------------------------ +
//!                            | ra                       |
//!                            + ------------------------ +
//! ```
//!
//! Unlike the reference implementation, which deep-copies the whole
//! variable map on every block entry, scopes here are an explicit stack
//! of frames holding only the names added in that block; lookup walks
//! inner-to-outer and a popped frame is simply discarded.

use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::types::Type;

/// A declared local or parameter: its type, and its byte offset from
/// `fp` (always negative).
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub offset: i32,
}

/// One lexical block's worth of declarations.
#[derive(Debug, Default)]
struct Frame {
    symbols: HashMap<String, Symbol>,
    /// Bytes of locals declared in this frame alone (not cumulative).
    own_bytes: u32,
}

/// The stack of scope frames active in the function currently being
/// translated. Pushed on function entry and on every block; popped on
/// the matching exit.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    /// Bytes of locals declared so far in the whole function, used to
    /// hand out strictly decreasing offsets across nested scopes.
    total_bytes: u32,
}

impl ScopeStack {
    /// A stack with a single, empty frame (the function's top-level scope).
    #[must_use]
    pub fn new() -> Self {
        ScopeStack { frames: vec![Frame::default()], total_bytes: 0 }
    }

    /// Push a fresh, empty frame (entering a block).
    pub fn enter_scope(&mut self) {
        self.frames.push(Frame::default());
        tracing::trace!(depth = self.frames.len(), "scope push");
    }

    /// Pop the innermost frame and return how many bytes of `sp` must be
    /// released to undo its declarations (its `own_bytes`).
    pub fn exit_scope(&mut self) -> u32 {
        let frame = self.frames.pop().expect("scope stack underflow: no matching enter_scope");
        tracing::trace!(depth = self.frames.len(), freed_bytes = frame.own_bytes, "scope pop");
        self.total_bytes -= frame.own_bytes;
        frame.own_bytes
    }

    /// Declare `name: ty` in the innermost scope, assigning it the next
    /// (strictly more negative) `fp`-relative offset. Rejects
    /// redeclaration of the same name within the same scope.
    pub fn insert(&mut self, name: &str, ty: Type) -> Result<&Symbol> {
        let frame = self.frames.last_mut().expect("scope stack is never empty");
        if frame.symbols.contains_key(name) {
            return Err(Error::Scope(format!("redeclaration of `{name}` in the same scope")));
        }
        let size = ty.size_of();
        self.total_bytes += size;
        frame.own_bytes += size;
        let offset = -i32::try_from(self.total_bytes).expect("frame size overflow");
        let frame = self.frames.last_mut().expect("scope stack is never empty");
        frame.symbols.insert(name.to_string(), Symbol { name: name.to_string(), ty, offset });
        Ok(frame.symbols.get(name).expect("just inserted"))
    }

    /// Look up `name`, searching from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Result<&Symbol> {
        self.frames.iter().rev()
            .find_map(|f| f.symbols.get(name))
            .ok_or_else(|| Error::Scope(format!("`{name}` used before declaration")))
    }

    /// Cumulative bytes of locals declared so far in the whole function
    /// (used by the prologue/epilogue to size and restore the frame).
    #[must_use]
    pub fn total_bytes(&self) -> u32 { self.total_bytes }
}

impl Default for ScopeStack {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_strictly_decrease() {
        let mut s = ScopeStack::new();
        let a = s.insert("a", Type::int()).unwrap().offset;
        let b = s.insert("b", Type::int()).unwrap().offset;
        assert!(b < a);
        assert_eq!(a, -8);
        assert_eq!(b, -16);
    }

    #[test]
    fn redeclaration_in_same_scope_rejected() {
        let mut s = ScopeStack::new();
        s.insert("a", Type::int()).unwrap();
        assert!(s.insert("a", Type::int()).is_err());
    }

    #[test]
    fn shadowing_across_blocks_and_restoration() {
        let mut s = ScopeStack::new();
        s.insert("x", Type::int()).unwrap();
        let outer_offset = s.lookup("x").unwrap().offset;
        s.enter_scope();
        s.insert("x", Type::int()).unwrap();
        assert_ne!(s.lookup("x").unwrap().offset, outer_offset);
        s.exit_scope();
        assert_eq!(s.lookup("x").unwrap().offset, outer_offset);
    }

    #[test]
    fn undeclared_lookup_is_scope_error() {
        let s = ScopeStack::new();
        assert!(matches!(s.lookup("nope"), Err(Error::Scope(_))));
    }

    #[test]
    fn exit_scope_reports_bytes_declared_in_that_frame() {
        let mut s = ScopeStack::new();
        s.insert("a", Type::int()).unwrap();
        s.enter_scope();
        s.insert("b", Type::int()).unwrap();
        s.insert("c", Type::int().to_array(smallvec::smallvec![2])).unwrap();
        let freed = s.exit_scope();
        assert_eq!(freed, 8 + 16);
        assert_eq!(s.total_bytes(), 8);
    }
}
