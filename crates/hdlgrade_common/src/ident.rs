//! Interned signal and module names.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An interned name of a module, port, net or other named entity.
///
/// Identifiers are `u32` indices into an [`Interner`]. Equality and copying
/// are O(1); the text is recovered with [`Interner::resolve`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw index.
    ///
    /// Intended for tests. Real identifiers come from [`Interner::get_or_intern`].
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32`, which always fits in `usize` on supported
// platforms, and `try_from_usize` rejects anything that does not fit in `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// Each compiled module owns one interner holding every name that appears
/// in its source, so a finished module can be shared across grading threads.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s`, returning the existing identifier if it was seen before.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up `s` without interning it.
    ///
    /// Returns `None` when the name never appeared, which lets callers tell
    /// an unknown test-vector key apart from a real port without growing the
    /// table.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an [`Ident`] back to its text.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Returns the number of distinct interned names.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_names_resolve() {
        let interner = Interner::new();
        let cin = interner.get_or_intern("cin");
        assert_eq!(interner.resolve(cin), "cin");
    }

    #[test]
    fn interning_is_idempotent() {
        let interner = Interner::new();
        let a = interner.get_or_intern("sum");
        let b = interner.get_or_intern("sum");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn get_does_not_intern() {
        let interner = Interner::new();
        interner.get_or_intern("a");
        assert!(interner.get("a").is_some());
        assert!(interner.get("carry").is_none());
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let interner = Interner::new();
        let lower = interner.get_or_intern("q");
        let upper = interner.get_or_intern("Q");
        assert_ne!(lower, upper);
    }

    #[test]
    fn debug_shows_size_only() {
        let interner = Interner::new();
        interner.get_or_intern("clk");
        assert_eq!(format!("{interner:?}"), "Interner { len: 1 }");
    }

    #[test]
    fn ident_serde_roundtrip() {
        let id = Ident::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: Ident = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
