//! Global String Interner
//!
//! Converts identifier strings (mixin names, parameter names, macro names)
//! into compact integer Symbols for O(1) comparison and hashing. Symbol
//! identity is what makes two `ParameterKey`s with the same name denote the
//! same semantic slot for the whole process lifetime.

use lasso::{Spur, ThreadedRodeo};
use std::sync::LazyLock;

/// Global interner instance.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer identifier for an interned string.
pub type Symbol = Spur;

/// Interns a string and returns its Symbol.
///
/// Returns the existing Symbol if the string is already in the pool,
/// otherwise adds it and returns a fresh one.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the Symbol of an already interned string.
///
/// Returns `None` if the string has never been interned. Never allocates.
#[inline]
#[must_use]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a Symbol back to its string.
///
/// # Panics
/// Panics if the Symbol did not come from this interner (cannot happen for
/// Symbols produced by [`intern`]).
#[inline]
#[must_use]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns names that appear on nearly every compilation.
///
/// Called once during registry bootstrap so hot composition paths do not
/// pay the interning write path for well-known keys.
pub fn preload_well_known() {
    let common = [
        // Compiler-injected keys
        "Effect.GraphicsPlatform",
        "Effect.GraphicsProfile",
        "Effect.CompileDebug",
        // Frequent macro values
        "1",
        "0",
        "true",
        "false",
    ];

    for name in common {
        intern(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("surface");
        let s2 = intern("surface");
        let s3 = intern("lighting");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "surface");
        assert_eq!(resolve(s3), "lighting");
    }

    #[test]
    fn test_get() {
        let _ = intern("existing");

        assert!(get("existing").is_some());
        assert!(get("never_interned_name").is_none());
    }
}
