//! Utility Module
//!
//! This module provides shared infrastructure:
//!
//! - [`interner`]: String interning for efficient symbol storage
//!
//! # String Interning
//!
//! The interner module provides efficient string storage for frequently
//! used identifiers like mixin names, parameter names, and macro names.
//! Interned strings (Symbols) can be compared in O(1) time.
//!
//! ```rust,ignore
//! use weft::utils::interner;
//!
//! let sym1 = interner::intern("MaterialSurface");
//! let sym2 = interner::intern("MaterialSurface");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod interner;

pub use interner::Symbol;
