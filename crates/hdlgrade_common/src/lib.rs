//! Shared foundational types used across the hdlgrade workspace.
//!
//! This crate provides interned identifiers for signal and module names,
//! content hashing for submissions, and the closed [`Value`] type that the
//! evaluator computes with.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod value;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use value::{Radix, Value, ValueError};
