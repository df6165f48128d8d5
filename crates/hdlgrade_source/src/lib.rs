//! Source text ownership and location tracking for diagnostics.
//!
//! A [`SourceDb`] owns every submission loaded in a session and hands out
//! [`FileId`]s. Tokens, IR nodes and diagnostics refer back to the text
//! through [`Span`]s, which the database resolves to line/column form.

#![warn(missing_docs)]

pub mod source_db;
pub mod span;

pub use source_db::{ResolvedSpan, SourceDb, SourceFile};
pub use span::{FileId, Span};
