//! Statements, assignment targets and sensitivity lists.

use crate::expr::Expr;
use hdlgrade_common::Ident;
use hdlgrade_source::Span;
use serde::{Deserialize, Serialize};

/// The left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// A whole signal.
    Signal {
        /// The written signal.
        name: Ident,
        /// Source location.
        span: Span,
    },
    /// One bit, as an offset from bit 0.
    Bit {
        /// The written signal.
        name: Ident,
        /// Offset of the bit.
        offset: u32,
        /// Source location.
        span: Span,
    },
    /// A constant range of bits.
    Slice {
        /// The written signal.
        name: Ident,
        /// Offset of the lowest bit.
        offset: u32,
        /// Number of bits.
        width: u32,
        /// Source location.
        span: Span,
    },
    /// `{hi, ..., lo}`; the value is split LSB-first starting from the last
    /// part.
    Concat {
        /// The parts, MSB first.
        parts: Vec<Target>,
        /// Source location.
        span: Span,
    },
}

impl Target {
    /// Returns the source span.
    pub fn span(&self) -> Span {
        match self {
            Target::Signal { span, .. }
            | Target::Bit { span, .. }
            | Target::Slice { span, .. }
            | Target::Concat { span, .. } => *span,
        }
    }

    /// Calls `f` for every written signal, MSB part first.
    pub fn for_each_name(&self, f: &mut impl FnMut(Ident, Span)) {
        match self {
            Target::Signal { name, span }
            | Target::Bit { name, span, .. }
            | Target::Slice { name, span, .. } => f(*name, *span),
            Target::Concat { parts, .. } => {
                for part in parts {
                    part.for_each_name(f);
                }
            }
        }
    }
}

/// How an assignment was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignKind {
    /// `assign x = ...;` or a net declaration assignment.
    Continuous,
    /// `x = ...;` inside a behavioral block.
    Blocking,
    /// `x <= ...;` inside a behavioral block. Evaluated like blocking.
    NonBlocking,
}

/// One assignment of an expression to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// What is written.
    pub target: Target,
    /// The value written.
    pub value: Expr,
    /// Continuous, blocking or nonblocking.
    pub kind: AssignKind,
    /// The whole assignment.
    pub span: Span,
}

/// The edge qualifier of a sensitivity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Any change.
    Any,
    /// `posedge`.
    Posedge,
    /// `negedge`.
    Negedge,
}

/// One entry of an explicit sensitivity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityItem {
    /// The edge qualifier.
    pub edge: Edge,
    /// The watched signal.
    pub signal: Ident,
    /// Source location.
    pub span: Span,
}

/// The trigger of a behavioral block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sensitivity {
    /// `@*` or `@(*)`.
    All,
    /// `@(a or b)`, `@(posedge clk)`.
    List(Vec<SensitivityItem>),
}

impl Sensitivity {
    /// Returns `true` if any entry is `posedge` or `negedge`.
    pub fn is_edge_triggered(&self) -> bool {
        match self {
            Sensitivity::All => false,
            Sensitivity::List(items) => items.iter().any(|i| i.edge != Edge::Any),
        }
    }

    /// Returns `true` if `signal` is covered by this list.
    pub fn contains(&self, signal: Ident) -> bool {
        match self {
            Sensitivity::All => true,
            Sensitivity::List(items) => items.iter().any(|i| i.signal == signal),
        }
    }
}

/// A module-level statement, executed in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// A continuous assignment.
    ContinuousAssign(Assignment),
    /// An `always` block: a trigger and a flat, ordered body.
    Behavioral {
        /// The trigger.
        sensitivity: Sensitivity,
        /// The assignments, in source order.
        body: Vec<Assignment>,
        /// The whole block.
        span: Span,
    },
}

impl Statement {
    /// Returns the source span.
    pub fn span(&self) -> Span {
        match self {
            Statement::ContinuousAssign(a) => a.span,
            Statement::Behavioral { span, .. } => *span,
        }
    }

    /// Returns the assignments this statement performs, in order.
    pub fn assignments(&self) -> &[Assignment] {
        match self {
            Statement::ContinuousAssign(a) => std::slice::from_ref(a),
            Statement::Behavioral { body, .. } => body,
        }
    }
}
