//! Expression trees.
//!
//! Every node carries the span of the source text it came from so runtime
//! errors can point back at the offending sub-expression.

use hdlgrade_common::{Ident, Value};
use hdlgrade_source::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT (`!`).
    Not,
    /// Bitwise NOT (`~`).
    BitNot,
    /// Two's-complement negation (`-`).
    Neg,
    /// Reduction AND (`&`).
    ReduceAnd,
    /// Reduction OR (`|`).
    ReduceOr,
    /// Reduction XOR (`^`).
    ReduceXor,
    /// Reduction NAND (`~&`).
    ReduceNand,
    /// Reduction NOR (`~|`).
    ReduceNor,
    /// Reduction XNOR (`~^`).
    ReduceXnor,
}

impl UnaryOp {
    /// Returns the operator's source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Neg => "-",
            UnaryOp::ReduceAnd => "&",
            UnaryOp::ReduceOr => "|",
            UnaryOp::ReduceXor => "^",
            UnaryOp::ReduceNand => "~&",
            UnaryOp::ReduceNor => "~|",
            UnaryOp::ReduceXnor => "~^",
        }
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Bitwise AND (`&`).
    And,
    /// Bitwise OR (`|`).
    Or,
    /// Bitwise XOR (`^`).
    Xor,
    /// Bitwise XNOR (`~^`, `^~`).
    Xnor,
    /// Logical AND (`&&`).
    LogicalAnd,
    /// Logical OR (`||`).
    LogicalOr,
    /// Equality (`==`).
    Eq,
    /// Inequality (`!=`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Greater than (`>`).
    Gt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than or equal (`>=`).
    Ge,
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
    /// Modulo (`%`).
    Mod,
    /// Logical left shift (`<<`).
    Shl,
    /// Logical right shift (`>>`).
    Shr,
}

impl BinaryOp {
    /// Returns the operator's source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Xnor => "~^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }

    /// Returns `true` for operators whose result is a single bit.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinaryOp::LogicalAnd
                | BinaryOp::LogicalOr
                | BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::Le
                | BinaryOp::Ge
        )
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// A constant.
    Literal {
        /// The value, with its width.
        value: Value,
        /// Source location.
        span: Span,
    },
    /// A whole-signal reference.
    Identifier {
        /// The referenced port, net or implicit signal.
        name: Ident,
        /// Source location.
        span: Span,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// `condition ? when_true : when_false`.
    Conditional {
        /// The selector; any non-zero value is true.
        condition: Box<Expr>,
        /// Result when the condition is true.
        when_true: Box<Expr>,
        /// Result when the condition is false.
        when_false: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// `{a, b, ...}`, first part most significant.
    Concat {
        /// The parts, MSB first.
        parts: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// `{count{value}}`: `count` copies of `value` side by side.
    Repeat {
        /// Number of copies, at least 1.
        count: u32,
        /// The replicated value, usually a [`Expr::Concat`].
        value: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// A single-bit select with a computed index, `base[index]`.
    Index {
        /// The selected signal.
        base: Ident,
        /// The index expression, in declared bit numbering.
        index: Box<Expr>,
        /// Low bound of `base`'s declared range, subtracted from the index.
        lsb: u32,
        /// Source location.
        span: Span,
    },
    /// A constant part select, `base[msb:lsb]` or `base[3]`, already
    /// translated to an offset from bit 0.
    Slice {
        /// The selected signal.
        base: Ident,
        /// Offset of the lowest selected bit.
        offset: u32,
        /// Number of selected bits.
        width: u32,
        /// Source location.
        span: Span,
    },
}

impl Expr {
    /// Returns the source span of this node.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Concat { span, .. }
            | Expr::Repeat { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. } => *span,
        }
    }

    /// Calls `f` for every signal name read by this expression, in
    /// left-to-right source order. Names may repeat.
    pub fn for_each_ident(&self, f: &mut impl FnMut(Ident, Span)) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Identifier { name, span } => f(*name, *span),
            Expr::Unary { operand, .. } => operand.for_each_ident(f),
            Expr::Binary { left, right, .. } => {
                left.for_each_ident(f);
                right.for_each_ident(f);
            }
            Expr::Conditional {
                condition,
                when_true,
                when_false,
                ..
            } => {
                condition.for_each_ident(f);
                when_true.for_each_ident(f);
                when_false.for_each_ident(f);
            }
            Expr::Concat { parts, .. } => {
                for part in parts {
                    part.for_each_ident(f);
                }
            }
            Expr::Repeat { value, .. } => value.for_each_ident(f),
            Expr::Index {
                base, index, span, ..
            } => {
                f(*base, *span);
                index.for_each_ident(f);
            }
            Expr::Slice { base, span, .. } => f(*base, *span),
        }
    }

    /// Returns the depth of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + match self {
            Expr::Literal { .. } | Expr::Identifier { .. } | Expr::Slice { .. } => 0,
            Expr::Unary { operand, .. } | Expr::Repeat { value: operand, .. } => operand.depth(),
            Expr::Index { index, .. } => index.depth(),
            Expr::Binary { left, right, .. } => left.depth().max(right.depth()),
            Expr::Conditional {
                condition,
                when_true,
                when_false,
                ..
            } => condition
                .depth()
                .max(when_true.depth())
                .max(when_false.depth()),
            Expr::Concat { parts, .. } => parts.iter().map(Expr::depth).max().unwrap_or(0),
        }
    }

    /// A lower bound on the width of the value, without knowing signal
    /// widths: every signal and operator result is at least 1 bit.
    pub fn min_width(&self) -> u64 {
        match self {
            Expr::Literal { value, .. } => u64::from(value.width()),
            Expr::Concat { parts, .. } => parts
                .iter()
                .fold(0u64, |total, part| total.saturating_add(part.min_width())),
            Expr::Repeat { count, value, .. } => u64::from(*count).saturating_mul(value.min_width()),
            Expr::Slice { width, .. } => u64::from(*width),
            _ => 1,
        }
    }
}
