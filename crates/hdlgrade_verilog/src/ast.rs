//! Parse tree for the Verilog subset.
//!
//! The tree keeps source structure (declaration lists, raw range
//! expressions, replication) that the builder later resolves into the
//! flat [`hdlgrade_ir::Module`]. Nodes that failed to parse are kept as
//! `Error` variants after the error has been reported.

use hdlgrade_common::{Ident, Value};
use hdlgrade_ir::{AssignKind, BinaryOp, Edge, NetKind, UnaryOp};
use hdlgrade_source::Span;
use serde::{Deserialize, Serialize};

/// Everything parsed from one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceText {
    /// Module declarations in source order.
    pub modules: Vec<ModuleDecl>,
    /// The whole file.
    pub span: Span,
}

/// How the module header lists its ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortStyle {
    /// `module m(input a, output y);`
    Ansi,
    /// `module m(a, y); input a; output y;`
    NonAnsi,
    /// `module m;` or `module m();`
    Empty,
}

/// A direction keyword as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// `input`
    Input,
    /// `output`
    Output,
    /// `inout`
    Inout,
}

/// A `[msb:lsb]` range with unevaluated bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Range {
    /// The left bound.
    pub msb: Expr,
    /// The right bound.
    pub lsb: Expr,
    /// The bracketed text.
    pub span: Span,
}

/// A name in a declaration list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclName {
    /// The declared name.
    pub name: Ident,
    /// Where it is written.
    pub span: Span,
}

/// `input [3:0] a, b` in an ANSI header or as a body item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDecl {
    /// The direction keyword.
    pub direction: PortDirection,
    /// `wire` or `reg`, if written.
    pub net_kind: Option<NetKind>,
    /// The declared range, if any.
    pub range: Option<Range>,
    /// The declared names.
    pub names: Vec<DeclName>,
    /// From the direction keyword to the last name.
    pub span: Span,
}

/// One name of a net declaration, with an optional initializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetDeclName {
    /// The declared name.
    pub decl: DeclName,
    /// `wire w = a & b;` initializer.
    pub init: Option<Expr>,
}

/// `wire [7:0] a, b = x;` or `reg q;`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetDecl {
    /// `wire` or `reg`.
    pub kind: NetKind,
    /// The declared range, if any.
    pub range: Option<Range>,
    /// The declared names.
    pub names: Vec<NetDeclName>,
    /// The whole declaration.
    pub span: Span,
}

/// One `target = value` or `target <= value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assign {
    /// The left-hand side, restricted to names, selects and concatenations.
    pub target: Expr,
    /// The right-hand side.
    pub value: Expr,
    /// Continuous, blocking or nonblocking.
    pub kind: AssignKind,
    /// From the target to the end of the value.
    pub span: Span,
}

/// One entry of `@(...)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensitivityEntry {
    /// Edge qualifier.
    pub edge: Edge,
    /// The watched name.
    pub name: Ident,
    /// Where it is written.
    pub span: Span,
}

/// The event control of an `always` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SensitivityList {
    /// `@*` or `@(*)`.
    Star(Span),
    /// An explicit list.
    List(Vec<SensitivityEntry>),
}

/// An `always` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlwaysBlock {
    /// The event control.
    pub sensitivity: SensitivityList,
    /// The assignments of the body, in order.
    pub body: Vec<Assign>,
    /// From `always` to the closing `end`.
    pub span: Span,
}

/// A module declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    /// The module name.
    pub name: DeclName,
    /// ANSI, non-ANSI or no ports.
    pub port_style: PortStyle,
    /// Port names in header order. For ANSI headers this repeats the names
    /// of `ansi_ports`.
    pub header_names: Vec<DeclName>,
    /// ANSI header declarations.
    pub ansi_ports: Vec<PortDecl>,
    /// Body items in order.
    pub items: Vec<ModuleItem>,
    /// From `module` to `endmodule`.
    pub span: Span,
}

/// A module body item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModuleItem {
    /// Non-ANSI `input`/`output` declaration.
    PortDecl(PortDecl),
    /// `wire`/`reg` declaration.
    NetDecl(NetDecl),
    /// `assign a = x, b = y;`
    ContinuousAssign(Vec<Assign>),
    /// `always @(...) ...`
    Always(AlwaysBlock),
    /// A construct that was recognized, reported and skipped.
    Unsupported(Span),
}

/// A parsed expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// A name.
    Identifier {
        /// The name.
        name: Ident,
        /// Source location.
        span: Span,
    },
    /// A numeric literal, already converted.
    Number {
        /// The value with its width.
        value: Value,
        /// Source location.
        span: Span,
    },
    /// A prefix operator.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// An infix operator.
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
    /// `cond ? a : b`
    Ternary {
        /// The condition.
        condition: Box<Expr>,
        /// Value when true.
        then_expr: Box<Expr>,
        /// Value when false.
        else_expr: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// `{a, b}`
    Concat {
        /// Parts, MSB first.
        elements: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// `{n{a, b}}`
    Repeat {
        /// The repetition count.
        count: Box<Expr>,
        /// The repeated parts.
        elements: Vec<Expr>,
        /// Source location.
        span: Span,
    },
    /// `name[index]`
    Index {
        /// The selected name.
        base: DeclName,
        /// The index.
        index: Box<Expr>,
        /// Source location.
        span: Span,
    },
    /// `name[msb:lsb]`, `name[i +: w]` or `name[i -: w]`.
    PartSelect {
        /// The selected name.
        base: DeclName,
        /// The selection form.
        select: PartSelect,
        /// Source location.
        span: Span,
    },
    /// Something that failed to parse and has been reported.
    Error(Span),
}

/// The bounds of a part select.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PartSelect {
    /// `[msb:lsb]`
    Range {
        /// Left bound.
        msb: Box<Expr>,
        /// Right bound.
        lsb: Box<Expr>,
    },
    /// `[base +: width]` (`ascending`) or `[base -: width]`.
    Indexed {
        /// The anchor index.
        base: Box<Expr>,
        /// The width.
        width: Box<Expr>,
        /// `+:` when true.
        ascending: bool,
    },
}

impl Expr {
    /// Returns the source span.
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::Number { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Concat { span, .. }
            | Expr::Repeat { span, .. }
            | Expr::Index { span, .. }
            | Expr::PartSelect { span, .. } => *span,
            Expr::Error(span) => *span,
        }
    }

    /// Returns `true` if this node or any child failed to parse.
    pub fn has_error(&self) -> bool {
        match self {
            Expr::Error(_) => true,
            Expr::Identifier { .. } | Expr::Number { .. } => false,
            Expr::Unary { operand, .. } => operand.has_error(),
            Expr::Binary { left, right, .. } => left.has_error() || right.has_error(),
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
                ..
            } => condition.has_error() || then_expr.has_error() || else_expr.has_error(),
            Expr::Concat { elements, .. } => elements.iter().any(Expr::has_error),
            Expr::Repeat {
                count, elements, ..
            } => count.has_error() || elements.iter().any(Expr::has_error),
            Expr::Index { index, .. } => index.has_error(),
            Expr::PartSelect { select, .. } => match select {
                PartSelect::Range { msb, lsb } => msb.has_error() || lsb.has_error(),
                PartSelect::Indexed { base, width, .. } => base.has_error() || width.has_error(),
            },
        }
    }
}
