//! The immutable module representation that the evaluator executes.
//!
//! The Verilog front end lowers a submission into one [`Module`]: its
//! [`Port`]s in declaration order, internal [`Net`]s, and an ordered list of
//! [`Statement`]s whose right-hand sides are [`Expr`] trees. Nothing here is
//! mutated after the module is built.

#![warn(missing_docs)]

pub mod expr;
pub mod module;
pub mod port;
pub mod stmt;

pub use expr::{BinaryOp, Expr, UnaryOp};
pub use module::Module;
pub use port::{Direction, Net, NetKind, Port};
pub use stmt::{AssignKind, Assignment, Edge, Sensitivity, SensitivityItem, Statement, Target};
