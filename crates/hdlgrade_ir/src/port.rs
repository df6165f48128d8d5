//! Ports and internal nets.

use hdlgrade_common::Ident;
use hdlgrade_source::Span;
use serde::{Deserialize, Serialize};

/// The direction of a port on the module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Bound from the test vector.
    Input,
    /// Read back after evaluation.
    Output,
}

/// The declared net type of a port or internal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetKind {
    /// `wire`, or no net type at all.
    Wire,
    /// `reg`.
    Reg,
}

/// A port in the module's interface.
///
/// `width` is `msb - lsb + 1` of the declared `[msb:lsb]` range, or 1 for an
/// un-ranged port. Bit selects use declared indices, so `lsb` is kept to
/// translate them to offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// The port name.
    pub name: Ident,
    /// Input or output.
    pub direction: Direction,
    /// Width in bits, 1 to 64.
    pub width: u32,
    /// Low bound of the declared range.
    pub lsb: u32,
    /// Declared net type.
    pub net_kind: NetKind,
    /// Where the port's direction was declared.
    pub span: Span,
}

impl Port {
    /// Returns `true` for input ports.
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    /// Returns `true` for output ports.
    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }
}

/// An internal `wire` or `reg` declared in the module body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    /// The net name.
    pub name: Ident,
    /// `wire` or `reg`.
    pub kind: NetKind,
    /// Width in bits, 1 to 64.
    pub width: u32,
    /// Low bound of the declared range.
    pub lsb: u32,
    /// The declaration.
    pub span: Span,
}
