//! The compiled module.

use crate::port::{Net, Port};
use crate::stmt::Statement;
use hdlgrade_common::{Ident, Interner};
use hdlgrade_source::Span;
use std::collections::HashMap;

/// One compiled hardware module, ready to evaluate.
///
/// A module owns the interner its identifiers came from, so it can be
/// shared across threads and evaluated against many test vectors without
/// any other context. It is never mutated after construction.
#[derive(Debug)]
pub struct Module {
    /// The module name.
    pub name: Ident,
    /// Ports in header order.
    pub ports: Vec<Port>,
    /// Internal `wire`/`reg` declarations.
    pub nets: Vec<Net>,
    /// Statements in declaration order.
    pub statements: Vec<Statement>,
    /// The whole `module ... endmodule` text.
    pub span: Span,
    interner: Interner,
    port_index: HashMap<Ident, usize>,
}

impl Module {
    /// Creates a module and indexes its ports by name.
    pub fn new(
        name: Ident,
        ports: Vec<Port>,
        nets: Vec<Net>,
        statements: Vec<Statement>,
        span: Span,
        interner: Interner,
    ) -> Self {
        let port_index = ports
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name, i))
            .collect();
        Self {
            name,
            ports,
            nets,
            statements,
            span,
            interner,
            port_index,
        }
    }

    /// Returns the text of an identifier.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// Returns the module name as text.
    pub fn name_str(&self) -> &str {
        self.resolve(self.name)
    }

    /// Looks up a name without interning it.
    pub fn lookup(&self, name: &str) -> Option<Ident> {
        self.interner.get(name)
    }

    /// Returns the port called `ident`.
    pub fn port(&self, ident: Ident) -> Option<&Port> {
        self.port_index.get(&ident).map(|i| &self.ports[*i])
    }

    /// Returns the port called `name`.
    pub fn port_by_name(&self, name: &str) -> Option<&Port> {
        self.lookup(name).and_then(|id| self.port(id))
    }

    /// Returns the internal net called `ident`.
    pub fn net(&self, ident: Ident) -> Option<&Net> {
        self.nets.iter().find(|n| n.name == ident)
    }

    /// Iterates over input ports in header order.
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_input())
    }

    /// Iterates over output ports in header order.
    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_output())
    }

    /// Returns the declared `(width, lsb)` of a port or net, or `None` for
    /// an implicit signal.
    pub fn declared_shape(&self, ident: Ident) -> Option<(u32, u32)> {
        self.port(ident)
            .map(|p| (p.width, p.lsb))
            .or_else(|| self.net(ident).map(|n| (n.width, n.lsb)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{Direction, NetKind};

    fn half_adder() -> Module {
        let interner = Interner::new();
        let port = |name: &str, direction| Port {
            name: interner.get_or_intern(name),
            direction,
            width: 1,
            lsb: 0,
            net_kind: NetKind::Wire,
            span: Span::DUMMY,
        };
        let ports = vec![
            port("a", Direction::Input),
            port("b", Direction::Input),
            port("sum", Direction::Output),
            port("carry", Direction::Output),
        ];
        let nets = vec![Net {
            name: interner.get_or_intern("t"),
            kind: NetKind::Reg,
            width: 4,
            lsb: 2,
            span: Span::DUMMY,
        }];
        let name = interner.get_or_intern("half_adder");
        Module::new(name, ports, nets, Vec::new(), Span::DUMMY, interner)
    }

    #[test]
    fn ports_by_direction_keep_order() {
        let m = half_adder();
        let inputs: Vec<_> = m.inputs().map(|p| m.resolve(p.name)).collect();
        let outputs: Vec<_> = m.outputs().map(|p| m.resolve(p.name)).collect();
        assert_eq!(inputs, ["a", "b"]);
        assert_eq!(outputs, ["sum", "carry"]);
        assert_eq!(m.name_str(), "half_adder");
    }

    #[test]
    fn lookup_by_name() {
        let m = half_adder();
        assert!(m.port_by_name("carry").unwrap().is_output());
        assert!(m.port_by_name("t").is_none());
        assert!(m.port_by_name("cin").is_none());
        assert!(m.lookup("cin").is_none());
    }

    #[test]
    fn declared_shapes() {
        let m = half_adder();
        assert_eq!(m.declared_shape(m.lookup("a").unwrap()), Some((1, 0)));
        assert_eq!(m.declared_shape(m.lookup("t").unwrap()), Some((4, 2)));
        assert_eq!(m.declared_shape(Ident::from_raw(999)), None);
    }

    #[test]
    fn module_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Module>();
    }
}
