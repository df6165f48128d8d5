//! The per-evaluation signal table.

use hdlgrade_common::{Ident, Value};
use std::collections::HashMap;

/// Current values of every signal written so far in one evaluation.
///
/// A table is created for each evaluation and dropped at its end; nothing
/// is shared between evaluations.
#[derive(Debug, Default, Clone)]
pub struct SignalTable {
    values: HashMap<Ident, Value>,
}

impl SignalTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `name`, or `None` if it has not been written.
    pub fn read(&self, name: Ident) -> Option<Value> {
        self.values.get(&name).copied()
    }

    /// Overwrites the value of `name`.
    pub fn write(&mut self, name: Ident, value: Value) {
        self.values.insert(name, value);
    }

    /// Number of signals written.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut table = SignalTable::new();
        let y = Ident::from_raw(3);
        assert_eq!(table.read(y), None);
        table.write(y, Value::Bit(true));
        table.write(y, Value::Bit(false));
        assert_eq!(table.read(y), Some(Value::Bit(false)));
        assert_eq!(table.len(), 1);
    }
}
