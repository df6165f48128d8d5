//! Single-pass evaluation of a compiled module.
//!
//! [`evaluate`] binds the inputs, executes every statement once in
//! declaration order against a fresh [`SignalTable`], and reads the outputs.
//! Assignments overwrite immediately, so a later assignment to the same
//! target wins. There is no notion of time, clock edges or stored state.
//!
//! # Widths
//!
//! Every value carries its width. Bitwise operators take the wider operand,
//! `+` grows by one bit and `*` to the sum of the operand widths (both
//! capped at 64) so carries survive until the result is written. `-`, unary
//! `-` and `~` wrap at the operand width. Comparisons, logical operators and
//! reductions give one bit. A write to a declared signal is truncated or
//! zero-extended to the declared width; an implicit signal keeps the width
//! of the value written to it.

use crate::error::EvalError;
use crate::table::SignalTable;
use crate::trace::{NoTrace, TraceEvent, TraceSink};
use hdlgrade_common::{Ident, Value};
use hdlgrade_ir::{BinaryOp, Expr, Module, Target, UnaryOp};
use std::collections::BTreeMap;

/// Signal values keyed by port name.
pub type SignalValues = BTreeMap<String, Value>;

/// Evaluates `module` once with the given input values.
///
/// Names in `inputs` that are not input ports are ignored. On success the
/// result holds exactly the declared output ports.
pub fn evaluate(module: &Module, inputs: &SignalValues) -> Result<SignalValues, EvalError> {
    evaluate_with_trace(module, inputs, &mut NoTrace)
}

/// Like [`evaluate`], reporting every step to `trace`.
pub fn evaluate_with_trace(
    module: &Module,
    inputs: &SignalValues,
    trace: &mut dyn TraceSink,
) -> Result<SignalValues, EvalError> {
    let mut table = SignalTable::new();
    for port in module.inputs() {
        let name = module.resolve(port.name);
        let value = inputs.get(name).ok_or_else(|| EvalError::MissingInput {
            port: name.to_string(),
        })?;
        if !value.fits_in(port.width) {
            return Err(EvalError::InputTooWide {
                port: name.to_string(),
                value: value.to_bit_string(),
                width: port.width,
            });
        }
        let value = value.resize(port.width);
        trace.event(&TraceEvent::InputBound { name, value });
        table.write(port.name, value);
    }

    let mut evaluator = Evaluator {
        module,
        table,
        trace,
    };
    for (index, statement) in module.statements.iter().enumerate() {
        evaluator.trace.event(&TraceEvent::StatementStarted {
            index,
            span: statement.span(),
        });
        for assignment in statement.assignments() {
            let value = evaluator.eval(&assignment.value)?;
            evaluator.assign(&assignment.target, value)?;
        }
    }

    let mut outputs = SignalValues::new();
    for port in module.outputs() {
        let name = module.resolve(port.name);
        let value = evaluator
            .table
            .read(port.name)
            .ok_or_else(|| EvalError::UnassignedOutput {
                port: name.to_string(),
            })?
            .resize(port.width);
        evaluator.trace.event(&TraceEvent::OutputRead { name, value });
        outputs.insert(name.to_string(), value);
    }
    Ok(outputs)
}

struct Evaluator<'a, 't> {
    module: &'a Module,
    table: SignalTable,
    trace: &'t mut dyn TraceSink,
}

fn mask(width: u32) -> u64 {
    Value::new(u64::MAX, width).bits()
}

impl Evaluator<'_, '_> {
    fn read(&self, name: Ident) -> Result<Value, EvalError> {
        self.table
            .read(name)
            .ok_or_else(|| EvalError::ReadBeforeWrite {
                name: self.module.resolve(name).to_string(),
            })
    }

    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal { value, .. } => Ok(*value),
            Expr::Identifier { name, .. } => self.read(*name),
            Expr::Unary { op, operand, .. } => Ok(eval_unary(*op, self.eval(operand)?)),
            Expr::Binary {
                op, left, right, ..
            } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                eval_binary(*op, l, r)
            }
            Expr::Conditional {
                condition,
                when_true,
                when_false,
                ..
            } => {
                // Only the selected branch is evaluated, so `b != 0 ? a / b : 0`
                // never divides by zero.
                if self.eval(condition)?.is_true() {
                    self.eval(when_true)
                } else {
                    self.eval(when_false)
                }
            }
            Expr::Concat { parts, .. } => {
                let mut bits = 0u64;
                let mut width = 0u32;
                for part in parts {
                    let value = self.eval(part)?;
                    width += value.width();
                    if width > Value::MAX_WIDTH {
                        return Err(EvalError::ConcatTooWide { width });
                    }
                    bits = shl(bits, value.width()) | value.bits();
                }
                Ok(Value::new(bits, width))
            }
            Expr::Repeat { count, value, .. } => {
                let value = self.eval(value)?;
                let width = count.saturating_mul(value.width());
                if width > Value::MAX_WIDTH {
                    return Err(EvalError::ConcatTooWide { width });
                }
                let bits = (0..*count).fold(0u64, |bits, _| shl(bits, value.width()) | value.bits());
                Ok(Value::new(bits, width))
            }
            Expr::Index {
                base, index, lsb, ..
            } => {
                let value = self.read(*base)?;
                let position = self.eval(index)?.bits();
                let bit = position
                    .checked_sub(u64::from(*lsb))
                    .and_then(|offset| u32::try_from(offset).ok())
                    .and_then(|offset| value.bit(offset));
                match bit {
                    Some(bit) => Ok(Value::from_bool(bit)),
                    None => Err(EvalError::IndexOutOfRange {
                        name: self.module.resolve(*base).to_string(),
                        index: position,
                        width: value.width(),
                    }),
                }
            }
            Expr::Slice {
                base,
                offset,
                width,
                ..
            } => {
                let value = self.read(*base)?;
                if offset + width > value.width() {
                    return Err(EvalError::IndexOutOfRange {
                        name: self.module.resolve(*base).to_string(),
                        index: u64::from(offset + width - 1),
                        width: value.width(),
                    });
                }
                Ok(Value::new(value.bits() >> offset, *width))
            }
        }
    }

    fn assign(&mut self, target: &Target, value: Value) -> Result<(), EvalError> {
        match target {
            Target::Signal { name, .. } => {
                let value = match self.module.declared_shape(*name) {
                    Some((width, _)) => value.resize(width),
                    None => value,
                };
                self.write(*name, value);
            }
            Target::Bit { name, offset, .. } => {
                self.write_bits(*name, *offset, 1, value);
            }
            Target::Slice {
                name,
                offset,
                width,
                ..
            } => {
                self.write_bits(*name, *offset, *width, value);
            }
            Target::Concat { parts, .. } => {
                let mut shift = 0u32;
                for part in parts.iter().rev() {
                    let width = self.target_width(part);
                    let piece = Value::new(shr(value.bits(), shift), width);
                    self.assign(part, piece)?;
                    shift += width;
                }
            }
        }
        Ok(())
    }

    /// Replaces `width` bits at `offset` in a declared signal. Bits outside
    /// the range keep their value, or start at zero if never written.
    fn write_bits(&mut self, name: Ident, offset: u32, width: u32, value: Value) {
        let declared = self
            .module
            .declared_shape(name)
            .map_or(offset + width, |(w, _)| w);
        let current = self.table.read(name).map_or(0, |v| v.bits());
        let field = mask(width) << offset;
        let bits = (current & !field) | ((value.bits() & mask(width)) << offset);
        self.write(name, Value::new(bits, declared));
    }

    fn target_width(&self, target: &Target) -> u32 {
        match target {
            Target::Signal { name, .. } => self.module.declared_shape(*name).map_or(1, |(w, _)| w),
            Target::Bit { .. } => 1,
            Target::Slice { width, .. } => *width,
            Target::Concat { parts, .. } => parts.iter().map(|p| self.target_width(p)).sum(),
        }
    }

    fn write(&mut self, name: Ident, value: Value) {
        self.trace.event(&TraceEvent::SignalWritten {
            name: self.module.resolve(name),
            value,
        });
        self.table.write(name, value);
    }
}

fn shl(bits: u64, amount: u32) -> u64 {
    bits.checked_shl(amount).unwrap_or(0)
}

fn shr(bits: u64, amount: u32) -> u64 {
    bits.checked_shr(amount).unwrap_or(0)
}

fn eval_unary(op: UnaryOp, v: Value) -> Value {
    let width = v.width();
    let bits = v.bits();
    match op {
        UnaryOp::Not => Value::from_bool(bits == 0),
        UnaryOp::BitNot => Value::new(!bits, width),
        UnaryOp::Neg => Value::new(bits.wrapping_neg(), width),
        UnaryOp::ReduceAnd => Value::from_bool(bits == mask(width)),
        UnaryOp::ReduceOr => Value::from_bool(bits != 0),
        UnaryOp::ReduceXor => Value::from_bool(bits.count_ones() % 2 == 1),
        UnaryOp::ReduceNand => Value::from_bool(bits != mask(width)),
        UnaryOp::ReduceNor => Value::from_bool(bits == 0),
        UnaryOp::ReduceXnor => Value::from_bool(bits.count_ones() % 2 == 0),
    }
}

fn eval_binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, EvalError> {
    let (a, b) = (l.bits(), r.bits());
    let wide = l.width().max(r.width());
    let value = match op {
        BinaryOp::And => Value::new(a & b, wide),
        BinaryOp::Or => Value::new(a | b, wide),
        BinaryOp::Xor => Value::new(a ^ b, wide),
        BinaryOp::Xnor => Value::new(!(a ^ b), wide),
        BinaryOp::LogicalAnd => Value::from_bool(a != 0 && b != 0),
        BinaryOp::LogicalOr => Value::from_bool(a != 0 || b != 0),
        BinaryOp::Eq => Value::from_bool(a == b),
        BinaryOp::Ne => Value::from_bool(a != b),
        BinaryOp::Lt => Value::from_bool(a < b),
        BinaryOp::Gt => Value::from_bool(a > b),
        BinaryOp::Le => Value::from_bool(a <= b),
        BinaryOp::Ge => Value::from_bool(a >= b),
        BinaryOp::Add => Value::new(a.wrapping_add(b), (wide + 1).min(Value::MAX_WIDTH)),
        BinaryOp::Sub => Value::new(a.wrapping_sub(b), wide),
        BinaryOp::Mul => Value::new(
            a.wrapping_mul(b),
            (l.width() + r.width()).min(Value::MAX_WIDTH),
        ),
        BinaryOp::Div => Value::new(a.checked_div(b).ok_or(EvalError::DivisionByZero)?, wide),
        BinaryOp::Mod => Value::new(a.checked_rem(b).ok_or(EvalError::DivisionByZero)?, wide),
        BinaryOp::Shl => {
            let amount = u32::try_from(b).unwrap_or(u32::MAX);
            let width = l.width().saturating_add(amount).min(Value::MAX_WIDTH);
            Value::new(shl(a, amount), width)
        }
        BinaryOp::Shr => {
            let amount = u32::try_from(b).unwrap_or(u32::MAX);
            Value::new(shr(a, amount), l.width())
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::RecordingTrace;
    use hdlgrade_verilog::{compile, CompileOptions};

    fn module(source: &str) -> Module {
        match compile(source, &CompileOptions::default()) {
            Ok(compiled) => compiled.module,
            Err(failure) => panic!("compile failed: {failure}"),
        }
    }

    fn bits(pairs: &[(&str, &str)]) -> SignalValues {
        pairs
            .iter()
            .map(|(name, text)| ((*name).to_string(), Value::parse_bits(text).unwrap()))
            .collect()
    }

    fn run(m: &Module, inputs: &[(&str, &str)]) -> BTreeMap<String, String> {
        evaluate(m, &bits(inputs))
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k, v.to_bit_string()))
            .collect()
    }

    fn out(m: &Module, inputs: &[(&str, &str)], port: &str) -> String {
        run(m, inputs)[port].clone()
    }

    #[test]
    fn and_gate_truth_table() {
        let m = module("module and_gate(input a, input b, output out); assign out = a & b; endmodule");
        for (a, b, y) in [("0", "0", "0"), ("0", "1", "0"), ("1", "0", "0"), ("1", "1", "1")] {
            assert_eq!(out(&m, &[("a", a), ("b", b)], "out"), y, "a={a} b={b}");
        }
    }

    #[test]
    fn four_bit_add_keeps_carry() {
        let m = module(
            "module add4(input [3:0] a, input [3:0] b, input cin, output [3:0] sum, output cout);\n\
             assign {cout, sum} = a + b + cin;\nendmodule",
        );
        let result = run(&m, &[("a", "1111"), ("b", "0001"), ("cin", "0")]);
        assert_eq!(result["sum"], "0000");
        assert_eq!(result["cout"], "1");
        let result = run(&m, &[("a", "0101"), ("b", "0011"), ("cin", "1")]);
        assert_eq!(result["sum"], "1001");
        assert_eq!(result["cout"], "0");
    }

    #[test]
    fn subtraction_wraps_at_operand_width() {
        let m = module(
            "module sub4(input [3:0] a, input [3:0] b, output [3:0] d, output borrow);\n\
             assign d = a - b;\n assign borrow = a < b;\nendmodule",
        );
        let result = run(&m, &[("a", "0010"), ("b", "0011")]);
        assert_eq!(result["d"], "1111");
        assert_eq!(result["borrow"], "1");
    }

    #[test]
    fn mux_with_conditional() {
        let m = module(
            "module mux4(input [1:0] sel, input a, input b, input c, input d, output y);\n\
             assign y = sel[1] ? (sel[0] ? d : c) : (sel[0] ? b : a);\nendmodule",
        );
        let inputs = |sel| [("sel", sel), ("a", "0"), ("b", "1"), ("c", "0"), ("d", "1")];
        assert_eq!(out(&m, &inputs("00"), "y"), "0");
        assert_eq!(out(&m, &inputs("01"), "y"), "1");
        assert_eq!(out(&m, &inputs("10"), "y"), "0");
        assert_eq!(out(&m, &inputs("11"), "y"), "1");
    }

    #[test]
    fn later_assignment_wins() {
        let m = module(
            "module m(input a, output reg y);\n always @* begin\n  y = a;\n  y = ~a;\n end\nendmodule",
        );
        assert_eq!(out(&m, &[("a", "1")], "y"), "0");
    }

    #[test]
    fn blocking_reads_see_earlier_writes() {
        let m = module(
            "module m(input [3:0] a, output reg [3:0] y);\n always @* begin\n  y = a;\n  y = y + 1;\n end\nendmodule",
        );
        assert_eq!(out(&m, &[("a", "0111")], "y"), "1000");
    }

    #[test]
    fn bitwise_and_reduction_operators() {
        let m = module(
            "module m(input [3:0] a, output [3:0] n, output all, output any, output par, output x);\n\
             assign n = ~a;\n assign all = &a;\n assign any = |a;\n assign par = ^a;\n assign x = ~^a;\nendmodule",
        );
        let r = run(&m, &[("a", "1011")]);
        assert_eq!(r["n"], "0100");
        assert_eq!(r["all"], "0");
        assert_eq!(r["any"], "1");
        assert_eq!(r["par"], "1");
        assert_eq!(r["x"], "0");
        let r = run(&m, &[("a", "1111")]);
        assert_eq!(r["all"], "1");
        assert_eq!(r["par"], "0");
    }

    #[test]
    fn selects_and_concatenation() {
        let m = module(
            "module m(input [7:0] a, output [3:0] hi, output [7:0] swapped, output b5);\n\
             assign hi = a[7:4];\n assign swapped = {a[3:0], a[7:4]};\n assign b5 = a[5];\nendmodule",
        );
        let r = run(&m, &[("a", "10100011")]);
        assert_eq!(r["hi"], "1010");
        assert_eq!(r["swapped"], "00111010");
        assert_eq!(r["b5"], "1");
    }

    #[test]
    fn dynamic_index() {
        let m = module("module m(input [3:0] a, input [1:0] i, output y); assign y = a[i]; endmodule");
        assert_eq!(out(&m, &[("a", "0100"), ("i", "10")], "y"), "1");
        assert_eq!(out(&m, &[("a", "0100"), ("i", "01")], "y"), "0");
    }

    #[test]
    fn dynamic_index_out_of_range() {
        let m = module("module m(input [1:0] a, input [1:0] i, output y); assign y = a[i]; endmodule");
        let err = evaluate(&m, &bits(&[("a", "01"), ("i", "11")])).unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfRange { index: 3, width: 2, .. }));
    }

    #[test]
    fn bit_targets_assemble_an_output() {
        let m = module(
            "module m(input a, input b, output [1:0] y); assign y[0] = a; assign y[1] = b; endmodule",
        );
        assert_eq!(out(&m, &[("a", "1"), ("b", "0")], "y"), "01");
    }

    #[test]
    fn shifts_and_arithmetic() {
        let m = module(
            "module m(input [3:0] a, output [7:0] s, output [3:0] r, output [7:0] p, output [3:0] q);\n\
             assign s = a << 2;\n assign r = a >> 1;\n assign p = a * a;\n assign q = a % 3;\nendmodule",
        );
        let r = run(&m, &[("a", "1101")]);
        assert_eq!(r["s"], "00110100");
        assert_eq!(r["r"], "0110");
        assert_eq!(r["p"], "10101001");
        assert_eq!(r["q"], "0001");
    }

    #[test]
    fn division_by_zero() {
        let m = module("module m(input [3:0] a, input [3:0] b, output [3:0] q); assign q = a / b; endmodule");
        let err = evaluate(&m, &bits(&[("a", "0100"), ("b", "0000")])).unwrap_err();
        assert_eq!(err, EvalError::DivisionByZero);
        let guarded = module(
            "module m(input [3:0] a, input [3:0] b, output [3:0] q); assign q = (b != 0) ? a / b : 0; endmodule",
        );
        assert_eq!(out(&guarded, &[("a", "0100"), ("b", "0000")], "q"), "0000");
    }

    #[test]
    fn missing_input() {
        let m = module("module m(input a, input b, output y); assign y = a | b; endmodule");
        let err = evaluate(&m, &bits(&[("a", "1")])).unwrap_err();
        assert_eq!(err, EvalError::MissingInput { port: "b".into() });
        assert_eq!(err.to_string(), "Missing input value for port: b");
    }

    #[test]
    fn oversized_input() {
        let m = module("module m(input [1:0] a, output [1:0] y); assign y = a; endmodule");
        let err = evaluate(&m, &bits(&[("a", "101")])).unwrap_err();
        assert!(matches!(err, EvalError::InputTooWide { width: 2, .. }));
        // Leading zeros beyond the port width are fine.
        assert_eq!(out(&m, &[("a", "0011")], "y"), "11");
    }

    #[test]
    fn extra_inputs_are_ignored() {
        let m = module("module m(input a, output y); assign y = a; endmodule");
        let r = run(&m, &[("a", "1"), ("unused", "0")]);
        assert_eq!(r.len(), 1);
        assert_eq!(r["y"], "1");
    }

    #[test]
    fn read_before_write_is_an_error() {
        let m = module(
            "module m(input clk, input d, output q, output reg r);\n\
             assign q = r;\n always @(posedge clk) r <= d;\nendmodule",
        );
        let err = evaluate(&m, &bits(&[("clk", "1"), ("d", "1")])).unwrap_err();
        assert_eq!(err, EvalError::ReadBeforeWrite { name: "r".into() });
    }

    #[test]
    fn flip_flop_is_one_static_pass() {
        let m = module(
            "module dff(input clk, input d, output reg q); always @(posedge clk) q <= d; endmodule",
        );
        assert_eq!(out(&m, &[("clk", "0"), ("d", "1")], "q"), "1");
        assert_eq!(out(&m, &[("clk", "1"), ("d", "0")], "q"), "0");
    }

    #[test]
    fn implicit_net_keeps_value_width() {
        let m = module(
            "module m(input [3:0] a, input [3:0] b, output [3:0] s, output c);\n\
             assign t = a + b;\n assign s = t[3:0];\n assign c = t[4];\nendmodule",
        );
        let r = run(&m, &[("a", "1000"), ("b", "1001")]);
        assert_eq!(r["s"], "0001");
        assert_eq!(r["c"], "1");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let m = module(
            "module m(input [3:0] a, input [3:0] b, output [4:0] s, output e); assign s = a + b; assign e = a == b; endmodule",
        );
        let inputs = bits(&[("a", "1010"), ("b", "0110")]);
        assert_eq!(evaluate(&m, &inputs), evaluate(&m, &inputs));
    }

    #[test]
    fn trace_records_each_step() {
        let m = module("module m(input a, output y); assign t = ~a; assign y = t; endmodule");
        let mut trace = RecordingTrace::new();
        evaluate_with_trace(&m, &bits(&[("a", "0")]), &mut trace).unwrap();
        assert_eq!(trace.writes_to("t"), [Value::Bit(true)]);
        assert_eq!(trace.events.len(), 6);
    }

    #[test]
    fn replication_tiles_the_value() {
        let m = module("module m(input [1:0] a, output [7:0] y); assign y = {2{a, 2'b01}}; endmodule");
        assert_eq!(run(&m, &[("a", "10")])["y"], "10011001");
    }

    #[test]
    fn replication_checks_signal_widths() {
        let m = module("module m(input [3:0] a, output [63:0] y); assign y = {32{a}}; endmodule");
        let err = evaluate(&m, &bits(&[("a", "1")])).unwrap_err();
        assert_eq!(err, EvalError::ConcatTooWide { width: 128 });
    }

    #[test]
    fn concat_too_wide() {
        let m = module(
            "module m(input [63:0] a, output [63:0] y); assign y = {a, a} >> 64; endmodule",
        );
        let err = evaluate(&m, &bits(&[("a", "1")])).unwrap_err();
        assert_eq!(err, EvalError::ConcatTooWide { width: 128 });
    }
}
