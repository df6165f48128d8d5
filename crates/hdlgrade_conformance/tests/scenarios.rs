//! Grading behavior seen by a learner: verdicts, scoped failures, and
//! value normalization.

use hdlgrade_conformance::{assert_all_pass, grade, truth_table, ErrorKind, TestVector};

const AND_GATE: &str = r#"
module and_gate(
  input a,
  input b,
  output out
);
  assign out = a & b;
endmodule
"#;

#[test]
fn and_gate_verdicts() {
    let vectors = [
        TestVector::new("a=0, b=0", &[("a", "0"), ("b", "0")], &[("out", "0")]),
        TestVector::new("a=1, b=1", &[("a", "1"), ("b", "1")], &[("out", "1")]),
        TestVector::new("a=1, b=0", &[("a", "1"), ("b", "0")], &[("out", "1")]),
    ];
    let outcome = grade(AND_GATE, &vectors);
    assert!(outcome.results[0].passed);
    assert!(outcome.results[1].passed);
    assert!(!outcome.results[2].passed);
    assert_eq!(outcome.actual(2, "out"), Some("0"));
    assert!(outcome.results[2].error.is_none());
    assert_eq!(outcome.summary.passed, 2);
}

#[test]
fn undriven_output_fails_every_vector() {
    let source = "module m(input a, input b, output y);\n  wire t;\n  assign t = a & b;\nendmodule\n";
    let vectors = truth_table(&["a", "b"], &["y"], |v| vec![(v[0] & v[1]).to_string()]);
    let outcome = grade(source, &vectors);
    let error = outcome.fatal_error().expect("a shared compile error");
    assert_eq!(error.kind, ErrorKind::UnassignedOutputError);
    assert_eq!(outcome.summary.failed, 4);
}

#[test]
fn four_bit_adder_carry() {
    let source = r#"
module adder4(
  input [3:0] a,
  input [3:0] b,
  input cin,
  output [3:0] sum,
  output cout
);
  assign {cout, sum} = a + b + cin;
endmodule
"#;
    let vectors = [TestVector::new(
        "overflow",
        &[("a", "1111"), ("b", "0001"), ("cin", "0")],
        &[("sum", "0000"), ("cout", "1")],
    )];
    let outcome = grade(source, &vectors);
    assert_all_pass(&outcome);
    assert_eq!(outcome.actual(0, "sum"), Some("0000"));
    assert_eq!(outcome.actual(0, "cout"), Some("1"));
}

#[test]
fn missing_input_is_scoped_to_its_vector() {
    let vectors = [
        TestVector::new("complete", &[("a", "1"), ("b", "1")], &[("out", "1")]),
        TestVector::new("b omitted", &[("a", "1")], &[("out", "1")]),
        TestVector::new("complete", &[("a", "1"), ("b", "0")], &[("out", "0")]),
    ];
    let outcome = grade(AND_GATE, &vectors);
    assert!(outcome.results[0].passed);
    assert!(outcome.results[2].passed);
    let error = outcome.results[1].error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::MissingInputError);
    assert_eq!(error.message, "Missing input value for port: b");
}

#[test]
fn missing_endmodule_short_circuits() {
    let source = "module and_gate(input a, input b, output out);\n  assign out = a & b;\n";
    let vectors = truth_table(&["a", "b"], &["out"], |v| vec![(v[0] & v[1]).to_string()]);
    let outcome = grade(source, &vectors);
    let error = outcome.fatal_error().expect("a shared compile error");
    assert_eq!(error.kind, ErrorKind::StructuralError);
    assert!(outcome.results.iter().all(|r| !r.passed));
}

#[test]
fn module_names_do_not_change_grading() {
    // Named like an AND gate but computes OR.
    let source = "module and_gate(input a, input b, output out);\n  assign out = a | b;\nendmodule\n";
    let vectors = truth_table(&["a", "b"], &["out"], |v| vec![(v[0] | v[1]).to_string()]);
    assert_all_pass(&grade(source, &vectors));

    let and_vectors = truth_table(&["a", "b"], &["out"], |v| vec![(v[0] & v[1]).to_string()]);
    let outcome = grade(source, &and_vectors);
    assert_eq!(outcome.summary.failed, 2);
}

#[test]
fn expected_values_are_radix_normalized() {
    let source = "module pass(input [3:0] a, output [3:0] y);\n  assign y = a;\nendmodule\n";
    let vectors = [
        TestVector::new("binary", &[("a", "0010")], &[("y", "0010")]),
        TestVector::new("short", &[("a", "0010")], &[("y", "10")]),
        TestVector::new("prefixed", &[("a", "0010")], &[("y", "2'b10")]),
        TestVector::new("hex", &[("a", "4'hA")], &[("y", "1010")]),
        TestVector::new("not equal", &[("a", "0010")], &[("y", "1010")]),
    ];
    let outcome = grade(source, &vectors);
    assert_eq!(
        outcome.results.iter().map(|r| r.passed).collect::<Vec<_>>(),
        [true, true, true, true, false]
    );
    assert_eq!(outcome.actual(0, "y"), Some("0010"));
}

#[test]
fn repeated_grading_is_deterministic() {
    let vectors = truth_table(&["a", "b"], &["out"], |v| vec![(v[0] & v[1]).to_string()]);
    let first = grade(AND_GATE, &vectors);
    let second = grade(AND_GATE, &vectors);
    assert_eq!(first.results, second.results);
}

#[test]
fn actual_lists_exactly_the_outputs() {
    let source = r#"
module split(input [1:0] a, output hi, output lo);
  wire unused;
  assign unused = a[0] ^ a[1];
  assign hi = a[1];
  assign lo = a[0];
endmodule
"#;
    let outcome = grade(source, &[TestVector::new("", &[("a", "10")], &[("hi", "1")])]);
    let actual = outcome.results[0].actual.as_ref().unwrap();
    assert_eq!(actual.keys().collect::<Vec<_>>(), ["hi", "lo"]);
}

#[test]
fn empty_vector_list() {
    assert!(grade(AND_GATE, &[]).results.is_empty());
}

#[test]
fn vectors_from_problem_json() {
    let json = r#"[
        {"inputs": {"a": "1", "b": "1"}, "outputs": {"out": "1"}, "description": "both"},
        {"inputs": {"a": "0", "b": "1"}, "outputs": {"out": "0"}, "description": "one"}
    ]"#;
    let vectors: Vec<TestVector> = serde_json::from_str(json).unwrap();
    assert_all_pass(&grade(AND_GATE, &vectors));
}
