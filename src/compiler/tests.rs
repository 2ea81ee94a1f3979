//! Unit tests for code generation.
//!
//! This module checks the emitted listing for:
//! - The preamble and function frames
//! - Constant folding and its interaction with loops
//! - Calls, vectors and one-byte types
//! - Configuration of the static segment

use std::rc::Rc;

use crate::{
    config::{CodegenConfig, StaticSegmentBase},
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};

use super::{
    compiler::compile,
    iloc::{CompareOp, Instruction, Label, Operation, Register, Width},
};

fn generate_with(source: &str, config: &CodegenConfig) -> Vec<String> {
    let tokens = tokenize(source.to_string(), Some("test.lang".to_string())).unwrap();
    let program = parse(tokens, Rc::new("test.lang".to_string())).1.unwrap();
    let typed = type_check(&program).unwrap();

    compile(&typed, config)
        .unwrap()
        .instructions()
        .iter()
        .map(|instruction| instruction.to_string())
        .collect()
}

fn generate(source: &str) -> Vec<String> {
    generate_with(source, &CodegenConfig::default())
}

fn contains(lines: &[String], line: &str) -> bool {
    lines.iter().any(|candidate| candidate == line)
}

#[test]
fn test_operation_syntax() {
    assert_eq!(Operation::LoadI(5, Register::R(1)).to_string(), "loadI 5 => r1");
    assert_eq!(
        Operation::LoadAI(Width::Byte, Register::Rfp, 16, Register::R(2)).to_string(),
        "cloadAI rfp, 16 => r2"
    );
    assert_eq!(
        Operation::StoreAO(Width::Word, Register::R(1), Register::Rbss, Register::R(2)).to_string(),
        "storeAO r1 => rbss, r2"
    );
    assert_eq!(
        Operation::Compare(CompareOp::Ge, Register::R(1), Register::R(2), Register::R(3)).to_string(),
        "cmp_GE r1, r2 -> r3"
    );
    assert_eq!(
        Operation::Cbr(Register::R(4), Label(1), Label(2)).to_string(),
        "cbr r4 -> L1, L2"
    );
    assert_eq!(Instruction::labelled(Label(3), Operation::Nop).to_string(), "L3: nop");
}

#[test]
fn test_empty_main() {
    let lines = generate("int main() { }");

    assert_eq!(
        lines,
        vec![
            "loadI 1024 => rfp",
            "loadI 1024 => rsp",
            "loadI 18 => rbss",
            "loadI 8 => r0",
            "storeAI r0 => rsp, 0",
            "storeAI rsp => rsp, 4",
            "storeAI rfp => rsp, 8",
            "jumpI -> L0",
            "halt",
            "L0: nop",
            "i2i rsp => rfp",
            "addI rsp, 16 => rsp",
            "loadAI rfp, 0 => r1",
            "loadAI rfp, 4 => r2",
            "loadAI rfp, 8 => r3",
            "i2i r2 => rsp",
            "i2i r3 => rfp",
            "jump -> r1",
        ]
    );
}

#[test]
fn test_fixed_static_segment() {
    let config = CodegenConfig {
        stack_base: 2048,
        static_segment: StaticSegmentBase::Fixed(500),
    };
    let lines = generate_with("int main() { }", &config);

    assert_eq!(lines[0], "loadI 2048 => rfp");
    assert_eq!(lines[2], "loadI 500 => rbss");
}

#[test]
fn test_missing_main_jumps_nowhere() {
    let lines = generate("int f() { return 1; }");

    assert_eq!(lines[7], "nop");
    assert_eq!(lines[8], "halt");
}

#[test]
fn test_constant_folding() {
    let lines = generate("int main() { int b <= 20, c <= 30, a; a = b + c; return 0; }");

    assert!(contains(&lines, "loadI 20 => r1"));
    assert!(contains(&lines, "storeAI r1 => rfp, 16"));
    assert!(contains(&lines, "loadI 50 => r3"));
    assert!(contains(&lines, "storeAI r3 => rfp, 24"));
    assert!(!lines.iter().any(|line| line.starts_with("add ")));
}

#[test]
fn test_memory_operands() {
    let lines = generate("int main() { int b, c, a; a = b + c; return 0; }");

    assert!(contains(&lines, "addI rsp, 4 => rsp"));
    assert!(contains(&lines, "loadAI rfp, 16 => r1"));
    assert!(contains(&lines, "loadAI rfp, 20 => r2"));
    assert!(contains(&lines, "add r1, r2 => r3"));
    assert!(contains(&lines, "storeAI r3 => rfp, 24"));
}

#[test]
fn test_immediate_forms() {
    let lines = generate("int main() { int a, b; b = a * 3 - 2; return 0; }");

    assert!(contains(&lines, "multI r1, 3 => r2"));
    assert!(contains(&lines, "subI r2, 2 => r3"));
}

#[test]
fn test_assignment_ends_constant_status() {
    let lines = generate("int main() { int a <= 1, b; input a; b = a + 1; return 0; }");

    assert!(contains(&lines, "loadAI rfp, 16 => r2"));
    assert!(contains(&lines, "addI r2, 1 => r3"));
}

#[test]
fn test_loop_variables_are_not_folded() {
    let lines = generate("int main() { int i <= 0; while (i < 10) do { i = i + 1; }; return i; }");

    assert!(lines.iter().any(|line| line.starts_with("cmp_LT")));
    assert!(lines.iter().any(|line| line.starts_with("cbr")));
    assert!(contains(&lines, "jumpI -> L1"));
    assert!(contains(&lines, "L2: nop"));
}

#[test]
fn test_constant_false_condition_jumps() {
    let lines = generate("int main() { int a; if (1 > 2) { a = 1; }; return 0; }");

    assert!(contains(&lines, "jumpI -> L1"));
    assert!(!lines.iter().any(|line| line.starts_with("cbr")));
}

#[test]
fn test_call_sequence() {
    let lines = generate("int f(int a) { return a; } int main() { return f(3); }");

    assert_eq!(lines[7], "jumpI -> L1");
    let call = lines.iter().position(|line| line.starts_with("addI rpc, 5 =>")).unwrap();
    assert!(lines[call - 1].starts_with("storeAI") && lines[call - 1].ends_with("=> rsp, 16"));
    assert!(lines[call + 1].starts_with("storeAI") && lines[call + 1].ends_with("=> rsp, 0"));
    assert_eq!(lines[call + 2], "storeAI rsp => rsp, 4");
    assert_eq!(lines[call + 3], "storeAI rfp => rsp, 8");
    assert_eq!(lines[call + 4], "jumpI -> L0");
    assert!(lines[call + 5].starts_with("loadAI rsp, 12 =>"));
}

#[test]
fn test_function_frame_reserves_parameters() {
    let lines = generate("int f(int a, char c, float x) { return a; } int main() { return 0; }");

    assert!(contains(&lines, "addI rsp, 29 => rsp"));
}

#[test]
fn test_vector_access() {
    let lines = generate("int g; int v[10]; int main() { int i; v[2] = 7; v[i] = 1; g = v[3]; return 0; }");

    assert!(contains(&lines, "storeAI r1 => rbss, 12"));
    assert!(lines.iter().any(|line| line.starts_with("multI") && line.contains(", 4 =>")));
    assert!(lines.iter().any(|line| line.starts_with("storeAO")));
    assert!(lines.iter().any(|line| line.starts_with("loadAI rbss, 16 =>")));
}

#[test]
fn test_one_byte_types() {
    let lines = generate("int main() { char c <= 'a'; bool b; b = true; return 0; }");

    assert!(contains(&lines, "loadI 97 => r1"));
    assert!(contains(&lines, "cstoreAI r1 => rfp, 16"));
    assert!(contains(&lines, "cstoreAI r2 => rfp, 17"));
}

#[test]
fn test_modulo_lowering() {
    let lines = generate("int main() { int a, b, c; c = a % b; c = 7 % 3; return 0; }");

    assert!(contains(&lines, "div r1, r2 => r3"));
    assert!(contains(&lines, "mult r3, r2 => r4"));
    assert!(contains(&lines, "sub r1, r4 => r5"));
    assert!(contains(&lines, "loadI 1 => r6"));
}

#[test]
fn test_logical_folding() {
    let lines = generate("int main() { bool a, b; a = true && false; b = a || true; return 0; }");

    assert!(contains(&lines, "loadI 0 => r1"));
    // `a` is only known in memory, but `|| true` still decides the result.
    assert!(contains(&lines, "cmp_NE r2, r3 -> r4"));
    assert!(contains(&lines, "loadI 1 => r5"));
    assert!(!lines.iter().any(|line| line.starts_with("or ")));
}

#[test]
fn test_break_outside_loop_is_nop() {
    let lines = generate("int main() { break; return 0; }");

    assert_eq!(lines[12], "nop");
}

#[test]
fn test_float_truncation() {
    let lines = generate("int main() { int a <= 2.9; return 0; }");

    assert!(contains(&lines, "loadI 2 => r1"));
}

#[test]
fn test_call_starts_past_branch_locals() {
    let lines = generate(
        "int g; int f() { return 99; }
         int main() { int c; c = 0; if (c == 1) { int skipped; skipped = 1; }; int a; a = 7; g = f(); g = a; return 0; }",
    );

    // `c`, `skipped` and `a` end at 28 whether or not the branch ran.
    assert!(lines.iter().any(|line| line.starts_with("storeAI") && line.ends_with("=> rfp, 24")));
    let call = lines.iter().position(|line| line.starts_with("addI rpc, 5 =>")).unwrap();
    assert_eq!(lines[call - 1], "addI rfp, 28 => rsp");
}

#[test]
fn test_call_inside_loop_resets_stack_pointer() {
    let lines = generate(
        "int f() { return 1; } int main() { int i; i = 0; while (i < 3) do { int t; t = f(); i = i + 1; }; return i; }",
    );

    let call = lines.iter().position(|line| line.starts_with("addI rpc, 5 =>")).unwrap();
    assert_eq!(lines[call - 1], "addI rfp, 24 => rsp");
}

#[test]
fn test_call_arguments_follow_stack_reset() {
    let lines = generate("int f(int a) { return a; } int main() { return f(3); }");

    let call = lines.iter().position(|line| line.starts_with("addI rpc, 5 =>")).unwrap();
    assert_eq!(lines[call - 2], "addI rfp, 16 => rsp");
    assert!(lines[call - 1].ends_with("=> rsp, 16"));
}

#[test]
fn test_initializer_sees_its_own_slot() {
    let lines = generate("int main() { int a <= a; return a; }");

    assert!(contains(&lines, "loadAI rfp, 16 => r1"));
    assert!(contains(&lines, "storeAI r1 => rfp, 16"));
}

#[test]
fn test_huge_constant_index_is_computed() {
    let lines = generate("int v[2]; int main() { v[4611686018427387904] = 1; return 0; }");

    assert!(contains(&lines, "loadI 4611686018427387904 => r2"));
    assert!(contains(&lines, "multI r2, 4 => r3"));
    assert!(contains(&lines, "storeAO r1 => rbss, r4"));
}

#[test]
fn test_bitwise_lowering() {
    let lines = generate("int main() { int a, b; b = a | 5; b = a ^ b; b = 6 & 3; return 0; }");

    assert!(contains(&lines, "or r1, r2 => r3"));
    assert!(contains(&lines, "xor r4, r5 => r6"));
    assert!(contains(&lines, "loadI 2 => r7"));
}

#[test]
fn test_prefix_operator_lowering() {
    let lines = generate("int main() { int a; bool t; t = ?a; a = *&a; a = #7; return 0; }");

    assert!(contains(&lines, "cmp_NE r1, r2 -> r3"));
    assert!(contains(&lines, "cstoreAI r3 => rfp, 20"));
    assert!(contains(&lines, "addI rfp, 16 => r4"));
    assert!(contains(&lines, "loadAI r4, 0 => r5"));
    assert!(contains(&lines, "loadI 7 => r6"));
}
