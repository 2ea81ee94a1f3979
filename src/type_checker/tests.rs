//! Unit tests for semantic analysis.
//!
//! This module contains tests for:
//! - Implicit conversions and type inference
//! - The scope stack
//! - Each diagnostic the analyzer can raise
//! - The shape of the typed program

use std::rc::Rc;

use crate::{
    ast::types::DataType,
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    Position, Span,
};

use super::{
    coercion::{can_coerce, check_assignment, infer, size_of, EXPECTED_NUMERIC},
    scope::{ScopeEntry, ScopeStack},
    type_checker::type_check,
    typed_ast::{TypedExprKind, TypedItem, TypedProgram, TypedStmt},
};

fn check(source: &str) -> Result<TypedProgram, Error> {
    let tokens = tokenize(source.to_string(), Some("test.lang".to_string()))?;
    let program = parse(tokens, Rc::new("test.lang".to_string())).1?;
    type_check(&program)
}

fn error_of(source: &str) -> Error {
    match check(source) {
        Ok(_) => panic!("Expected a semantic error for: {}", source),
        Err(error) => error,
    }
}

fn main_body(program: &TypedProgram) -> Vec<TypedStmt> {
    program
        .items
        .iter()
        .find_map(|item| match item {
            TypedItem::Function(function) if function.name == "main" => Some(function.body.statements.clone()),
            _ => None,
        })
        .unwrap()
}

#[derive(Debug)]
struct Entry(Span);

impl ScopeEntry for Entry {
    fn declared_at(&self) -> &Span {
        &self.0
    }
}

fn span(start: u32) -> Span {
    let file = Rc::new("test.lang".to_string());
    Span {
        start: Position(start, Rc::clone(&file)),
        end: Position(start + 1, file),
    }
}

#[test]
fn test_coercion_rules() {
    assert!(can_coerce(DataType::Int, DataType::Float));
    assert!(can_coerce(DataType::Bool, DataType::Int));
    assert!(can_coerce(DataType::Char, DataType::Char));
    assert!(!can_coerce(DataType::Char, DataType::Int));
    assert!(!can_coerce(DataType::Int, DataType::String));

    assert_eq!(infer(DataType::Int, DataType::Float, EXPECTED_NUMERIC), Ok(DataType::Float));
    assert_eq!(infer(DataType::Bool, DataType::Int, EXPECTED_NUMERIC), Ok(DataType::Int));
    assert_eq!(infer(DataType::Bool, DataType::Bool, EXPECTED_NUMERIC), Ok(DataType::Bool));
    assert_eq!(
        infer(DataType::Int, DataType::Char, EXPECTED_NUMERIC),
        Err(ErrorImpl::CharToX {
            target: "int or float".to_string()
        })
    );
}

#[test]
fn test_assignment_rules() {
    assert!(check_assignment(DataType::Float, DataType::Bool).is_ok());
    assert_eq!(
        check_assignment(DataType::Int, DataType::Char),
        Err(ErrorImpl::WrongType {
            received: "char".to_string()
        })
    );
    assert_eq!(
        check_assignment(DataType::String, DataType::Int),
        Err(ErrorImpl::StringToX {
            target: "int".to_string()
        })
    );
    assert_eq!(
        check_assignment(DataType::Char, DataType::Float),
        Err(ErrorImpl::CharToX {
            target: "float".to_string()
        })
    );
}

#[test]
fn test_sizes() {
    assert_eq!(size_of(DataType::Char, 0), 1);
    assert_eq!(size_of(DataType::Bool, 0), 1);
    assert_eq!(size_of(DataType::Int, 0), 4);
    assert_eq!(size_of(DataType::Float, 0), 8);
    assert_eq!(size_of(DataType::String, 7), 7);
}

#[test]
fn test_scope_stack_redeclaration_and_shadowing() {
    let mut scopes: ScopeStack<Entry> = ScopeStack::new();

    scopes.declare("a", Entry(span(0)), &span(0)).unwrap();
    let error = scopes.declare("a", Entry(span(10)), &span(10)).unwrap_err();
    assert_eq!(error.code(), 11);
    assert_eq!(error.get_first_occurrence().unwrap().start.0, 0);
    assert_eq!(error.get_occurrence().start.0, 10);

    scopes.enter_scope();
    scopes.declare("a", Entry(span(20)), &span(20)).unwrap();
    assert_eq!(scopes.resolve("a", &span(30)).unwrap().0.start.0, 20);

    scopes.exit_scope();
    assert_eq!(scopes.resolve("a", &span(30)).unwrap().0.start.0, 0);
    assert_eq!(scopes.resolve("b", &span(30)).unwrap_err().code(), 10);
}

#[test]
fn test_scope_stack_keeps_global_frame() {
    let mut scopes: ScopeStack<Entry> = ScopeStack::new();
    scopes.declare("g", Entry(span(0)), &span(0)).unwrap();

    scopes.exit_scope();
    scopes.exit_scope();

    assert!(scopes.is_global());
    assert_eq!(scopes.depth(), 1);
    assert!(scopes.lookup("g").is_some());
}

#[test]
fn test_valid_program() {
    let source = "int g; float v[4];
    int f(int n, float x) { return n; }
    int main() {
        int a <= 1, b;
        b = a + 2;
        v[a] = b * 1.5;
        if (a < b) { int a; a = 3; };
        while (b > 0) do { b = b - 1; };
        for (a = 0 : a < 10 : a = a + 1) { g = g + f(a, 2.0); };
        b << 16;
        output b;
        return f(a, b);
    }";

    assert!(check(source).is_ok());
}

#[test]
fn test_recursive_call_resolves() {
    assert!(check("int fat(int n) { return n * fat(n - 1); }").is_ok());
}

#[test]
fn test_undeclared() {
    let error = error_of("int main() { a = 1; return 0; }");

    assert_eq!(error.code(), 10);
    assert_eq!(error.get_occurrence().start.0, 13);
}

#[test]
fn test_redeclaration_in_same_scope() {
    let error = error_of("int abc; bool abc;");

    assert_eq!(error.code(), 11);
    assert_eq!(error.get_first_occurrence().unwrap().start.0, 4);
    assert_eq!(error.get_occurrence().start.0, 14);
}

#[test]
fn test_parameter_and_local_share_a_frame() {
    assert_eq!(error_of("int f(int a) { int a; return 0; }").code(), 11);
}

#[test]
fn test_shadowing_in_nested_block() {
    assert!(check("int a; int main() { int a; { int a; }; return 0; }").is_ok());
}

#[test]
fn test_identifier_misuse() {
    let error = error_of("int v[3]; int main() { v = 1; return 0; }");
    assert_eq!(error.code(), 21);
    assert_eq!(
        error.get_error(),
        &ErrorImpl::VectorMisuse {
            identifier: "v".to_string(),
            used_as: "variable".to_string()
        }
    );
    assert_eq!(error.get_first_occurrence().unwrap().start.0, 4);

    assert_eq!(error_of("int a; int main() { a(); return 0; }").code(), 20);
    assert_eq!(error_of("int a; int main() { a[1] = 2; return 0; }").code(), 20);
    assert_eq!(error_of("int f() { return 0; } int main() { int x; x = f; return 0; }").code(), 22);
}

#[test]
fn test_wrong_type_in_attribution() {
    let error = error_of("int main() { int a; a = 'c'; return 0; }");
    assert_eq!(error.code(), 30);
    assert_eq!(
        error.get_error(),
        &ErrorImpl::WrongType {
            received: "char".to_string()
        }
    );

    assert_eq!(error_of("int main() { string s; s = 1; return 0; }").code(), 31);
    assert_eq!(error_of("int main() { char c; c = 1; return 0; }").code(), 32);
    assert_eq!(error_of("int main() { int a <= \"abc\"; return 0; }").code(), 30);
}

#[test]
fn test_char_in_arithmetic() {
    let error = error_of("int main() { int a; a = 'c' + 1; return 0; }");

    assert_eq!(error.code(), 32);
    assert_eq!(
        error.get_error(),
        &ErrorImpl::CharToX {
            target: "int or float".to_string()
        }
    );
    // Points at the operator.
    assert_eq!(error.get_occurrence().start.0, 28);
}

#[test]
fn test_string_condition() {
    let error = error_of("int main() { string s; if (s) { }; return 0; }");

    assert_eq!(error.code(), 31);
    assert_eq!(
        error.get_error(),
        &ErrorImpl::StringToX {
            target: "bool".to_string()
        }
    );
}

#[test]
fn test_string_capacity() {
    let error = error_of("int main() { string s <= \"ab\"; s = \"abc\"; return 0; }");
    assert_eq!(error.code(), 33);
    assert_eq!(error.get_error(), &ErrorImpl::StringMax { capacity: 2, length: 3 });

    assert!(check("int main() { string s <= \"abcd\"; string t <= s; t = \"dcba\"; return 0; }").is_ok());
    assert_eq!(
        error_of("int main() { string s; string t <= \"x\"; s = t; return 0; }").code(),
        33
    );
}

#[test]
fn test_string_vector() {
    let error = error_of("string aaa[1];");

    assert_eq!(error.code(), 34);
    assert_eq!(error.get_occurrence().start.0, 0);
    assert_eq!(error.get_occurrence().end.0, 13);
}

#[test]
fn test_argument_count_and_types() {
    let functions = "int f(int a, float b) { return a; }";

    let error = error_of(&format!("{} int main() {{ return f(1); }}", functions));
    assert_eq!(error.code(), 40);
    assert_eq!(error.get_first_occurrence().unwrap().start.0, 4);

    assert_eq!(error_of(&format!("{} int main() {{ return f(1, 2, 3); }}", functions)).code(), 41);

    let error = error_of(&format!("{} int main() {{ return f(1, 'c'); }}", functions));
    assert_eq!(error.code(), 42);
    assert_eq!(
        error.get_error(),
        &ErrorImpl::WrongTypeArgs {
            function: "f".to_string(),
            index: 2,
            expected: "float".to_string(),
            received: "char".to_string()
        }
    );

    assert!(check(&format!("{} int main() {{ return f(true, 1); }}", functions)).is_ok());
}

#[test]
fn test_string_in_function_signature() {
    let error = error_of("string f() { return 0; }");
    assert_eq!(error.code(), 43);
    assert_eq!(
        error.get_error(),
        &ErrorImpl::FunctionString {
            identifier: "f".to_string(),
            role: "return".to_string()
        }
    );

    assert_eq!(error_of("int f(string s) { return 0; }").code(), 43);
}

#[test]
fn test_input_and_output_arguments() {
    let error = error_of("int main() { char c; input c; return 0; }");
    assert_eq!(error.code(), 50);
    assert!(error.get_first_occurrence().is_some());

    let error = error_of("int main() { bool b; output b; return 0; }");
    assert_eq!(error.code(), 51);
    assert!(error.get_first_occurrence().is_some());

    let error = error_of("int main() { output 'c'; return 0; }");
    assert_eq!(error.code(), 51);
    assert!(error.get_first_occurrence().is_none());

    assert!(check("int main() { float x; input x; output x; output 2; return 0; }").is_ok());
}

#[test]
fn test_return_compatibility() {
    let error = error_of("int main() { return 'c'; }");

    assert_eq!(error.code(), 52);
    assert_eq!(
        error.get_error(),
        &ErrorImpl::WrongParReturn {
            expected: "int".to_string(),
            received: "char".to_string()
        }
    );
    assert!(check("int main() { return 1.5; }").is_ok());
}

#[test]
fn test_shift_amount() {
    let error = error_of("int main() { int a; a << 17; return 0; }");

    assert_eq!(error.code(), 53);
    assert_eq!(error.get_error(), &ErrorImpl::WrongParShift { received: 17 });
    assert_eq!(error.get_occurrence().start.0, 25);

    assert!(check("int main() { int a; a >> 16; return 0; }").is_ok());
}

#[test]
fn test_expression_types() {
    let program = check("int main() { bool b; float f; int x; x = -b; f = x + f; b = x < f; return 0; }").unwrap();
    let body = main_body(&program);

    let types: Vec<DataType> = body
        .iter()
        .filter_map(|stmt| match stmt {
            TypedStmt::Assign { value, .. } => Some(value.data_type),
            _ => None,
        })
        .collect();
    assert_eq!(types, vec![DataType::Int, DataType::Float, DataType::Bool]);
}

#[test]
fn test_declarations_carry_sizes() {
    let program = check("int main() { int a, b <= 2; string s <= \"hello\"; char c; return 0; }").unwrap();
    let body = main_body(&program);

    let sizes: Vec<(String, u32)> = body
        .iter()
        .filter_map(|stmt| match stmt {
            TypedStmt::Declare { name, size, .. } => Some((name.clone(), *size)),
            _ => None,
        })
        .collect();
    assert_eq!(
        sizes,
        vec![
            ("a".to_string(), 4),
            ("b".to_string(), 4),
            ("s".to_string(), 5),
            ("c".to_string(), 1)
        ]
    );

    match &body[1] {
        TypedStmt::Declare {
            initializer: Some(value), ..
        } => assert!(matches!(value.kind, TypedExprKind::Literal(_))),
        _ => panic!("Expected an initialized declaration"),
    }
}

#[test]
fn test_global_sizes() {
    let program = check("int v[10]; char c; float f[2];").unwrap();

    let sizes: Vec<u32> = program
        .items
        .iter()
        .filter_map(|item| match item {
            TypedItem::Global(global) => Some(global.size),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![40, 1, 16]);
}

#[test]
fn test_assignment_target_is_checked_before_value() {
    let source = "bool bbb() {\n  bbb[3] = aaa;\n  return true;\n}";
    let error = error_of(source);

    assert_eq!(error.code(), 22);
    assert_eq!(
        error.render(source),
        "Function identifier used as vector: \"bbb\"\n\
         First occurrence at line 1, column 6:\nbool bbb() {\n     ^^^\n\
         And again at line 2, column 3:\n  bbb[3] = aaa;\n  ^^^"
    );
}

#[test]
fn test_declaration_precedes_initializer() {
    assert_eq!(error_of("int main() { int a; int a <= b; return 0; }").code(), 11);
    assert_eq!(error_of("int main() { int a; int a <= 'c'; return 0; }").code(), 11);

    // The new name is already visible to its own initializer.
    assert!(check("int main() { int a <= a; return 0; }").is_ok());
}

#[test]
fn test_initializer_still_sets_string_capacity() {
    let error = error_of("int main() { string s <= \"123\"; s = \"1234\"; return 0; }");

    assert_eq!(
        error.get_error(),
        &ErrorImpl::StringMax {
            capacity: 3,
            length: 4
        }
    );
}

#[test]
fn test_unary_boolean() {
    for operand in ["1", "bbb", "1.1", "true", "fff", "ccc"] {
        let source = format!(
            "bool main() {{ bool aaa; int bbb <= 1; float fff <= 1.1; bool ccc; aaa = ?{}; return aaa; }}",
            operand
        );
        assert!(check(&source).is_ok(), "?{} should be accepted", operand);
    }

    let source = "int main() {\n  bool aaa;\n  aaa = ?'1';\n  return 0;\n}";
    let error = error_of(source);
    assert_eq!(error.code(), 32);
    assert_eq!(
        error.render(source),
        "Invalid type conversion from \"char\" to \"bool\"\nOccurrence at line 3, column 9:\n  aaa = ?'1';\n        ^"
    );

    let error = error_of("int main() { bool aaa; string bbb <= \"1\"; aaa = ?bbb; return 0; }");
    assert_eq!(
        error.get_error(),
        &ErrorImpl::StringToX {
            target: "bool".to_string()
        }
    );
}

#[test]
fn test_bitwise_and_prefix_operator_types() {
    let program = check("int main() { int a; float f; bool b; a = 6 | f ^ b & 2; a = #'c'; f = *&f; b = ?f; return 0; }").unwrap();
    let body = main_body(&program);

    let types: Vec<DataType> = body
        .iter()
        .filter_map(|stmt| match stmt {
            TypedStmt::Assign { value, .. } => Some(value.data_type),
            _ => None,
        })
        .collect();
    assert_eq!(types, vec![DataType::Int, DataType::Int, DataType::Float, DataType::Bool]);

    let error = error_of("int main() { int a; a = 'c' | 1; return 0; }");
    assert_eq!(
        error.get_error(),
        &ErrorImpl::CharToX {
            target: "int".to_string()
        }
    );
}

#[test]
fn test_vector_size_overflow_is_reported() {
    let error = error_of("int v[2000000000];");

    assert_eq!(error.code(), 2);
    assert_eq!(error.get_error_name(), "VectorTooLarge");
    assert!(check("char v[2000000000];").is_ok());
}
