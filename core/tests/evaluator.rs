//! Evaluation semantics: arithmetic, scoping, constants, functions and closures.

use rubric_core::error::{RubricError, RuntimeError};
use rubric_core::interpreter::Value;
use rubric_core::run_source;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn eval(code: &str) -> Result<Value, RubricError> {
    init_tracing();
    run_source(code, Vec::new())
}

fn eval_ok(code: &str) -> Value {
    match eval(code) {
        Ok(value) => value,
        Err(err) => panic!("{} failed: {}", code, err),
    }
}

fn runtime_error(code: &str) -> RuntimeError {
    match eval(code) {
        Err(RubricError::Runtime(err)) => err,
        other => panic!("expected runtime error for {}, got {:?}", code, other),
    }
}

#[test]
fn test_integer_arithmetic() {
    let cases = [
        ("5 + 5 + 5 + 5 - 10;", 10),
        ("2 * 2 * 2 * 2 * 2;", 32),
        ("-50 + 100 + -50;", 0),
        ("20 + 2 * -10;", 0),
        ("50 / 2 * 2 + 10;", 60),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10;", 50),
        ("10 / 3;", 3),
        ("10 % 3;", 1),
        ("-7 / 2;", -3),
        ("-7 % 2;", -1),
    ];

    for (code, expected) in cases {
        assert_eq!(eval_ok(code), Value::Integer(expected), "{}", code);
    }
}

#[test]
fn test_mixed_numeric_promotion() {
    let cases = [
        ("5 + 5.0;", 10.0),
        ("5.0 + 5;", 10.0),
        ("5 - 1.5;", 3.5),
        ("2.5 * 4;", 10.0),
        ("10 / 4.0;", 2.5),
        ("2.0 * (5.0 + 10.0);", 30.0),
    ];

    for (code, expected) in cases {
        match eval_ok(code) {
            Value::Float(actual) => assert!((actual - expected).abs() < 1e-9, "{}", code),
            other => panic!("{} produced {:?}, expected a float", code, other),
        }
    }
}

#[test]
fn test_comparisons_and_equality() {
    let cases = [
        ("1 < 2;", true),
        ("2 <= 2;", true),
        ("1 >= 2;", false),
        ("(1 < 2) == true;", true),
        ("\"hello\" == \"hello\";", true),
        ("\"hello\" != \"world\";", true),
        ("\"apple\" < \"banana\";", true),
        ("5.0 == 5;", true),
        ("5 == 5.0;", true),
        ("5.1 != 5;", true),
        ("10.0 == \"10\";", true),
        ("true == 1;", false),
    ];

    for (code, expected) in cases {
        assert_eq!(eval_ok(code), Value::Boolean(expected), "{}", code);
    }
}

#[test]
fn test_prefix_operators() {
    assert_eq!(eval_ok("!true;"), Value::Boolean(false));
    assert_eq!(eval_ok("!0;"), Value::Boolean(true));
    assert_eq!(eval_ok("!\"\";"), Value::Boolean(true));
    assert_eq!(eval_ok("!\"hello\";"), Value::Boolean(false));
    assert_eq!(eval_ok("-5.5;"), Value::Float(-5.5));
    assert_eq!(
        runtime_error("-true;"),
        RuntimeError::UnsupportedPrefix {
            operator: "-".to_string(),
            operand: "boolean".to_string(),
        }
    );
}

#[test]
fn test_string_concatenation() {
    assert_eq!(
        eval_ok("\"Hello\" + \" \" + \"World!\";"),
        Value::String("Hello World!".to_string())
    );
    assert_eq!(
        eval_ok("\"n = \" + 10.0;"),
        Value::String("n = 10".to_string())
    );
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(eval_ok("false && (1 / 0);"), Value::Boolean(false));
    assert_eq!(eval_ok("true || (1 / 0);"), Value::Boolean(true));
    assert_eq!(eval_ok("1 < 2 && 2 < 3;"), Value::Boolean(true));
    assert_eq!(eval_ok("1 && \"x\";"), Value::Boolean(true));
    assert_eq!(eval_ok("0 || \"\";"), Value::Boolean(false));
    assert_eq!(runtime_error("true && (1 / 0);"), RuntimeError::DivisionByZero);
}

#[test]
fn test_division_and_modulo_by_zero() {
    assert_eq!(runtime_error("1 / 0;"), RuntimeError::DivisionByZero);
    assert_eq!(runtime_error("1.5 / 0;"), RuntimeError::DivisionByZero);
    assert_eq!(runtime_error("1 % 0;"), RuntimeError::ModuloByZero);
}

#[test]
fn test_blocks_and_shadowing() {
    assert_eq!(eval_ok("{ 5; 10; }"), Value::Integer(10));
    assert_eq!(eval_ok("{ var a = 1; a + 2; }"), Value::Integer(3));
    assert_eq!(eval_ok("{ }"), Value::Null);
    assert_eq!(eval_ok("var x = 10; { var x = 5; } x;"), Value::Integer(10));
    assert_eq!(eval_ok("var a = 1; { var a = 2; a; } a;"), Value::Integer(1));
    assert_eq!(
        eval_ok("var global = 10; { var local = 5; global + local; }"),
        Value::Integer(15)
    );
    assert_eq!(
        runtime_error("{ var hidden = 1; } hidden;"),
        RuntimeError::UndefinedIdentifier("hidden".to_string())
    );
}

#[test]
fn test_declarations_and_assignment() {
    assert_eq!(eval_ok("var age = 30; age;"), Value::Integer(30));
    assert_eq!(eval_ok("const pi = 3.5; pi;"), Value::Float(3.5));
    assert_eq!(eval_ok("var x = 5; x = 10; x;"), Value::Integer(10));
    assert_eq!(eval_ok("var y: int; y = 99;"), Value::Integer(99));
    assert_eq!(eval_ok("var y: int; y;"), Value::Null);
    assert_eq!(eval_ok("var a = 1; var b = 2; a = b = 7; a + b;"), Value::Integer(14));
    assert_eq!(eval_ok("var o = 1; { o = 2; } o;"), Value::Integer(2));
}

#[test]
fn test_declaration_errors() {
    let err = runtime_error("var name = \"Rubric\"; var name = \"Lang\";");
    assert_eq!(
        err.to_string(),
        "Identifier 'name' has already been declared in this scope."
    );

    let err = runtime_error("const count = 100; count = 200;");
    assert_eq!(err.to_string(), "Assignment to constant variable 'count'.");

    let err = runtime_error("const c = 1; c = 2;");
    assert_eq!(err, RuntimeError::ConstantAssignment("c".to_string()));

    let err = runtime_error("missing = 1;");
    assert_eq!(err.to_string(), "Identifier 'missing' not found for assignment.");

    let err = runtime_error("myUndefinedVar;");
    assert_eq!(err.to_string(), "identifier not found: myUndefinedVar");
}

#[test]
fn test_if_else() {
    assert_eq!(eval_ok("if (true) { 10; }"), Value::Integer(10));
    assert_eq!(eval_ok("if (false) { 10; }"), Value::Null);
    assert_eq!(eval_ok("if (1 > 2) { 10; } else { 20; }"), Value::Integer(20));
    assert_eq!(
        eval_ok("var n = 0; if (n > 0) { \"pos\"; } else if (n < 0) { \"neg\"; } else { \"zero\"; }"),
        Value::String("zero".to_string())
    );
    assert_eq!(eval_ok("1 > 2 ? \"a\" : \"b\";"), Value::String("b".to_string()));
}

#[test]
fn test_loops() {
    let code = r#"
        var i = 0;
        var result = 0;
        while (i < 5) {
            result = result + i;
            i = i + 1;
        }
        result;
    "#;
    assert_eq!(eval_ok(code), Value::Integer(10));

    let code = r#"
        var i = 5;
        var result = 0;
        do {
            result = result + i;
            i = i + 1;
        } while (i < 5);
        result;
    "#;
    assert_eq!(eval_ok(code), Value::Integer(5));

    let code = r#"
        var outerI = 100;
        var total = 0;
        for (var i = 0; i < 3; i = i + 1) {
            total = total + i;
        }
        outerI + total;
    "#;
    assert_eq!(eval_ok(code), Value::Integer(103));

    assert_eq!(
        runtime_error("for (var i = 0; i < 3; i++) { } i;"),
        RuntimeError::UndefinedIdentifier("i".to_string())
    );
    assert_eq!(eval_ok("while (false) { 1; }"), Value::Null);
}

#[test]
fn test_for_body_scope_is_fresh_each_iteration() {
    let code = r#"
        var sum = 0;
        for (var i = 0; i < 3; i++) {
            var doubled = i * 2;
            sum = sum + doubled;
        }
        sum;
    "#;
    assert_eq!(eval_ok(code), Value::Integer(6));
}

#[test]
fn test_return_inside_loops_leaves_the_function() {
    let cases = [
        (
            "fn f(): int { var i = 0; while (true) { i++; if (i == 3) { return i; } } } f();",
            3,
        ),
        ("fn g(): int { for (;;) { return 4; } } g();", 4),
        (
            "fn h(): int { var n = 5; do { n = n + 1; if (n > 6) { return n; } } while (true); } h();",
            7,
        ),
        (
            "fn first(limit: int): int { for (var i = 1; i < limit; i++) { if (i % 4 == 0) { return i; } } return -1; } first(10);",
            4,
        ),
    ];

    for (code, expected) in cases {
        assert_eq!(eval_ok(code), Value::Integer(expected), "{}", code);
    }

    let code = r#"
        var count = 0;
        fn spin() { while (true) { count++; if (count == 3) { return; } } }
        spin();
        count;
    "#;
    assert_eq!(eval_ok(code), Value::Integer(3));
}

#[test]
fn test_errors_inside_loops_abort_them() {
    assert_eq!(
        runtime_error("var i = 0; while (i < 5) { i++; if (i == 2) { missing; } }"),
        RuntimeError::UndefinedIdentifier("missing".to_string())
    );
    assert_eq!(
        runtime_error("while (nope) { }"),
        RuntimeError::UndefinedIdentifier("nope".to_string())
    );
    assert_eq!(
        runtime_error("do { } while (undefinedFlag);"),
        RuntimeError::UndefinedIdentifier("undefinedFlag".to_string())
    );
    assert_eq!(
        runtime_error("for (var i = 0; i < 3; i = i / 0) { }"),
        RuntimeError::DivisionByZero
    );
    assert_eq!(
        runtime_error("for (var i = 0; i < 1 % 0; i++) { }"),
        RuntimeError::ModuloByZero
    );
}

#[test]
fn test_function_calls() {
    let code = "fn add(a: int, b: int): int { return a + b; } add(5, 10);";
    assert_eq!(eval_ok(code), Value::Integer(15));

    let code = r#"
        fn factorial(n: int): int {
            if (n <= 1) { return 1; }
            return n * factorial(n - 1);
        }
        factorial(5);
    "#;
    assert_eq!(eval_ok(code), Value::Integer(120));

    assert_eq!(
        eval_ok("fn(val: int): boolean { return val > 0; }(5);"),
        Value::Boolean(true)
    );
    assert_eq!(eval_ok("fn last(): int { 1; 2; } last();"), Value::Integer(2));
    assert_eq!(eval_ok("fn nothing() { return; } nothing();"), Value::Null);
}

#[test]
fn test_argument_type_checks() {
    let err = runtime_error("fn double(n: int): int { return n * 2; } double(\"two\");");
    assert_eq!(
        err,
        RuntimeError::ArgumentType {
            param: "n".to_string(),
            function: "double".to_string(),
            expected: "int".to_string(),
            actual: "string".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Type mismatch for parameter 'n' in function 'double': expected int, got string"
    );

    let err = runtime_error("fn add(a: int, b: int): int { return a + b; } add(1);");
    assert_eq!(
        err,
        RuntimeError::ArgumentCount {
            function: "add".to_string(),
            expected: 2,
            actual: 1,
        }
    );

    let err = runtime_error("fn half(n: int): int { return n / 2; } half(4.0);");
    assert!(matches!(err, RuntimeError::ArgumentType { .. }));
}

#[test]
fn test_float_parameter_promotes_integer() {
    let code = "fn half(x: float): float { return x / 2; } half(5);";
    assert_eq!(eval_ok(code), Value::Float(2.5));

    let code = "fn show(x: any): string { return \"\" + x; } show(true);";
    assert_eq!(eval_ok(code), Value::String("true".to_string()));

    let code = "fn apply(f: function, v: int): int { return f(v); } apply(fn(n: int): int { return n + 1; }, 1);";
    assert_eq!(eval_ok(code), Value::Integer(2));
}

#[test]
fn test_call_non_function() {
    assert_eq!(
        runtime_error("\"text\"(1);"),
        RuntimeError::NotCallable("string".to_string())
    );
}

#[test]
fn test_closures_capture_their_scope() {
    let code = r#"
        fn makeCounter(): function {
            var count = 0;
            return fn(): int {
                count = count + 1;
                return count;
            };
        }
        const counter = makeCounter();
        counter();
        counter();
        counter();
    "#;
    assert_eq!(eval_ok(code), Value::Integer(3));

    let code = r#"
        fn adder(x: int): function {
            return fn(y: int): int { return x + y; };
        }
        const addTwo = adder(2);
        const addTen = adder(10);
        addTwo(1) + addTen(1);
    "#;
    assert_eq!(eval_ok(code), Value::Integer(14));
}

#[test]
fn test_function_sees_later_outer_assignment() {
    let code = r#"
        var factor = 2;
        fn scale(n: int): int { return n * factor; }
        factor = 3;
        scale(5);
    "#;
    assert_eq!(eval_ok(code), Value::Integer(15));
}

#[test]
fn test_errors_inside_calls_propagate() {
    let code = r#"
        fn inner(): int { return 1 / 0; }
        fn outer(): int { var v = inner(); return v + 1; }
        outer();
    "#;
    assert_eq!(runtime_error(code), RuntimeError::DivisionByZero);
}

#[test]
fn test_parse_errors_prevent_evaluation() {
    let mut output = Vec::new();
    let result = run_source("display(1); var x: string = 5;", &mut output);

    match result {
        Err(RubricError::Parse(errors)) => assert_eq!(errors.len(), 1),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(output.is_empty());
}
