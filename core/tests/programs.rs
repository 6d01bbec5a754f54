//! End-to-end programs checked through their `display` output.

use pretty_assertions::assert_eq;
use rubric_core::error::RubricError;
use rubric_core::interpreter::{Environment, Interpreter};
use rubric_core::parser::parse_program;
use rubric_core::run_source;

/// Runs `code` and returns everything it displayed.
fn run_and_capture(code: &str) -> String {
    let mut output = Vec::new();
    if let Err(err) = run_source(code, &mut output) {
        panic!("program failed: {}", err);
    }
    String::from_utf8(output).expect("display output is utf-8")
}

#[test]
fn test_display_block_shadowing() {
    let code = r#"
        var x = 10;
        {
            var x = 5; // shadows the outer x
            display(x);
        }
        display(x);
    "#;

    assert_eq!(run_and_capture(code), "5\n10\n");
}

#[test]
fn test_display_joins_arguments_with_spaces() {
    let code = r#"
        const name = 'Rubric';
        display("hello", name, 1 + 1, 2.5, 10.0, true);
        display();
    "#;

    assert_eq!(run_and_capture(code), "hello Rubric 2 2.5 10 true\n\n");
}

#[test]
fn test_display_function_value() {
    let code = r#"
        fn add(a: int, b: int): int { return a + b; }
        display(add);
        display(fn(x: int) { });
    "#;

    assert_eq!(
        run_and_capture(code),
        "fn add(a, b) { ... }\nfn <anonymous>(x) { ... }\n"
    );
}

#[test]
fn test_fizzbuzz() {
    let code = r#"
        /* classic */
        for (var i = 1; i <= 15; i++) {
            if (i % 15 == 0) {
                display("FizzBuzz");
            } else if (i % 3 == 0) {
                display("Fizz");
            } else if (i % 5 == 0) {
                display("Buzz");
            } else {
                display(i);
            }
        }
    "#;

    let expected = "1\n2\nFizz\n4\nBuzz\nFizz\n7\n8\nFizz\nBuzz\n11\nFizz\n13\n14\nFizzBuzz\n";
    assert_eq!(run_and_capture(code), expected);
}

#[test]
fn test_recursive_fibonacci() {
    let code = r#"
        fn fib(n: int): int {
            return n < 2 ? n : fib(n - 1) + fib(n - 2);
        }
        var out = "";
        for (var i = 0; i < 10; i++) {
            out = out + fib(i) + " ";
        }
        display(out);
    "#;

    assert_eq!(run_and_capture(code), "0 1 1 2 3 5 8 13 21 34 \n");
}

#[test]
fn test_display_stops_at_first_error() {
    let mut output = Vec::new();
    let code = r#"display("before"); display(1, undefinedName); display("after");"#;
    let result = run_source(code, &mut output);

    assert!(matches!(result, Err(RubricError::Runtime(_))));
    assert_eq!(String::from_utf8(output).unwrap(), "before\n");
}

#[test]
fn test_environment_persists_across_runs() {
    let env = Environment::root();
    let mut interpreter = Interpreter::with_output(Vec::new());

    for line in ["var total = 1;", "total = total + 41;", "display(total);"] {
        let (program, errors) = parse_program(line);
        assert!(errors.is_empty());
        interpreter.run(&program, &env).unwrap();
    }

    assert_eq!(String::from_utf8(interpreter.into_output()).unwrap(), "42\n");
}

#[test]
fn test_parse_error_report() {
    let err = run_source("var a = 1;\nvar b: boolean = 2;", Vec::new()).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Parser error: [line 2:5] Type mismatch for variable 'b'. Explicitly typed as 'boolean' but initializer is of inferred type 'int'."
    );
}
