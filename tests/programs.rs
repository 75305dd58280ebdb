use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use tree_lox::interpreter::{Config, Interpreter};
use tree_lox::lox::{self, LoxError, Reporter};
use tree_lox::parser::Parser;
use tree_lox::scanner::Scanner;
use tree_lox::token::Token;
use tree_lox::token_type::TokenType;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Recorder {
    errors: Vec<String>,
    runtime_errors: Vec<String>,
}

impl Reporter for Recorder {
    fn error(&mut self, line: usize, message: &str) {
        self.errors.push(format!("[line {}] Error: {}", line, message));
    }

    fn error_at(&mut self, token: &Token, message: &str) {
        let location = if token.type_ == TokenType::EOF {
            String::from("at end")
        } else {
            format!("at '{}'", token.lexeme)
        };
        self.errors
            .push(format!("[line {}] Error {}: {}", token.line, location, message));
    }

    fn runtime_error(&mut self, err: &LoxError) {
        self.runtime_errors.push(err.to_string());
    }

    fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    fn had_runtime_error(&self) -> bool {
        !self.runtime_errors.is_empty()
    }
}

/// One interpreter kept alive across several runs, like a prompt session.
struct Session {
    interpreter: Interpreter,
    buffer: SharedBuffer,
    reporter: Recorder,
}

impl Session {
    fn new(config: Config) -> Self {
        let buffer = SharedBuffer::default();
        Session {
            interpreter: Interpreter::with_output(Box::new(buffer.clone()), config),
            buffer,
            reporter: Recorder::default(),
        }
    }

    fn run(&mut self, source: &str) -> &mut Self {
        let tokens = Scanner::new(source).scan_tokens().expect("scan failed");
        if let Some(statements) = Parser::new(&mut self.reporter, tokens).parse() {
            self.interpreter.interpret(&statements, &mut self.reporter);
        }
        self
    }

    fn run_expression(&mut self, source: &str) -> &mut Self {
        let tokens = Scanner::new(source).scan_tokens().expect("scan failed");
        if let Some(expr) = Parser::new(&mut self.reporter, tokens).parse_expression() {
            self.interpreter
                .interpret_expression(&expr, &mut self.reporter);
        }
        self
    }

    fn output(&self) -> String {
        String::from_utf8(self.buffer.0.borrow().clone()).unwrap()
    }
}

fn run(source: &str) -> Session {
    let mut session = Session::new(Config::default());
    session.run(source);
    session
}

struct Outcome {
    output: String,
    errors: Vec<String>,
    runtime_errors: Vec<String>,
    scopes: usize,
}

/// Runs `sources` in one session on a thread with the driver's stack size.
fn run_deep(config: Config, sources: Vec<String>) -> Outcome {
    lox::with_stack(move || {
        let mut session = Session::new(config);
        for source in &sources {
            session.run(source);
        }
        Outcome {
            output: session.output(),
            errors: session.reporter.errors,
            runtime_errors: session.reporter.runtime_errors,
            scopes: session.interpreter.environments.len(),
        }
    })
    .expect("interpreter thread failed")
}

#[test]
fn arithmetic_and_concatenation() {
    let session = run(r#"
        print 1 + 2;
        print "x" + 1;
        print 2.5 + "y";
        print "a" + "b";
        print 10 / 4;
        print 2 * 3 - 4 / 2;
        print -(1 + 2);
    "#);
    assert_eq!(session.output(), "3\nx1\n2.5y\nab\n2.5\n4\n-3\n");
    assert!(session.reporter.runtime_errors.is_empty());
}

#[test]
fn numbers_print_without_trailing_zero() {
    assert_eq!(run("print 4.0; print 4.5; print 100;").output(), "4\n4.5\n100\n");
}

#[test]
fn division_by_zero_stops_the_program() {
    let session = run(r#"
print "before";
print 10 / 0;
print "after";"#);
    assert_eq!(session.output(), "before\n");
    assert_eq!(session.reporter.runtime_errors, ["Divided by the /0\n[line 3]"]);
}

#[test]
fn operand_type_errors() {
    let session = run("print -\"a\";");
    assert_eq!(session.reporter.runtime_errors, ["Operand must be a number.\n[line 1]"]);
    let session = run("print 1 < \"2\";");
    assert_eq!(session.reporter.runtime_errors, ["Operands must be numbers.\n[line 1]"]);
    let session = run("print true + 1;");
    assert_eq!(session.reporter.runtime_errors, ["Operands must be numbers.\n[line 1]"]);
    let session = run("print nil + nil;");
    assert_eq!(session.reporter.runtime_errors, ["Operands must be numbers.\n[line 1]"]);
}

#[test]
fn truthiness() {
    let session = run(r#"print !nil; print !0; print !false; print !""; print !!true;"#);
    assert_eq!(session.output(), "true\nfalse\ntrue\nfalse\ntrue\n");
}

#[test]
fn equality() {
    let session = run(r#"
        print 1 == "1";
        print nil == nil;
        print nil == false;
        print "a" != "b";
        print 2 == 2.0;
    "#);
    assert_eq!(session.output(), "false\ntrue\nfalse\ntrue\ntrue\n");
}

#[test]
fn logical_operators_short_circuit() {
    let session = run(r#"
        print nil or "yes";
        print false and undefinedVariable;
        print 1 and 2;
        print "left" or undefinedVariable;
        print nil and boom();
    "#);
    assert_eq!(session.output(), "yes\nfalse\n2\nleft\nnil\n");
    assert!(session.reporter.runtime_errors.is_empty());
}

#[test]
fn ternary_evaluates_one_branch() {
    let session = run(r#"
        var log = "";
        fun yes() { log = log + "then;"; return 1; }
        fun no() { log = log + "else;"; return 2; }
        print true ? yes() : no();
        print 1 > 2 ? yes() : no();
        print log;
    "#);
    assert_eq!(session.output(), "1\n2\nthen;else;\n");
}

#[test]
fn ternary_is_right_associative() {
    let session = run(r#"
        var n = 5;
        print n < 0 ? "negative" : n == 0 ? "zero" : "positive";
    "#);
    assert_eq!(session.output(), "positive\n");
}

#[test]
fn ternary_condition_must_be_boolean() {
    let session = run("print 1 ? 2 : 3;");
    assert!(session.output().is_empty());
    assert_eq!(session.reporter.runtime_errors, ["Operand must be a boolean.\n[line 1]"]);
}

#[test]
fn block_scoping() {
    let session = run(r#"var a = "outer";
{
  var b = "inner";
  a = "changed";
  print b;
}
print a;
print b;"#);
    assert_eq!(session.output(), "inner\nchanged\n");
    assert_eq!(session.reporter.runtime_errors, ["Undefined variable 'b'.\n[line 8]"]);
}

#[test]
fn shadowing_and_redeclaration() {
    let session = run(r#"
        var a = 1;
        { var a = 2; print a; }
        print a;
        var a = "again";
        print a;
        var empty;
        print empty;
    "#);
    assert_eq!(session.output(), "2\n1\nagain\nnil\n");
}

#[test]
fn chained_assignment() {
    let session = run("var a; var b; a = b = 3; print a; print b;");
    assert_eq!(session.output(), "3\n3\n");
}

#[test]
fn assigning_undefined_variable() {
    let session = run("x = 1;");
    assert_eq!(session.reporter.runtime_errors, ["Undefined variable 'x'.\n[line 1]"]);
}

#[test]
fn control_flow() {
    let session = run(r#"
        if (1 < 2) print "then"; else print "else";
        if (nil) print "then"; else print "else";
        if (false) print "skipped";
        var n = 3;
        while (n > 0) { print n; n = n - 1; }
    "#);
    assert_eq!(session.output(), "then\nelse\n3\n2\n1\n");
}

#[test]
fn for_loop_runs_increment_after_body() {
    let session = run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert_eq!(session.output(), "0\n1\n2\n");

    let session = run(r#"
        var trace = "";
        for (var i = 0; i < 2; i = i + 1) trace = trace + "body" + i + ";";
        print trace;
        print i;
    "#);
    assert_eq!(session.output(), "body0;body1;\n");
    assert_eq!(session.reporter.runtime_errors, ["Undefined variable 'i'.\n[line 5]"]);
}

#[test]
fn for_loop_with_missing_clauses() {
    let session = run(r#"
        var x = 0;
        for (; x < 3;) x = x + 1;
        print x;
    "#);
    assert_eq!(session.output(), "3\n");
}

#[test]
fn functions_and_return() {
    let session = run(r#"
        fun add(a, b) { return a + b; }
        print add(1, 2);
        fun nothing() { return; }
        print nothing();
        fun noReturn() { 1 + 1; }
        print noReturn();
        fun fib(n) {
          if (n < 2) return n;
          return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#);
    assert_eq!(session.output(), "3\nnil\nnil\n55\n");
}

#[test]
fn closures_outlive_their_defining_call() {
    let session = run(r#"
        fun makeCounter() {
          var i = 0;
          fun count() {
            i = i + 1;
            return i;
          }
          return count;
        }
        var counter = makeCounter();
        print counter();
        print counter();
        var other = makeCounter();
        print other();
        print counter();
    "#);
    assert_eq!(session.output(), "1\n2\n1\n3\n");
}

#[test]
fn closures_see_later_declarations_in_their_scope() {
    let session = run(r#"
        var a = "global";
        {
          fun show() { print a; }
          show();
          var a = "block";
          show();
        }
    "#);
    assert_eq!(session.output(), "global\nblock\n");
}

#[test]
fn function_values() {
    let session = run(r#"
        fun f() {}
        var g = f;
        print f;
        print clock;
        print f == g;
        print f == clock;
        print clock() > 0;
    "#);
    assert_eq!(session.output(), "<fn f>\n<native fn>\ntrue\nfalse\ntrue\n");
}

#[test]
fn call_errors() {
    let session = run("fun f() {}\nf(1);");
    assert_eq!(
        session.reporter.runtime_errors,
        ["Expected 0 arguments but got 1.\n[line 2]"]
    );
    let session = run("\"text\"();");
    assert_eq!(
        session.reporter.runtime_errors,
        ["Can only call functions and classes.\n[line 1]"]
    );
}

#[test]
fn trailing_operator_is_a_syntax_error() {
    let session = run("1 +");
    assert_eq!(session.reporter.errors, ["[line 1] Error at end: Expect expression."]);
    assert!(session.reporter.runtime_errors.is_empty());
}

#[test]
fn syntax_errors_prevent_execution() {
    let session = run("print 1;\nvar = 1;\nprint 2;\n1 +;");
    assert_eq!(
        session.reporter.errors,
        [
            "[line 2] Error at '=': Expect variable name.",
            "[line 4] Error at ';': Expect expression."
        ]
    );
    assert!(session.output().is_empty());
}

#[test]
fn invalid_assignment_target() {
    let session = run("var a = 1; (a) = 2;");
    assert_eq!(session.reporter.errors, ["[line 1] Error at '=': Invalid assignment target."]);
    assert!(session.output().is_empty());
}

#[test]
fn return_outside_function() {
    let session = run("return 1;");
    assert_eq!(
        session.reporter.errors,
        ["[line 1] Error at 'return': Can't return from top-level code."]
    );
}

#[test]
fn runaway_recursion_overflows_without_corrupting_state() {
    let outcome = run_deep(
        Config { max_call_depth: 100 },
        vec![
            String::from("var before = 1; fun f() { { var x = 1; f(); } } f();"),
            String::from("print before;"),
        ],
    );
    assert_eq!(outcome.runtime_errors, ["Stack overflow: more than 100 nested calls."]);
    assert_eq!(outcome.scopes, 1);
    assert_eq!(outcome.output, "1\n");
}

#[test]
fn runaway_recursion_stops_at_the_default_limit() {
    let outcome = run_deep(
        Config::default(),
        vec![String::from("fun f() { f(); } f();")],
    );
    assert_eq!(outcome.runtime_errors, ["Stack overflow: more than 4096 nested calls."]);
    assert_eq!(outcome.scopes, 1);
}

#[test]
fn deep_recursion_fits_in_default_config() {
    let outcome = run_deep(
        Config::default(),
        vec![String::from(
            "fun count(n) { if (n <= 0) return 0; return count(n - 1) + 1; } print count(3000);",
        )],
    );
    assert!(outcome.runtime_errors.is_empty(), "{:?}", outcome.runtime_errors);
    assert_eq!(outcome.output, "3000\n");
}

#[test]
fn deeply_nested_syntax_is_rejected_cleanly() {
    let parens = format!("print {}1{};", "(".repeat(10_000), ")".repeat(10_000));
    let negations = format!("print {}1;", "-".repeat(10_000));
    let outcome = run_deep(
        Config::default(),
        vec![parens, String::from("print 2;"), negations],
    );
    assert_eq!(
        outcome.errors,
        [
            "[line 1] Error at '(': Too much nesting.",
            "[line 1] Error at '-': Too much nesting.",
        ]
    );
    assert!(outcome.runtime_errors.is_empty());
    assert_eq!(outcome.output, "2\n");
}

#[test]
fn nested_expressions_below_the_limit_evaluate() {
    let parens = format!("print {}1 + 1{};", "(".repeat(900), ")".repeat(900));
    let negations = format!("print {}1;", "-".repeat(901));
    let outcome = run_deep(Config::default(), vec![parens, negations]);
    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.output, "2\n-1\n");
}

#[test]
fn scopes_are_released_after_errors_and_loops() {
    let mut session = Session::new(Config::default());
    session.run("for (var i = 0; i < 100; i = i + 1) { var x = i; }");
    assert_eq!(session.interpreter.environments.len(), 1);

    session.run("fun f() { { var x = 1; return x / 0; } } f();");
    assert_eq!(session.reporter.runtime_errors, ["Divided by the /0\n[line 1]"]);
    assert_eq!(session.interpreter.environments.len(), 1);

    session.run("{ var hidden = 1; print hidden / 0; }");
    session.run("print hidden;");
    assert_eq!(
        session.reporter.runtime_errors.last().unwrap(),
        "Undefined variable 'hidden'.\n[line 1]"
    );
}

#[test]
fn prompt_expressions() {
    let mut session = Session::new(Config::default());
    session
        .run("var a = 2;")
        .run_expression("a * 3")
        .run_expression("1, a = 5, a + 1")
        .run_expression("\"n: \" + a");
    // Only the last expression of a comma sequence is evaluated.
    assert_eq!(session.output(), "6\n3\nn: 2\n");
}

#[test]
fn prompt_expression_errors_are_reported() {
    let mut session = Session::new(Config::default());
    session.run_expression("1 / 0").run_expression("2 +");
    assert_eq!(session.reporter.runtime_errors, ["Divided by the /0\n[line 1]"]);
    assert_eq!(session.reporter.errors, ["[line 1] Error at end: Expect expression."]);
    assert!(session.output().is_empty());
}
