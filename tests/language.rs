use std::{
    cell::RefCell,
    io::{self, Cursor},
    rc::Rc,
};

use pretty_assertions::assert_eq;
use treelox::{Lox, LoxError, Outcome};

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Session {
    lox: Lox,
    output: SharedBuffer,
    errors: SharedBuffer,
}

impl Session {
    fn new() -> Session {
        let output = SharedBuffer::default();
        let errors = SharedBuffer::default();
        let lox = Lox::with_io(Box::new(output.clone()), Box::new(errors.clone()));
        Session {
            lox,
            output,
            errors,
        }
    }

    fn run(&mut self, source: &str) -> Outcome {
        self.lox.run(source)
    }
}

fn assert_prints(source: &str, expected: &str) {
    let mut session = Session::new();
    let outcome = session.run(source);

    assert_eq!(session.errors.contents(), "");
    assert_eq!(outcome, Outcome::Success);
    assert_eq!(session.output.contents(), expected);
}

#[test]
fn for_loop_counts() {
    assert_prints("for (var i = 0; i < 3; i = i + 1) print i;", "0\n1\n2\n");
}

#[test]
fn for_loop_with_existing_variable_and_no_increment() {
    let source = "
        var i = 3;
        for (; i > 0;) {
            print i;
            i = i - 1;
        }
        print i;
    ";
    assert_prints(source, "3\n2\n1\n0\n");
}

#[test]
fn for_loop_variable_is_scoped_to_the_loop() {
    let mut session = Session::new();

    let outcome = session.run("for (var i = 0; i < 1; i = i + 1) {} print i;");

    assert_eq!(outcome, Outcome::RuntimeError);
    assert_eq!(
        session.errors.contents(),
        "[line 1] Error: Undefined variable 'i'.\n"
    );
}

#[test]
fn block_scoping() {
    let source = "
        var x = 1;
        { x = 2; }
        print x;
        var z = \"outer\";
        {
            var z = \"inner\";
            print z;
        }
        print z;
    ";
    assert_prints(source, "2\ninner\nouter\n");
}

#[test]
fn block_local_is_gone_after_the_block() {
    let mut session = Session::new();

    let outcome = session.run("{ var y = 1; print y; }\nprint y;");

    assert_eq!(outcome, Outcome::RuntimeError);
    assert_eq!(session.output.contents(), "1\n");
    assert_eq!(
        session.errors.contents(),
        "[line 2] Error: Undefined variable 'y'.\n"
    );
}

#[test]
fn closures_keep_their_own_state() {
    let source = "
        fun makeCounter() {
            var count = 0;
            fun counter() {
                count = count + 1;
                return count;
            }
            return counter;
        }
        var c = makeCounter();
        print c();
        print c();
        print c();
        var d = makeCounter();
        print d();
    ";
    assert_prints(source, "1\n2\n3\n1\n");
}

#[test]
fn closures_see_later_assignments_to_captured_variables() {
    let source = "
        var x = \"before\";
        fun show() { print x; }
        x = \"after\";
        show();
    ";
    assert_prints(source, "after\n");
}

#[test]
fn closures_outlive_their_defining_block() {
    let source = "
        var f;
        {
            var secret = \"kept\";
            fun reveal() { return secret; }
            f = reveal;
        }
        print f();
    ";
    assert_prints(source, "kept\n");
}

#[test]
fn closures_are_lexical_not_dynamic() {
    let source = "
        var a = \"global\";
        fun show() { print a; }
        fun caller() {
            var a = \"local\";
            show();
        }
        caller();
    ";
    assert_prints(source, "global\n");
}

#[test]
fn nested_function_reads_enclosing_parameters() {
    let source = "
        fun adder(n) {
            fun add(m) { return n + m; }
            return add;
        }
        print adder(2)(40);
    ";
    assert_prints(source, "42\n");
}

#[test]
fn arity_mismatch_skips_the_body() {
    let mut session = Session::new();

    let outcome = session.run(
        "fun pair(a, b) { print \"called\"; return a; }\nvar r = pair(1);\nprint r;",
    );

    assert_eq!(outcome, Outcome::RuntimeError);
    assert_eq!(session.output.contents(), "nil\n");
    assert_eq!(
        session.errors.contents(),
        "[line 2] Error: Expected 2 arguments but got 1.\n"
    );
}

#[test]
fn static_errors_prevent_execution() {
    let mut session = Session::new();

    let outcome = session.run("print 1;\nprint (;\nvar 2 = 3;");

    assert_eq!(outcome, Outcome::StaticError);
    assert_eq!(session.output.contents(), "");
    assert_eq!(
        session.errors.contents(),
        "[line 2] Error at ';': Expect expression.\n\
         [line 3] Error at '2': Expect variable name.\n"
    );
}

#[test]
fn scan_errors_prevent_execution() {
    let mut session = Session::new();

    let outcome = session.run("print 1;\nprint \"open");

    assert_eq!(outcome, Outcome::StaticError);
    assert_eq!(session.output.contents(), "");
    assert!(session.lox.errors().contains(&LoxError::Scan {
        line: 2,
        message: "Unterminated string.".to_string(),
    }));
}

#[test]
fn scan_then_interpret() {
    let mut session = Session::new();

    let tokens = session.lox.scan("var a = \"x\"; print a + a;");
    let outcome = session.lox.interpret(tokens);

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(session.output.contents(), "xx\n");
}

#[test]
fn globals_persist_between_runs() {
    let mut session = Session::new();

    session.run("var count = 1; fun bump() { count = count + 1; }");
    session.run("bump(); bump();");
    session.run("print count;");

    assert_eq!(session.output.contents(), "3\n");
}

#[test]
fn prompt_survives_bad_lines() {
    let mut session = Session::new();
    let prompt = SharedBuffer::default();
    let input = Cursor::new(
        "var a = 1;\nprint a +;\nprint a;\nprint b;\nprint a + 1;\nexit\nprint 99;\n",
    );

    session
        .lox
        .run_prompt(input, prompt.clone())
        .expect("in-memory io does not fail");

    assert_eq!(session.output.contents(), "1\n2\n");
    assert_eq!(prompt.contents(), "> ".repeat(6));
    assert_eq!(
        session.errors.contents(),
        "[line 1] Error at ';': Expect expression.\n\
         [line 1] Error: Undefined variable 'b'.\n"
    );
    assert!(!session.lox.had_error());
    assert!(!session.lox.had_runtime_error());
}

#[test]
fn prompt_stops_at_end_of_input() {
    let mut session = Session::new();
    let prompt = SharedBuffer::default();

    session
        .lox
        .run_prompt(Cursor::new("print \"last\";"), prompt.clone())
        .expect("in-memory io does not fail");

    assert_eq!(session.output.contents(), "last\n");
    assert_eq!(prompt.contents(), "> > ");
}
