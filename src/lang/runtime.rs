use std::io::{self, BufRead, Write};

use log::info;

use crate::lang::environment::Environment;
use crate::lang::error::ExecutionError;
use crate::lang::eval::Eval;
use crate::lang::parse::Statements;

pub struct Runtime<'a> {
    eval: Eval<'a>,
}

impl<'a> Runtime<'a> {
    /// Create a new `Runtime` instance
    ///
    /// `sink` is where output should be written. eg. result of `print()` calls
    ///
    /// `input` is where `userInput()` reads lines from
    pub fn new(sink: &'a mut dyn Write, input: &'a mut dyn BufRead) -> Self {
        Self {
            eval: Eval::new(sink, input),
        }
    }

    /// Execute `source` against this runtime's environment
    ///
    /// Stops at the first error. Variables defined before the error stay defined.
    pub fn run(&mut self, source: &str) -> Result<(), ExecutionError> {
        // Parse and eval run in lockstep, statement by statement, so that everything before a
        // malformed line still executes.
        for stmt in Statements::new(source) {
            let stmt = stmt?;
            self.eval.eval(std::slice::from_ref(&stmt))?;
        }

        Ok(())
    }

    pub fn environment(&self) -> &Environment {
        self.eval.environment()
    }
}

/// Run a whole program against the process's stdin and stdout
pub fn run(source: &str) -> Result<(), ExecutionError> {
    let stdout = io::stdout();
    let mut sink = stdout.lock();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    info!("running {} line program", source.lines().count());
    let mut rt = Runtime::new(&mut sink, &mut input);
    rt.run(source)
}

#[cfg(test)]
fn run_prog(rt_input: &str, prog: &str) -> (Result<(), ExecutionError>, String) {
    let mut output = Vec::new();
    let mut input = rt_input.as_bytes();
    let res = Runtime::new(&mut output, &mut input).run(prog);

    (res, String::from_utf8(output).expect("Output not utf-8"))
}

#[test]
fn test_run_scenario() {
    let (res, output) = run_prog(
        "",
        "var count = 0\nfor(3) => (i)\n{\ncount += 1\n}\nprint(count)",
    );
    res.expect("Failed to run");
    assert_eq!(output, "3\n");
}

#[test]
fn test_run_partial_before_syntax_error() {
    let (res, output) = run_prog("", "var x = 1\nprint(x)\nthis is not valid\nprint(x)");
    let err = res.expect_err("Syntax error not reported");
    assert_eq!(err.line, 3);
    assert_eq!(err.text, "this is not valid");
    assert!(matches!(err.kind, crate::lang::error::Error::Syntax(_)));
    assert_eq!(output, "1\n");
}

#[test]
fn test_runtime_keeps_environment() {
    let mut output = Vec::new();
    let mut input = "5\n".as_bytes();
    let mut rt = Runtime::new(&mut output, &mut input);

    rt.run("var x = userInput()").expect("first chunk failed");
    rt.run("x *= 2").expect_err("*= is not an operator");
    rt.run("x += 2\nfor(2) => (i) {\nx += i\n}").expect("third chunk failed");
    rt.run("for(2) => (j) {\nx += nope\n}")
        .expect_err("undefined variable not reported");
    rt.run("print(x)").expect("last chunk failed");

    let vars: Vec<_> = rt.environment().iter().map(|(k, _)| k.0.clone()).collect();
    assert_eq!(vars, vec!["x".to_string()]);
    drop(rt);

    assert_eq!(String::from_utf8(output).expect("Output not utf-8"), "8\n");
}

#[test]
fn test_run_comments_and_blank_lines() {
    let prog = r#"
# sums the first five numbers
var total = 0   # accumulator

for(5)   =>   (n) {
    total   +=   n    # add
}

print(total)
"#;
    let (res, output) = run_prog("", prog);
    res.expect("Failed to run");
    assert_eq!(output, "10\n");
}

#[test]
fn test_run_double_sign() {
    let (res, output) = run_prog("", "var y = 5--3\nprint(y)\ny--\nprint(y)");
    res.expect("Failed to run");
    assert_eq!(output, "8\n7\n");
}

#[test]
fn test_run_deep_nesting_is_an_error() {
    let depth = 500;
    let prog = format!(
        "var y = {}1{}\nprint(y)",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let (res, output) = run_prog("", &prog);
    let err = res.expect_err("deep nesting not reported");
    assert_eq!(err.line, 1);
    assert!(matches!(
        err.kind,
        crate::lang::error::Error::ExpressionSyntax(_)
    ));
    assert_eq!(output, "");
}
