use std::io::{self, Write};

use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer, Helper, Highlighter, Hinter, Result};

use crate::input::is_incomplete;
use crate::lang::environment::Environment;
use crate::lang::functions::BUILTINS;
use crate::lang::value;

/// Helper that extends editor
///
/// Currently only implements `Validator` trait to keep multiline editing going while a `for`
/// block has been opened but not yet closed with `}`.
#[derive(Completer, Helper, Highlighter, Hinter)]
pub struct ReplHelper {}

impl ReplHelper {
    pub fn new() -> Self {
        ReplHelper {}
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> Result<ValidationResult> {
        if is_incomplete(ctx.input()) {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

/// Session commands that are not part of the language
#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Vars,
    Quit,
}

pub fn command(line: &str) -> Option<Command> {
    match line.trim() {
        "help" => Some(Command::Help),
        "vars" => Some(Command::Vars),
        "quit" => Some(Command::Quit),
        _ => None,
    }
}

pub fn print_help(sink: &mut dyn Write) -> io::Result<()> {
    let mut help = vec![
        ("Commands", ""),
        ("--------------------", ""),
        ("help", "Print help"),
        ("vars", "Print all variables"),
        ("quit", "Exit"),
        ("", ""),
        ("Statements", ""),
        ("--------------------", ""),
        ("var <name> = <expr>", "Declare a new variable"),
        ("<name> = <expr>", "Assign to an existing variable"),
        ("<name> += <expr>", "Add to an existing variable (also -=)"),
        ("<name> ++", "Increment an existing variable (also --)"),
        (
            "for(<expr>) => (<name>) { ... }",
            "Run the body <expr> times with <name> counting from 0",
        ),
        ("", ""),
        ("Functions", ""),
        ("--------------------", ""),
    ];
    help.extend(BUILTINS.iter().map(|f| f.usage()));

    let width = help
        .iter()
        .max_by_key(|p| p.0.len())
        .map_or(0, |p| p.0.len() + 4);
    let mut s = String::new();
    for (l, r) in help {
        s += &format!("{:width$}{}\n", l, r, width = width);
    }

    write!(sink, "{}", s)
}

pub fn print_vars(sink: &mut dyn Write, env: &Environment) -> io::Result<()> {
    for (ident, val) in env.iter() {
        writeln!(sink, "{} = {}", ident, value::display(*val))?;
    }

    Ok(())
}

#[test]
fn test_command() {
    assert_eq!(command("help"), Some(Command::Help));
    assert_eq!(command("  quit "), Some(Command::Quit));
    assert_eq!(command("vars"), Some(Command::Vars));
    assert_eq!(command("print(help)"), None);
    assert_eq!(command("var quit = 1"), None);
}

#[test]
fn test_print_help() {
    let mut output = Vec::new();
    print_help(&mut output).expect("Failed to print help");
    let output = String::from_utf8(output).expect("Output not utf-8");

    for f in &*BUILTINS {
        assert!(output.contains(f.usage().0), "help is missing {}", f);
    }
    assert!(output.lines().any(|l| l.starts_with("quit ")));
}

#[test]
fn test_print_vars() {
    let mut env = Environment::new();
    env.define("b".into(), 2.5).expect("define failed");
    env.define("a".into(), 1.0).expect("define failed");

    let mut output = Vec::new();
    print_vars(&mut output, &env).expect("Failed to print vars");
    assert_eq!(
        String::from_utf8(output).expect("Output not utf-8"),
        "a = 1\nb = 2.5\n"
    );
}
