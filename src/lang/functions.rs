use std::convert::TryFrom;
use std::fmt;
use std::io::{BufRead, Write};

use lazy_static::lazy_static;
use log::debug;

use crate::lang::ast::Identifier;
use crate::lang::error::{Error, Result};
use crate::lang::value::{self, Value};

/// Functions that may be called as statements as well as inside expressions
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Builtin {
    Print,
    Sqrt,
    UserInput,
    Add,
}

impl TryFrom<&str> for Builtin {
    type Error = Error;

    fn try_from(f: &str) -> Result<Self> {
        Ok(match f {
            "print" => Self::Print,
            "sqrt" => Self::Sqrt,
            "userInput" => Self::UserInput,
            "add" => Self::Add,
            _ => return Err(Error::Syntax(format!("Unknown function: {}", f))),
        })
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builtin::Print => write!(f, "print"),
            Builtin::Sqrt => write!(f, "sqrt"),
            Builtin::UserInput => write!(f, "userInput"),
            Builtin::Add => write!(f, "add"),
        }
    }
}

lazy_static! {
    pub static ref BUILTINS: Vec<Builtin> =
        vec![Builtin::Print, Builtin::Sqrt, Builtin::UserInput, Builtin::Add];
}

/// An evaluated builtin argument
///
/// Builtins receive bare identifiers that have no binding as-is so each one can decide what an
/// unbound name means (`print` ignores it, `add` rejects it).
#[derive(Debug, PartialEq)]
pub enum Argument {
    Value(Value),
    Unbound(Identifier),
}

impl Argument {
    fn into_number(self) -> Result<Value> {
        match self {
            Argument::Value(v) => Ok(v),
            Argument::Unbound(ident) => Err(Error::NumberFormat(ident.0)),
        }
    }
}

impl Builtin {
    /// Usage string shown by `help`
    pub fn usage(&self) -> (&'static str, &'static str) {
        match self {
            Builtin::Print => ("print(var)", "Print the value of `var` followed by a newline"),
            Builtin::Sqrt => ("sqrt(x)", "Returns the square root of `x`"),
            Builtin::UserInput => ("userInput()", "Reads one line of input as a number"),
            Builtin::Add => ("add(a, b, ...)", "Returns the sum of all arguments"),
        }
    }

    pub fn call(
        &self,
        args: Vec<Argument>,
        sink: &mut dyn Write,
        input: &mut dyn BufRead,
    ) -> Result<Value> {
        debug!("calling {}() with {:?}", self, args);

        match self {
            f @ Builtin::Print => {
                if args.len() != 1 {
                    return Err(Error::arity(f, 1, args.len()));
                }

                if let Some(Argument::Value(v)) = args.into_iter().next() {
                    writeln!(sink, "{}", value::display(v))?;
                }

                Ok(value::TRUE)
            }
            f @ Builtin::Sqrt => {
                if args.len() != 1 {
                    return Err(Error::arity(f, 1, args.len()));
                }

                match args.into_iter().next() {
                    Some(arg) => Ok(arg.into_number()?.sqrt()),
                    None => Err(Error::arity(f, 1, 0)),
                }
            }
            f @ Builtin::UserInput => {
                if !args.is_empty() {
                    return Err(Error::arity(f, 0, args.len()));
                }

                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    return Err(Error::InputExhausted);
                }

                let line = line.trim();
                line.parse::<Value>()
                    .map_err(|_| Error::NumberFormat(line.to_string()))
            }
            Builtin::Add => {
                let mut sum = 0.0;
                for arg in args {
                    sum += arg.into_number()?;
                }

                Ok(sum)
            }
        }
    }
}

/// Math functions available inside expressions
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum MathFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
    Ln,
    Log,
    Log2,
    Exp,
    Floor,
    Ceil,
    Round,
    Sgn,
    Min,
    Max,
}

impl TryFrom<&str> for MathFunction {
    type Error = Error;

    fn try_from(f: &str) -> Result<Self> {
        Ok(match f {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "abs" => Self::Abs,
            "ln" => Self::Ln,
            "log" => Self::Log,
            "log2" => Self::Log2,
            "exp" => Self::Exp,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "sgn" => Self::Sgn,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return Err(Error::ExpressionSyntax(format!("Unknown function: {}", f))),
        })
    }
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Asin => "asin",
            MathFunction::Acos => "acos",
            MathFunction::Atan => "atan",
            MathFunction::Sinh => "sinh",
            MathFunction::Cosh => "cosh",
            MathFunction::Tanh => "tanh",
            MathFunction::Abs => "abs",
            MathFunction::Ln => "ln",
            MathFunction::Log => "log",
            MathFunction::Log2 => "log2",
            MathFunction::Exp => "exp",
            MathFunction::Floor => "floor",
            MathFunction::Ceil => "ceil",
            MathFunction::Round => "round",
            MathFunction::Sgn => "sgn",
            MathFunction::Min => "min",
            MathFunction::Max => "max",
        };

        write!(f, "{}", name)
    }
}

impl MathFunction {
    pub fn apply(&self, args: &[Value]) -> Result<Value> {
        let unary = |op: fn(Value) -> Value| match args {
            [x] => Ok(op(*x)),
            _ => Err(Error::arity(self, 1, args.len())),
        };

        match self {
            MathFunction::Sin => unary(f64::sin),
            MathFunction::Cos => unary(f64::cos),
            MathFunction::Tan => unary(f64::tan),
            MathFunction::Asin => unary(f64::asin),
            MathFunction::Acos => unary(f64::acos),
            MathFunction::Atan => unary(f64::atan),
            MathFunction::Sinh => unary(f64::sinh),
            MathFunction::Cosh => unary(f64::cosh),
            MathFunction::Tanh => unary(f64::tanh),
            MathFunction::Abs => unary(f64::abs),
            MathFunction::Ln => unary(f64::ln),
            MathFunction::Log => unary(f64::log10),
            MathFunction::Log2 => unary(f64::log2),
            MathFunction::Exp => unary(f64::exp),
            MathFunction::Floor => unary(f64::floor),
            MathFunction::Ceil => unary(f64::ceil),
            MathFunction::Round => unary(f64::round),
            MathFunction::Sgn => unary(|x: Value| if x == 0.0 { 0.0 } else { x.signum() }),
            f @ MathFunction::Min | f @ MathFunction::Max => {
                if args.is_empty() {
                    return Err(Error::arity(f, "at least 1", 0));
                }

                let pick: fn(Value, Value) -> Value = if *f == MathFunction::Min {
                    f64::min
                } else {
                    f64::max
                };
                Ok(args[1..].iter().fold(args[0], |acc, v| pick(acc, *v)))
            }
        }
    }
}

#[cfg(test)]
fn call(f: Builtin, args: Vec<Argument>, input: &str) -> (Result<Value>, String) {
    let mut output = Vec::new();
    let mut input = input.as_bytes();
    let res = f.call(args, &mut output, &mut input);
    (res, String::from_utf8(output).expect("Output not utf-8"))
}

#[test]
fn test_lookup() {
    for f in &*BUILTINS {
        let name = f.to_string();
        assert_eq!(Builtin::try_from(name.as_str()).expect("lookup failed"), *f);
    }

    assert!(Builtin::try_from("sin").is_err());
    assert!(Builtin::try_from("Print").is_err());
    assert_eq!(
        MathFunction::try_from("log2").expect("lookup failed"),
        MathFunction::Log2
    );
}

#[test]
fn test_print() {
    let (res, out) = call(Builtin::Print, vec![Argument::Value(42.0)], "");
    assert_eq!(res.expect("print failed"), 1.0);
    assert_eq!(out, "42\n");

    let (res, out) = call(Builtin::Print, vec![Argument::Unbound("nope".into())], "");
    assert!(res.is_ok());
    assert_eq!(out, "");

    let (res, _) = call(
        Builtin::Print,
        vec![Argument::Value(1.0), Argument::Value(2.0)],
        "",
    );
    assert!(matches!(res, Err(Error::Arity { found: 2, .. })));
}

#[test]
fn test_sqrt() {
    let (res, _) = call(Builtin::Sqrt, vec![Argument::Value(9.0)], "");
    assert_eq!(res.expect("sqrt failed"), 3.0);

    let (res, _) = call(Builtin::Sqrt, vec![Argument::Value(-1.0)], "");
    assert!(res.expect("sqrt(-1) should not fail").is_nan());

    let (res, _) = call(Builtin::Sqrt, vec![], "");
    assert!(matches!(res, Err(Error::Arity { found: 0, .. })));

    let (res, _) = call(Builtin::Sqrt, vec![Argument::Unbound("x".into())], "");
    assert!(matches!(res, Err(Error::NumberFormat(s)) if s == "x"));
}

#[test]
fn test_user_input() {
    let (res, _) = call(Builtin::UserInput, vec![], "  12.5 \nrest\n");
    assert_eq!(res.expect("userInput failed"), 12.5);

    let (res, _) = call(Builtin::UserInput, vec![], "");
    assert!(matches!(res, Err(Error::InputExhausted)));

    let (res, _) = call(Builtin::UserInput, vec![], "twelve\n");
    assert!(matches!(res, Err(Error::NumberFormat(s)) if s == "twelve"));

    let (res, _) = call(Builtin::UserInput, vec![Argument::Value(1.0)], "3\n");
    assert!(matches!(res, Err(Error::Arity { found: 1, .. })));
}

#[test]
fn test_add() {
    let (res, _) = call(
        Builtin::Add,
        vec![
            Argument::Value(2.0),
            Argument::Value(3.0),
            Argument::Value(4.0),
        ],
        "",
    );
    assert_eq!(res.expect("add failed"), 9.0);

    let (res, _) = call(Builtin::Add, vec![], "");
    assert_eq!(res.expect("add() failed"), 0.0);

    let (res, _) = call(
        Builtin::Add,
        vec![Argument::Value(1.0), Argument::Unbound("q".into())],
        "",
    );
    assert!(matches!(res, Err(Error::NumberFormat(_))));
}

#[test]
fn test_math_functions() {
    let data = vec![
        (MathFunction::Abs, vec![-3.0], 3.0),
        (MathFunction::Floor, vec![2.7], 2.0),
        (MathFunction::Ceil, vec![2.1], 3.0),
        (MathFunction::Log, vec![1000.0], 3.0),
        (MathFunction::Sgn, vec![-0.5], -1.0),
        (MathFunction::Sgn, vec![0.0], 0.0),
        (MathFunction::Min, vec![4.0, -1.0, 2.0], -1.0),
        (MathFunction::Max, vec![4.0, -1.0, 2.0], 4.0),
    ];

    for (f, args, expected) in data {
        assert_eq!(f.apply(&args).expect("apply failed"), expected);
    }

    assert!(matches!(
        MathFunction::Sin.apply(&[1.0, 2.0]),
        Err(Error::Arity { .. })
    ));
    assert!(matches!(
        MathFunction::Max.apply(&[]),
        Err(Error::Arity { .. })
    ));
}
