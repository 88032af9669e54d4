use std::convert::TryFrom;
use std::io::{BufRead, Write};

use log::{debug, trace};

use crate::lang::ast::*;
use crate::lang::environment::Environment;
use crate::lang::error::{Error, ExecutionError, Result};
use crate::lang::functions::{Argument, Builtin, MathFunction};
use crate::lang::value::{self, Value};

pub struct Eval<'a> {
    sink: &'a mut dyn Write,
    input: &'a mut dyn BufRead,
    env: Environment,
}

impl<'a> Eval<'a> {
    fn eval_primary_expr(&mut self, expr: &PrimaryExpression) -> Result<Value> {
        let val = match expr {
            PrimaryExpression::Identifier(ident) => self.env.get(ident)?,
            PrimaryExpression::Constant(c) => match c {
                Constant::Number(n) => *n,
                Constant::Boolean(b) => value::from_bool(*b),
            },
            PrimaryExpression::Paren(expr) => self.eval_expr(expr)?,
        };

        Ok(val)
    }

    fn eval_binop_expr(&mut self, binop: &BinaryExpression) -> Result<Value> {
        let val = match binop {
            BinaryExpression::Plus(lhs, rhs) => self.eval_expr(lhs)? + self.eval_expr(rhs)?,
            BinaryExpression::Minus(lhs, rhs) => self.eval_expr(lhs)? - self.eval_expr(rhs)?,
            BinaryExpression::Multiply(lhs, rhs) => self.eval_expr(lhs)? * self.eval_expr(rhs)?,
            // Division and modulo by zero are IEEE (inf/NaN), not errors
            BinaryExpression::Divide(lhs, rhs) => self.eval_expr(lhs)? / self.eval_expr(rhs)?,
            BinaryExpression::Modulo(lhs, rhs) => self.eval_expr(lhs)? % self.eval_expr(rhs)?,
            BinaryExpression::Power(lhs, rhs) => {
                let base = self.eval_expr(lhs)?;
                base.powf(self.eval_expr(rhs)?)
            }
            BinaryExpression::Equals(lhs, rhs) => {
                let lhs_val = self.eval_expr(lhs)?;
                value::from_bool(lhs_val == self.eval_expr(rhs)?)
            }
            BinaryExpression::NotEquals(lhs, rhs) => {
                let lhs_val = self.eval_expr(lhs)?;
                value::from_bool(lhs_val != self.eval_expr(rhs)?)
            }
            BinaryExpression::LessThan(lhs, rhs) => {
                let lhs_val = self.eval_expr(lhs)?;
                value::from_bool(lhs_val < self.eval_expr(rhs)?)
            }
            BinaryExpression::LessThanEquals(lhs, rhs) => {
                let lhs_val = self.eval_expr(lhs)?;
                value::from_bool(lhs_val <= self.eval_expr(rhs)?)
            }
            BinaryExpression::GreaterThan(lhs, rhs) => {
                let lhs_val = self.eval_expr(lhs)?;
                value::from_bool(lhs_val > self.eval_expr(rhs)?)
            }
            BinaryExpression::GreaterThanEquals(lhs, rhs) => {
                let lhs_val = self.eval_expr(lhs)?;
                value::from_bool(lhs_val >= self.eval_expr(rhs)?)
            }
            // NB: logical operators short circuit
            BinaryExpression::LogicalOr(lhs, rhs) => {
                let res = value::is_truthy(self.eval_expr(lhs)?)
                    || value::is_truthy(self.eval_expr(rhs)?);
                value::from_bool(res)
            }
            BinaryExpression::LogicalAnd(lhs, rhs) => {
                let res = value::is_truthy(self.eval_expr(lhs)?)
                    && value::is_truthy(self.eval_expr(rhs)?);
                value::from_bool(res)
            }
        };

        Ok(val)
    }

    fn eval_unary_expr(&mut self, unary: &UnaryExpression) -> Result<Value> {
        match unary {
            UnaryExpression::Not(expr) => Ok(value::invert(self.eval_expr(expr)?)),
            UnaryExpression::Minus(expr) => Ok(-self.eval_expr(expr)?),
        }
    }

    /// Evaluate builtin arguments left to right
    ///
    /// A bare identifier with no binding is passed through unevaluated
    fn eval_args(&mut self, args: &[Expression]) -> Result<Vec<Argument>> {
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            let val = match arg {
                Expression::PrimaryExpression(PrimaryExpression::Identifier(ident))
                    if !self.env.contains(ident) =>
                {
                    Argument::Unbound(ident.clone())
                }
                _ => Argument::Value(self.eval_expr(arg)?),
            };

            vals.push(val);
        }

        Ok(vals)
    }

    fn eval_builtin(&mut self, func: Builtin, args: &[Expression]) -> Result<Value> {
        let args = self.eval_args(args)?;
        func.call(args, &mut *self.sink, &mut *self.input)
    }

    /// Builtins take priority over math functions of the same name
    fn eval_function(&mut self, func: &Identifier, args: &[Expression]) -> Result<Value> {
        if let Ok(builtin) = Builtin::try_from(func.0.as_str()) {
            return self.eval_builtin(builtin, args);
        }

        let math = MathFunction::try_from(func.0.as_str())?;
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            vals.push(self.eval_expr(arg)?);
        }

        math.apply(&vals)
    }

    pub fn eval_expr(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::PrimaryExpression(p) => self.eval_primary_expr(p),
            Expression::FunctionCall(func, args) => self.eval_function(func, args),
            Expression::BinaryExpression(b) => self.eval_binop_expr(b),
            Expression::UnaryExpression(u) => self.eval_unary_expr(u),
        }
    }

    fn eval_var_decl(&mut self, ident: &Identifier, expr: &Expression) -> Result<()> {
        // Check before evaluating so a conflicting declaration has no side effects
        if self.env.contains(ident) {
            return Err(Error::NameConflict(ident.clone()));
        }

        let val = self.eval_expr(expr)?;
        self.env.define(ident.clone(), val)
    }

    fn eval_assign(&mut self, ident: &Identifier, op: &AssignOp) -> Result<()> {
        let current = self.env.get(ident)?;
        let val = match op {
            AssignOp::Set(expr) => self.eval_expr(expr)?,
            AssignOp::Add(expr) => current + self.eval_expr(expr)?,
            AssignOp::Sub(expr) => current - self.eval_expr(expr)?,
            AssignOp::Increment => current + 1.0,
            AssignOp::Decrement => current - 1.0,
        };

        self.env.set(ident, val)
    }

    /// Evaluate a loop count, truncating toward zero
    fn eval_count(&mut self, count: &Expression) -> Result<i64> {
        let count = self.eval_expr(count)?;
        if !count.is_finite() {
            return Err(Error::NumberFormat(value::display(count)));
        }

        Ok(count.trunc() as i64)
    }

    fn eval_for(
        &mut self,
        count: i64,
        ident: &Identifier,
        stmts: &[Spanned<Statement>],
    ) -> std::result::Result<(), ExecutionError> {
        for i in 0..count {
            trace!("{} = {}", ident, i);
            self.env.bind(ident.clone(), i as Value);

            for stmt in stmts {
                self.eval_statement(stmt)?;
            }
        }

        Ok(())
    }

    fn eval_statement(
        &mut self,
        stmt: &Spanned<Statement>,
    ) -> std::result::Result<(), ExecutionError> {
        debug!("line {}: {}", stmt.line, stmt.text);
        let at = |e| ExecutionError::new(stmt.line, stmt.text.as_str(), e);

        match &stmt.node {
            Statement::VarDecl(ident, expr) => self.eval_var_decl(ident, expr).map_err(at),
            Statement::Assign(ident, op) => self.eval_assign(ident, op).map_err(at),
            Statement::ForLoop(count, ident, body) => {
                let count = self.eval_count(count).map_err(at)?;

                // The loop variable must not outlive the loop, even if the body fails
                let ret = self.eval_for(count, ident, body);
                self.env.remove(ident);

                ret
            }
            Statement::Call(func, args) => self.eval_builtin(*func, args).map(|_| ()).map_err(at),
        }
    }

    /// Create a new `Eval` instance
    ///
    /// `sink` is where output should be written. eg. result of `print()` calls
    ///
    /// `input` is where `userInput()` reads from
    pub fn new(sink: &'a mut dyn Write, input: &'a mut dyn BufRead) -> Self {
        Self {
            sink,
            input,
            env: Environment::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn eval(
        &mut self,
        stmts: &[Spanned<Statement>],
    ) -> std::result::Result<(), ExecutionError> {
        for stmt in stmts {
            self.eval_statement(stmt)?;
        }

        Ok(())
    }
}

#[cfg(test)]
fn eval_prog(
    input: &str,
    stdin: &str,
) -> (std::result::Result<(), ExecutionError>, String, Vec<(Identifier, Value)>) {
    use crate::lang::parse::Statements;

    let stmts = Statements::new(input)
        .collect::<std::result::Result<Vec<_>, _>>()
        .expect("Failed to parse");

    let mut output = Vec::new();
    let mut stdin = stdin.as_bytes();
    let mut eval = Eval::new(&mut output, &mut stdin);
    let res = eval.eval(&stmts);
    let vars = eval
        .environment()
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    drop(eval);

    (res, String::from_utf8(output).expect("Output not utf-8"), vars)
}

#[cfg(test)]
fn eval_value(expr: &str, bindings: &[(&str, Value)]) -> Result<Value> {
    use crate::lang::lexer::tokenize;
    use crate::lang::parse::parse_expr;

    let mut output = Vec::new();
    let mut stdin: &[u8] = &[];
    let mut eval = Eval::new(&mut output, &mut stdin);
    for (name, val) in bindings {
        eval.env.bind((*name).into(), *val);
    }

    let expr = parse_expr(&tokenize(expr).expect("Failed to tokenize"))?;
    eval.eval_expr(&expr)
}

#[test]
fn test_expression() {
    let tests = vec![
        ("true", 1.0),
        ("false", 0.0),
        ("!true", 0.0),
        ("!false", 1.0),
        ("!!true", 1.0),
        ("5 + 5", 10.0),
        ("100 -3", 97.0),
        ("100* 3", 300.0),
        ("99 / 3", 33.0),
        ("7 / 2", 3.5),
        ("100 % 3", 1.0),
        ("2 ^ 10", 1024.0),
        ("-2 ^ 2", -4.0),
        ("2 ^ -1", 0.5),
        ("(1 + 2) * 3", 9.0),
        ("1 + 2 * 3", 7.0),
        ("1 == 1", 1.0),
        ("true == false", 0.0),
        ("true != false && 2 == 2", 1.0),
        ("true != false && 2 != 2", 0.0),
        ("true != false || 2 != 2", 1.0),
        ("1 < 3", 1.0),
        ("3 <= 3", 1.0),
        ("3 > 3", 0.0),
        ("3 >= 3", 1.0),
        ("abs(-4) + floor(2.9)", 6.0),
        ("max(1, 7, 3) - min(4, 2)", 5.0),
        ("sqrt(16) + add(1, 2, 3)", 10.0),
        ("5--3", 8.0),
        ("1e3 / .5", 2000.0),
    ];

    for (input, expected) in tests {
        assert_eq!(
            eval_value(input, &[]).expect("Failed to evaluate"),
            expected,
            "{}",
            input
        );
    }
}

#[test]
fn test_expression_variables() {
    let bindings = [("x", 4.0), ("flag", 1.0), ("weird", 2.5)];
    let tests = vec![
        ("x", 4.0),
        ("!flag", 0.0),
        ("!weird", 0.0),
        ("x * x - 1", 15.0),
        ("add(2, 3, x)", 9.0),
        ("add()", 0.0),
        ("sqrt(x)", 2.0),
        ("x--1", 5.0),
        ("-x--x", 0.0),
    ];

    for (input, expected) in tests {
        assert_eq!(
            eval_value(input, &bindings).expect("Failed to evaluate"),
            expected,
            "{}",
            input
        );
    }

    assert!(eval_value("sqrt(-1)", &bindings)
        .expect("sqrt(-1) should not fail")
        .is_nan());
    assert_eq!(eval_value("1 / 0", &[]).expect("1 / 0 failed"), f64::INFINITY);
}

#[test]
fn test_expression_errors() {
    assert!(matches!(
        eval_value("y + 1", &[]),
        Err(Error::UndefinedVariable(_))
    ));
    assert!(matches!(eval_value("!y", &[]), Err(Error::UndefinedVariable(_))));
    assert!(matches!(
        eval_value("frobnicate(1)", &[]),
        Err(Error::ExpressionSyntax(_))
    ));
    assert!(matches!(
        eval_value("sqrt(1, 2)", &[]),
        Err(Error::Arity { .. })
    ));
    assert!(matches!(
        eval_value("add(1, nope)", &[]),
        Err(Error::NumberFormat(_))
    ));
}

#[test]
fn test_logical_lazy_eval() {
    // The rhs would fail if evaluated
    assert_eq!(eval_value("false && missing", &[]).expect("&& not lazy"), 0.0);
    assert_eq!(eval_value("true || missing", &[]).expect("|| not lazy"), 1.0);
    assert!(eval_value("true && missing", &[]).is_err());
}

#[test]
fn test_declare_and_assign() {
    let (res, _, vars) = eval_prog(
        "var x = 5\nvar y = x * 2\nx ++\ny --\nx += 10\ny -= 4\nvar z = 1\nz = !z",
        "",
    );
    res.expect("Failed to eval");
    assert_eq!(
        vars,
        vec![
            (Identifier::from("x"), 16.0),
            (Identifier::from("y"), 5.0),
            (Identifier::from("z"), 0.0)
        ]
    );
}

#[test]
fn test_redeclare() {
    let (res, _, vars) = eval_prog("var x = 1\nvar x = 2", "");
    let err = res.expect_err("redeclaration should fail");
    assert_eq!(err.line, 2);
    assert!(matches!(err.kind, Error::NameConflict(_)));
    assert_eq!(vars, vec![(Identifier::from("x"), 1.0)]);
}

#[test]
fn test_assign_undefined() {
    let (res, _, _) = eval_prog("b = 5", "");
    let err = res.expect_err("assignment to undeclared variable should fail");
    assert_eq!(err.line, 1);
    assert_eq!(err.text, "b = 5");
    assert!(matches!(err.kind, Error::UndefinedVariable(_)));

    let (res, _, _) = eval_prog("b ++", "");
    assert!(matches!(
        res.expect_err("increment of undeclared variable should fail").kind,
        Error::UndefinedVariable(_)
    ));
}

#[test]
fn test_loop() {
    let tests = vec![
        ("var count = 0\nfor(3) => (i)\n{\ncount += 1\n}\nprint(count)", "3\n"),
        ("for(4) => (i) {\nprint(i)\n}", "0\n1\n2\n3\n"),
        ("var n = 2\nfor(n + 0.9) => (i) {\nprint(i)\n}", "0\n1\n"),
        ("for(0) => (i) {\nprint(i)\n}", ""),
        ("for(-3) => (i) {\nprint(i)\n}", ""),
    ];

    for (input, expected) in tests {
        let (res, output, vars) = eval_prog(input, "");
        res.expect("Failed to eval");
        assert_eq!(output, expected);
        assert!(vars.iter().all(|(k, _)| k.0 != "i"), "loop variable leaked");
    }
}

#[test]
fn test_loop_variable_removed_on_error() {
    let (res, output, vars) = eval_prog(
        "var total = 0\nfor(5) => (i) {\ntotal += i\nprint(total)\ntotal += boom\n}",
        "",
    );
    let err = res.expect_err("loop body should fail");
    assert_eq!(err.line, 5);
    assert!(matches!(err.kind, Error::UndefinedVariable(_)));
    assert_eq!(output, "0\n");
    assert_eq!(vars, vec![(Identifier::from("total"), 0.0)]);
}

#[test]
fn test_loop_overwrites_and_removes_existing() {
    let (res, output, vars) = eval_prog("var i = 42\nfor(2) => (i) {\nprint(i)\n}", "");
    res.expect("Failed to eval");
    assert_eq!(output, "0\n1\n");
    assert!(vars.is_empty());
}

#[test]
fn test_loop_bad_count() {
    let (res, _, _) = eval_prog("for(1 / 0) => (i) {\nprint(i)\n}", "");
    let err = res.expect_err("infinite count should fail");
    assert_eq!(err.line, 1);
    assert!(matches!(err.kind, Error::NumberFormat(_)));
}

#[test]
fn test_builtin_statements() {
    let (res, output, vars) = eval_prog(
        "var a = userInput()\nvar b = userInput()\nvar s = add(a, b, 0.5)\nprint(s)\nprint(missing)\nprint(a * 10)\nadd(1, 2)",
        "3\n4\n",
    );
    res.expect("Failed to eval");
    assert_eq!(output, "7.5\n30\n");
    assert_eq!(vars.len(), 3);
}

#[test]
fn test_user_input_errors() {
    let (res, _, _) = eval_prog("var a = userInput()\nvar b = userInput()", "1\n");
    let err = res.expect_err("second read should fail");
    assert_eq!(err.line, 2);
    assert!(matches!(err.kind, Error::InputExhausted));

    let (res, _, _) = eval_prog("var a = userInput()", "abc\n");
    assert!(matches!(
        res.expect_err("non-numeric input should fail").kind,
        Error::NumberFormat(_)
    ));

    let (res, _, _) = eval_prog("userInput(1)", "1\n");
    assert!(matches!(
        res.expect_err("userInput with args should fail").kind,
        Error::Arity { .. }
    ));
}
