//! This module implements the grammar of the language.
//!
//! Source is read one line at a time. Each normalized line is tokenized (see `lexer.rs`) and then
//! parsed by a PEG (https://en.wikipedia.org/wiki/Parsing_expression_grammar) over the token
//! stream. A line is exactly one statement, except for `for` loops which additionally consume
//! every line up to the first line that is exactly `}`.
//!
//! Developer notes:
//!
//! * A PEG is order sensitive. Alternatives are tried in order and the first match wins, so a
//!   function call must be tried before a bare identifier.
//!
//! * PEGs may not have left recursion. Operator precedence is implemented with a "precedence
//!   ladder": lower precedence operations are "higher up" on the parser so they bind later than
//!   the higher precedence operators.
//!
//! * Right hand sides of declarations and assignments are captured as raw tokens by the statement
//!   grammar and parsed as an expression afterwards. That way a malformed expression is reported
//!   as such instead of as an unrecognized statement.

use std::convert::TryFrom;
use std::iter::Enumerate;
use std::str::Lines;

use log::trace;
use pom::parser::{call, end, is_a, list, sym, Parser};

use crate::input::normalize;
use crate::lang::ast::*;
use crate::lang::error::{Error, ExecutionError, Result};
use crate::lang::functions::Builtin;
use crate::lang::lexer::{tokenize, Token};

/// Macro to left fold a series of binary expressions
///
/// Left fold creates left-to-right associativity, ie:
///     1 + 2 + 3 + 4 => ((1 + 2) + 3) + 4
macro_rules! left_fold_binop {
    ($binop_ty: expr, $lhs: expr, $rest: expr) => {{
        let binop_create_fn =
            |_op, e, ee| -> BinaryExpression { $binop_ty(Box::new(e), Box::new(ee)) };

        // Assign dummy operators b/c we already know the binop type and ignore the operator
        // argument in `binop_create_fn`
        let rest = $rest
            .into_iter()
            .map(|e| ((), e))
            .collect::<Vec<((), Expression)>>();

        left_fold_binop_multiop!(binop_create_fn, $lhs, rest)
    }};
}

/// Same as `left_fold_binop` except intead of taking one binop type, takes a function,
/// `binop_create_fn`, that creates an `BinaryExpression` based on the operator
macro_rules! left_fold_binop_multiop {
    ($binop_create_fn: expr, $lhs: expr, $rest: expr) => {{
        let mut expr = $lhs;
        for (op, e) in $rest {
            expr = Expression::BinaryExpression($binop_create_fn(op, expr, e));
        }

        expr
    }};
}

fn any_token<'a>() -> Parser<'a, Token, Token> {
    is_a(|_: Token| true)
}

fn ident<'a>() -> Parser<'a, Token, Identifier> {
    any_token().convert(|t| match t {
        Token::Ident(s) => Ok(Identifier(s)),
        t => Err(t),
    })
}

fn number<'a>() -> Parser<'a, Token, f64> {
    any_token().convert(|t| match t {
        Token::Number(n) => Ok(n),
        t => Err(t),
    })
}

fn constant<'a>() -> Parser<'a, Token, Expression> {
    let constant = number().map(Constant::Number)
        | sym(Token::True).map(|_| Constant::Boolean(true))
        | sym(Token::False).map(|_| Constant::Boolean(false));

    constant.map(|c| Expression::PrimaryExpression(PrimaryExpression::Constant(c)))
}

fn primary_expr<'a>() -> Parser<'a, Token, Expression> {
    let function_call = (ident() - sym(Token::LParen) + list(call(expr), sym(Token::Comma))
        - sym(Token::RParen))
    .map(|(func, args)| Expression::FunctionCall(func, args));
    let variable =
        ident().map(|i| Expression::PrimaryExpression(PrimaryExpression::Identifier(i)));
    let paren = (sym(Token::LParen) * call(expr) - sym(Token::RParen))
        .map(|e| Expression::PrimaryExpression(PrimaryExpression::Paren(Box::new(e))));

    constant() | function_call | variable | paren
}

/// NB: `^` is right associative and binds tighter than unary minus, ie. `-2^2 == -4`
fn power_expr<'a>() -> Parser<'a, Token, Expression> {
    let pow = call(primary_expr) + (sym(Token::Caret) * call(unary_expr)).opt();

    pow.map(|(base, exp)| match exp {
        Some(exp) => {
            Expression::BinaryExpression(BinaryExpression::Power(Box::new(base), Box::new(exp)))
        }
        None => base,
    })
}

fn unary_expr<'a>() -> Parser<'a, Token, Expression> {
    let ops = sym(Token::Bang) | sym(Token::Minus);
    let not_minus = ops.repeat(0..) + call(power_expr);

    // NB: unary expression are right-to-left associativity, so fold-right
    not_minus.map(|(mut ops, expr)| {
        let mut expr = expr;
        while let Some(op) = ops.pop() {
            match op {
                Token::Bang => {
                    expr = Expression::UnaryExpression(UnaryExpression::Not(Box::new(expr)))
                }
                _ => expr = Expression::UnaryExpression(UnaryExpression::Minus(Box::new(expr))),
            }
        }

        expr
    })
}

fn mult_expr<'a>() -> Parser<'a, Token, Expression> {
    let ops = sym(Token::Star) | sym(Token::Slash) | sym(Token::Percent);
    let mult_div_mod = call(unary_expr) + (ops + call(unary_expr)).repeat(0..);

    mult_div_mod.map(|(lhs, rest)| {
        let binop_create_fn = |op: Token, lhs, rhs| match op {
            Token::Star => BinaryExpression::Multiply(Box::new(lhs), Box::new(rhs)),
            Token::Slash => BinaryExpression::Divide(Box::new(lhs), Box::new(rhs)),
            Token::Percent => BinaryExpression::Modulo(Box::new(lhs), Box::new(rhs)),
            _ => panic!("Unhandled mult operator: {}", op),
        };

        left_fold_binop_multiop!(binop_create_fn, lhs, rest)
    })
}

fn add_expr<'a>() -> Parser<'a, Token, Expression> {
    let ops = sym(Token::Plus) | sym(Token::Minus);
    let plus_minus = call(mult_expr) + (ops + call(mult_expr)).repeat(0..);

    plus_minus.map(|(lhs, rest)| {
        let binop_create_fn = |op: Token, lhs, rhs| match op {
            Token::Plus => BinaryExpression::Plus(Box::new(lhs), Box::new(rhs)),
            Token::Minus => BinaryExpression::Minus(Box::new(lhs), Box::new(rhs)),
            _ => panic!("Unhandled addition operator: {}", op),
        };

        left_fold_binop_multiop!(binop_create_fn, lhs, rest)
    })
}

fn relation_expr<'a>() -> Parser<'a, Token, Expression> {
    let ops = sym(Token::LessEqual)
        | sym(Token::Less)
        | sym(Token::GreaterEqual)
        | sym(Token::Greater);
    let lt_lte_gt_gte = call(add_expr) + (ops + call(add_expr)).repeat(0..);

    lt_lte_gt_gte.map(|(lhs, rest)| {
        let binop_create_fn = |op: Token, lhs, rhs| match op {
            Token::Less => BinaryExpression::LessThan(Box::new(lhs), Box::new(rhs)),
            Token::LessEqual => BinaryExpression::LessThanEquals(Box::new(lhs), Box::new(rhs)),
            Token::Greater => BinaryExpression::GreaterThan(Box::new(lhs), Box::new(rhs)),
            Token::GreaterEqual => {
                BinaryExpression::GreaterThanEquals(Box::new(lhs), Box::new(rhs))
            }
            _ => panic!("Unhandled relational operator: {}", op),
        };

        left_fold_binop_multiop!(binop_create_fn, lhs, rest)
    })
}

/// NB: equality expressions cannot be chained (eg `1 == 2 == false`)
fn eq_expr<'a>() -> Parser<'a, Token, Expression> {
    let ops = sym(Token::EqualEqual) | sym(Token::NotEqual);
    let eq_neq = call(relation_expr) + (ops + call(relation_expr)).opt();

    eq_neq.map(|(lhs, rhs)| match rhs {
        Some((Token::EqualEqual, rhs)) => {
            Expression::BinaryExpression(BinaryExpression::Equals(Box::new(lhs), Box::new(rhs)))
        }
        Some((_, rhs)) => Expression::BinaryExpression(BinaryExpression::NotEquals(
            Box::new(lhs),
            Box::new(rhs),
        )),
        None => lhs,
    })
}

fn and_expr<'a>() -> Parser<'a, Token, Expression> {
    let land = call(eq_expr) + (sym(Token::AndAnd) * call(eq_expr)).repeat(0..);
    land.map(|(lhs, rhs)| left_fold_binop!(BinaryExpression::LogicalAnd, lhs, rhs))
}

fn or_expr<'a>() -> Parser<'a, Token, Expression> {
    let lor = call(and_expr) + (sym(Token::OrOr) * call(and_expr)).repeat(0..);
    lor.map(|(lhs, rhs)| left_fold_binop!(BinaryExpression::LogicalOr, lhs, rhs))
}

fn expr<'a>() -> Parser<'a, Token, Expression> {
    or_expr()
}

/// Statement shapes before their raw expression tokens are parsed
enum Shape {
    VarDecl(Identifier, Vec<Token>),
    Update(Identifier, fn(Expression) -> AssignOp, Vec<Token>),
    Step(Identifier, AssignOp),
    /// (count, loop variable, `{` on the same line)
    ForHeader(Expression, Identifier, bool),
    Call(Identifier, Vec<Expression>),
    OpenBrace,
    CloseBrace,
}

fn rest<'a>() -> Parser<'a, Token, Vec<Token>> {
    any_token().repeat(1..)
}

fn var_decl<'a>() -> Parser<'a, Token, Shape> {
    (sym(Token::Var) * ident() - sym(Token::Assign) + rest())
        .map(|(ident, rhs)| Shape::VarDecl(ident, rhs))
}

fn for_header<'a>() -> Parser<'a, Token, Shape> {
    let header = sym(Token::For) * sym(Token::LParen) * expr()
        - sym(Token::RParen)
        - sym(Token::Arrow)
        - sym(Token::LParen)
        + ident()
        - sym(Token::RParen)
        + sym(Token::LBrace).opt();

    header.map(|((count, var), brace)| Shape::ForHeader(count, var, brace.is_some()))
}

fn assign<'a>() -> Parser<'a, Token, Shape> {
    let update_op = sym(Token::Assign).map(|_| AssignOp::Set as fn(Expression) -> AssignOp)
        | sym(Token::PlusAssign).map(|_| AssignOp::Add as fn(Expression) -> AssignOp)
        | sym(Token::MinusAssign).map(|_| AssignOp::Sub as fn(Expression) -> AssignOp);
    let update =
        (ident() + update_op + rest()).map(|((ident, op), rhs)| Shape::Update(ident, op, rhs));

    let step_op = sym(Token::Increment).map(|_| AssignOp::Increment)
        | sym(Token::Decrement).map(|_| AssignOp::Decrement);
    let step = (ident() + step_op).map(|(ident, op)| Shape::Step(ident, op));

    update | step
}

fn call_stmt<'a>() -> Parser<'a, Token, Shape> {
    (ident() - sym(Token::LParen) + list(expr(), sym(Token::Comma)) - sym(Token::RParen))
        .map(|(func, args)| Shape::Call(func, args))
}

fn line<'a>() -> Parser<'a, Token, Shape> {
    let open = sym(Token::LBrace).map(|_| Shape::OpenBrace);
    let close = sym(Token::RBrace).map(|_| Shape::CloseBrace);

    (var_decl() | for_header() | call_stmt() | assign() | open | close) - end()
}

/// Deepest parenthesis nesting the grammar will descend into
const MAX_NESTING: usize = 64;

/// Reject input whose nesting would exhaust the stack in the recursive grammar
///
/// Right associative `^` chains recurse like parentheses do, so they count towards the limit.
fn check_nesting(tokens: &[Token]) -> Result<()> {
    let mut depth: usize = 0;
    let mut deepest = 0;
    let mut powers = 0;
    for t in tokens {
        match t {
            Token::LParen => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Caret => powers += 1,
            _ => (),
        }
    }

    if deepest + powers > MAX_NESTING {
        return Err(Error::ExpressionSyntax(
            "expression nested too deeply".to_string(),
        ));
    }

    Ok(())
}

/// Parse a complete expression out of `tokens`
pub fn parse_expr(tokens: &[Token]) -> Result<Expression> {
    check_nesting(tokens)?;

    let parser = expr() - end();
    parser.parse(tokens).map_err(|e| {
        let position = match e {
            pom::Error::Mismatch { position, .. } => position,
            pom::Error::Conversion { position, .. } => position,
            pom::Error::Expect { position, .. } => position,
            pom::Error::Custom { position, .. } => position,
            _ => tokens.len(),
        };

        match tokens.get(position) {
            Some(t) => Error::ExpressionSyntax(format!("unexpected '{}'", t)),
            None => Error::ExpressionSyntax("unexpected end of expression".to_string()),
        }
    })
}

/// A parsed line
#[derive(Debug, PartialEq)]
pub enum Line {
    Statement(Statement),
    /// (count, loop variable, `{` on the same line)
    ForHeader(Expression, Identifier, bool),
    OpenBrace,
    CloseBrace,
}

/// Parse a single normalized line
pub fn parse_line(text: &str) -> Result<Line> {
    let tokens = tokenize(text).map_err(|pos| {
        let c = text.chars().nth(pos).unwrap_or(' ');
        Error::Syntax(format!("Unexpected character '{}'", c))
    })?;
    check_nesting(&tokens)?;

    let shape = line()
        .parse(&tokens)
        .map_err(|_| Error::Syntax(format!("Unrecognized statement '{}'", text)))?;

    let line = match shape {
        Shape::VarDecl(ident, rhs) => Line::Statement(Statement::VarDecl(ident, parse_expr(&rhs)?)),
        Shape::Update(ident, op, rhs) => {
            Line::Statement(Statement::Assign(ident, op(parse_expr(&rhs)?)))
        }
        Shape::Step(ident, op) => Line::Statement(Statement::Assign(ident, op)),
        Shape::ForHeader(count, var, brace) => Line::ForHeader(count, var, brace),
        Shape::Call(func, args) => {
            Line::Statement(Statement::Call(Builtin::try_from(func.0.as_str())?, args))
        }
        Shape::OpenBrace => Line::OpenBrace,
        Shape::CloseBrace => Line::CloseBrace,
    };

    Ok(line)
}

/// Lazily parses a program into statements
///
/// Statements are produced one at a time so that they can be executed as soon as they are read.
/// A `for` loop is produced as a single statement once its whole body has been captured.
pub struct Statements<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Statements<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
        }
    }

    /// Returns the next line that isn't blank or a comment as (line number, text)
    fn next_line(&mut self) -> Option<(usize, String)> {
        for (idx, raw) in &mut self.lines {
            let line = normalize(raw);
            if !line.is_skip() {
                return Some((idx + 1, line.text));
            }
        }

        None
    }

    fn parse_for_body(
        &mut self,
        header_line: usize,
        header_text: &str,
        mut opened: bool,
    ) -> std::result::Result<Vec<Spanned<Statement>>, ExecutionError> {
        let mut body = Vec::new();

        loop {
            let (line, text) = match self.next_line() {
                Some(l) => l,
                None => {
                    return Err(ExecutionError::new(
                        header_line,
                        header_text,
                        Error::Syntax("Unterminated for loop, expected '}'".to_string()),
                    ))
                }
            };

            if !opened {
                if text == "{" {
                    opened = true;
                    continue;
                }

                return Err(ExecutionError::new(
                    line,
                    text,
                    Error::Syntax("Expected '{' after for loop header".to_string()),
                ));
            }

            // NB: closing brace matching is purely textual
            if text == "}" {
                trace!("captured {} line for loop body", body.len());
                return Ok(body);
            }

            let node = match parse_line(&text) {
                Ok(Line::Statement(s)) => s,
                Ok(Line::ForHeader(..)) => {
                    return Err(ExecutionError::new(
                        line,
                        text,
                        Error::Syntax("Nested for loops are not supported".to_string()),
                    ))
                }
                Ok(Line::OpenBrace) | Ok(Line::CloseBrace) => {
                    return Err(ExecutionError::new(
                        line,
                        text,
                        Error::Syntax("Unexpected brace in for loop body".to_string()),
                    ))
                }
                Err(e) => return Err(ExecutionError::new(line, text, e)),
            };

            body.push(Spanned { line, text, node });
        }
    }

    fn parse_statement(
        &mut self,
        line: usize,
        text: String,
    ) -> std::result::Result<Spanned<Statement>, ExecutionError> {
        let node = match parse_line(&text) {
            Ok(Line::Statement(s)) => s,
            Ok(Line::ForHeader(count, var, opened)) => {
                let body = self.parse_for_body(line, &text, opened)?;
                Statement::ForLoop(count, var, body)
            }
            Ok(Line::OpenBrace) => {
                return Err(ExecutionError::new(
                    line,
                    text,
                    Error::Syntax("'{' without a for loop header".to_string()),
                ))
            }
            Ok(Line::CloseBrace) => {
                return Err(ExecutionError::new(
                    line,
                    text,
                    Error::Syntax("Unmatched '}'".to_string()),
                ))
            }
            Err(e) => return Err(ExecutionError::new(line, text, e)),
        };

        Ok(Spanned { line, text, node })
    }
}

impl<'a> Iterator for Statements<'a> {
    type Item = std::result::Result<Spanned<Statement>, ExecutionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line, text) = self.next_line()?;
        Some(self.parse_statement(line, text))
    }
}

#[cfg(test)]
fn parse_expr_str(input: &str) -> Result<Expression> {
    parse_expr(&tokenize(input).expect("Failed to tokenize"))
}

#[cfg(test)]
fn num(n: f64) -> Box<Expression> {
    Box::new(Expression::PrimaryExpression(PrimaryExpression::Constant(
        Constant::Number(n),
    )))
}

#[cfg(test)]
fn var(name: &str) -> Box<Expression> {
    Box::new(Expression::PrimaryExpression(PrimaryExpression::Identifier(
        name.into(),
    )))
}

#[test]
fn test_primary_expr() {
    let data = vec![
        ("asdf", *var("asdf")),
        ("_var1", *var("_var1")),
        ("42", *num(42.0)),
        ("4.25", *num(4.25)),
        (
            "true",
            Expression::PrimaryExpression(PrimaryExpression::Constant(Constant::Boolean(true))),
        ),
        (
            "(false)",
            Expression::PrimaryExpression(PrimaryExpression::Paren(Box::new(
                Expression::PrimaryExpression(PrimaryExpression::Constant(Constant::Boolean(
                    false,
                ))),
            ))),
        ),
        (
            "add(x, 2)",
            Expression::FunctionCall("add".into(), vec![*var("x"), *num(2.0)]),
        ),
        ("userInput()", Expression::FunctionCall("userInput".into(), vec![])),
    ];

    for (input, expected) in data {
        assert_eq!(parse_expr_str(input).expect("Failed to parse"), expected);
    }
}

#[test]
fn test_arith_expr() {
    let data = vec![
        (
            "1 + 2 * 3",
            Expression::BinaryExpression(BinaryExpression::Plus(
                num(1.0),
                Box::new(Expression::BinaryExpression(BinaryExpression::Multiply(
                    num(2.0),
                    num(3.0),
                ))),
            )),
        ),
        (
            "8 - 4 - 2",
            Expression::BinaryExpression(BinaryExpression::Minus(
                Box::new(Expression::BinaryExpression(BinaryExpression::Minus(
                    num(8.0),
                    num(4.0),
                ))),
                num(2.0),
            )),
        ),
        (
            "2 ^ 3 ^ 2",
            Expression::BinaryExpression(BinaryExpression::Power(
                num(2.0),
                Box::new(Expression::BinaryExpression(BinaryExpression::Power(
                    num(3.0),
                    num(2.0),
                ))),
            )),
        ),
        (
            "-2 ^ 2",
            Expression::UnaryExpression(UnaryExpression::Minus(Box::new(
                Expression::BinaryExpression(BinaryExpression::Power(num(2.0), num(2.0))),
            ))),
        ),
        (
            "x % 2 == 0",
            Expression::BinaryExpression(BinaryExpression::Equals(
                Box::new(Expression::BinaryExpression(BinaryExpression::Modulo(
                    var("x"),
                    num(2.0),
                ))),
                num(0.0),
            )),
        ),
    ];

    for (input, expected) in data {
        assert_eq!(parse_expr_str(input).expect("Failed to parse"), expected);
    }
}

#[test]
fn test_logic_expr() {
    let expected = Expression::BinaryExpression(BinaryExpression::LogicalOr(
        Box::new(Expression::BinaryExpression(BinaryExpression::LessThan(
            var("a"),
            var("b"),
        ))),
        Box::new(Expression::BinaryExpression(BinaryExpression::LogicalAnd(
            Box::new(Expression::UnaryExpression(UnaryExpression::Not(var("c")))),
            Box::new(Expression::BinaryExpression(
                BinaryExpression::GreaterThanEquals(var("d"), num(1.0)),
            )),
        ))),
    ));

    assert_eq!(
        parse_expr_str("a < b || !c && d >= 1").expect("Failed to parse"),
        expected
    );
}

#[test]
fn test_bad_expr() {
    let data = vec![
        ("1 +", "Malformed expression: unexpected '+'"),
        ("* 2", "Malformed expression: unexpected '*'"),
        ("1 == 2 == 3", "Malformed expression: unexpected '=='"),
        ("(1 + 2", "Malformed expression: unexpected end of expression"),
    ];

    for (input, expected) in data {
        match parse_expr_str(input) {
            Err(e @ Error::ExpressionSyntax(_)) => assert_eq!(e.to_string(), expected),
            other => panic!("expected syntax error for '{}', got {:?}", input, other),
        }
    }
}

#[test]
fn test_nesting_limit() {
    let nested = |depth| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

    assert!(parse_expr_str(&nested(MAX_NESTING)).is_ok());
    match parse_expr_str(&nested(MAX_NESTING + 1)) {
        Err(e @ Error::ExpressionSyntax(_)) => {
            assert_eq!(e.to_string(), "Malformed expression: expression nested too deeply")
        }
        other => panic!("deep nesting not rejected: {:?}", other),
    }

    let powers = vec!["2"; 500].join("^");
    assert!(matches!(
        parse_expr_str(&powers),
        Err(Error::ExpressionSyntax(_))
    ));

    // Statement forms parse expressions in place, so they are checked too
    let deep = format!("print({})", nested(500));
    assert!(matches!(parse_line(&deep), Err(Error::ExpressionSyntax(_))));
    let deep = format!("for({}) => (i)", nested(500));
    assert!(matches!(parse_line(&deep), Err(Error::ExpressionSyntax(_))));
}

#[test]
fn test_parse_line() {
    let data = vec![
        (
            "var x = 3",
            Line::Statement(Statement::VarDecl("x".into(), *num(3.0))),
        ),
        (
            "x += y",
            Line::Statement(Statement::Assign("x".into(), AssignOp::Add(*var("y")))),
        ),
        (
            "x -= 1",
            Line::Statement(Statement::Assign("x".into(), AssignOp::Sub(*num(1.0)))),
        ),
        (
            "x = !x",
            Line::Statement(Statement::Assign(
                "x".into(),
                AssignOp::Set(Expression::UnaryExpression(UnaryExpression::Not(var("x")))),
            )),
        ),
        (
            "x ++",
            Line::Statement(Statement::Assign("x".into(), AssignOp::Increment)),
        ),
        (
            "x--",
            Line::Statement(Statement::Assign("x".into(), AssignOp::Decrement)),
        ),
        (
            "print(x)",
            Line::Statement(Statement::Call(Builtin::Print, vec![*var("x")])),
        ),
        (
            "add()",
            Line::Statement(Statement::Call(Builtin::Add, vec![])),
        ),
        (
            "for(3) => (i)",
            Line::ForHeader(*num(3.0), "i".into(), false),
        ),
        (
            "for (n + 1) => (idx) {",
            Line::ForHeader(
                Expression::BinaryExpression(BinaryExpression::Plus(var("n"), num(1.0))),
                "idx".into(),
                true,
            ),
        ),
        ("{", Line::OpenBrace),
        ("}", Line::CloseBrace),
    ];

    for (input, expected) in data {
        assert_eq!(parse_line(input).expect("Failed to parse"), expected);
    }
}

#[test]
fn test_parse_line_errors() {
    assert!(matches!(parse_line("var x = 3 +"), Err(Error::ExpressionSyntax(_))));
    assert!(matches!(parse_line("x = "), Err(Error::Syntax(_))));
    assert!(matches!(parse_line("var = 3"), Err(Error::Syntax(_))));
    assert!(matches!(parse_line("x"), Err(Error::Syntax(_))));
    assert!(matches!(parse_line("sin(3)"), Err(Error::Syntax(_))));
    assert!(matches!(parse_line("for(3) => i"), Err(Error::Syntax(_))));
    assert!(matches!(parse_line("x = 3 $"), Err(Error::Syntax(_))));
}

#[test]
fn test_statements() {
    let prog = "# counting\nvar count = 0   # start\n\nfor(3) => (i)\n{\n  count  +=  i\n}\nprint(count)\n";
    let stmts = Statements::new(prog)
        .collect::<std::result::Result<Vec<_>, _>>()
        .expect("Failed to parse");

    assert_eq!(
        stmts,
        vec![
            Spanned {
                line: 2,
                text: "var count = 0".to_string(),
                node: Statement::VarDecl("count".into(), *num(0.0)),
            },
            Spanned {
                line: 4,
                text: "for(3) => (i)".to_string(),
                node: Statement::ForLoop(
                    *num(3.0),
                    "i".into(),
                    vec![Spanned {
                        line: 6,
                        text: "count += i".to_string(),
                        node: Statement::Assign("count".into(), AssignOp::Add(*var("i"))),
                    }],
                ),
            },
            Spanned {
                line: 8,
                text: "print(count)".to_string(),
                node: Statement::Call(Builtin::Print, vec![*var("count")]),
            },
        ]
    );
}

#[test]
fn test_statements_block_errors() {
    let data = vec![
        ("for(2) => (i)\nprint(i)\n}", 2, "Expected '{'"),
        ("for(2) => (i) {\nprint(i)\n", 1, "Unterminated for loop"),
        (
            "for(2) => (i) {\nfor(2) => (j) {\n}\n}",
            2,
            "Nested for loops are not supported",
        ),
        ("var x = 1\n}", 2, "Unmatched '}'"),
        ("{", 1, "'{' without a for loop header"),
    ];

    for (input, line, msg) in data {
        let err = Statements::new(input)
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect_err("Parse should have failed");
        assert_eq!(err.line, line, "wrong line for {:?}", input);
        assert!(
            err.kind.to_string().contains(msg),
            "'{}' does not contain '{}'",
            err.kind,
            msg
        );
    }
}
