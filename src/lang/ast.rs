use std::fmt;

use crate::lang::functions::Builtin;

#[derive(Debug, PartialEq, Clone)]
pub enum UnaryExpression {
    /// `!`
    Not(Box<Expression>),
    /// `-`
    Minus(Box<Expression>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum BinaryExpression {
    /// `+`
    Plus(Box<Expression>, Box<Expression>),
    /// `-`
    Minus(Box<Expression>, Box<Expression>),
    /// `*`
    Multiply(Box<Expression>, Box<Expression>),
    /// `/`
    Divide(Box<Expression>, Box<Expression>),
    /// `%`
    Modulo(Box<Expression>, Box<Expression>),
    /// `^`
    Power(Box<Expression>, Box<Expression>),
    /// `==`
    Equals(Box<Expression>, Box<Expression>),
    /// `!=`
    NotEquals(Box<Expression>, Box<Expression>),
    /// `&&`
    LogicalAnd(Box<Expression>, Box<Expression>),
    /// `||`
    LogicalOr(Box<Expression>, Box<Expression>),
    /// `<`
    LessThan(Box<Expression>, Box<Expression>),
    /// `<=`
    LessThanEquals(Box<Expression>, Box<Expression>),
    /// `>`
    GreaterThan(Box<Expression>, Box<Expression>),
    /// `>=`
    GreaterThanEquals(Box<Expression>, Box<Expression>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Constant {
    Number(f64),
    Boolean(bool),
}

#[derive(Debug, PartialEq, Hash, PartialOrd, Ord, Eq, Clone)]
pub struct Identifier(pub String);

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier(s.to_string())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum PrimaryExpression {
    Identifier(Identifier),
    Constant(Constant),
    Paren(Box<Expression>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    PrimaryExpression(PrimaryExpression),
    /// (function, arguments)
    FunctionCall(Identifier, Vec<Expression>),
    BinaryExpression(BinaryExpression),
    UnaryExpression(UnaryExpression),
}

/// Right hand side of an assignment to an existing variable
#[derive(Debug, PartialEq, Clone)]
pub enum AssignOp {
    /// `=`
    Set(Expression),
    /// `+=`
    Add(Expression),
    /// `-=`
    Sub(Expression),
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            AssignOp::Set(_) => "=",
            AssignOp::Add(_) => "+=",
            AssignOp::Sub(_) => "-=",
            AssignOp::Increment => "++",
            AssignOp::Decrement => "--",
        };

        write!(f, "{}", op)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    /// `var NAME = EXPR`
    VarDecl(Identifier, Expression),
    /// `NAME OP [EXPR]`
    Assign(Identifier, AssignOp),
    /// (count, loop variable, body)
    ForLoop(Expression, Identifier, Vec<Spanned<Statement>>),
    /// (function, arguments)
    Call(Builtin, Vec<Expression>),
}

/// A node tagged with the source line it came from
#[derive(Debug, PartialEq, Clone)]
pub struct Spanned<T> {
    /// 1-based line number
    pub line: usize,
    /// Normalized source text of the line
    pub text: String,
    pub node: T,
}
