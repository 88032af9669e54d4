//! Turns one normalized source line into a stream of `Token`s.
//!
//! Like the grammar in `parse.rs`, the lexer is a PEG. Order matters: multi-character operators
//! must be tried before any operator that is a prefix of them (eg. `=>` before `=`), and keywords
//! are recognized after the whole word has been read so `variable` is not lexed as `var iable`.

use std::fmt;
use std::iter::FromIterator;
use std::str::FromStr;

use pom::parser::{end, is_a, one_of, sym, tag, Parser};

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Var,
    For,
    True,
    False,
    Ident(String),
    Number(f64),
    /// `=>`
    Arrow,
    /// `=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `++`
    Increment,
    /// `--`
    Decrement,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Var => "var",
            Token::For => "for",
            Token::True => "true",
            Token::False => "false",
            Token::Ident(i) => return write!(f, "{}", i),
            Token::Number(n) => return write!(f, "{}", n),
            Token::Arrow => "=>",
            Token::Assign => "=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::Increment => "++",
            Token::Decrement => "--",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Caret => "^",
            Token::Bang => "!",
            Token::EqualEqual => "==",
            Token::NotEqual => "!=",
            Token::Less => "<",
            Token::LessEqual => "<=",
            Token::Greater => ">",
            Token::GreaterEqual => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
        };

        write!(f, "{}", s)
    }
}

fn space<'a>() -> Parser<'a, char, ()> {
    one_of(" \t").repeat(0..).discard()
}

fn number<'a>() -> Parser<'a, char, Token> {
    let digits = || one_of("0123456789").repeat(1..);
    let frac = || sym('.') + digits();
    let exp = one_of("eE") + one_of("+-").opt() + digits();
    let mantissa = (digits() + frac().opt()).discard() | frac().discard();
    let number = (mantissa + exp.opt())
        .collect()
        .map(String::from_iter)
        .convert(|s| f64::from_str(&s));

    number.map(Token::Number)
}

fn word<'a>() -> Parser<'a, char, Token> {
    (is_a(|c: char| c.is_ascii_alphabetic() || c == '_')
        + is_a(|c: char| c.is_ascii_alphanumeric() || c == '_').repeat(0..))
    .collect()
    .map(String::from_iter)
    .map(|w| match w.as_str() {
        "var" => Token::Var,
        "for" => Token::For,
        "true" => Token::True,
        "false" => Token::False,
        _ => Token::Ident(w),
    })
}

/// `++` and `--` only exist as statement suffixes. Anywhere else they are two signs, so `5--3`
/// lexes as `5 - -3`.
fn step<'a>() -> Parser<'a, char, Token> {
    let increment = tag("++") - space() - end();
    let decrement = tag("--") - space() - end();

    increment.map(|_| Token::Increment) | decrement.map(|_| Token::Decrement)
}

fn operator<'a>() -> Parser<'a, char, Token> {
    // NB: longest match first
    let double = tag("=>").map(|_| Token::Arrow)
        | tag("==").map(|_| Token::EqualEqual)
        | tag("!=").map(|_| Token::NotEqual)
        | tag("<=").map(|_| Token::LessEqual)
        | tag(">=").map(|_| Token::GreaterEqual)
        | tag("&&").map(|_| Token::AndAnd)
        | tag("||").map(|_| Token::OrOr)
        | tag("+=").map(|_| Token::PlusAssign)
        | tag("-=").map(|_| Token::MinusAssign)
        | step();
    let single = sym('=').map(|_| Token::Assign)
        | sym('+').map(|_| Token::Plus)
        | sym('-').map(|_| Token::Minus)
        | sym('*').map(|_| Token::Star)
        | sym('/').map(|_| Token::Slash)
        | sym('%').map(|_| Token::Percent)
        | sym('^').map(|_| Token::Caret)
        | sym('!').map(|_| Token::Bang)
        | sym('<').map(|_| Token::Less)
        | sym('>').map(|_| Token::Greater)
        | sym('(').map(|_| Token::LParen)
        | sym(')').map(|_| Token::RParen)
        | sym('{').map(|_| Token::LBrace)
        | sym('}').map(|_| Token::RBrace)
        | sym(',').map(|_| Token::Comma);

    double | single
}

fn token<'a>() -> Parser<'a, char, Token> {
    (number() | word() | operator()) - space()
}

/// Tokenize a single line
///
/// Returns the offending character index on failure
pub fn tokenize(line: &str) -> Result<Vec<Token>, usize> {
    let input: Vec<char> = line.chars().collect();
    let lexer = space() * token().repeat(0..) - end();

    lexer.parse(&input).map_err(|e| match e {
        pom::Error::Mismatch { position, .. } => position,
        pom::Error::Conversion { position, .. } => position,
        pom::Error::Expect { position, .. } => position,
        pom::Error::Custom { position, .. } => position,
        _ => 0,
    })
}

#[test]
fn test_tokenize_statements() {
    let data = vec![
        (
            "var x = 3",
            vec![
                Token::Var,
                Token::Ident("x".to_string()),
                Token::Assign,
                Token::Number(3.0),
            ],
        ),
        (
            "for(10) => (i)",
            vec![
                Token::For,
                Token::LParen,
                Token::Number(10.0),
                Token::RParen,
                Token::Arrow,
                Token::LParen,
                Token::Ident("i".to_string()),
                Token::RParen,
            ],
        ),
        (
            "count += 1.5",
            vec![
                Token::Ident("count".to_string()),
                Token::PlusAssign,
                Token::Number(1.5),
            ],
        ),
        (
            "x --",
            vec![Token::Ident("x".to_string()), Token::Decrement],
        ),
        (
            "print(add(a,2))",
            vec![
                Token::Ident("print".to_string()),
                Token::LParen,
                Token::Ident("add".to_string()),
                Token::LParen,
                Token::Ident("a".to_string()),
                Token::Comma,
                Token::Number(2.0),
                Token::RParen,
                Token::RParen,
            ],
        ),
        ("", vec![]),
    ];

    for (input, expected) in data {
        assert_eq!(tokenize(input), Ok(expected));
    }
}

#[test]
fn test_tokenize_keywords_vs_identifiers() {
    let data = vec![
        ("variable", Token::Ident("variable".to_string())),
        ("format", Token::Ident("format".to_string())),
        ("trueish", Token::Ident("trueish".to_string())),
        ("_tmp1", Token::Ident("_tmp1".to_string())),
        ("true", Token::True),
        ("false", Token::False),
    ];

    for (input, expected) in data {
        assert_eq!(tokenize(input), Ok(vec![expected]));
    }
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        tokenize("!a<=b&&c!=d||e>=f"),
        Ok(vec![
            Token::Bang,
            Token::Ident("a".to_string()),
            Token::LessEqual,
            Token::Ident("b".to_string()),
            Token::AndAnd,
            Token::Ident("c".to_string()),
            Token::NotEqual,
            Token::Ident("d".to_string()),
            Token::OrOr,
            Token::Ident("e".to_string()),
            Token::GreaterEqual,
            Token::Ident("f".to_string()),
        ])
    );
    assert_eq!(
        tokenize("\t2 ^ 3 % 4"),
        Ok(vec![
            Token::Number(2.0),
            Token::Caret,
            Token::Number(3.0),
            Token::Percent,
            Token::Number(4.0),
        ])
    );
}

#[test]
fn test_tokenize_numbers() {
    let data = vec![
        ("42", 42.0),
        ("4.25", 4.25),
        (".5", 0.5),
        ("1e3", 1000.0),
        ("2.5E-2", 0.025),
        ("6e+1", 60.0),
    ];

    for (input, expected) in data {
        assert_eq!(tokenize(input), Ok(vec![Token::Number(expected)]), "{}", input);
    }

    // No exponent digits, so `e` is an identifier
    assert_eq!(
        tokenize("2e"),
        Ok(vec![Token::Number(2.0), Token::Ident("e".to_string())])
    );
}

#[test]
fn test_tokenize_step_only_at_end() {
    assert_eq!(
        tokenize("x++  "),
        Ok(vec![Token::Ident("x".to_string()), Token::Increment])
    );
    assert_eq!(
        tokenize("5--3"),
        Ok(vec![
            Token::Number(5.0),
            Token::Minus,
            Token::Minus,
            Token::Number(3.0),
        ])
    );
    assert_eq!(
        tokenize("x ++ 1"),
        Ok(vec![
            Token::Ident("x".to_string()),
            Token::Plus,
            Token::Plus,
            Token::Number(1.0),
        ])
    );
}

#[test]
fn test_tokenize_bad_input() {
    assert_eq!(tokenize("var x = $"), Err(8));
    assert!(tokenize("x = 1.").is_err());
    assert!(tokenize("\"str\"").is_err());
}
