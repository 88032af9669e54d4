/// Every value is a double. Booleans are 1.0 (true) and 0.0 (false).
pub type Value = f64;

pub const TRUE: Value = 1.0;
pub const FALSE: Value = 0.0;

pub fn from_bool(b: bool) -> Value {
    if b {
        TRUE
    } else {
        FALSE
    }
}

/// Any nonzero value (including NaN) counts as true
pub fn is_truthy(v: Value) -> bool {
    v != 0.0
}

pub fn invert(v: Value) -> Value {
    from_bool(!is_truthy(v))
}

/// Renders a value the way `print` shows it (`3`, not `3.0`)
pub fn display(v: Value) -> String {
    format!("{}", v)
}

#[test]
fn test_invert() {
    assert_eq!(invert(TRUE), FALSE);
    assert_eq!(invert(FALSE), TRUE);
    assert_eq!(invert(-2.5), FALSE);
    assert_eq!(invert(-0.0), TRUE);
}

#[test]
fn test_display() {
    let data = vec![
        (3.0, "3"),
        (-7.0, "-7"),
        (2.5, "2.5"),
        (0.1 + 0.2, "0.30000000000000004"),
        (f64::NAN, "NaN"),
    ];

    for (input, expected) in data {
        assert_eq!(display(input), expected);
    }
}
