/// One line of source after comment stripping and whitespace collapsing
#[derive(Debug, PartialEq)]
pub struct NormalizedLine {
    pub text: String,
}

impl NormalizedLine {
    /// Blank and comment lines produce no statement
    pub fn is_skip(&self) -> bool {
        self.text.is_empty() || self.text.starts_with('#')
    }
}

/// Drop everything from the first `#` to the end of the line
pub fn strip_comment(input: &str) -> &str {
    match input.find('#') {
        Some(idx) => &input[..idx],
        None => input,
    }
}

/// Collapse runs of spaces into a single space. Other whitespace is left alone.
pub fn collapse_spaces(input: &str) -> String {
    let mut collapsed = String::with_capacity(input.len());
    let mut last_was_space = false;
    for c in input.chars() {
        if c == ' ' && last_was_space {
            continue;
        }

        last_was_space = c == ' ';
        collapsed.push(c);
    }

    collapsed
}

pub fn normalize(raw: &str) -> NormalizedLine {
    NormalizedLine {
        text: collapse_spaces(strip_comment(raw).trim()),
    }
}

/// Whether `input` ends inside a `for` block, ie. more lines are needed before it can run
///
/// Mirrors the textual block matching the parser does: a header opens a block and the first line
/// that is exactly `}` closes it.
pub fn is_incomplete(input: &str) -> bool {
    let mut open = false;
    for line in input.lines().map(normalize) {
        if line.is_skip() {
            continue;
        }

        if line.text == "}" {
            open = false;
        } else if line.text.starts_with("for(") || line.text.starts_with("for (") {
            open = true;
        }
    }

    open
}

#[test]
fn test_strip_comment() {
    let data = vec![
        (r#"asdf"#, r#"asdf"#),
        (r#"asdf #comment"#, r#"asdf "#),
        (r#"asdf#comment"#, r#"asdf"#),
        (r#"# whole line"#, r#""#),
        (r#"x = 1 # a # b"#, r#"x = 1 "#),
    ];

    for (input, expected) in data {
        assert_eq!(strip_comment(input), expected);
    }
}

#[test]
fn test_collapse_spaces() {
    assert_eq!(collapse_spaces("var   x  =    3"), "var x = 3");
    assert_eq!(collapse_spaces("a\t\tb"), "a\t\tb");
    assert_eq!(collapse_spaces(" \t  x"), " \t x");
}

#[test]
fn test_normalize() {
    let data = vec![
        ("   var  count = 0  # init", "var count = 0", false),
        ("count    += 1", "count += 1", false),
        ("", "", true),
        ("      ", "", true),
        ("# only a comment", "", true),
        ("x += 1#no space", "x += 1", false),
    ];

    for (input, text, skip) in data {
        let line = normalize(input);
        assert_eq!(line.text, text);
        assert_eq!(line.is_skip(), skip, "skip mismatch for {:?}", input);
    }
}

#[test]
fn test_is_incomplete() {
    assert!(!is_incomplete("var x = 1"));
    assert!(is_incomplete("for(3) => (i)"));
    assert!(is_incomplete("for(3) => (i)\n{\nprint(i)"));
    assert!(!is_incomplete("for(3) => (i)\n{\nprint(i)\n}"));
    assert!(!is_incomplete("for (3) => (i) {\n  }  # done"));
    assert!(is_incomplete("var x = 1\nfor(x) => (i) {  # open"));
}
