//! Minimal syntax highlighting for captured source.
//!
//! Produces HTML-escaped text with inline-styled `<span>`s, so pages need no
//! stylesheet or script to show colored code. Only the token classes that matter
//! for reading plotting code are recognized: keywords, builtins, strings,
//! comments, numbers and decorators/attributes.

use stencil::escape_html;

const KEYWORD: &str = "color:#d73a49;font-weight:bold";
const BUILTIN: &str = "color:#6f42c1";
const STRING: &str = "color:#032f62";
const COMMENT: &str = "color:#6a737d;font-style:italic";
const NUMBER: &str = "color:#005cc5";
const DECORATOR: &str = "color:#e36209";

const PYTHON_KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];
const PYTHON_BUILTINS: &[&str] = &[
    "True", "False", "None", "self", "print", "range", "len", "list", "dict", "str", "int",
    "float", "zip", "enumerate",
];
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "static", "struct", "super", "trait", "type", "unsafe", "use", "where", "while",
];
const RUST_BUILTINS: &[&str] = &[
    "true", "false", "self", "Self", "Some", "None", "Ok", "Err", "Vec", "String", "Option",
    "Result", "Box",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Rust,
    Plain,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "py" | "pyw" | "ipynb" => Language::Python,
            "rs" => Language::Rust,
            _ => Language::Plain,
        }
    }

    /// Name used in `language-*` CSS classes.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Plain => "text",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Python => PYTHON_KEYWORDS,
            Language::Rust => RUST_KEYWORDS,
            Language::Plain => &[],
        }
    }

    fn builtins(&self) -> &'static [&'static str] {
        match self {
            Language::Python => PYTHON_BUILTINS,
            Language::Rust => RUST_BUILTINS,
            Language::Plain => &[],
        }
    }
}

/// Highlights `source`, returning HTML safe to embed inside `<pre><code>`.
pub fn highlight(source: &str, language: Language) -> String {
    if language == Language::Plain {
        return escape_html(source);
    }

    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        let style = if is_line_comment(&chars, i, language) {
            i = scan_to_eol(&chars, i);
            Some(COMMENT)
        } else if language == Language::Rust && starts_with(&chars, i, "/*") {
            i = scan_block_comment(&chars, i);
            Some(COMMENT)
        } else if is_string_start(&chars, i, language) {
            i = scan_string(&chars, i, language);
            Some(STRING)
        } else if c.is_ascii_digit() {
            i = scan_while(&chars, i, |c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            Some(NUMBER)
        } else if language == Language::Python && c == '@' {
            i = scan_while(&chars, i + 1, |c| c.is_alphanumeric() || c == '_' || c == '.');
            Some(DECORATOR)
        } else if language == Language::Rust && starts_with(&chars, i, "#[") {
            i = scan_while(&chars, i, |c| c != ']' && c != '\n');
            if i < chars.len() && chars[i] == ']' {
                i += 1;
            }
            Some(DECORATOR)
        } else if c.is_alphabetic() || c == '_' {
            i = scan_while(&chars, i, |c| c.is_alphanumeric() || c == '_');
            let word: String = chars[start..i].iter().collect();
            if language.keywords().contains(&word.as_str()) {
                Some(KEYWORD)
            } else if language.builtins().contains(&word.as_str()) {
                Some(BUILTIN)
            } else {
                None
            }
        } else {
            i += 1;
            None
        };

        let text: String = chars[start..i].iter().collect();
        match style {
            Some(style) => {
                out.push_str("<span style=\"");
                out.push_str(style);
                out.push_str("\">");
                out.push_str(&escape_html(&text));
                out.push_str("</span>");
            }
            None => out.push_str(&escape_html(&text)),
        }
    }
    out
}

fn starts_with(chars: &[char], at: usize, pattern: &str) -> bool {
    let mut idx = at;
    for p in pattern.chars() {
        if chars.get(idx) != Some(&p) {
            return false;
        }
        idx += 1;
    }
    true
}

fn is_line_comment(chars: &[char], at: usize, language: Language) -> bool {
    match language {
        Language::Python => chars[at] == '#',
        Language::Rust => starts_with(chars, at, "//"),
        Language::Plain => false,
    }
}

fn is_string_start(chars: &[char], at: usize, language: Language) -> bool {
    match (language, chars[at]) {
        (_, '"') => true,
        (Language::Python, '\'') => true,
        // Char literals only; a lone quote is a lifetime.
        (Language::Rust, '\'') => {
            (chars.get(at + 2) == Some(&'\'') && chars.get(at + 1) != Some(&'\\'))
                || (chars.get(at + 1) == Some(&'\\') && chars.get(at + 3) == Some(&'\''))
        }
        _ => false,
    }
}

fn scan_while(chars: &[char], from: usize, keep: impl Fn(char) -> bool) -> usize {
    let mut i = from;
    while i < chars.len() && keep(chars[i]) {
        i += 1;
    }
    i
}

fn scan_to_eol(chars: &[char], from: usize) -> usize {
    scan_while(chars, from, |c| c != '\n')
}

fn scan_block_comment(chars: &[char], from: usize) -> usize {
    let mut i = from + 2;
    while i < chars.len() {
        if starts_with(chars, i, "*/") {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

/// Returns the index just past the closing quote, or the end of input for an
/// unterminated string.
fn scan_string(chars: &[char], from: usize, language: Language) -> usize {
    let quote = chars[from];
    let triple = language == Language::Python
        && chars.get(from + 1) == Some(&quote)
        && chars.get(from + 2) == Some(&quote);

    let mut i = if triple { from + 3 } else { from + 1 };
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
            continue;
        }
        if triple {
            if c == quote && chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                return i + 3;
            }
        } else if c == quote {
            return i + 1;
        } else if c == '\n' && language == Language::Python {
            return i;
        }
        i += 1;
    }
    chars.len()
}
