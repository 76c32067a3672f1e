//! # Call Sites and Source Resolution
//!
//! A capture documents the code that produced a plot. Rather than walking the
//! stack at runtime, the caller identifies itself with a [`CallSite`], usually via
//! the [`call_site!`](crate::call_site) macro:
//!
//! ```rust
//! let site = snapplot::call_site!("plot_sine");
//! assert_eq!(site.function, "plot_sine");
//! assert!(site.line > 0);
//! ```
//!
//! The text of the function is then found by a [`SourceResolver`]. Resolution
//! degrades in steps and never fails:
//!
//! 1. source text carried by the call site itself
//! 2. the named function, cut out of the caller's file
//! 3. the whole caller file
//! 4. a placeholder comment

use crate::naming::extension_of;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const UNKNOWN_FUNCTION: &str = "unknown_function";
pub const UNKNOWN_FILE: &str = "unknown_file";

/// Where in the program a capture was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub function: String,
    /// Source file as reported by `file!()`, usually relative to the workspace root.
    pub file: PathBuf,
    /// 1-based line of the call; 0 when unknown.
    pub line: u32,
    /// Directory `file` is relative to, if known.
    pub root: Option<PathBuf>,
    /// Source text supplied directly by the caller.
    pub source: Option<String>,
}

impl CallSite {
    pub fn new(function: impl Into<String>, file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
            root: None,
            source: None,
        }
    }

    /// A call site with no usable information; captures fall back to placeholders.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_FUNCTION, UNKNOWN_FILE, 0)
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// File name component of `file`, e.g. `analysis.rs`.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_FILE)
            .to_string()
    }

    /// Extension of the caller file, `txt` when there is none.
    pub fn extension(&self) -> String {
        extension_of(&self.file).unwrap_or_else(|| "txt".to_string())
    }
}

/// Builds a [`CallSite`] for the current file and line.
///
/// The crate's manifest directory is recorded as the root `file!()` is resolved
/// against.
#[macro_export]
macro_rules! call_site {
    ($function:expr) => {
        $crate::source::CallSite::new($function, file!(), line!())
            .with_root(env!("CARGO_MANIFEST_DIR"))
    };
}

/// How the captured source text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Explicit,
    Function,
    File,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub text: String,
    pub origin: SourceOrigin,
}

/// Capability to read the text of a caller's source file.
pub trait SourceResolver {
    /// Returns the full text of the file named by the call site, if readable.
    fn read_file(&self, site: &CallSite) -> Option<String>;
}

/// Reads caller files from disk.
///
/// `file` is tried as given, then joined onto the call site root and each of
/// its ancestors, which covers `file!()` paths in workspace members.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceResolver;

impl SourceResolver for FsSourceResolver {
    fn read_file(&self, site: &CallSite) -> Option<String> {
        if site.file.as_os_str().is_empty() || site.file == Path::new(UNKNOWN_FILE) {
            return None;
        }

        let mut candidates = vec![site.file.clone()];
        if let Some(root) = &site.root {
            candidates.extend(root.ancestors().map(|dir| dir.join(&site.file)));
        }
        candidates
            .iter()
            .find(|path| path.is_file())
            .and_then(|path| fs::read_to_string(path).ok())
    }
}

/// In-memory file contents keyed by path, for tests and embedded sources.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceResolver {
    files: HashMap<PathBuf, String>,
}

impl MemorySourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }
}

impl SourceResolver for MemorySourceResolver {
    fn read_file(&self, site: &CallSite) -> Option<String> {
        self.files.get(&site.file).cloned()
    }
}

/// Resolves the source text for a call site. Never fails.
pub fn resolve(site: &CallSite, resolver: &dyn SourceResolver) -> ResolvedSource {
    if let Some(text) = &site.source {
        return ResolvedSource {
            text: text.clone(),
            origin: SourceOrigin::Explicit,
        };
    }

    if let Some(file_text) = resolver.read_file(site) {
        if let Some(function) = extract_function(&file_text, &site.function, site.line, &site.extension()) {
            return ResolvedSource {
                text: function,
                origin: SourceOrigin::Function,
            };
        }
        return ResolvedSource {
            text: file_text,
            origin: SourceOrigin::File,
        };
    }

    ResolvedSource {
        text: placeholder(site),
        origin: SourceOrigin::Placeholder,
    }
}

fn placeholder(site: &CallSite) -> String {
    let marker = if site.extension() == "rs" { "//" } else { "#" };
    format!(
        "{} Source code for {} in {} could not be retrieved\n",
        marker,
        site.function,
        site.file_name()
    )
}

/// Cuts the definition of `function` out of a source file.
///
/// When several definitions match, the last one starting at or before `line` wins.
/// Python (`py`) bodies end at the first line indented no deeper than the `def`;
/// everything else is treated as brace-delimited. Leading decorators, attributes
/// and doc comments are included.
pub fn extract_function(text: &str, function: &str, line: u32, extension: &str) -> Option<String> {
    if function.is_empty() || function == UNKNOWN_FUNCTION {
        return None;
    }

    let lines: Vec<&str> = text.lines().collect();
    let indented = extension == "py";
    let is_def = |l: &str| {
        if indented {
            is_python_def(l, function)
        } else {
            is_brace_def(l, function)
        }
    };

    let candidates: Vec<usize> = (0..lines.len()).filter(|&i| is_def(lines[i])).collect();
    let hint = (line as usize).saturating_sub(1);
    let def = candidates
        .iter()
        .rev()
        .find(|&&i| line > 0 && i <= hint)
        .or_else(|| candidates.first())
        .copied()?;

    let mut start = def;
    while start > 0 && is_preamble(lines[start - 1], indented) {
        start -= 1;
    }

    let end = if indented {
        indented_block_end(&lines, def)
    } else {
        brace_block_end(&lines, def)?
    };

    let mut body = lines[start..=end].join("\n");
    body.push('\n');
    Some(body)
}

fn is_python_def(line: &str, function: &str) -> bool {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("async def ")
        .or_else(|| trimmed.strip_prefix("def "));
    match rest {
        Some(rest) => rest
            .trim_start()
            .strip_prefix(function)
            .map(|after| after.trim_start().starts_with('('))
            .unwrap_or(false),
        None => false,
    }
}

fn is_brace_def(line: &str, function: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") {
        return false;
    }
    let needle = format!("fn {}", function);
    let mut search = trimmed;
    while let Some(pos) = search.find(&needle) {
        let before_ok = pos == 0
            || search[..pos]
                .chars()
                .last()
                .map(|c| c.is_whitespace())
                .unwrap_or(true);
        let after = search[pos + needle.len()..].trim_start();
        if before_ok && (after.starts_with('(') || after.starts_with('<')) {
            return true;
        }
        search = &search[pos + needle.len()..];
    }
    false
}

fn is_preamble(line: &str, indented: bool) -> bool {
    let trimmed = line.trim_start();
    if indented {
        trimmed.starts_with('@')
    } else {
        trimmed.starts_with("#[") || trimmed.starts_with("///") || trimmed.starts_with("//!")
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn indented_block_end(lines: &[&str], def: usize) -> usize {
    let base = indent_of(lines[def]);
    let mut depth = 0i32;
    let mut in_header = true;
    let mut end = def;

    for (i, line) in lines.iter().enumerate().skip(def) {
        if in_header {
            end = i;
            match scan_header(line, &mut depth) {
                Some(HeaderEnd::InlineBody) => return i,
                Some(HeaderEnd::Block) => in_header = false,
                None => {}
            }
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= base {
            break;
        }
        end = i;
    }
    end
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderEnd {
    /// `def f():` followed by an indented block.
    Block,
    /// `def f(): return 1`
    InlineBody,
}

/// Scans one line of a `def` header, carrying bracket depth across lines.
/// Returns where the header ends if its closing `:` is on this line. Strings
/// and trailing comments are skipped.
fn scan_header(line: &str, depth: &mut i32) -> Option<HeaderEnd> {
    let mut quote: Option<char> = None;
    let mut chars = line.char_indices();
    while let Some((pos, c)) = chars.next() {
        if let Some(q) = quote {
            match c {
                '\\' => {
                    chars.next();
                }
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '#' => return None,
            '(' | '[' | '{' => *depth += 1,
            ')' | ']' | '}' => *depth -= 1,
            ':' if *depth <= 0 => {
                let rest = line[pos + 1..].trim();
                return Some(if rest.is_empty() || rest.starts_with('#') {
                    HeaderEnd::Block
                } else {
                    HeaderEnd::InlineBody
                });
            }
            _ => {}
        }
    }
    None
}

/// Index of the line closing the block opened at or after `def`. A definition
/// ending in `;` before any `{` is a declaration and ends on that line.
fn brace_block_end(lines: &[&str], def: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut opened = false;

    for (i, line) in lines.iter().enumerate().skip(def) {
        let mut in_string = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if in_string {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '/' if chars.peek() == Some(&'/') => break,
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                ';' if !opened => return Some(i),
                _ => {}
            }
            if opened && depth == 0 {
                return Some(i);
            }
        }
    }
    None
}
