//! File and directory naming conventions.
//!
//! A capture in snapshot mode writes three files sharing one token prefix:
//!
//! ```text
//! <output>/snapshot_<caller stem>/<token>_code.<ext>
//! <output>/snapshot_<caller stem>/<token>_plot.<ext>
//! <output>/snapshot_<caller stem>/<token>_snapshot.html
//! ```
//!
//! In site mode an entry directory is named `<token>_<sanitized title>`, which is
//! unique within its collection because the token is.

use crate::timestamp::Token;
use std::path::Path;

pub const SNAPSHOT_DIR_PREFIX: &str = "snapshot_";
pub const CODE_SUFFIX: &str = "_code";
pub const PLOT_SUFFIX: &str = "_plot";
pub const PAGE_SUFFIX: &str = "_snapshot.html";

/// Characters that are unsafe in file names on at least one platform.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes a title safe for use as a file or directory name.
///
/// Invalid characters become `_`, spaces become `-`, and leading/trailing spaces
/// and dots are stripped. An empty result becomes `unnamed`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            c if INVALID_CHARS.contains(&c) => '_',
            ' ' => '-',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.' || c == '-');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory name for the snapshots of one caller file: `snapshot_<stem>`.
pub fn snapshot_dir_name(caller_file: &Path) -> String {
    let stem = caller_file
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown_file");
    format!("{}{}", SNAPSHOT_DIR_PREFIX, stem)
}

pub fn code_file_name(token: &Token, ext: &str) -> String {
    format!("{}{}.{}", token, CODE_SUFFIX, ext)
}

pub fn plot_file_name(token: &Token, ext: &str) -> String {
    format!("{}{}.{}", token, PLOT_SUFFIX, ext)
}

pub fn page_file_name(token: &Token) -> String {
    format!("{}{}", token, PAGE_SUFFIX)
}

/// Entry directory name inside a collection: `<token>_<sanitized title>`.
pub fn entry_slug(token: &Token, title: &str) -> String {
    format!("{}_{}", token, sanitize_filename(title))
}

/// Derives a display title from a directory name.
///
/// Underscores and hyphens become spaces and every word is capitalized:
/// `random_walk-study` becomes `Random Walk Study`.
pub fn title_from_name(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    title_case(&spaced)
}

/// Capitalizes the first letter of every alphabetic run and lowercases the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Returns the lowercase extension of a path, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        "20241201_143022_123".parse().unwrap()
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Sine Wave"), "Sine-Wave");
        assert_eq!(sanitize_filename("a/b:c"), "a_b_c");
        assert_eq!(sanitize_filename(" .hidden. "), "hidden");
        assert_eq!(sanitize_filename("..."), "unnamed");
        assert_eq!(sanitize_filename(""), "unnamed");
    }

    #[test]
    fn test_snapshot_dir_name_uses_stem() {
        assert_eq!(
            snapshot_dir_name(Path::new("src/analysis.rs")),
            "snapshot_analysis"
        );
        assert_eq!(snapshot_dir_name(Path::new("test_file.py")), "snapshot_test_file");
        assert_eq!(snapshot_dir_name(Path::new("")), "snapshot_unknown_file");
    }

    #[test]
    fn test_triple_shares_token_prefix() {
        let t = token();
        assert_eq!(code_file_name(&t, "py"), "20241201_143022_123_code.py");
        assert_eq!(plot_file_name(&t, "png"), "20241201_143022_123_plot.png");
        assert_eq!(page_file_name(&t), "20241201_143022_123_snapshot.html");
    }

    #[test]
    fn test_entry_slug() {
        assert_eq!(
            entry_slug(&token(), "Random Walk Simulation"),
            "20241201_143022_123_Random-Walk-Simulation"
        );
    }

    #[test]
    fn test_title_from_name() {
        assert_eq!(title_from_name("my_cool_plot"), "My Cool Plot");
        assert_eq!(title_from_name("ml-experiments"), "Ml Experiments");
        assert_eq!(
            title_from_name("20250717_152701_random_walk"),
            "20250717 152701 Random Walk"
        );
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/plot.PNG")), Some("png".to_string()));
        assert_eq!(extension_of(Path::new("Makefile")), None);
    }
}
