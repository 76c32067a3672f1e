use pulldown_cmark::{html, Options, Parser};

/// Renders the markdown body of an entry or collection to HTML.
///
/// Tables, footnotes, strikethrough and task lists are enabled. Raw HTML in the
/// source is passed through, as it is in any static site generator.
pub fn to_html(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(source, options);
    let mut output = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markup() {
        let html = to_html("# Title\n\nSome *emphasis* and `code`.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<code>code</code>"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(to_html(""), "");
    }
}
