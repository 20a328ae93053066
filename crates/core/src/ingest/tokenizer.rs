use super::QUOTE;

/// Split one source line into trimmed fields.
///
/// Quote characters toggle a quoted span and are dropped; the separator is
/// literal inside a span. A doubled quote inside a span yields one literal
/// quote and keeps the span open. An unbalanced quote makes the rest of the
/// line part of the current field. Trimming happens after quotes are consumed.
#[must_use]
pub fn tokenize_line(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == QUOTE {
            if in_quotes && chars.peek() == Some(&QUOTE) {
                chars.next();
                current.push(QUOTE);
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == separator && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    fields.push(current.trim().to_string());

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields_and_trims() {
        assert_eq!(tokenize_line(" a , b,c ", ','), vec!["a", "b", "c"]);
    }

    #[test]
    fn separator_inside_quotes_is_literal() {
        let fields = tokenize_line(r#""Hello, world",x"#, ',');
        assert_eq!(fields, vec!["Hello, world", "x"]);
    }

    #[test]
    fn doubled_quote_is_one_literal_quote() {
        let fields = tokenize_line(r#""say ""hi"", ok",2"#, ',');
        assert_eq!(fields, vec![r#"say "hi", ok"#, "2"]);
    }

    #[test]
    fn padding_inside_quotes_is_trimmed() {
        let fields = tokenize_line(r#"" Paris ",  " Rome"  "#, ',');
        assert_eq!(fields, vec!["Paris", "Rome"]);
    }

    #[test]
    fn bare_quotes_in_unquoted_text_are_dropped() {
        let fields = tokenize_line(r#"He said "hi",x"#, ',');
        assert_eq!(fields, vec!["He said hi", "x"]);
    }

    #[test]
    fn tripled_quotes_keep_one_pair() {
        let fields = tokenize_line(r#""""Quoted""",x"#, ',');
        assert_eq!(fields, vec![r#""Quoted""#, "x"]);
    }

    #[test]
    fn unbalanced_quote_swallows_rest_of_line() {
        let fields = tokenize_line(r#"a,"b,c,d"#, ',');
        assert_eq!(fields, vec!["a", "b,c,d"]);
    }

    #[test]
    fn empty_line_yields_one_empty_field() {
        assert_eq!(tokenize_line("", ','), vec![""]);
    }

    #[test]
    fn trailing_separator_yields_empty_field() {
        assert_eq!(tokenize_line("a,b,", ','), vec!["a", "b", ""]);
    }

    #[test]
    fn custom_separator() {
        assert_eq!(tokenize_line("a;\"b;c\";d", ';'), vec!["a", "b;c", "d"]);
    }
}
