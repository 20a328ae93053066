use super::QUOTE;

const ESCAPED_QUOTE: &str = "\"\"";

/// Second cleanup pass over a tokenized field: strip one pair of wrapping
/// quotes, collapse doubled quotes and trim.
#[must_use]
pub fn normalize_field(token: &str) -> String {
    let token = token.trim();
    let unwrapped = if token.len() >= 2 && token.starts_with(QUOTE) && token.ends_with(QUOTE) {
        &token[1..token.len() - 1]
    } else {
        token
    };
    unwrapped.replace(ESCAPED_QUOTE, "\"").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(normalize_field(r#""abc""#), "abc");
    }

    #[test]
    fn unescapes_doubled_quotes() {
        assert_eq!(normalize_field(r#""Hello, ""World""""#), r#"Hello, "World""#);
    }

    #[test]
    fn unquoted_token_is_untouched() {
        assert_eq!(normalize_field("plain"), "plain");
    }

    #[test]
    fn empty_token_and_empty_quotes() {
        assert_eq!(normalize_field(""), "");
        assert_eq!(normalize_field(r#""""#), "");
    }

    #[test]
    fn lone_quote_is_kept() {
        assert_eq!(normalize_field("\""), "\"");
    }

    #[test]
    fn trims_after_unwrapping() {
        assert_eq!(normalize_field(r#"" Paris ""#), "Paris");
        assert_eq!(normalize_field("  plain  "), "plain");
    }

    #[test]
    fn strips_only_one_pair() {
        assert_eq!(normalize_field(r#""""A""""#), r#""A""#);
    }
}
