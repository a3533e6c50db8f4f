//! RediSearch value escaping.
//!
//! | Function                          | Input          | Output           | Field kind       |
//! |-----------------------------------|----------------|------------------|------------------|
//! | `escape_for_tag_query(value)`     | `"test-user"`  | `"test\-user"`   | TAG (bool, list) |
//! | `escape_for_text_contains(value)` | `"hi there"`   | `"(*hi* *there*)"` | TEXT match ops |
//! | `escape_for_text_exact(value)`    | `"John Doe"`   | `"\"John Doe\""` | TEXT equality    |

/// Escape a value for RediSearch TAG field queries.
///
/// ```
/// use qsfilter::search::escape_for_tag_query;
///
/// assert_eq!(escape_for_tag_query("active"), "active");
/// assert_eq!(escape_for_tag_query("New York"), "New York");
/// assert_eq!(escape_for_tag_query("test-user"), "test\\-user");
/// assert_eq!(escape_for_tag_query("a|b"), "a\\|b");
/// assert_eq!(escape_for_tag_query("list.test"), "list\\.test");
/// ```
pub fn escape_for_tag_query(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            // `-` is the NOT operator, `.` the JSON path separator
            '$' | '{' | '}' | '\\' | '|' | '.' | '-' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escape a value for substring matching on TEXT fields.
///
/// TEXT fields are tokenized on whitespace, `-` and `/` at index time, so the
/// value is split the same way and every token becomes its own `*token*` term.
/// Several terms are grouped so the field modifier applies to all of them.
///
/// ```
/// use qsfilter::search::escape_for_text_contains;
///
/// assert_eq!(escape_for_text_contains("science"), "*science*");
/// assert_eq!(escape_for_text_contains("name@domain"), "*name\\@domain*");
/// assert_eq!(escape_for_text_contains("open science"), "(*open* *science*)");
/// ```
pub fn escape_for_text_contains(value: &str) -> String {
    let tokens: Vec<String> = value
        .split(|ch: char| ch.is_whitespace() || ch == '-' || ch == '/')
        .filter(|token| !token.is_empty())
        .map(|token| format!("*{}*", escape_text_value(token)))
        .collect();

    match tokens.len() {
        0 => "*".to_string(),
        1 => tokens.concat(),
        _ => format!("({})", tokens.join(" ")),
    }
}

/// Quote a value for exact phrase matching on TEXT fields.
///
/// ```
/// use qsfilter::search::escape_for_text_exact;
///
/// assert_eq!(escape_for_text_exact("John Doe"), "\"John Doe\"");
/// assert_eq!(escape_for_text_exact("say \"hi\""), "\"say \\\"hi\\\"\"");
/// ```
pub fn escape_for_text_exact(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for ch in value.chars() {
        match ch {
            '\\' | '"' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped.push('"');
    escaped
}

fn escape_text_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | '(' | ')' | '|' | '\'' | '"' | '[' | ']' | '{' | '}' | ':' | '@' | '?' | '~' | '&' | '!' | '.'
            | '*' | '%' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub(crate) fn format_numeric(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_escaping_covers_query_syntax() {
        assert_eq!(escape_for_tag_query("$100"), "\\$100");
        assert_eq!(escape_for_tag_query("{foo}"), "\\{foo\\}");
        assert_eq!(escape_for_tag_query("a b:c"), "a b:c");
    }

    #[test]
    fn text_contains_escapes_wildcards() {
        assert_eq!(escape_for_text_contains("50%"), "*50\\%*");
        assert_eq!(escape_for_text_contains("a*b"), "*a\\*b*");
    }

    #[test]
    fn text_contains_splits_on_index_separators() {
        assert_eq!(escape_for_text_contains("open-science"), "(*open* *science*)");
        assert_eq!(escape_for_text_contains("  open   data/sets "), "(*open* *data* *sets*)");
        assert_eq!(escape_for_text_contains("bio:lab 2.0"), "(*bio\\:lab* *2\\.0*)");
        assert_eq!(escape_for_text_contains(" - "), "*");
    }

    #[test]
    fn numbers_drop_trailing_zero_fraction() {
        assert_eq!(format_numeric(10.0), "10");
        assert_eq!(format_numeric(-2.5), "-2.5");
        assert_eq!(format_numeric(1588291200000.0), "1588291200000");
    }
}
