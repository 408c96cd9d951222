//! Character and naming rules applied before a payload leaves the process.
//!
//! # Validation Rules
//!
//! - Custom property names: lower-cased name matches `^[a-z][a-z_]*$`
//! - Tag keys: letters, digits and underscores, at least one character
//! - Tag values: empty, or letters, digits, whitespace and `_ , @ . -`
//! - Provider and data source names: letters, digits, space and
//!   `@#$%&*:()!,_'"=.-`

/// Pattern custom property names must match once lower-cased.
pub const PROPERTY_NAME_PATTERN: &str = "^[a-z][a-z_]*$";

/// Characters the platform accepts in provider and data source names.
pub const ALLOWED_NAME_PATTERN: &str = r#"^[ @#$%&*:()!,a-zA-Z0-9_'"=.-]*$"#;

/// Default byte limit used by [`truncate_string`].
pub const DEFAULT_TRUNCATE_LENGTH: usize = 256;

/// Returns `true` when `name` is a valid custom property name.
///
/// # Examples
///
/// ```
/// use oaaclient::validation::is_valid_property_name;
///
/// assert!(is_valid_property_name("last_rotated"));
/// assert!(is_valid_property_name("Owner"));
/// assert!(!is_valid_property_name("_private"));
/// assert!(!is_valid_property_name("build2"));
/// ```
#[must_use]
pub fn is_valid_property_name(name: &str) -> bool {
    let mut chars = name.chars().flat_map(char::to_lowercase);
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_lowercase() || c == '_')
        }
        _ => false,
    }
}

/// Returns `true` when `key` is a valid tag key.
#[must_use]
pub fn is_valid_tag_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(is_word_char)
}

/// Returns `true` when `value` is a valid tag value. Empty values are allowed.
#[must_use]
pub fn is_valid_tag_value(value: &str) -> bool {
    value.chars().all(is_tag_value_char)
}

/// Returns `true` when every character of `name` is accepted in provider and
/// data source names.
///
/// # Examples
///
/// ```
/// use oaaclient::validation::is_allowed_name;
///
/// assert!(is_allowed_name("allowed 1234 @#$%&*:()!,_'\" =.-"));
/// assert!(!is_allowed_name("invalid/characters"));
/// ```
#[must_use]
pub fn is_allowed_name(name: &str) -> bool {
    name.chars().all(is_allowed_name_char)
}

/// Returns the first `limit` bytes of `source`, dropping a trailing partial
/// UTF-8 sequence.
///
/// # Examples
///
/// ```
/// use oaaclient::validation::truncate_string;
///
/// assert_eq!(truncate_string("abcdef", 3), "abc");
/// assert_eq!(truncate_string("añb", 2), "a");
/// ```
#[must_use]
pub fn truncate_string(source: &str, limit: usize) -> &str {
    if source.len() <= limit {
        return source;
    }
    let mut end = limit;
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    source.get(..end).unwrap_or_default()
}

/// De-duplicates strings case-insensitively, keeping the first spelling.
#[must_use]
pub fn unique_strs<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(values.len());
    let mut unique = Vec::with_capacity(values.len());
    for value in values {
        let lowered = value.as_ref().to_lowercase();
        if !seen.contains(&lowered) {
            seen.push(lowered);
            unique.push(value.as_ref().to_owned());
        }
    }
    unique
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_tag_value_char(c: char) -> bool {
    is_word_char(c) || c.is_whitespace() || matches!(c, ',' | '@' | '.' | '-')
}

const fn is_allowed_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            ' ' | '@'
                | '#'
                | '$'
                | '%'
                | '&'
                | '*'
                | ':'
                | '('
                | ')'
                | '!'
                | ','
                | '_'
                | '\''
                | '"'
                | '='
                | '.'
                | '-'
        )
}
