//! Pulling a JSON payload out of model prose. Models are asked for bare
//! JSON but routinely wrap it in markdown fences or commentary.

/// First balanced `{...}` in the text, string-aware.
pub fn extract_object(text: &str) -> Option<&str> {
    extract_balanced(text, '{', '}')
}

/// First balanced `[...]` in the text, string-aware.
pub fn extract_array(text: &str) -> Option<&str> {
    extract_balanced(text, '[', ']')
}

fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[start..start + i + c.len_utf8()]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object() {
        assert_eq!(extract_object(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn object_inside_prose_and_fences() {
        let text = "Sure! Here you go:\n```json\n{\"category\": \"Dining\"}\n```\nHope that helps.";
        assert_eq!(extract_object(text), Some(r#"{"category": "Dining"}"#));
    }

    #[test]
    fn nested_objects_stay_balanced() {
        let text = r#"x {"a": {"b": 2}} y"#;
        assert_eq!(extract_object(text), Some(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = r#"{"note": "odd } brace", "n": 1}"#;
        assert_eq!(extract_object(text), Some(text));
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let text = r#"{"note": "she said \"}\"", "n": 1}"#;
        assert_eq!(extract_object(text), Some(text));
    }

    #[test]
    fn array_of_objects() {
        let text = "answer:\n[{\"a\": 1}, {\"a\": 2}]";
        assert_eq!(extract_array(text), Some(r#"[{"a": 1}, {"a": 2}]"#));
    }

    #[test]
    fn unbalanced_yields_none() {
        assert_eq!(extract_object(r#"{"a": 1"#), None);
        assert_eq!(extract_object("no json here"), None);
    }
}
