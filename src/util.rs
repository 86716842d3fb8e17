//! JSON value coercion helpers used by the parameter validator.
use json::JsonValue;

/// We support a variety of true-ish values.
///
/// ```
/// assert_eq!(mo_query::util::json_bool(&json::from("yes")), Some(true));
/// assert_eq!(mo_query::util::json_bool(&json::from("off")), Some(false));
/// assert_eq!(mo_query::util::json_bool(&json::from(1)), Some(true));
/// assert_eq!(mo_query::util::json_bool(&json::from(false)), Some(false));
/// assert_eq!(mo_query::util::json_bool(&json::from("maybe")), None);
/// ```
pub fn json_bool(value: &JsonValue) -> Option<bool> {
    if let Some(b) = value.as_bool() {
        return Some(b);
    }
    if let Some(n) = value.as_i64() {
        return match n {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        };
    }
    if let Some(s) = value.as_str() {
        return match s {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        };
    }
    None
}

/// Translate a number-ish thing into a signed int.
///
/// ```
/// assert_eq!(mo_query::util::json_int(&json::from("-11")), Some(-11));
/// assert_eq!(mo_query::util::json_int(&json::from(12)), Some(12));
/// assert_eq!(mo_query::util::json_int(&json::JsonValue::new_array()), None);
/// ```
pub fn json_int(value: &JsonValue) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.parse::<i64>() {
            return Some(n);
        }
    }
    None
}

/// Translate a number-ish thing into a float.
pub fn json_float(value: &JsonValue) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.parse::<f64>() {
            return Some(n);
        }
    }
    None
}

/// Translate a json value into a String, coercing numbers.
pub fn json_string(value: &JsonValue) -> Option<String> {
    if let Some(s) = value.as_str() {
        Some(s.to_string())
    } else if value.is_number() {
        Some(format!("{value}"))
    } else {
        None
    }
}

/// A positive integer, given as a number or a digit string.
pub fn json_id(value: &JsonValue) -> Option<i64> {
    match json_int(value) {
        Some(n) if n > 0 => Some(n),
        _ => None,
    }
}

/// True if a string value looks like a bare record id.
pub fn is_id_string(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) && !s.starts_with('0')
}

/// Collapse runs of whitespace and trim, like the search tokenizers expect.
pub fn strip_squeeze(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_strings() {
        assert!(is_id_string("42"));
        assert!(!is_id_string("042"));
        assert!(!is_id_string(""));
        assert!(!is_id_string("12a"));
    }

    #[test]
    fn squeeze() {
        assert_eq!(strip_squeeze("  a   b \t c "), "a b c");
    }
}
