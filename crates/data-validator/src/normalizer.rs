//! Text normalization applied before validation

/// Trim and collapse internal whitespace runs to a single space
pub fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional field; blank becomes `None`
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| normalize_text(&v))
        .filter(|v| !v.is_empty())
}

/// Normalize every entry and drop the blank ones
pub fn normalize_list(values: Vec<String>) -> Vec<String> {
    values
        .iter()
        .map(|v| normalize_text(v))
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Boiler \t room\n 3 "), "Boiler room 3");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_blank_optional_becomes_none() {
        assert_eq!(normalize_optional(Some("  ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
        assert_eq!(
            normalize_optional(Some(" Pump 4 ".to_string())),
            Some("Pump 4".to_string())
        );
    }

    #[test]
    fn test_normalize_list_drops_blanks() {
        let actions = vec![
            " isolated valve ".to_string(),
            "".to_string(),
            "notified  supervisor".to_string(),
        ];
        assert_eq!(
            normalize_list(actions),
            vec!["isolated valve", "notified supervisor"]
        );
    }
}
