//! Custom filters for manifest templates
//!
//! - `yaml_quote`: Render a string as a YAML double-quoted scalar

use minijinja::{Error, ErrorKind};

/// YAML quote filter - escapes backslashes, quotes and control characters
///
/// A JSON string literal is also a valid YAML double-quoted scalar, so the
/// value is serialized with serde_json.
///
/// Usage: `value: {{ secret_key | yaml_quote }}`
pub fn yaml_quote(value: &str) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("failed to quote value: {}", e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_quote_plain() {
        assert_eq!(yaml_quote("AK").unwrap(), "\"AK\"");
    }

    #[test]
    fn test_yaml_quote_escapes_special_characters() {
        assert_eq!(yaml_quote(r#"a"b\c"#).unwrap(), r#""a\"b\\c""#);
        assert_eq!(yaml_quote("tab\there").unwrap(), r#""tab\there""#);
    }
}
