//! Properties file parsing
//!
//! Parses Java-style `key=value` properties files: `#` comments and
//! blank lines are skipped, the first `=` splits key from value, both
//! sides are trimmed, and pairs with an empty value are dropped.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

/// Characters stripped from both ends of keys and values
const TRIM: &[char] = &[' ', '\t', '\r', '\n'];

/// Parse a properties file into a key/value map
pub fn parse_props(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(parse_props_str(&content))
}

/// Parse properties from an in-memory string
pub fn parse_props_str(content: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim_matches(TRIM);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim_matches(TRIM);
        let value = value.trim_matches(TRIM);
        if value.is_empty() {
            continue;
        }
        props.insert(key.to_string(), value.to_string());
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_lines() {
        let props = parse_props_str("foo=bar\n# comment\n\nbaz = qux \n");
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("foo").map(String::as_str), Some("bar"));
        assert_eq!(props.get("baz").map(String::as_str), Some("qux"));
    }

    #[test]
    fn test_empty_value_dropped() {
        let props = parse_props_str("empty=\nblank =   \nkept=v");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("kept").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_first_equals_splits() {
        let props = parse_props_str("url=https://example.com/?a=b");
        assert_eq!(
            props.get("url").map(String::as_str),
            Some("https://example.com/?a=b")
        );
    }

    #[test]
    fn test_line_without_equals_skipped() {
        let props = parse_props_str("not a property\nkey=value");
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_crlf_trimmed() {
        let props = parse_props_str("key=value\r\nother=thing\r\n");
        assert_eq!(props.get("key").map(String::as_str), Some("value"));
        assert_eq!(props.get("other").map(String::as_str), Some("thing"));
    }

    #[test]
    fn test_missing_file_error() {
        let err = parse_props(Path::new("/nonexistent/file.prop")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/file.prop"));
    }
}
