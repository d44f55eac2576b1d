//! Front-matter splitting.
//!
//! A document may start with a `---` delimited YAML block. Malformed or
//! absent blocks are not errors: the whole text is treated as body and the
//! mapping comes back empty.

use std::collections::BTreeMap;

/// Parsed front-matter mapping.
pub type Metadata = BTreeMap<String, serde_yaml::Value>;

/// Split a raw document into its front-matter mapping and body.
pub fn split(raw: &str) -> (Metadata, String) {
    let Some(rest) = raw.strip_prefix("---") else {
        return (Metadata::new(), raw.to_string());
    };
    let Some(end) = rest.find("\n---") else {
        return (Metadata::new(), raw.to_string());
    };

    let block = &rest[..end];
    let body = rest[end + 4..].strip_prefix('\n').unwrap_or(&rest[end + 4..]);

    if block.trim().is_empty() {
        return (Metadata::new(), body.to_string());
    }
    match serde_yaml::from_str::<Metadata>(block) {
        Ok(metadata) => (metadata, body.to_string()),
        Err(_) => (Metadata::new(), raw.to_string()),
    }
}

/// String value for `key`, if present and non-empty.
pub fn string_value<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    match metadata.get(key) {
        Some(serde_yaml::Value::String(value)) if !value.is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_front_matter_and_body() {
        let raw = "---\ntitle: Hello\ncover: hero.jpg\n---\n\n# Body\n";
        let (metadata, body) = split(raw);

        assert_eq!(string_value(&metadata, "cover"), Some("hero.jpg"));
        assert_eq!(string_value(&metadata, "title"), Some("Hello"));
        assert_eq!(body, "\n# Body\n");
    }

    #[test]
    fn test_no_front_matter() {
        let raw = "# Just a body\n";
        let (metadata, body) = split(raw);
        assert!(metadata.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_unterminated_block_is_body() {
        let raw = "---\ntitle: Hello\n";
        let (metadata, body) = split(raw);
        assert!(metadata.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_malformed_yaml_degrades_to_body() {
        let raw = "---\n: [unbalanced\n---\nbody\n";
        let (metadata, body) = split(raw);
        assert!(metadata.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_empty_block() {
        let raw = "---\n---\nbody\n";
        let (metadata, body) = split(raw);
        assert!(metadata.is_empty());
        assert_eq!(body, "body\n");
    }

    #[test]
    fn test_string_value_skips_non_strings() {
        let (metadata, _) = split("---\ncount: 3\nempty: ''\ncover: hero.jpg\n---\nbody");
        assert_eq!(string_value(&metadata, "count"), None);
        assert_eq!(string_value(&metadata, "empty"), None);
        assert_eq!(string_value(&metadata, "missing"), None);
        assert_eq!(string_value(&metadata, "cover"), Some("hero.jpg"));
    }
}
