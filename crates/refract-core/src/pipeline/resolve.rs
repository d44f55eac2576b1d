//! Per-reference option resolution.
//!
//! Three tiers, applied independently per attribute: a valid per-reference
//! value wins, else the document-level value, else the attribute stays
//! absent. Validation failure is equivalent to absence, never an error.

/// Resolve one numeric attribute across the two configuration layers.
///
/// A per-reference value wins when it is a plain non-negative integer;
/// anything else (`"100%"`, `"auto"`, an empty string) falls through to the
/// document-level value. Absent at both layers resolves to `None` — the
/// attribute is omitted from the job rather than defaulted to zero.
pub fn numeric(per_reference: Option<&str>, configured: Option<u32>) -> Option<u32> {
    per_reference.and_then(parse_numeric).or(configured)
}

/// Parse a width/quality attribute value. Values that are not all digits, or
/// that overflow, count as invalid.
fn parse_numeric(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reference_value_beats_config() {
        assert_eq!(numeric(Some("500"), Some(600)), Some(500));
        assert_eq!(numeric(Some("0"), Some(600)), Some(0));
    }

    #[test]
    fn test_invalid_reference_value_falls_back_to_config() {
        assert_eq!(numeric(Some("100%"), Some(600)), Some(600));
        assert_eq!(numeric(Some("auto"), Some(600)), Some(600));
        assert_eq!(numeric(Some(""), Some(600)), Some(600));
        assert_eq!(numeric(Some("-5"), Some(600)), Some(600));
        assert_eq!(numeric(Some("1.5"), Some(600)), Some(600));
    }

    #[test]
    fn test_invalid_reference_value_without_config_is_absent() {
        assert_eq!(numeric(Some("100%"), None), None);
    }

    #[test]
    fn test_config_used_when_reference_is_absent() {
        assert_eq!(numeric(None, Some(600)), Some(600));
    }

    #[test]
    fn test_absent_everywhere_stays_absent() {
        assert_eq!(numeric(None, None), None);
    }

    #[test]
    fn test_overflowing_value_is_invalid() {
        assert_eq!(numeric(Some("99999999999999999999"), Some(600)), Some(600));
    }
}
