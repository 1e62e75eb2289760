use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// What a create request's `OData-EntityId` (or `Location`) URL tells us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedGuidUrl {
    /// The URL up to and including the suffix, empty when the suffix was not found.
    pub base_url: String,
    /// Empty when the URL has no parenthesized segment.
    pub id: String,
}

/// Finds the record id in a URL like `https://org.example.com/api/data/v9.1/accounts(<id>)`.
///
/// The id is the first parenthesized segment after `base_url_suffix` (or anywhere in the URL, if
/// there is no suffix or it cannot be found).
pub fn parse_guid_url(url: &str, base_url_suffix: Option<&str>) -> ParsedGuidUrl {
    static PARENTHESIZED_SEGMENT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\(([^)]+)\)").unwrap());

    let base_url_end = base_url_suffix
        .filter(|suffix| !suffix.is_empty())
        .and_then(|suffix| url.find(suffix).map(|start| start + suffix.len()));

    let (base_url, rest) = match base_url_end {
        Some(end) => url.split_at(end),
        None => ("", url),
    };

    let id = PARENTHESIZED_SEGMENT
        .captures(rest)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
        .unwrap_or_default();

    ParsedGuidUrl {
        base_url: base_url.to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str =
        "https://org.crm.dynamics.com/api/data/v9.1/accounts(4db0ac76-cfcd-ea11-a812-000d3a33febe)";

    #[test]
    fn test_with_suffix() {
        assert_eq!(
            parse_guid_url(URL, Some("/api/data/v9.1")),
            ParsedGuidUrl {
                base_url: "https://org.crm.dynamics.com/api/data/v9.1".to_string(),
                id: "4db0ac76-cfcd-ea11-a812-000d3a33febe".to_string(),
            }
        );
    }

    #[test]
    fn test_without_suffix() {
        for suffix in [None, Some(""), Some("/api/data/v8.0")] {
            assert_eq!(
                parse_guid_url(URL, suffix),
                ParsedGuidUrl {
                    base_url: String::new(),
                    id: "4db0ac76-cfcd-ea11-a812-000d3a33febe".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_only_looks_after_the_suffix() {
        let url = "https://host/tenant(eu)/api/data/v9.1/leads(1234)";

        assert_eq!(parse_guid_url(url, Some("/api/data/v9.1")).id, "1234");
        assert_eq!(parse_guid_url(url, None).id, "eu");
    }

    #[test]
    fn test_no_id() {
        assert_eq!(parse_guid_url("https://host/api/data/v9.1/leads", None).id, "");
    }
}
